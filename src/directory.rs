use crate::service::{DeltaBatch, Service, ServiceStatus};

/// The authoritative in-memory set of known services.
///
/// Insertion order is preserved and ids are unique. The directory is owned
/// exclusively by the [`Synchronizer`](crate::synchronizer::Synchronizer);
/// the stream listener and mutation gateway never touch it directly. It
/// performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    services: Vec<Service>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the whole directory with the given list.
    ///
    /// Services absent from the new list are discarded. Duplicate ids keep
    /// their first occurrence; the backend keys services by id, so a
    /// duplicate only appears if it misbehaves.
    pub fn replace_all(&mut self, services: Vec<Service>) {
        let mut next: Vec<Service> = Vec::with_capacity(services.len());
        for service in services {
            if next.iter().any(|s| s.id == service.id) {
                tracing::warn!(id = %service.id, "dropping duplicate id in directory payload");
                continue;
            }
            next.push(service);
        }
        self.services = next;
    }

    /// Overwrites the status of every service named in the batch.
    ///
    /// Entries for ids not in the directory are ignored — the service may
    /// have been deleted or not loaded yet. An `Unknown` entry never
    /// overwrites a known status. Applying the same batch twice is
    /// harmless.
    pub fn apply_status(&mut self, batch: &DeltaBatch) {
        for (id, status) in batch.iter() {
            if *status == ServiceStatus::Unknown {
                continue;
            }
            if let Some(service) = self.services.iter_mut().find(|s| s.id == *id) {
                service.status = *status;
            }
        }
    }

    /// Ordered view of the directory for rendering.
    pub fn snapshot(&self) -> Vec<Service> {
        self.services.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
