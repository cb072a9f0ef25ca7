use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Health of a monitored service as last reported by the poller.
///
/// Serializes to the backend's REST shape (`"UNKNOWN" | "OK" | "FAIL"`).
/// Deserialization is case-insensitive; any unrecognized value maps to
/// `Unknown`, which is also what the status stream sends before the first
/// poll of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Ok,
    Fail,
}

impl ServiceStatus {
    pub fn from_wire(value: &str) -> Self {
        if value.eq_ignore_ascii_case("ok") {
            ServiceStatus::Ok
        } else if value.eq_ignore_ascii_case("fail") {
            ServiceStatus::Fail
        } else {
            ServiceStatus::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Unknown => "UNKNOWN",
            ServiceStatus::Ok => "OK",
            ServiceStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ServiceStatus::from_wire(&value))
    }
}

/// A monitored endpoint as served by `GET /service`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub status: ServiceStatus,
}

/// Request body for `POST /service` and `PUT /service/{id}`.
#[derive(Debug, Serialize)]
pub struct ServiceUpsert<'a> {
    pub url: &'a str,
    pub name: &'a str,
}

/// One status-stream frame body: service id → newly polled status.
///
/// Batches carry no ordering guarantee relative to each other and may be
/// redelivered; applying one is idempotent (last write wins per id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DeltaBatch(HashMap<String, ServiceStatus>);

impl DeltaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, status: ServiceStatus) {
        self.0.insert(id.into(), status);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceStatus)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ServiceStatus)> for DeltaBatch {
    fn from_iter<T: IntoIterator<Item = (String, ServiceStatus)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
