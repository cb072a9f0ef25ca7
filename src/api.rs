//! Collaborator seam for the service CRUD backend.
//!
//! [`HttpGateway`](crate::gateway::HttpGateway) is the production
//! implementation; tests substitute in-memory fakes.

use std::future::Future;

use crate::error::Result;
use crate::service::Service;

/// Service CRUD operations, each a single network round trip.
///
/// Implementations never touch the local [`Directory`]; on success the
/// caller triggers a directory refresh instead of patching state from the
/// response. They also do not deduplicate concurrent submissions — the
/// surface issuing intents is responsible for disabling its trigger while
/// one is in flight.
///
/// [`Directory`]: crate::directory::Directory
pub trait ServiceApi: Send + Sync {
    /// `GET /service` — the full ordered directory.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Service>>> + Send;

    /// `GET /service/{id}` — a single service, backend-validated existence.
    fn fetch_service(&self, id: &str) -> impl Future<Output = Result<Service>> + Send;

    /// `POST /service` — register a new service.
    fn create_service(
        &self,
        url: &str,
        name: &str,
    ) -> impl Future<Output = Result<Service>> + Send;

    /// `PUT /service/{id}` — update name and url of an existing service.
    fn update_service(
        &self,
        id: &str,
        url: &str,
        name: &str,
    ) -> impl Future<Output = Result<Service>> + Send;

    /// `DELETE /service/{id}` — remove a service.
    fn delete_service(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}
