//! HTTP mutation gateway for the service CRUD backend.

use std::time::Duration;

use reqwest::header::ACCEPT;

use crate::api::ServiceApi;
use crate::error::{MutationError, Result};
use crate::service::{Service, ServiceUpsert};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway to the backend's `/service` REST surface.
///
/// Every operation is at most one attempt: no retries, no local caching,
/// no side effects on the directory. `url` and `name` are validated
/// locally as non-empty; id existence is validated by the backend only.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { base_url, client }
    }

    fn list_url(&self) -> String {
        format!("{}/service", self.base_url)
    }

    fn service_url(&self, id: &str) -> String {
        format!("{}/service/{}", self.base_url, id)
    }

    fn validate_upsert(url: &str, name: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(MutationError::InvalidInput("url must not be empty".to_string()));
        }
        if name.trim().is_empty() {
            return Err(MutationError::InvalidInput("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Maps any non-2xx response to [`MutationError::Backend`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MutationError::Backend {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Reads the body as text and parses it, so that a well-formed HTTP
    /// response with a malformed body surfaces as a parse error rather
    /// than a transport error.
    async fn parse_body<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl ServiceApi for HttpGateway {
    async fn fetch_all(&self) -> Result<Vec<Service>> {
        let response = self
            .client
            .get(self.list_url())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::parse_body(response).await
    }

    async fn fetch_service(&self, id: &str) -> Result<Service> {
        let response = self
            .client
            .get(self.service_url(id))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::parse_body(response).await
    }

    async fn create_service(&self, url: &str, name: &str) -> Result<Service> {
        Self::validate_upsert(url, name)?;
        let response = self
            .client
            .post(self.list_url())
            .header(ACCEPT, "application/json")
            .json(&ServiceUpsert { url, name })
            .send()
            .await?;
        Self::parse_body(response).await
    }

    async fn update_service(&self, id: &str, url: &str, name: &str) -> Result<Service> {
        Self::validate_upsert(url, name)?;
        let response = self
            .client
            .put(self.service_url(id))
            .header(ACCEPT, "application/json")
            .json(&ServiceUpsert { url, name })
            .send()
            .await?;
        Self::parse_body(response).await
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.service_url(id))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
