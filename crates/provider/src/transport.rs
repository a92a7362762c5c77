//! HTTP transport for the provider API.
//!
//! [`ProviderTransport`] is the seam between the sync logic and the wire:
//! the submitter, collector, and resolver only ever see this trait, so
//! tests drive them with scripted in-memory stubs while production uses
//! [`HttpTransport`] over [`reqwest`].

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Low-level provider API surface.
///
/// One method per upstream endpoint; all return raw JSON. Shape
/// interpretation (status fields, page envelopes, job-id aliases) happens
/// in the callers, which is where the provider's inconsistencies are
/// handled.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// `POST /requests`: submit a search job.
    async fn submit_request(&self, body: &Value) -> Result<Value, ProviderError>;

    /// `GET /requests/{id}`: current status of a job.
    async fn request_status(&self, job_id: &str) -> Result<Value, ProviderError>;

    /// `GET /responses?request_id={id}&page={n}&page_size={m}`: one
    /// results page.
    async fn response_page(
        &self,
        job_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Value, ProviderError>;

    /// `GET /tracking/{tracking_id}`: current tracking-subscription state.
    async fn tracking_state(&self, tracking_id: &str) -> Result<Value, ProviderError>;

    /// `POST /tracking`: create a standing monitor.
    async fn create_tracking(&self, body: &Value) -> Result<Value, ProviderError>;

    /// `DELETE /tracking/{tracking_id}`: tear down a standing monitor.
    async fn delete_tracking(&self, tracking_id: &str) -> Result<(), ProviderError>;
}

/// Production transport over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpTransport {
    /// Create a transport from a validated configuration.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or [`ProviderError::Upstream`] with
    /// the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body as JSON.
    async fn parse_json(response: reqwest::Response) -> Result<Value, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn submit_request(&self, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.url("/requests"))
            .header("api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn request_status(&self, job_id: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("/requests/{job_id}")))
            .header("api-key", &self.config.api_key)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn response_page(
        &self,
        job_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(self.url("/responses"))
            .header("api-key", &self.config.api_key)
            .query(&[
                ("request_id", job_id),
                ("page", &page.to_string()),
                ("page_size", &page_size.to_string()),
            ])
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn tracking_state(&self, tracking_id: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(self.url(&format!("/tracking/{tracking_id}")))
            .header("api-key", &self.config.api_key)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn create_tracking(&self, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.url("/tracking"))
            .header("api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn delete_tracking(&self, tracking_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(self.url(&format!("/tracking/{tracking_id}")))
            .header("api-key", &self.config.api_key)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
