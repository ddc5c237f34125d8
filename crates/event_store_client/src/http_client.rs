//! HTTP client implementation for the remote event store.
//!
//! This module provides a reqwest-based implementation of the [`EventStoreApi`](crate::EventStoreApi) trait.

use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::{DeleteResponse, EventRecord, EventStoreApi, EventStoreError, MutationResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Client for the event store REST API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestEventStoreClient {
    base_url: String,
    api_token: Option<SecretString>,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl ReqwestEventStoreClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - Root of the event store API (e.g., "http://localhost:5000/api")
    /// * `api_token` - Optional bearer token sent with every request
    pub fn new(base_url: &str, api_token: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            retry: RetryPolicy::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, config.api_token.clone()).with_retry_policy(RetryPolicy {
            max_retries: config.max_retries,
            ..RetryPolicy::default()
        })
    }

    /// Replace the retry policy applied to idempotent reads.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    /// `{base}/events/{id}` with `id` percent-encoded as a single segment.
    fn event_url(&self, id: &str) -> Result<reqwest::Url, EventStoreError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| EventStoreError::Config(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| {
                EventStoreError::Config(format!("base url cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("events")
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, EventStoreError> {
        let resp = self.authorize(request).send().await?;
        self.handle_response(resp).await
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, EventStoreError> {
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> EventStoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        tracing::debug!(status, body = %body_snippet, "event store returned an error");
        EventStoreError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl EventStoreApi for ReqwestEventStoreClient {
    async fn fetch_events(&self) -> Result<Vec<EventRecord>, EventStoreError> {
        let url = self.events_url();
        self.retry
            .retry_async_if(
                || self.execute_json(self.client.get(&url)),
                EventStoreError::is_transient,
            )
            .await
    }

    async fn create_event(
        &self,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        let url = self.events_url();
        self.execute_json(self.client.post(&url).json(payload)).await
    }

    async fn update_event(
        &self,
        id: &str,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        if id.is_empty() {
            return Err(EventStoreError::InvalidInput("event id is empty".into()));
        }
        let url = self.event_url(id)?;
        self.execute_json(self.client.put(url).json(payload)).await
    }

    async fn delete_event(&self, id: &str) -> Result<DeleteResponse, EventStoreError> {
        if id.is_empty() {
            return Err(EventStoreError::InvalidInput("event id is empty".into()));
        }
        let url = self.event_url(id)?;
        self.execute_json(self.client.delete(url)).await
    }
}
