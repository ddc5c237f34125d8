//! Middleware layer for cross-cutting concerns around the remote event store:
//! logging with timings and request metrics.

use std::sync::Arc;
use std::time::Instant;

use event_store_client::observability::{Outcome, record_request};
use event_store_client::{
    DeleteResponse, EventRecord, EventStoreApi, EventStoreError, MutationResponse,
};
use tracing::debug;

/// Wraps any [`EventStoreApi`] and logs/measures each call.
#[derive(Clone)]
pub struct LoggingMiddleware<C: EventStoreApi> {
    inner: Arc<C>,
}

impl<C: EventStoreApi> LoggingMiddleware<C> {
    /// Create a new logging middleware wrapper.
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Execute a fallible operation with logging.
    async fn with_logging<F, Fut, T>(&self, operation: F, name: &str) -> Result<T, EventStoreError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = Result<T, EventStoreError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        match &result {
            Ok(_) => {
                debug!(
                    "Operation completed successfully: {} in {:?}",
                    name, duration
                );
                record_request(name, Outcome::Success, duration);
            }
            Err(e) => {
                debug!(
                    "Operation failed: {} in {:?} - error: {}",
                    name, duration, e
                );
                record_request(name, Outcome::Failure, duration);
            }
        }

        result
    }
}

#[async_trait::async_trait]
impl<C: EventStoreApi> EventStoreApi for LoggingMiddleware<C> {
    async fn fetch_events(&self) -> Result<Vec<EventRecord>, EventStoreError> {
        self.with_logging(
            |client| async move { client.fetch_events().await },
            "fetch_events",
        )
        .await
    }

    async fn create_event(
        &self,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        self.with_logging(
            |client| async move { client.create_event(payload).await },
            "create_event",
        )
        .await
    }

    async fn update_event(
        &self,
        id: &str,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        self.with_logging(
            |client| async move { client.update_event(id, payload).await },
            "update_event",
        )
        .await
    }

    async fn delete_event(&self, id: &str) -> Result<DeleteResponse, EventStoreError> {
        self.with_logging(
            |client| async move { client.delete_event(id).await },
            "delete_event",
        )
        .await
    }
}
