//! Error types for the event store.

use thiserror::Error;

/// Event store errors. Nothing here is fatal; each failure is contained to
/// the operation that produced it and the caller decides how to surface it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("API error: {0}")]
    Api(#[from] event_store_client::EventStoreError),

    #[error("no event selected")]
    NoSelection,

    #[error("{operation} rejected by the event store")]
    Rejected { operation: &'static str },

    #[error("{operation} response carried no event")]
    MissingRecord { operation: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
