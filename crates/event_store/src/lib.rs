//! Client-side event store for a calendar UI.
//!
//! Holds the event list and editor-dialog state, converts dates between wire,
//! display and local-epoch form, and keeps the list in step with a remote
//! [`EventStoreApi`](event_store_client::EventStoreApi).

pub mod config;
pub mod dates;
pub mod dialog;
pub mod error;
pub mod middleware;
pub mod reconcile;
pub mod state;
pub mod store;

mod test_utils;

pub use config::StoreConfig;
pub use dates::{DatePair, FixedZone, OffsetSource, SystemZone};
pub use error::{StoreError, StoreResult};
pub use middleware::LoggingMiddleware;
pub use state::{DialogState, FormType, StoreState};
pub use store::EventStore;

pub use event_store_client::{DateValue, EventRecord};
