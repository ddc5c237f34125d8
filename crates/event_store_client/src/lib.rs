//! `EventStoreApi` trait, wire types and a reqwest-based client for the remote
//! calendar event store.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;
pub mod retry;

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl EventStoreError {
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => EventStoreError::NotFound(body),
            401 | 403 => EventStoreError::Auth(body),
            400 | 422 => EventStoreError::InvalidInput(body),
            _ => EventStoreError::Api { status, body },
        }
    }

    /// Transport failures and server-side errors may succeed on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            EventStoreError::Http(e) => !e.is_decode() && !e.is_builder(),
            EventStoreError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A date as it travels between the event store and the UI.
///
/// Text covers both absolute ISO strings and minute-precision display strings
/// (`YYYY-MM-DDTHH:MM`). Numbers are milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateValue {
    Text(String),
    Epoch(i64),
    /// Sentinel for a date that could not be parsed.
    Invalid,
}

impl DateValue {
    pub fn text(s: impl Into<String>) -> Self {
        DateValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_epoch(&self) -> Option<i64> {
        match self {
            DateValue::Epoch(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateValue::Text(s) => serializer.serialize_str(s),
            DateValue::Epoch(ms) => serializer.serialize_i64(*ms),
            DateValue::Invalid => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(DateValue::Text(s)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(DateValue::Epoch)
                .ok_or_else(|| D::Error::custom(format!("epoch out of range: {n}"))),
            serde_json::Value::Null => Ok(DateValue::Invalid),
            other => Err(D::Error::custom(format!(
                "expected date string or epoch number, got {other}"
            ))),
        }
    }
}

/// Event record shared by the wire, the event list and the dialog selection.
///
/// All fields are optional: a timeslot stub only carries `start`/`end`, and
/// form data never carries an id.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "deserialize_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateValue>,
}

impl EventRecord {
    /// A blank calendar selection: only a start/end range.
    pub fn timeslot(start: DateValue, end: DateValue) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn is_timeslot_stub(&self) -> bool {
        self.start.is_some()
            && self.end.is_some()
            && self.title.is_none()
            && self.description.is_none()
    }
}

fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string().into()),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventRecord>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub success: bool,
}

/// The remote event store. Implementations own transport concerns only; no
/// date conversion happens at this layer.
#[async_trait]
pub trait EventStoreApi: Send + Sync + 'static {
    async fn fetch_events(&self) -> Result<Vec<EventRecord>, EventStoreError>;

    async fn create_event(&self, payload: &EventRecord)
    -> Result<MutationResponse, EventStoreError>;

    /// Update an existing event. `payload` may be partial.
    async fn update_event(
        &self,
        id: &str,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError>;

    async fn delete_event(&self, id: &str) -> Result<DeleteResponse, EventStoreError>;
}
