//! The event store: an in-memory event list plus dialog/selection state,
//! synchronised with a remote [`EventStoreApi`].
//!
//! One `EventStore` serves one application session. Clones share the same
//! state, and presentation code observes it through [`EventStore::subscribe`].
//! Operations are not serialized against each other: a reload that resolves
//! late replaces whatever the list held when it completes.

use std::sync::Arc;

use event_store_client::{DeleteResponse, EventRecord, EventStoreApi, MutationResponse};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dates::{
    OffsetSource, to_absolute_epoch_pair, to_display_record, to_local_epoch_pair,
};
use crate::dialog;
use crate::error::{StoreError, StoreResult};
use crate::reconcile;
use crate::state::{DialogState, FormType, StoreState};

#[derive(Clone)]
pub struct EventStore {
    client: Arc<dyn EventStoreApi>,
    offsets: Arc<dyn OffsetSource>,
    state: Arc<watch::Sender<StoreState>>,
}

impl EventStore {
    pub fn new(client: Arc<dyn EventStoreApi>, offsets: Arc<dyn OffsetSource>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            client,
            offsets,
            state: Arc::new(state),
        }
    }

    /// A receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state.borrow().events.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    pub fn selected_event(&self) -> Option<EventRecord> {
        self.state.borrow().selected_event.clone()
    }

    pub fn form_type(&self) -> FormType {
        self.state.borrow().form_type
    }

    pub fn dialog_state(&self) -> DialogState {
        self.state.borrow().dialog_state()
    }

    fn selected_id(&self) -> StoreResult<String> {
        self.state
            .borrow()
            .selected_id()
            .map(str::to_string)
            .ok_or(StoreError::NoSelection)
    }

    fn offsets(&self) -> &dyn OffsetSource {
        self.offsets.as_ref()
    }

    /// Fetch every event and replace the local list with their display form.
    /// On failure the list keeps its previous contents.
    pub async fn initial_load(&self) -> StoreResult<usize> {
        let fetched = self.client.fetch_events().await.inspect_err(|e| {
            warn!(error = %e, "loading events failed");
        })?;
        let events: Vec<EventRecord> = fetched
            .into_iter()
            .map(|e| to_display_record(e, self.offsets()))
            .collect();
        let count = events.len();
        self.state.send_modify(|s| s.events = events);
        info!(count, "events loaded");
        Ok(count)
    }

    /// Open the editor dialog. Re-opening while open replaces the selection.
    pub fn open_dialog(&self, event: Option<EventRecord>) -> DialogState {
        let opened = dialog::open(event, self.offsets());
        debug!(state = ?opened.state, "opening dialog");
        self.state.send_modify(|s| {
            s.open = true;
            s.form_type = opened.form_type;
            s.selected_event = opened.selection;
        });
        opened.state
    }

    pub fn close_dialog(&self) {
        self.state.send_modify(|s| {
            s.form_type = FormType::Closed;
            s.selected_event = None;
            s.open = false;
        });
    }

    pub fn set_selected_event(&self, event: Option<EventRecord>) {
        self.state.send_modify(|s| s.selected_event = event);
    }

    /// Override the form type. The open flag follows it.
    pub fn set_form_type(&self, form_type: FormType) {
        self.state.send_modify(|s| {
            s.form_type = form_type;
            s.open = form_type != FormType::Closed;
        });
    }

    /// Create an event from form data.
    ///
    /// The payload carries title, description, colour and dates, with dates as
    /// the absolute epoch millis they name, so the appended record shows the
    /// wall-clock minutes the form held. When the store reports success the
    /// returned record is appended to the list in display form. The raw
    /// response is returned either way.
    pub async fn create(&self, form: &EventRecord) -> StoreResult<MutationResponse> {
        let payload = EventRecord {
            title: form.title.clone(),
            description: form.description.clone(),
            bg_color: form.bg_color.clone(),
            start: form.start.clone(),
            end: form.end.clone(),
            ..EventRecord::default()
        };
        let payload = to_absolute_epoch_pair(&payload, self.offsets()).apply_to(payload);

        let response = self.client.create_event(&payload).await?;
        if !response.success {
            warn!("create rejected by the event store");
            return Ok(response);
        }
        let created = response
            .event
            .clone()
            .ok_or(StoreError::MissingRecord {
                operation: "create",
            })?;
        let record = to_display_record(created, self.offsets());
        debug!(id = ?record.id, "appending created event");
        self.state
            .send_modify(|s| s.events = reconcile::append(&s.events, record));
        Ok(response)
    }

    /// Send `form` as an update of the selected event.
    ///
    /// On success the dialog closes and the list is reloaded from the store.
    /// If that reload fails the updated record is reconciled into the list
    /// locally instead. Returns the server's record with local-epoch dates.
    ///
    /// When the store answers `success: false` this returns
    /// [`StoreError::Rejected`]; the dialog stays open and no reload happens,
    /// unlike the close-and-reload that follows an accepted update.
    pub async fn update(&self, form: &EventRecord) -> StoreResult<EventRecord> {
        let id = self.selected_id()?;
        let response = self.client.update_event(&id, form).await?;
        if !response.success {
            warn!(%id, "update rejected by the event store");
            return Err(StoreError::Rejected {
                operation: "update",
            });
        }
        let updated = response.event.ok_or(StoreError::MissingRecord {
            operation: "update",
        })?;
        let converted = to_local_epoch_pair(&updated, self.offsets()).apply_to(updated.clone());

        self.close_dialog();
        if let Err(e) = self.initial_load().await {
            warn!(error = %e, %id, "reload after update failed; reconciling locally");
            let record = to_display_record(updated, self.offsets());
            self.state
                .send_modify(|s| s.events = reconcile::replace_by_id(&s.events, &record));
        }
        Ok(converted)
    }

    /// Delete the selected event.
    ///
    /// On success the dialog closes and the list is reloaded once; if that
    /// reload fails the event is dropped from the list locally. When the store
    /// refuses, list and dialog are left as they were.
    pub async fn remove(&self) -> StoreResult<DeleteResponse> {
        let id = self.selected_id()?;
        let response = self.client.delete_event(&id).await?;
        if !response.success {
            warn!(%id, "delete rejected by the event store");
            return Ok(response);
        }
        self.close_dialog();
        if let Err(e) = self.initial_load().await {
            warn!(error = %e, %id, "reload after delete failed; reconciling locally");
            self.state
                .send_modify(|s| s.events = reconcile::remove_by_id(&s.events, &id));
        }
        Ok(response)
    }
}
