//! Shared test utilities: an in-memory `EventStoreApi` with call counters,
//! failure injection and a gate that holds `fetch_events` responses back.
#![cfg(test)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

use event_store_client::{
    DeleteResponse, EventRecord, EventStoreApi, EventStoreError, MutationResponse,
};

#[derive(Default)]
pub struct MockEventApi {
    server: Mutex<Vec<EventRecord>>,
    next_id: AtomicUsize,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fetch_failures: AtomicUsize,
    reject_mutations: AtomicBool,
    omit_event: AtomicBool,
    gate_fetches: AtomicBool,
    gate: Notify,
    last_create: Mutex<Option<EventRecord>>,
    last_update: Mutex<Option<(String, EventRecord)>>,
}

impl MockEventApi {
    pub fn with_events(events: Vec<EventRecord>) -> Self {
        let mock = Self::default();
        *mock.server.lock().unwrap() = events;
        mock
    }

    pub fn server_events(&self) -> Vec<EventRecord> {
        self.server.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_fetch(&self) {
        self.fetch_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Answer every mutation with `success: false`.
    pub fn reject_mutations(&self) {
        self.reject_mutations.store(true, Ordering::SeqCst);
    }

    /// Answer successful mutations without an `event` payload.
    pub fn omit_event(&self) {
        self.omit_event.store(true, Ordering::SeqCst);
    }

    /// From now on `fetch_events` snapshots the server list when called but
    /// only returns once [`release_fetch`](Self::release_fetch) is called.
    pub fn gate_fetches(&self) {
        self.gate_fetches.store(true, Ordering::SeqCst);
    }

    pub fn release_fetch(&self) {
        self.gate.notify_one();
    }

    pub fn last_create(&self) -> Option<EventRecord> {
        self.last_create.lock().unwrap().clone()
    }

    pub fn last_update(&self) -> Option<(String, EventRecord)> {
        self.last_update.lock().unwrap().clone()
    }

    fn response(&self, event: EventRecord) -> MutationResponse {
        MutationResponse {
            success: true,
            event: (!self.omit_event.load(Ordering::SeqCst)).then_some(event),
        }
    }
}

fn merge(target: &mut EventRecord, patch: &EventRecord) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if let Some(v) = &patch.$field { target.$field = Some(v.clone()); })*
        };
    }
    take!(title, description, bg_color, hours, start, end);
}

#[async_trait]
impl EventStoreApi for MockEventApi {
    async fn fetch_events(&self) -> Result<Vec<EventRecord>, EventStoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let failures = self.fetch_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.fetch_failures.store(failures - 1, Ordering::SeqCst);
            return Err(EventStoreError::from_status(503, "unavailable"));
        }
        let snapshot = self.server_events();
        if self.gate_fetches.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn create_event(
        &self,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_create.lock().unwrap() = Some(payload.clone());
        if self.reject_mutations.load(Ordering::SeqCst) {
            return Ok(MutationResponse::default());
        }
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = EventRecord {
            id: Some(id),
            ..payload.clone()
        };
        self.server.lock().unwrap().push(stored.clone());
        Ok(self.response(stored))
    }

    async fn update_event(
        &self,
        id: &str,
        payload: &EventRecord,
    ) -> Result<MutationResponse, EventStoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_update.lock().unwrap() = Some((id.to_string(), payload.clone()));
        if self.reject_mutations.load(Ordering::SeqCst) {
            return Ok(MutationResponse::default());
        }
        let updated = {
            let mut server = self.server.lock().unwrap();
            match server.iter_mut().find(|e| e.id.as_deref() == Some(id)) {
                Some(existing) => {
                    merge(existing, payload);
                    existing.clone()
                }
                None => return Err(EventStoreError::from_status(404, id)),
            }
        };
        Ok(self.response(updated))
    }

    async fn delete_event(&self, id: &str) -> Result<DeleteResponse, EventStoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_mutations.load(Ordering::SeqCst) {
            return Ok(DeleteResponse { success: false });
        }
        let mut server = self.server.lock().unwrap();
        let before = server.len();
        server.retain(|e| e.id.as_deref() != Some(id));
        Ok(DeleteResponse {
            success: server.len() != before,
        })
    }
}
