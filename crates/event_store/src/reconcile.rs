//! Pure list reconciliation. Each function returns a new list and leaves the
//! input untouched.

use event_store_client::EventRecord;

/// `list` with `record` appended. No deduplication.
pub fn append(list: &[EventRecord], record: EventRecord) -> Vec<EventRecord> {
    let mut out = Vec::with_capacity(list.len() + 1);
    out.extend_from_slice(list);
    out.push(record);
    out
}

/// Replace every entry whose id matches `record` with `record`, keeping its
/// position. The server copy wins for every field. Records without an id, or
/// ids not in the list, leave it unchanged.
pub fn replace_by_id(list: &[EventRecord], record: &EventRecord) -> Vec<EventRecord> {
    let Some(id) = record.id.as_deref() else {
        return list.to_vec();
    };
    list.iter()
        .map(|e| {
            if e.id.as_deref() == Some(id) {
                record.clone()
            } else {
                e.clone()
            }
        })
        .collect()
}

/// `list` without the entries carrying `id`.
pub fn remove_by_id(list: &[EventRecord], id: &str) -> Vec<EventRecord> {
    list.iter()
        .filter(|e| e.id.as_deref() != Some(id))
        .cloned()
        .collect()
}
