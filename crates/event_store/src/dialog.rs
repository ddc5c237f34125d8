//! Selection/dialog transitions, kept free of store plumbing.

use event_store_client::EventRecord;

use crate::dates::{OffsetSource, to_local_display_pair, to_local_epoch_pair};
use crate::state::{DialogState, FormType};

/// Outcome of opening the editor dialog.
#[derive(Clone, Debug, PartialEq)]
pub struct Opened {
    pub state: DialogState,
    pub form_type: FormType,
    pub selection: Option<EventRecord>,
}

/// Decide form type and selection for an open request.
///
/// * nothing passed: blank create form
/// * a timeslot stub: create form seeded with the range in display form
/// * anything else: view form; dates in local-epoch form override the raw
///   ones, every other field passes through
pub fn open(event: Option<EventRecord>, offsets: &dyn OffsetSource) -> Opened {
    match event {
        None => Opened {
            state: DialogState::Creating,
            form_type: FormType::Add,
            selection: None,
        },
        Some(stub) if stub.is_timeslot_stub() => Opened {
            state: DialogState::CreatingFromTimeslot,
            form_type: FormType::Add,
            selection: Some(to_local_display_pair(&stub, offsets).into_record()),
        },
        Some(existing) => {
            let stamps = to_local_epoch_pair(&existing, offsets);
            Opened {
                state: DialogState::Viewing,
                form_type: FormType::Show,
                selection: Some(stamps.apply_to(existing)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedZone;
    use event_store_client::DateValue;

    #[test]
    fn open_without_event_creates() {
        let opened = open(None, &FixedZone::utc());
        assert_eq!(opened.state, DialogState::Creating);
        assert_eq!(opened.form_type, FormType::Add);
        assert!(opened.selection.is_none());
    }

    #[test]
    fn timeslot_selection_is_display_pair_only() {
        let stub = EventRecord::timeslot(
            DateValue::text("2024-01-01T10:00:00Z"),
            DateValue::text("2024-01-01T11:00:00Z"),
        );
        let opened = open(Some(stub), &FixedZone::east_minutes(60));
        assert_eq!(opened.state, DialogState::CreatingFromTimeslot);
        assert_eq!(
            opened.selection,
            Some(EventRecord::timeslot(
                DateValue::text("2024-01-01T11:00"),
                DateValue::text("2024-01-01T12:00"),
            ))
        );
    }

    #[test]
    fn existing_record_views_with_epoch_dates() {
        let record = EventRecord {
            id: Some("1".into()),
            title: Some("A".into()),
            description: Some(String::new()),
            bg_color: Some("#fff".into()),
            start: Some(DateValue::text("2024-01-01T10:00:00Z")),
            end: Some(DateValue::text("2024-01-01T11:00:00Z")),
            ..EventRecord::default()
        };
        let opened = open(Some(record), &FixedZone::utc());
        assert_eq!(opened.state, DialogState::Viewing);
        assert_eq!(opened.form_type, FormType::Show);
        let sel = opened.selection.expect("selection");
        assert_eq!(sel.id.as_deref(), Some("1"));
        assert_eq!(sel.title.as_deref(), Some("A"));
        assert_eq!(sel.description.as_deref(), Some(""));
        assert_eq!(sel.bg_color.as_deref(), Some("#fff"));
        assert_eq!(sel.start, Some(DateValue::Epoch(1_704_103_200_000)));
        assert_eq!(sel.end, Some(DateValue::Epoch(1_704_106_800_000)));
    }

    #[test]
    fn titled_record_without_dates_still_views() {
        let record = EventRecord {
            title: Some("No dates".into()),
            ..EventRecord::default()
        };
        let opened = open(Some(record.clone()), &FixedZone::utc());
        assert_eq!(opened.state, DialogState::Viewing);
        assert_eq!(opened.selection, Some(record));
    }

    #[test]
    fn malformed_dates_propagate_as_invalid() {
        let stub = EventRecord::timeslot(DateValue::text("garbage"), DateValue::text("2024-01-01"));
        let opened = open(Some(stub), &FixedZone::utc());
        let sel = opened.selection.expect("selection");
        assert_eq!(sel.start, Some(DateValue::Invalid));
        assert_eq!(sel.end, Some(DateValue::text("2024-01-01T00:00")));
    }
}
