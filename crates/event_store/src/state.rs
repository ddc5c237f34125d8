use event_store_client::EventRecord;
use serde::{Deserialize, Serialize};

/// Which editor form, if any, the dialog shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormType {
    #[default]
    #[serde(rename = "")]
    Closed,
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "show")]
    Show,
}

impl FormType {
    pub fn as_str(self) -> &'static str {
        match self {
            FormType::Closed => "",
            FormType::Add => "add",
            FormType::Show => "show",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DialogState {
    Closed,
    /// Blank create form.
    Creating,
    /// Create form seeded from a calendar time range.
    CreatingFromTimeslot,
    /// An existing event is being viewed or edited.
    Viewing,
}

/// Everything presentation code renders from. Published to subscribers on
/// every change.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Display-form records in arrival order.
    pub events: Vec<EventRecord>,
    pub open: bool,
    pub selected_event: Option<EventRecord>,
    pub form_type: FormType,
}

impl StoreState {
    pub fn dialog_state(&self) -> DialogState {
        match self.form_type {
            FormType::Closed => DialogState::Closed,
            FormType::Show => DialogState::Viewing,
            FormType::Add => match &self.selected_event {
                Some(sel) if sel.is_timeslot_stub() => DialogState::CreatingFromTimeslot,
                _ => DialogState::Creating,
            },
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_event
            .as_ref()
            .and_then(|e| e.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store_client::DateValue;

    #[test]
    fn form_type_wire_names() {
        assert_eq!(serde_json::to_value(FormType::Closed).unwrap(), "");
        assert_eq!(serde_json::to_value(FormType::Add).unwrap(), "add");
        let parsed: FormType = serde_json::from_str("\"show\"").unwrap();
        assert_eq!(parsed, FormType::Show);
        assert_eq!(FormType::Add.as_str(), "add");
    }

    #[test]
    fn dialog_state_from_form_and_selection() {
        let mut state = StoreState::default();
        assert_eq!(state.dialog_state(), DialogState::Closed);

        state.form_type = FormType::Add;
        assert_eq!(state.dialog_state(), DialogState::Creating);

        state.selected_event = Some(EventRecord::timeslot(
            DateValue::text("2024-01-01T10:00"),
            DateValue::text("2024-01-01T11:00"),
        ));
        assert_eq!(state.dialog_state(), DialogState::CreatingFromTimeslot);

        state.form_type = FormType::Show;
        assert_eq!(state.dialog_state(), DialogState::Viewing);
    }

    #[test]
    fn selected_id_ignores_blank_ids() {
        let mut state = StoreState {
            selected_event: Some(EventRecord {
                id: Some(String::new()),
                ..EventRecord::default()
            }),
            ..StoreState::default()
        };
        assert_eq!(state.selected_id(), None);
        state.selected_event.as_mut().unwrap().id = Some("7".into());
        assert_eq!(state.selected_id(), Some("7"));
    }
}
