//! Conversions between the three date representations used by the store.
//!
//! * wire: an absolute instant, either ISO text with an offset or epoch millis
//! * display: local wall-clock text truncated to minutes, `YYYY-MM-DDTHH:MM`
//! * local-epoch: the local wall-clock time read back as if it were UTC, in
//!   epoch millis
//!
//! The local-epoch form is lossy and feeds display math only: the Viewing
//! selection and the record `update` hands back carry it. Payloads sent to
//! the store carry absolute epoch millis instead (see [`to_absolute_epoch`]).
//!
//! Every conversion asks its [`OffsetSource`] for the offset in force at the
//! instant being converted, so values on either side of a DST change get the
//! right bias.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use event_store_client::{DateValue, EventRecord};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Timezone offsets for date normalization.
pub trait OffsetSource: Send + Sync {
    /// Offset (east of UTC) in force at `instant`.
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset;

    /// Offset for a local wall-clock time. Ambiguous times take the earliest
    /// mapping; times inside a DST gap use the offset at the same wall-clock
    /// reading taken as UTC.
    fn offset_for_local(&self, local: NaiveDateTime) -> FixedOffset;
}

/// The operating system's local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemZone;

impl OffsetSource for SystemZone {
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        Local.offset_from_utc_datetime(&instant.naive_utc())
    }

    fn offset_for_local(&self, local: NaiveDateTime) -> FixedOffset {
        Local
            .offset_from_local_datetime(&local)
            .earliest()
            .unwrap_or_else(|| self.offset_at(local.and_utc()))
    }
}

/// A constant offset with no DST.
#[derive(Clone, Copy, Debug)]
pub struct FixedZone(pub FixedOffset);

impl FixedZone {
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    /// Offset in minutes east of UTC. Out-of-range values clamp to UTC.
    pub fn east_minutes(minutes: i32) -> Self {
        Self(FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix()))
    }
}

impl OffsetSource for FixedZone {
    fn offset_at(&self, _instant: DateTime<Utc>) -> FixedOffset {
        self.0
    }

    fn offset_for_local(&self, _local: NaiveDateTime) -> FixedOffset {
        self.0
    }
}

impl OffsetSource for chrono_tz::Tz {
    fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        self.offset_from_utc_datetime(&instant.naive_utc()).fix()
    }

    fn offset_for_local(&self, local: NaiveDateTime) -> FixedOffset {
        self.offset_from_local_datetime(&local)
            .earliest()
            .map(|o| o.fix())
            .unwrap_or_else(|| self.offset_at(local.and_utc()))
    }
}

/// A `start`/`end` pair after conversion. A field missing from the input is
/// missing here too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatePair {
    pub start: Option<DateValue>,
    pub end: Option<DateValue>,
}

impl DatePair {
    /// Overwrite the dates of `record` with the ones present in this pair.
    pub fn apply_to(self, mut record: EventRecord) -> EventRecord {
        if let Some(start) = self.start {
            record.start = Some(start);
        }
        if let Some(end) = self.end {
            record.end = Some(end);
        }
        record
    }

    /// A record holding nothing but this pair.
    pub fn into_record(self) -> EventRecord {
        EventRecord {
            start: self.start,
            end: self.end,
            ..EventRecord::default()
        }
    }
}

/// Read a date as an absolute instant.
///
/// Text with an offset or `Z` is absolute. Date-time text without an offset is
/// local wall-clock time. A bare date is UTC midnight. Numbers are epoch
/// millis. Anything else is `None`.
pub fn parse_instant(value: &DateValue, offsets: &dyn OffsetSource) -> Option<DateTime<Utc>> {
    match value {
        DateValue::Epoch(ms) => DateTime::from_timestamp_millis(*ms),
        DateValue::Invalid => None,
        DateValue::Text(raw) => parse_text(raw.trim(), offsets),
    }
}

fn parse_text(s: &str, offsets: &dyn OffsetSource) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = s.strip_suffix(['Z', 'z']).and_then(parse_naive) {
        return Some(naive.and_utc());
    }
    if let Some(naive) = parse_naive(s) {
        let offset = offsets.offset_for_local(naive);
        return naive.checked_sub_offset(offset).map(|n| n.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT))
        .ok()
}

/// Local wall-clock time of `instant`, or `None` past the representable range.
fn shift_to_local(instant: DateTime<Utc>, offsets: &dyn OffsetSource) -> Option<NaiveDateTime> {
    instant.naive_utc().checked_add_offset(offsets.offset_at(instant))
}

/// One date to display form. Unparseable input becomes [`DateValue::Invalid`].
pub fn to_local_display(value: &DateValue, offsets: &dyn OffsetSource) -> DateValue {
    parse_instant(value, offsets)
        .and_then(|instant| shift_to_local(instant, offsets))
        .map_or(DateValue::Invalid, |local| {
            DateValue::Text(local.format(DISPLAY_FORMAT).to_string())
        })
}

/// One date to local-epoch form, truncated to whole seconds.
pub fn to_local_epoch(value: &DateValue, offsets: &dyn OffsetSource) -> DateValue {
    parse_instant(value, offsets)
        .and_then(|instant| shift_to_local(instant, offsets))
        .and_then(|local| local.and_utc().timestamp().checked_mul(1000))
        .map_or(DateValue::Invalid, DateValue::Epoch)
}

/// One date as the absolute instant it names, in epoch millis. This is the
/// form outbound payloads carry, so a display string sent to the store comes
/// back as the same wall-clock minute.
pub fn to_absolute_epoch(value: &DateValue, offsets: &dyn OffsetSource) -> DateValue {
    parse_instant(value, offsets).map_or(DateValue::Invalid, |instant| {
        DateValue::Epoch(instant.timestamp_millis())
    })
}

/// `start`/`end` of `record` in display form.
pub fn to_local_display_pair(record: &EventRecord, offsets: &dyn OffsetSource) -> DatePair {
    DatePair {
        start: record.start.as_ref().map(|v| to_local_display(v, offsets)),
        end: record.end.as_ref().map(|v| to_local_display(v, offsets)),
    }
}

/// `start`/`end` of `record` in local-epoch form.
pub fn to_local_epoch_pair(record: &EventRecord, offsets: &dyn OffsetSource) -> DatePair {
    DatePair {
        start: record.start.as_ref().map(|v| to_local_epoch(v, offsets)),
        end: record.end.as_ref().map(|v| to_local_epoch(v, offsets)),
    }
}

/// `start`/`end` of `record` as absolute epoch millis.
pub fn to_absolute_epoch_pair(record: &EventRecord, offsets: &dyn OffsetSource) -> DatePair {
    DatePair {
        start: record.start.as_ref().map(|v| to_absolute_epoch(v, offsets)),
        end: record.end.as_ref().map(|v| to_absolute_epoch(v, offsets)),
    }
}

/// A wire record as it is kept in the event list: the known fields pass
/// through, dates are converted to display form.
pub fn to_display_record(record: EventRecord, offsets: &dyn OffsetSource) -> EventRecord {
    let pair = to_local_display_pair(&record, offsets);
    EventRecord {
        id: record.id,
        title: record.title,
        description: record.description,
        bg_color: record.bg_color,
        hours: record.hours,
        start: pair.start,
        end: pair.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn berlin() -> chrono_tz::Tz {
        chrono_tz::Europe::Berlin
    }

    fn text(s: &str) -> DateValue {
        DateValue::text(s)
    }

    #[test]
    fn display_shifts_by_offset_and_truncates_to_minutes() {
        let plus_two = FixedZone::east_minutes(120);
        assert_eq!(
            to_local_display(&text("2024-01-01T10:00:59.999Z"), &plus_two),
            text("2024-01-01T12:00")
        );
        let minus_five = FixedZone::east_minutes(-300);
        assert_eq!(
            to_local_display(&text("2024-01-01T03:30:00Z"), &minus_five),
            text("2023-12-31T22:30")
        );
    }

    #[test]
    fn epoch_is_local_wall_clock_read_as_utc() {
        let plus_two = FixedZone::east_minutes(120);
        // 2024-01-01T12:00:00 as if it were UTC.
        assert_eq!(
            to_local_epoch(&text("2024-01-01T10:00:00Z"), &plus_two),
            DateValue::Epoch(1_704_110_400_000)
        );
    }

    #[test]
    fn epoch_drops_sub_second_precision() {
        let utc = FixedZone::utc();
        assert_eq!(
            to_local_epoch(&DateValue::Epoch(1_704_103_200_750), &utc),
            DateValue::Epoch(1_704_103_200_000)
        );
        assert_eq!(
            to_local_epoch(&text("2024-01-01T10:00:00.750+00:00"), &utc),
            DateValue::Epoch(1_704_103_200_000)
        );
    }

    #[test]
    fn naive_text_is_local_time() {
        let plus_two = FixedZone::east_minutes(120);
        let instant = parse_instant(&text("2024-01-01T12:00"), &plus_two).expect("parse");
        assert_eq!(instant.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        // Display strings survive a display round trip unchanged.
        assert_eq!(to_local_display(&text("2024-01-01T12:00"), &plus_two), text("2024-01-01T12:00"));
        // And their local epoch is the wall clock read as UTC.
        assert_eq!(
            to_local_epoch(&text("2024-01-01T12:00"), &plus_two),
            DateValue::Epoch(1_704_110_400_000)
        );
    }

    #[test]
    fn absolute_epoch_round_trips_through_display() {
        let plus_two = FixedZone::east_minutes(120);
        let picked = text("2024-01-02T09:00");
        let sent = to_absolute_epoch(&picked, &plus_two);
        assert_eq!(sent, DateValue::Epoch(1_704_178_800_000));
        assert_eq!(to_local_display(&sent, &plus_two), picked);
        assert_eq!(to_absolute_epoch(&text("nope"), &plus_two), DateValue::Invalid);
    }

    #[test]
    fn bare_date_is_utc_midnight() {
        let minus_five = FixedZone::east_minutes(-300);
        let instant = parse_instant(&text("2024-03-01"), &minus_five).expect("parse");
        assert_eq!(instant.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn offset_follows_dst_at_each_instant() {
        // Berlin switches from +01:00 to +02:00 at 2024-03-31T01:00Z.
        let winter = to_local_display(&text("2024-03-31T00:30:00Z"), &berlin());
        let summer = to_local_display(&text("2024-03-31T01:30:00Z"), &berlin());
        assert_eq!(winter, text("2024-03-31T01:30"));
        assert_eq!(summer, text("2024-03-31T03:30"));
    }

    #[test]
    fn local_time_inside_dst_gap_still_parses() {
        let instant = parse_instant(&text("2024-03-31T02:30"), &berlin());
        assert!(instant.is_some());
    }

    #[test]
    fn unparseable_dates_become_invalid() {
        let utc = FixedZone::utc();
        assert_eq!(to_local_display(&text("not-a-date"), &utc), DateValue::Invalid);
        assert_eq!(to_local_epoch(&text(""), &utc), DateValue::Invalid);
        assert_eq!(to_local_epoch(&DateValue::Invalid, &utc), DateValue::Invalid);
    }

    #[test]
    fn dates_at_the_edge_of_the_calendar_become_invalid() {
        let latest = DateValue::Epoch(DateTime::<Utc>::MAX_UTC.timestamp_millis());
        let east = FixedZone::east_minutes(60);
        assert_eq!(to_local_display(&latest, &east), DateValue::Invalid);
        assert_eq!(to_local_epoch(&latest, &east), DateValue::Invalid);

        let earliest = DateValue::Epoch(DateTime::<Utc>::MIN_UTC.timestamp_millis());
        let west = FixedZone::east_minutes(-60);
        assert_eq!(to_local_display(&earliest, &west), DateValue::Invalid);
        assert_eq!(to_local_epoch(&earliest, &west), DateValue::Invalid);

        // The same instants still convert where the shift stays in range.
        assert!(matches!(to_local_epoch(&latest, &west), DateValue::Epoch(_)));
        assert_eq!(parse_instant(&DateValue::Epoch(i64::MAX), &east), None);

        let last_minute = text(&NaiveDateTime::MAX.format(DISPLAY_FORMAT).to_string());
        assert_eq!(parse_instant(&last_minute, &west), None);
        assert_eq!(to_local_display(&last_minute, &west), DateValue::Invalid);
        assert!(parse_instant(&last_minute, &east).is_some());
    }

    #[test]
    fn missing_fields_stay_missing() {
        let utc = FixedZone::utc();
        let only_start = EventRecord {
            start: Some(text("2024-01-01T10:00:00Z")),
            ..EventRecord::default()
        };
        let display = to_local_display_pair(&only_start, &utc);
        assert_eq!(display.start, Some(text("2024-01-01T10:00")));
        assert_eq!(display.end, None);

        let epoch = to_local_epoch_pair(&EventRecord::default(), &utc);
        assert_eq!(epoch, DatePair::default());
    }

    #[test]
    fn display_record_passes_known_fields() {
        let wire = EventRecord {
            id: Some("1".into()),
            title: Some("A".into()),
            description: Some(String::new()),
            bg_color: Some("#fff".into()),
            hours: Some(serde_json::json!(2)),
            start: Some(DateValue::Epoch(1_704_103_200_000)),
            end: Some(text("2024-01-01T11:00:00Z")),
        };
        let display = to_display_record(wire.clone(), &FixedZone::east_minutes(60));
        assert_eq!(display.id, wire.id);
        assert_eq!(display.hours, wire.hours);
        assert_eq!(display.start, Some(text("2024-01-01T11:00")));
        assert_eq!(display.end, Some(text("2024-01-01T12:00")));
    }

    #[test]
    fn apply_to_overrides_only_present_dates() {
        let record = EventRecord {
            title: Some("A".into()),
            start: Some(text("a")),
            end: Some(text("b")),
            ..EventRecord::default()
        };
        let merged = DatePair {
            start: Some(DateValue::Epoch(1)),
            end: None,
        }
        .apply_to(record);
        assert_eq!(merged.start, Some(DateValue::Epoch(1)));
        assert_eq!(merged.end, Some(text("b")));
        assert_eq!(merged.title.as_deref(), Some("A"));
    }

    proptest! {
        #[test]
        fn display_and_epoch_agree_within_a_minute(
            secs in 0i64..4_102_444_800,
            millis in 0i64..1000,
            offset_minutes in -720i32..=840,
        ) {
            let zone = FixedZone::east_minutes(offset_minutes);
            let instant = DateTime::from_timestamp_millis(secs * 1000 + millis).unwrap();
            let wire = DateValue::Text(instant.to_rfc3339());

            let display = to_local_display(&wire, &zone);
            let epoch = to_local_epoch(&wire, &zone).as_epoch().unwrap();

            let shown = NaiveDateTime::parse_from_str(display.as_text().unwrap(), DISPLAY_FORMAT)
                .unwrap()
                .and_utc()
                .timestamp_millis();
            prop_assert!(epoch >= shown);
            prop_assert!(epoch - shown < 60_000);
        }

        #[test]
        fn dst_zone_round_trip_within_a_minute(secs in 0i64..4_102_444_800) {
            let instant = DateTime::from_timestamp(secs, 0).unwrap();
            let wire = DateValue::Epoch(instant.timestamp_millis());
            let display = to_local_display(&wire, &berlin());
            let epoch = to_local_epoch(&wire, &berlin()).as_epoch().unwrap();
            let shown = NaiveDateTime::parse_from_str(display.as_text().unwrap(), DISPLAY_FORMAT)
                .unwrap()
                .and_utc()
                .timestamp_millis();
            prop_assert!((epoch - shown).abs() < 60_000);
        }
    }
}
