//! Joins raw event values with data element metadata.

use tracing::{debug, warn};

use crate::dates::parse_timestamp;
use crate::metadata::MetadataIndex;
use crate::{DataElement, EnrichedDataValue, EnrichedEvent, RawDataValue, RawEvent};

pub fn merge_events(events: &[RawEvent], elements: &[DataElement]) -> Vec<EnrichedEvent> {
    let index = MetadataIndex::build(elements);
    events
        .iter()
        .map(|event| merge_event(event, &index))
        .collect()
}

/// Enriches one event. Unknown elements and unmatched options degrade to the
/// raw id/value instead of failing.
pub fn merge_event(event: &RawEvent, index: &MetadataIndex) -> EnrichedEvent {
    let occurred_at = event.occurred_at.trim().to_string();
    let occurred_at_utc = parse_timestamp(&occurred_at);
    if occurred_at_utc.is_none() {
        warn!(
            event_id = %event.event_id,
            occurred_at = %occurred_at,
            "event timestamp could not be parsed"
        );
    }

    EnrichedEvent {
        event_id: event.event_id.clone(),
        org_unit_id: event.org_unit_id.clone(),
        org_unit_name: event.org_unit_name.clone(),
        occurred_at,
        occurred_at_utc,
        status: event.status.clone(),
        values: event
            .values
            .iter()
            .map(|value| enrich_value(value, index, &event.event_id))
            .collect(),
    }
}

fn enrich_value(value: &RawDataValue, index: &MetadataIndex, event_id: &str) -> EnrichedDataValue {
    let Some(info) = index.get(&value.data_element_id) else {
        debug!(
            event_id,
            data_element = %value.data_element_id,
            "data element missing from metadata"
        );
        return EnrichedDataValue {
            data_element_id: value.data_element_id.clone(),
            display_name: None,
            value_type: None,
            display_value: value.raw_value.clone(),
            raw_value: value.raw_value.clone(),
        };
    };

    let display_value = match &info.option_set {
        Some(option_set) => match option_set.resolve(&value.raw_value) {
            Some(option) => option.display_name.clone(),
            None => {
                debug!(
                    event_id,
                    data_element = %value.data_element_id,
                    raw_value = %value.raw_value,
                    "no option matched raw value"
                );
                value.raw_value.clone()
            }
        },
        None => value.raw_value.clone(),
    };

    EnrichedDataValue {
        data_element_id: value.data_element_id.clone(),
        display_name: Some(info.display_name.clone()),
        value_type: Some(info.value_type.clone()),
        display_value,
        raw_value: value.raw_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChoiceOption, EventStatus, OptionSet, ValueType};
    use chrono::{TimeZone, Utc};

    fn condition_element() -> DataElement {
        DataElement {
            id: "de-roof".into(),
            display_name: "Roof condition".into(),
            value_type: ValueType::IntegerPositive,
            option_set: Some(OptionSet {
                id: "os-cond".into(),
                options: vec![
                    ChoiceOption {
                        id: "opt-2".into(),
                        code: "2".into(),
                        display_name: "Poor".into(),
                    },
                    ChoiceOption {
                        id: "opt-4".into(),
                        code: "4".into(),
                        display_name: "Good".into(),
                    },
                ],
            }),
        }
    }

    fn raw_event(values: &[(&str, &str)]) -> RawEvent {
        RawEvent {
            event_id: "ev1".into(),
            org_unit_id: "ou1".into(),
            org_unit_name: "Banjul Primary".into(),
            occurred_at: " 2024-10-01T00:00:00.000 ".into(),
            status: EventStatus::Completed,
            values: values
                .iter()
                .map(|(id, raw)| RawDataValue {
                    data_element_id: id.to_string(),
                    raw_value: raw.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn option_code_resolves_to_label() {
        let merged = merge_events(&[raw_event(&[("de-roof", "4")])], &[condition_element()]);
        let value = &merged[0].values[0];
        assert_eq!(value.display_value, "Good");
        assert_eq!(value.raw_value, "4");
        assert_eq!(value.display_name.as_deref(), Some("Roof condition"));
        assert_eq!(value.value_type, Some(ValueType::IntegerPositive));
    }

    #[test]
    fn option_id_resolves_to_label() {
        let merged = merge_events(&[raw_event(&[("de-roof", "opt-2")])], &[condition_element()]);
        assert_eq!(merged[0].values[0].display_value, "Poor");
    }

    #[test]
    fn unmatched_option_keeps_raw_value() {
        let merged = merge_events(&[raw_event(&[("de-roof", "9")])], &[condition_element()]);
        assert_eq!(merged[0].values[0].display_value, "9");
    }

    #[test]
    fn preserves_identity_and_trims_timestamp() {
        let merged = merge_events(&[raw_event(&[])], &[]);
        let event = &merged[0];
        assert_eq!(event.event_id, "ev1");
        assert_eq!(event.org_unit_id, "ou1");
        assert_eq!(event.org_unit_name, "Banjul Primary");
        assert_eq!(event.status, EventStatus::Completed);
        assert_eq!(event.occurred_at, "2024-10-01T00:00:00.000");
        assert_eq!(
            event.occurred_at_utc,
            Some(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn empty_metadata_keeps_every_value_in_order() {
        let raw = raw_event(&[("b", "2"), ("a", "1"), ("b", "2")]);
        let merged = merge_events(std::slice::from_ref(&raw), &[]);
        let values = &merged[0].values;

        assert_eq!(values.len(), 3);
        let ids: Vec<_> = values.iter().map(|v| v.data_element_id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "b"]);
        for (value, source) in values.iter().zip(&raw.values) {
            assert_eq!(value.display_name, None);
            assert_eq!(value.value_type, None);
            assert_eq!(value.raw_value, source.raw_value);
            assert_eq!(value.display_value, source.raw_value);
            assert_eq!(value.label(), source.data_element_id);
        }
    }

    #[test]
    fn unparsable_timestamp_is_none() {
        let mut raw = raw_event(&[]);
        raw.occurred_at = "not a date".into();
        let merged = merge_events(&[raw], &[]);
        assert_eq!(merged[0].occurred_at_utc, None);
        assert_eq!(merged[0].occurred_at, "not a date");
    }
}
