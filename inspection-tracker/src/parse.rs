//! Lenient extraction of platform JSON into core types.
//!
//! Missing optional fields degrade to defaults; only a missing top-level
//! collection is an error.

use inspection_core::{
    ChoiceOption, Coordinates, DataElement, EventStatus, InspectionError, InspectionResult,
    Location, OptionSet, RawDataValue, RawEvent, ValueType,
};
use serde_json::Value;
use tracing::debug;

/// Events from a `tracker/events` response (`instances`, legacy `events`, or a bare array).
pub fn parse_events(response: &Value) -> InspectionResult<Vec<RawEvent>> {
    let instances = response
        .get("instances")
        .or_else(|| response.get("events"))
        .and_then(Value::as_array)
        .or_else(|| response.as_array())
        .ok_or(InspectionError::MissingData)?;

    Ok(instances.iter().filter_map(parse_event).collect())
}

fn parse_event(value: &Value) -> Option<RawEvent> {
    let Some(org_unit_id) = string_field(value, &["orgUnit"]) else {
        debug!(event = ?value.get("event"), "skipping event without org unit");
        return None;
    };

    let values = value
        .get("dataValues")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|dv| {
                    Some(RawDataValue {
                        data_element_id: string_field(dv, &["dataElement"])?,
                        raw_value: dv.get("value").map(scalar_text).unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(RawEvent {
        event_id: string_field(value, &["event"]).unwrap_or_default(),
        org_unit_name: string_field(value, &["orgUnitName"]).unwrap_or_else(|| org_unit_id.clone()),
        org_unit_id,
        occurred_at: string_field(value, &["occurredAt", "eventDate"]).unwrap_or_default(),
        status: EventStatus::from(string_field(value, &["status"]).unwrap_or_default()),
        values,
    })
}

/// Data elements of a data element group response (`{"dataElements": [..]}`).
pub fn parse_data_elements(response: &Value) -> InspectionResult<Vec<DataElement>> {
    let elements = response
        .get("dataElements")
        .and_then(Value::as_array)
        .ok_or(InspectionError::MissingData)?;
    Ok(elements.iter().filter_map(parse_data_element).collect())
}

/// A data element together with its position on the program stage form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageElement {
    pub sort_order: i64,
    pub element: DataElement,
}

pub fn parse_program_stage(response: &Value) -> InspectionResult<Vec<StageElement>> {
    let entries = response
        .get("programStageDataElements")
        .and_then(Value::as_array)
        .ok_or(InspectionError::MissingData)?;

    let mut stage: Vec<StageElement> = entries
        .iter()
        .filter_map(|entry| {
            Some(StageElement {
                sort_order: entry.get("sortOrder").and_then(Value::as_i64).unwrap_or(0),
                element: entry.get("dataElement").and_then(parse_data_element)?,
            })
        })
        .collect();
    stage.sort_by_key(|entry| entry.sort_order);
    Ok(stage)
}

fn parse_data_element(value: &Value) -> Option<DataElement> {
    let id = string_field(value, &["id"])?;
    let display_name = string_field(
        value,
        &["displayFormName", "displayShortName", "displayName", "name"],
    )
    .unwrap_or_else(|| id.clone());

    // optionSetValue false means the element is free-form even if a set is attached.
    let uses_options = value
        .get("optionSetValue")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let option_set = if uses_options {
        value.get("optionSet").and_then(parse_option_set)
    } else {
        None
    };

    Some(DataElement {
        id,
        display_name,
        value_type: ValueType::from(string_field(value, &["valueType"]).unwrap_or_default()),
        option_set,
    })
}

fn parse_option_set(value: &Value) -> Option<OptionSet> {
    let options = value.get("options")?.as_array()?;
    Some(OptionSet {
        id: string_field(value, &["id"]).unwrap_or_default(),
        options: options
            .iter()
            .filter_map(|option| {
                let id = string_field(option, &["id"])?;
                Some(ChoiceOption {
                    code: string_field(option, &["code"]).unwrap_or_default(),
                    display_name: string_field(option, &["displayFormName", "displayName", "name"])
                        .unwrap_or_else(|| id.clone()),
                    id,
                })
            })
            .collect(),
    })
}

/// Children of the cluster org unit as schools.
pub fn parse_org_units(response: &Value) -> InspectionResult<Vec<Location>> {
    let children = response
        .get("children")
        .and_then(Value::as_array)
        .ok_or(InspectionError::MissingData)?;

    Ok(children
        .iter()
        .filter_map(|child| {
            let id = string_field(child, &["id"])?;
            Some(Location {
                name: string_field(child, &["name", "displayName"]).unwrap_or_else(|| id.clone()),
                coordinates: child.get("geometry").and_then(parse_point),
                id,
            })
        })
        .collect())
}

fn parse_point(geometry: &Value) -> Option<Coordinates> {
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return None;
    }
    let coordinates = geometry.get("coordinates")?.as_array()?;
    Some(Coordinates {
        longitude: coordinates.first()?.as_f64()?,
        latitude: coordinates.get(1)?.as_f64()?,
    })
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
