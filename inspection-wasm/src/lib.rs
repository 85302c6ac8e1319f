//! Framework-neutral WASM <-> JavaScript bridge.
//!
//! The host performs the API calls itself and hands the raw response bodies
//! over; snapshots and mutation payloads come back as plain JS objects.

use std::collections::HashSet;

use inspection_core::{InspectionConfig, InspectionError, PlannerSnapshot, RawDataValue, ReportSnapshot};
use inspection_tracker::parse::{parse_data_elements, parse_events, parse_org_units};
use inspection_tracker::payload::EventBatch;
use inspection_tracker::{InspectionSubmission, TrackerEventPayload, TrackerIds, VisitRequest};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsInspectionConfig {
    #[serde(default)]
    follow_up_score_threshold: Option<u32>,
    #[serde(default)]
    inspection_due_days: Option<u32>,
    #[serde(default)]
    max_condition_score: Option<u32>,
    #[serde(default)]
    palette: Option<Vec<String>>,
}

impl From<JsInspectionConfig> for InspectionConfig {
    fn from(cfg: JsInspectionConfig) -> Self {
        let mut base = InspectionConfig::default();
        if let Some(threshold) = cfg.follow_up_score_threshold {
            base.follow_up_score_threshold = threshold;
        }
        if let Some(days) = cfg.inspection_due_days {
            base.inspection_due_days = days;
        }
        if let Some(max) = cfg.max_condition_score {
            base.max_condition_score = max;
        }
        if let Some(palette) = cfg.palette {
            base.palette = palette;
        }
        base
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsDataValue {
    data_element: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsSubmission {
    org_unit: String,
    occurred_at: String,
    #[serde(default)]
    data_values: Vec<JsDataValue>,
}

/// Categorizes raw `tracker/events`, data element group and cluster responses.
#[wasm_bindgen]
pub fn build_planner_snapshot(
    events: JsValue,
    data_elements: JsValue,
    org_units: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let events = parse_events(&read_json(events, "events")?).map_err(inspection_error)?;
    let elements = parse_data_elements(&read_json(data_elements, "data elements")?)
        .map_err(inspection_error)?;
    let locations = parse_org_units(&read_json(org_units, "org units")?).map_err(inspection_error)?;

    let snapshot = PlannerSnapshot::build(events, &elements, locations, &cfg);
    to_value(&snapshot).map_err(|err| JsValue::from_str(&format!("Could not serialize snapshot: {err}")))
}

#[wasm_bindgen]
pub fn build_report(
    events: JsValue,
    data_elements: JsValue,
    org_units: JsValue,
    school: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let events = parse_events(&read_json(events, "events")?).map_err(inspection_error)?;
    let elements = parse_data_elements(&read_json(data_elements, "data elements")?)
        .map_err(inspection_error)?;
    let schools = parse_org_units(&read_json(org_units, "org units")?).map_err(inspection_error)?;

    let report = ReportSnapshot::build(events, &elements, schools, school.as_deref(), &cfg);
    to_value(&report).map_err(|err| JsValue::from_str(&format!("Could not serialize report: {err}")))
}

/// `{"events": [..]}` body scheduling a visit, ready for the host to post.
#[wasm_bindgen]
pub fn build_visit_payload(org_unit_id: String, date: String) -> Result<JsValue, JsValue> {
    let payload = VisitRequest {
        org_unit_id,
        date,
    }
    .into_payload(&TrackerIds::default())
    .map_err(inspection_error)?;
    batch_value(&payload)
}

/// `{"events": [..]}` body for a completed inspection; `stage_elements` lists the
/// data element ids of the program stage.
#[wasm_bindgen]
pub fn build_inspection_payload(
    submission: JsValue,
    stage_elements: Vec<String>,
) -> Result<JsValue, JsValue> {
    let submission: JsSubmission = from_value(submission)
        .map_err(|err| JsValue::from_str(&format!("Could not read submission: {err}")))?;
    let stage: HashSet<String> = stage_elements.into_iter().collect();

    let payload = InspectionSubmission {
        org_unit_id: submission.org_unit,
        occurred_at: submission.occurred_at,
        values: submission
            .data_values
            .into_iter()
            .map(|value| RawDataValue {
                data_element_id: value.data_element,
                raw_value: value.value,
            })
            .collect(),
    }
    .into_payload(&TrackerIds::default(), &stage)
    .map_err(inspection_error)?;
    batch_value(&payload)
}

fn batch_value(payload: &TrackerEventPayload) -> Result<JsValue, JsValue> {
    to_value(&EventBatch {
        events: std::slice::from_ref(payload),
    })
    .map_err(|err| JsValue::from_str(&format!("Could not serialize payload: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<InspectionConfig, JsValue> {
    let cfg = match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsInspectionConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            InspectionConfig::from(cfg)
        }
        _ => InspectionConfig::default(),
    };
    cfg.validate().map_err(inspection_error)?;
    Ok(cfg)
}

fn read_json(value: JsValue, what: &str) -> Result<serde_json::Value, JsValue> {
    from_value::<serde_json::Value>(value)
        .map_err(|err| JsValue::from_str(&format!("Could not read {what} JSON: {err}")))
}

fn inspection_error(err: InspectionError) -> JsValue {
    JsValue::from_str(&format!("Inspection error: {err}"))
}
