//! Tracker platform adapter: JSON payloads, queries, HTTP client and loaders.

use inspection_core::{InspectionConfig, InspectionError, PlannerSnapshot, ReportSnapshot};
use serde_json::Value;

#[cfg(feature = "http")]
pub mod client;
pub mod error;
#[cfg(feature = "http")]
pub mod loader;
pub mod parse;
pub mod payload;
pub mod queries;

#[cfg(feature = "http")]
pub use client::{ApiConfig, TrackerClient};
pub use error::{TrackerError, TrackerResult};
#[cfg(feature = "http")]
pub use loader::Planner;
pub use payload::{InspectionSubmission, TrackerEventPayload, VisitRequest};
pub use queries::{Query, TrackerIds};

/// Builds a planner snapshot from raw API response bodies.
pub fn planner_snapshot_from_str(
    events_json: &str,
    elements_json: &str,
    org_units_json: &str,
    config: &InspectionConfig,
) -> Result<PlannerSnapshot, InspectionError> {
    let events = parse::parse_events(&parse_json(events_json)?)?;
    let elements = parse::parse_data_elements(&parse_json(elements_json)?)?;
    let locations = parse::parse_org_units(&parse_json(org_units_json)?)?;
    Ok(PlannerSnapshot::build(events, &elements, locations, config))
}

/// Builds a report from raw API response bodies.
pub fn report_from_str(
    events_json: &str,
    elements_json: &str,
    org_units_json: &str,
    school: Option<&str>,
    config: &InspectionConfig,
) -> Result<ReportSnapshot, InspectionError> {
    let events = parse::parse_events(&parse_json(events_json)?)?;
    let elements = parse::parse_data_elements(&parse_json(elements_json)?)?;
    let schools = parse::parse_org_units(&parse_json(org_units_json)?)?;
    Ok(ReportSnapshot::build(events, &elements, schools, school, config))
}

fn parse_json(raw: &str) -> Result<Value, InspectionError> {
    serde_json::from_str(raw).map_err(|err| InspectionError::Parse(err.to_string()))
}
