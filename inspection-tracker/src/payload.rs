//! Event payloads for the tracker mutation.

use std::collections::HashSet;

use inspection_core::dates::{parse_calendar_date, parse_timestamp};
use inspection_core::{EventStatus, InspectionError, InspectionResult, RawDataValue};
use serde::Serialize;
use tracing::debug;

use crate::queries::TrackerIds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadValue {
    pub data_element: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEventPayload {
    pub program: String,
    pub program_stage: String,
    pub org_unit: String,
    pub occurred_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_values: Vec<PayloadValue>,
}

/// Body of the `tracker` create call.
#[derive(Debug, Serialize)]
pub struct EventBatch<'a> {
    pub events: &'a [TrackerEventPayload],
}

/// A filled-in inspection form for one school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionSubmission {
    pub org_unit_id: String,
    pub occurred_at: String,
    pub values: Vec<RawDataValue>,
}

impl InspectionSubmission {
    /// Builds a completed event; values for elements outside `stage_elements` are dropped.
    pub fn into_payload(
        self,
        ids: &TrackerIds,
        stage_elements: &HashSet<String>,
    ) -> InspectionResult<TrackerEventPayload> {
        if self.org_unit_id.trim().is_empty() {
            return Err(InspectionError::InvalidInput("school is required".into()));
        }
        let occurred_at = self.occurred_at.trim().to_string();
        if parse_timestamp(&occurred_at).is_none() {
            return Err(InspectionError::InvalidInput(format!(
                "inspection date {occurred_at:?} is not a date"
            )));
        }

        let data_values = self
            .values
            .into_iter()
            .filter(|value| {
                let known = stage_elements.contains(&value.data_element_id);
                if !known {
                    debug!(data_element = %value.data_element_id, "dropping value outside program stage");
                }
                known
            })
            .map(|value| PayloadValue {
                data_element: value.data_element_id,
                value: value.raw_value,
            })
            .collect();

        Ok(TrackerEventPayload {
            program: ids.program.clone(),
            program_stage: ids.program_stage.clone(),
            org_unit: self.org_unit_id,
            occurred_at,
            scheduled_at: None,
            status: EventStatus::Completed,
            data_values,
        })
    }
}

/// A planned visit to a school on a calendar date (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRequest {
    pub org_unit_id: String,
    pub date: String,
}

impl VisitRequest {
    pub fn into_payload(self, ids: &TrackerIds) -> InspectionResult<TrackerEventPayload> {
        if self.org_unit_id.trim().is_empty() {
            return Err(InspectionError::InvalidInput("school is required".into()));
        }
        let date = parse_calendar_date(&self.date).ok_or_else(|| {
            InspectionError::InvalidInput(format!("visit date {:?} is not a calendar date", self.date))
        })?;
        let date = date.format("%Y-%m-%d").to_string();

        Ok(TrackerEventPayload {
            program: ids.program.clone(),
            program_stage: ids.program_stage.clone(),
            org_unit: self.org_unit_id,
            occurred_at: date.clone(),
            scheduled_at: Some(date),
            status: EventStatus::Schedule,
            data_values: Vec::new(),
        })
    }
}
