//! Resource paths and parameters of the read surface.

use serde::{Deserialize, Serialize};

/// Identifiers of the inspection workflow on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerIds {
    pub program: String,
    pub program_stage: String,
    pub data_element_group: String,
    /// Parent org unit whose children are the inspected schools.
    pub cluster: String,
}

impl Default for TrackerIds {
    fn default() -> Self {
        Self {
            program: "UxK2o06ScIe".to_string(),
            program_stage: "eJiBjm9Rl7E".to_string(),
            data_element_group: "KY12l6IVEB2".to_string(),
            cluster: "Jj1IUjjPaWf".to_string(),
        }
    }
}

const ELEMENT_FIELDS: &str =
    "id,displayFormName,valueType,optionSetValue,optionSet[id,options[displayFormName,id,code]]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub resource: String,
    pub params: Vec<(String, String)>,
}

impl Query {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }
}

/// All events of the program, optionally restricted to one status.
pub fn events(ids: &TrackerIds, status: Option<&str>) -> Query {
    let query = Query::new("tracker/events")
        .param("program", ids.program.as_str())
        .param("paging", "false");
    match status {
        Some(status) => query
            .param("programStage", ids.program_stage.as_str())
            .param("status", status),
        None => query,
    }
}

pub fn data_elements(ids: &TrackerIds) -> Query {
    Query::new(format!("dataElementGroups/{}", ids.data_element_group))
        .param("fields", format!("dataElements[{ELEMENT_FIELDS}]"))
        .param("paging", "false")
}

/// Data elements named by their short names, as used by the report tables.
pub fn report_data_elements(ids: &TrackerIds) -> Query {
    Query::new(format!("dataElementGroups/{}", ids.data_element_group))
        .param("fields", "dataElements[id,displayShortName,valueType]")
        .param("paging", "false")
}

pub fn cluster(ids: &TrackerIds) -> Query {
    Query::new(format!("organisationUnits/{}", ids.cluster)).param(
        "fields",
        "children[name,geometry[coordinates,type],id],name,geometry[coordinates,type]",
    )
}

pub fn program_stage(ids: &TrackerIds) -> Query {
    Query::new(format!("programStages/{}", ids.program_stage))
        .param(
            "fields",
            format!("programStageDataElements[sortOrder,dataElement[{ELEMENT_FIELDS}]]"),
        )
        .param("paging", "false")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_events_query_adds_stage_and_status() {
        let query = events(&TrackerIds::default(), Some("COMPLETED"));
        assert_eq!(query.resource, "tracker/events");
        assert!(query
            .params
            .contains(&("programStage".to_string(), "eJiBjm9Rl7E".to_string())));
        assert!(query
            .params
            .contains(&("status".to_string(), "COMPLETED".to_string())));
    }

    #[test]
    fn element_queries_target_configured_group() {
        let ids = TrackerIds {
            data_element_group: "grp".into(),
            ..TrackerIds::default()
        };
        assert_eq!(data_elements(&ids).resource, "dataElementGroups/grp");
        let fields = &report_data_elements(&ids).params[0].1;
        assert!(fields.contains("displayShortName"));
    }
}
