//! Thresholds and standards that drive categorization and reports.

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_PALETTE;
use crate::{InspectionError, InspectionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Condition scores strictly below this value require follow-up.
    pub follow_up_score_threshold: u32,
    /// Days after which a non-scheduled inspection is considered due again.
    pub inspection_due_days: u32,
    /// Highest value of a condition score.
    pub max_condition_score: u32,
    /// Chart colours, assigned by index.
    pub palette: Vec<String>,
    /// Data element carrying the number of students.
    pub students_element: String,
    pub resource_standards: Vec<ResourceStandard>,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            follow_up_score_threshold: 3,
            inspection_due_days: 15,
            max_condition_score: 5,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            students_element: "Students".to_string(),
            resource_standards: vec![
                ResourceStandard::new("Seats", RatioKind::PerStudent, 1.0),
                ResourceStandard::new("Desks", RatioKind::PerStudent, 1.0),
                ResourceStandard::new("Books", RatioKind::PerStudent, 1.0),
                ResourceStandard::new("Teachers", RatioKind::StudentsPer, 45.0),
                ResourceStandard::new("Classrooms", RatioKind::StudentsPer, 53.0),
                ResourceStandard::new("Toilets", RatioKind::StudentsPer, 25.0),
            ],
        }
    }
}

impl InspectionConfig {
    pub fn validate(&self) -> InspectionResult<()> {
        if self.follow_up_score_threshold == 0 {
            return Err(InspectionError::InvalidInput(
                "follow_up_score_threshold must be at least 1".into(),
            ));
        }
        if self.max_condition_score < self.follow_up_score_threshold {
            return Err(InspectionError::InvalidInput(format!(
                "max_condition_score {} is below follow_up_score_threshold {}",
                self.max_condition_score, self.follow_up_score_threshold
            )));
        }
        if self.palette.is_empty() {
            return Err(InspectionError::InvalidInput(
                "palette must contain at least one colour".into(),
            ));
        }
        if let Some(standard) = self
            .resource_standards
            .iter()
            .find(|standard| !(standard.threshold.is_finite() && standard.threshold > 0.0))
        {
            return Err(InspectionError::InvalidInput(format!(
                "threshold for {} must be a positive number",
                standard.name
            )));
        }
        Ok(())
    }

    pub fn standard_for(&self, name: &str) -> Option<&ResourceStandard> {
        self.resource_standards
            .iter()
            .find(|standard| standard.name == name)
    }
}

/// Direction of a resource ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    /// resource / students, met when at or above the threshold (seats per student).
    PerStudent,
    /// students / resource, met when below the threshold (learners per teacher).
    StudentsPer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStandard {
    pub name: String,
    pub kind: RatioKind,
    pub threshold: f64,
}

impl ResourceStandard {
    pub fn new(name: &str, kind: RatioKind, threshold: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            threshold,
        }
    }

    /// Human readable threshold, e.g. `>1` or `<45`.
    pub fn threshold_label(&self) -> String {
        match self.kind {
            RatioKind::PerStudent => format!(">{}", self.threshold),
            RatioKind::StudentsPer => format!("<{}", self.threshold),
        }
    }
}
