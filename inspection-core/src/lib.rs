//! Core logic for planning and reviewing school facility inspections.
//!
//! Everything in this crate is pure: reference metadata and tracker events go
//! in, enriched events, status buckets and report figures come out. Fetching
//! and submitting data lives in `inspection-tracker`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod categorize;
pub mod config;
pub mod dates;
pub mod generation;
pub mod merge;
pub mod metadata;
pub mod palette;
pub mod report;
pub mod views;

pub use categorize::{categorize, categorize_at, classify_event, needs_follow_up, order_by_recency};
pub use config::{InspectionConfig, RatioKind, ResourceStandard};
pub use generation::{Generation, RequestGenerations};
pub use merge::{merge_event, merge_events};
pub use metadata::{ElementInfo, MetadataIndex};
pub use report::ReportSnapshot;
pub use views::{CategoryCounts, StatusFilter};

/// Value type of a data element as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Number,
    IntegerPositive,
    Other(String),
}

impl ValueType {
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Number => "NUMBER",
            ValueType::IntegerPositive => "INTEGER_POSITIVE",
            ValueType::Other(other) => other,
        }
    }
}

impl From<&str> for ValueType {
    fn from(value: &str) -> Self {
        match value {
            "NUMBER" => ValueType::Number,
            "INTEGER_POSITIVE" => ValueType::IntegerPositive,
            other => ValueType::Other(other.to_string()),
        }
    }
}

impl From<String> for ValueType {
    fn from(value: String) -> Self {
        ValueType::from(value.as_str())
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.as_str().to_string()
    }
}

/// One enumerated answer of an option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OptionSet {
    pub id: String,
    pub options: Vec<ChoiceOption>,
}

impl OptionSet {
    /// Option whose id or code equals `raw`, first match wins.
    pub fn resolve(&self, raw: &str) -> Option<&ChoiceOption> {
        self.options
            .iter()
            .find(|option| option.id == raw || option.code == raw)
    }
}

/// Definition of a recorded field ("Seats count", "Roof condition", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataElement {
    pub id: String,
    pub display_name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub option_set: Option<OptionSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDataValue {
    pub data_element_id: String,
    pub raw_value: String,
}

/// Tracker event status. Unknown statuses are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Schedule,
    Completed,
    Active,
    Other(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Schedule => "SCHEDULE",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Active => "ACTIVE",
            EventStatus::Other(other) => other,
        }
    }
}

impl From<&str> for EventStatus {
    fn from(value: &str) -> Self {
        match value {
            "SCHEDULE" => EventStatus::Schedule,
            "COMPLETED" => EventStatus::Completed,
            "ACTIVE" => EventStatus::Active,
            other => EventStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for EventStatus {
    fn from(value: String) -> Self {
        EventStatus::from(value.as_str())
    }
}

impl From<EventStatus> for String {
    fn from(value: EventStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event exactly as returned by the tracker API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_id: String,
    pub org_unit_id: String,
    pub org_unit_name: String,
    pub occurred_at: String,
    pub status: EventStatus,
    pub values: Vec<RawDataValue>,
}

/// A data value joined with its data element metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedDataValue {
    pub data_element_id: String,
    /// `None` when the data element is unknown to the metadata index.
    pub display_name: Option<String>,
    pub value_type: Option<ValueType>,
    /// Option label when the raw value matched an option, the raw value otherwise.
    pub display_value: String,
    pub raw_value: String,
}

impl EnrichedDataValue {
    /// Display name, falling back to the data element id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.data_element_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub event_id: String,
    pub org_unit_id: String,
    pub org_unit_name: String,
    /// Source timestamp with surrounding whitespace removed.
    pub occurred_at: String,
    /// `occurred_at` parsed as UTC, `None` when it could not be parsed.
    pub occurred_at_utc: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub values: Vec<EnrichedDataValue>,
}

/// Longitude/latitude pair as delivered by org unit geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// A school (organisation unit) of the inspected cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Inspection status bucket of a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    NeedFollowUp,
    SoonNeedInspection,
    Scheduled,
    Good,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::NeedFollowUp,
        Category::SoonNeedInspection,
        Category::Scheduled,
        Category::Good,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::NeedFollowUp => "Bad Condition",
            Category::SoonNeedInspection => "Inspection Needed Soon",
            Category::Scheduled => "Scheduled",
            Category::Good => "Good Condition",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Category::NeedFollowUp => "rgb(254, 55, 59)",
            Category::SoonNeedInspection => "rgb(253, 215, 54)",
            Category::Scheduled => "rgb(54, 165, 255)",
            Category::Good => "rgb(113, 220, 61)",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            Category::NeedFollowUp => "Requires immediate follow-up due to critical conditions.",
            Category::SoonNeedInspection => {
                "Occurred more than 15 days ago or yet to occur - requiring inspection."
            }
            Category::Scheduled => "Scheduled for inspection in the near future.",
            Category::Good => "Conditions are normal; no immediate inspection required.",
        }
    }
}

/// Member of a status bucket: either the event representing a school or a
/// placeholder for a school that has no events at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketEntry {
    Inspected(EnrichedEvent),
    NoEvents {
        org_unit_id: String,
        org_unit_name: String,
    },
}

impl BucketEntry {
    pub const NO_EVENTS_STATUS: &'static str = "No events";

    pub fn org_unit_id(&self) -> &str {
        match self {
            BucketEntry::Inspected(event) => &event.org_unit_id,
            BucketEntry::NoEvents { org_unit_id, .. } => org_unit_id,
        }
    }

    pub fn org_unit_name(&self) -> &str {
        match self {
            BucketEntry::Inspected(event) => &event.org_unit_name,
            BucketEntry::NoEvents { org_unit_name, .. } => org_unit_name,
        }
    }

    pub fn status_label(&self) -> &str {
        match self {
            BucketEntry::Inspected(event) => event.status.as_str(),
            BucketEntry::NoEvents { .. } => Self::NO_EVENTS_STATUS,
        }
    }

    pub fn event(&self) -> Option<&EnrichedEvent> {
        match self {
            BucketEntry::Inspected(event) => Some(event),
            BucketEntry::NoEvents { .. } => None,
        }
    }
}

/// The four disjoint status buckets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedEvents {
    pub need_follow_up: Vec<BucketEntry>,
    pub soon_need_inspection: Vec<BucketEntry>,
    pub scheduled: Vec<BucketEntry>,
    pub good: Vec<BucketEntry>,
}

impl CategorizedEvents {
    pub fn bucket(&self, category: Category) -> &[BucketEntry] {
        match category {
            Category::NeedFollowUp => &self.need_follow_up,
            Category::SoonNeedInspection => &self.soon_need_inspection,
            Category::Scheduled => &self.scheduled,
            Category::Good => &self.good,
        }
    }

    pub(crate) fn bucket_mut(&mut self, category: Category) -> &mut Vec<BucketEntry> {
        match category {
            Category::NeedFollowUp => &mut self.need_follow_up,
            Category::SoonNeedInspection => &mut self.soon_need_inspection,
            Category::Scheduled => &mut self.scheduled,
            Category::Good => &mut self.good,
        }
    }

    /// Bucket holding the given org unit, if any.
    pub fn category_of(&self, org_unit_id: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|category| {
            self.bucket(*category)
                .iter()
                .any(|entry| entry.org_unit_id() == org_unit_id)
        })
    }

    pub fn entry_for(&self, org_unit_id: &str) -> Option<(Category, &BucketEntry)> {
        Category::ALL.into_iter().find_map(|category| {
            self.bucket(category)
                .iter()
                .find(|entry| entry.org_unit_id() == org_unit_id)
                .map(|entry| (category, entry))
        })
    }

    pub fn len(&self) -> usize {
        Category::ALL
            .into_iter()
            .map(|category| self.bucket(category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the planner view needs, computed from one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    pub generated_at: DateTime<Utc>,
    pub locations: Vec<Location>,
    pub categories: CategorizedEvents,
    pub counts: CategoryCounts,
    /// Scheduled visits, soonest first.
    pub upcoming: Vec<EnrichedEvent>,
    /// Non-scheduled events, most recent first.
    pub recent: Vec<EnrichedEvent>,
}

impl PlannerSnapshot {
    /// Runs restrict → merge → categorize against the wall clock.
    pub fn build(
        events: Vec<RawEvent>,
        elements: &[DataElement],
        locations: Vec<Location>,
        config: &InspectionConfig,
    ) -> Self {
        Self::build_at(events, elements, locations, config, Utc::now())
    }

    pub fn build_at(
        events: Vec<RawEvent>,
        elements: &[DataElement],
        locations: Vec<Location>,
        config: &InspectionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let events = views::restrict_to_locations(events, &locations);
        let enriched = merge_events(&events, elements);
        let categories = categorize_at(&enriched, &locations, config, now);
        let counts = CategoryCounts::from_categorized(&categories, locations.len());

        let upcoming = views::upcoming_visits(&enriched)
            .into_iter()
            .cloned()
            .collect();
        let recent = views::recent_inspections(&enriched, StatusFilter::All)
            .into_iter()
            .cloned()
            .collect();

        Self {
            generated_at: now,
            locations,
            categories,
            counts,
            upcoming,
            recent,
        }
    }
}

/// Errors raised at the input boundaries of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum InspectionError {
    #[error("input is missing required data")]
    MissingData,
    #[error("could not parse input: {0}")]
    Parse(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type InspectionResult<T> = Result<T, InspectionError>;
