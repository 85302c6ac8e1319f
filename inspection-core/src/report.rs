//! Management report figures: condition scores, resource ratios and trends.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::categorize::order_by_recency;
use crate::config::{InspectionConfig, RatioKind};
use crate::merge::merge_events;
use crate::palette::color_for_schools;
use crate::{DataElement, EnrichedEvent, EventStatus, Location, RawEvent, ValueType};

/// Report for the whole cluster (latest inspection per school) or one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub school: Option<String>,
    pub schools: Vec<Location>,
    /// Events the figures were computed from.
    pub inspections: Vec<AlignedEvent>,
    pub condition: Option<ConditionSummary>,
    pub resources: ResourceReport,
    /// Chart colour per school name, in order of first appearance.
    pub school_colors: Vec<(String, String)>,
    /// Condition scores over time; only for a single-school report.
    pub trend: Option<TrendSeries>,
}

impl ReportSnapshot {
    pub fn build(
        events: Vec<RawEvent>,
        elements: &[DataElement],
        schools: Vec<Location>,
        school: Option<&str>,
        config: &InspectionConfig,
    ) -> Self {
        Self::build_at(events, elements, schools, school, config, Utc::now())
    }

    /// Only completed events count as inspections. With `school` set, only its
    /// most recent one is reported.
    pub fn build_at(
        events: Vec<RawEvent>,
        elements: &[DataElement],
        schools: Vec<Location>,
        school: Option<&str>,
        config: &InspectionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let completed: Vec<RawEvent> = events
            .into_iter()
            .filter(|event| event.status == EventStatus::Completed)
            .collect();
        let enriched = merge_events(&completed, elements);
        let ordered = order_by_recency(&enriched);
        let selected: Vec<&EnrichedEvent> = match school {
            Some(id) => ordered
                .into_iter()
                .filter(|event| event.org_unit_id == id)
                .take(1)
                .collect(),
            None => first_event_per_school(&ordered, |event| event.org_unit_id.as_str())
                .into_iter()
                .copied()
                .collect(),
        };

        let trend = school.map(|id| {
            let scored: Vec<&str> = elements
                .iter()
                .filter(|element| element.value_type == ValueType::IntegerPositive)
                .map(|element| element.id.as_str())
                .collect();
            trend_series(&enriched, id, &scored)
        });

        let inspections: Vec<AlignedEvent> = selected
            .iter()
            .map(|event| align_to_metadata(event, elements))
            .collect();
        let owned: Vec<EnrichedEvent> = selected.into_iter().cloned().collect();
        let school_colors = color_for_schools(
            &config.palette,
            owned.iter().map(|event| event.org_unit_name.as_str()),
        );

        Self {
            generated_at: now,
            school: school.map(str::to_string),
            schools,
            condition: condition_summary(&inspections, config),
            resources: resource_ratios(&owned, config),
            inspections,
            school_colors,
            trend,
        }
    }
}

/// An event projected onto the full data element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedEvent {
    pub event_id: String,
    pub org_unit_id: String,
    pub org_unit_name: String,
    pub occurred_at_utc: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub values: Vec<AlignedValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedValue {
    pub data_element_id: String,
    pub display_name: String,
    pub value_type: ValueType,
    /// Raw value, `None` when the event did not record this element.
    pub value: Option<String>,
}

/// One value per data element in metadata order.
pub fn align_to_metadata(event: &EnrichedEvent, elements: &[DataElement]) -> AlignedEvent {
    AlignedEvent {
        event_id: event.event_id.clone(),
        org_unit_id: event.org_unit_id.clone(),
        org_unit_name: event.org_unit_name.clone(),
        occurred_at_utc: event.occurred_at_utc,
        status: event.status.clone(),
        values: elements
            .iter()
            .map(|element| AlignedValue {
                data_element_id: element.id.clone(),
                display_name: element.display_name.clone(),
                value_type: element.value_type.clone(),
                value: event
                    .values
                    .iter()
                    .find(|value| value.data_element_id == element.id)
                    .map(|value| value.raw_value.clone()),
            })
            .collect(),
    }
}

/// First event of every org unit, in input order.
pub fn first_event_per_school<T, F>(events: &[T], org_unit: F) -> Vec<&T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| seen.insert(org_unit(*event).to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRating {
    Good,
    Ok,
    Bad,
}

impl ConditionRating {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 75 {
            ConditionRating::Good
        } else if percentage >= 50 {
            ConditionRating::Ok
        } else {
            ConditionRating::Bad
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub element: String,
    pub score: u64,
    pub max_score: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub percentage: u32,
    pub rating: ConditionRating,
    pub rows: Vec<ScoreRow>,
}

/// Sums condition scores over `events`. `None` when nothing was scored.
///
/// Totals saturate instead of wrapping; a score above the configured maximum
/// can push the percentage past 100.
pub fn condition_summary(events: &[AlignedEvent], config: &InspectionConfig) -> Option<ConditionSummary> {
    let max = u64::from(config.max_condition_score);
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, u64> = HashMap::new();
    let mut slots: u64 = 0;

    for event in events {
        for value in event
            .values
            .iter()
            .filter(|value| value.value_type == ValueType::IntegerPositive)
        {
            let score = value
                .value
                .as_deref()
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .unwrap_or(0);
            if !totals.contains_key(&value.display_name) {
                order.push(value.display_name.clone());
            }
            let total = totals.entry(value.display_name.clone()).or_insert(0);
            *total = total.saturating_add(score);
            slots = slots.saturating_add(1);
        }
    }

    if slots == 0 {
        return None;
    }

    let total = totals.values().fold(0u64, |sum, score| sum.saturating_add(*score));
    let possible = max.saturating_mul(slots);
    let percentage = (total as f64 / possible as f64 * 100.0).round() as u32;
    let event_count = u64::try_from(events.len()).unwrap_or(u64::MAX);

    Some(ConditionSummary {
        percentage,
        rating: ConditionRating::from_percentage(percentage),
        rows: order
            .into_iter()
            .map(|element| ScoreRow {
                score: totals.get(&element).copied().unwrap_or(0),
                element,
                max_score: max.saturating_mul(event_count),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRatio {
    pub resource: String,
    pub total: f64,
    /// Two-decimal ratio; `None` when the denominator is zero.
    pub ratio: Option<f64>,
    pub threshold: String,
    pub meets_standard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub students: f64,
    pub ratios: Vec<ResourceRatio>,
}

/// Compares resource totals with the configured minimum standards.
pub fn resource_ratios(events: &[EnrichedEvent], config: &InspectionConfig) -> ResourceReport {
    let mut students = 0.0;
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();

    for value in events.iter().flat_map(|event| &event.values) {
        let label = value.label();
        let Ok(amount) = value.raw_value.trim().parse::<f64>() else {
            continue;
        };

        if label == config.students_element {
            students += amount;
        }

        if value.value_type == Some(ValueType::Number) && config.standard_for(label).is_some() {
            if !sums.contains_key(label) {
                order.push(label.to_string());
            }
            *sums.entry(label.to_string()).or_insert(0.0) += amount;
        }
    }

    let ratios = order
        .into_iter()
        .filter_map(|resource| {
            let standard = config.standard_for(&resource)?;
            let total = sums.get(&resource).copied().unwrap_or(0.0);
            let (numerator, denominator) = match standard.kind {
                RatioKind::PerStudent => (total, students),
                RatioKind::StudentsPer => (students, total),
            };
            let ratio = (denominator != 0.0).then(|| round2(numerator / denominator));
            let meets_standard = match (standard.kind, ratio) {
                (RatioKind::PerStudent, Some(ratio)) => ratio >= standard.threshold,
                (RatioKind::StudentsPer, Some(ratio)) => ratio < standard.threshold,
                (_, None) => false,
            };
            Some(ResourceRatio {
                threshold: standard.threshold_label(),
                resource,
                total,
                ratio,
                meets_standard,
            })
        })
        .collect();

    ResourceReport { students, ratios }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub data_element_id: String,
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendSeries {
    pub dates: Vec<NaiveDate>,
    pub lines: Vec<TrendLine>,
}

/// Daily sums of the requested elements for one school, oldest date first.
pub fn trend_series(events: &[EnrichedEvent], org_unit_id: &str, element_ids: &[&str]) -> TrendSeries {
    let mut by_date: BTreeMap<NaiveDate, HashMap<&str, f64>> = BTreeMap::new();
    let mut labels: HashMap<&str, &str> = HashMap::new();

    for event in events.iter().filter(|event| event.org_unit_id == org_unit_id) {
        let Some(occurred) = event.occurred_at_utc else {
            continue;
        };
        for value in &event.values {
            let Some(id) = element_ids
                .iter()
                .copied()
                .find(|id| *id == value.data_element_id)
            else {
                continue;
            };
            labels.entry(id).or_insert_with(|| value.label());
            let Ok(amount) = value.raw_value.trim().parse::<f64>() else {
                continue;
            };
            *by_date
                .entry(occurred.date_naive())
                .or_default()
                .entry(id)
                .or_insert(0.0) += amount;
        }
    }

    let lines = element_ids
        .iter()
        .map(|id| TrendLine {
            data_element_id: id.to_string(),
            label: labels.get(id).copied().unwrap_or(*id).to_string(),
            values: by_date
                .values()
                .map(|sums| sums.get(id).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    TrendSeries {
        dates: by_date.into_keys().collect(),
        lines,
    }
}
