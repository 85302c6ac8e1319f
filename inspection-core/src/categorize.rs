//! Partitions schools into inspection status buckets.
//!
//! Each school is represented by its most recent event. Events are ordered by
//! parsed `occurred_at`, newest first, before the first-seen-per-org-unit pass;
//! the sort is stable so events sharing a timestamp keep their input order and
//! events without a usable timestamp go last.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::InspectionConfig;
use crate::dates::{cmp_undated_last, days_ago};
use crate::{
    BucketEntry, CategorizedEvents, Category, EnrichedEvent, EventStatus, Location, ValueType,
};

pub fn categorize(
    events: &[EnrichedEvent],
    locations: &[Location],
    config: &InspectionConfig,
) -> CategorizedEvents {
    categorize_at(events, locations, config, Utc::now())
}

pub fn categorize_at(
    events: &[EnrichedEvent],
    locations: &[Location],
    config: &InspectionConfig,
    now: DateTime<Utc>,
) -> CategorizedEvents {
    let mut categories = CategorizedEvents::default();
    let mut classified: HashSet<&str> = HashSet::new();

    for event in order_by_recency(events) {
        if !classified.insert(event.org_unit_id.as_str()) {
            continue;
        }
        let category = classify_event(event, config, now);
        categories
            .bucket_mut(category)
            .push(BucketEntry::Inspected(event.clone()));
    }

    for location in locations {
        if classified.contains(location.id.as_str()) {
            continue;
        }
        debug!(org_unit = %location.id, "location has no events");
        categories
            .soon_need_inspection
            .push(BucketEntry::NoEvents {
                org_unit_id: location.id.clone(),
                org_unit_name: location.name.clone(),
            });
    }

    categories
}

/// Bucket for a single event, ignoring every other event of its school.
pub fn classify_event(
    event: &EnrichedEvent,
    config: &InspectionConfig,
    now: DateTime<Utc>,
) -> Category {
    if event.status == EventStatus::Schedule {
        return Category::Scheduled;
    }
    if needs_follow_up(event, config.follow_up_score_threshold) {
        return Category::NeedFollowUp;
    }
    match event.occurred_at_utc {
        Some(occurred) if days_ago(occurred, now) <= i64::from(config.inspection_due_days) => {
            Category::Good
        }
        Some(_) => Category::SoonNeedInspection,
        None => {
            debug!(event_id = %event.event_id, "no usable timestamp, inspection treated as due");
            Category::SoonNeedInspection
        }
    }
}

/// True when any condition score of the event is below `threshold`.
pub fn needs_follow_up(event: &EnrichedEvent, threshold: u32) -> bool {
    event.values.iter().any(|value| {
        value.value_type == Some(ValueType::IntegerPositive)
            && value
                .raw_value
                .trim()
                .parse::<f64>()
                .map(|score| score < f64::from(threshold))
                .unwrap_or(false)
    })
}

pub fn order_by_recency(events: &[EnrichedEvent]) -> Vec<&EnrichedEvent> {
    let mut ordered: Vec<&EnrichedEvent> = events.iter().collect();
    ordered.sort_by(|a, b| cmp_undated_last(a.occurred_at_utc, b.occurred_at_utc, true));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnrichedDataValue;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 20, 12, 0, 0).unwrap()
    }

    fn event(
        id: &str,
        org_unit: &str,
        status: EventStatus,
        occurred: Option<DateTime<Utc>>,
        scores: &[&str],
    ) -> EnrichedEvent {
        EnrichedEvent {
            event_id: id.into(),
            org_unit_id: org_unit.into(),
            org_unit_name: format!("School {org_unit}"),
            occurred_at: occurred.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
            occurred_at_utc: occurred,
            status,
            values: scores
                .iter()
                .map(|score| EnrichedDataValue {
                    data_element_id: "de-cond".into(),
                    display_name: Some("Condition".into()),
                    value_type: Some(ValueType::IntegerPositive),
                    display_value: score.to_string(),
                    raw_value: score.to_string(),
                })
                .collect(),
        }
    }

    fn location(id: &str) -> Location {
        Location {
            id: id.into(),
            name: format!("School {id}"),
            coordinates: None,
        }
    }

    fn ids(entries: &[BucketEntry]) -> Vec<&str> {
        entries.iter().map(BucketEntry::org_unit_id).collect()
    }

    fn days_before(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    #[test]
    fn end_to_end_scenario() {
        let events = [event("e1", "A", EventStatus::Completed, days_before(20), &["4"])];
        let result = categorize_at(
            &events,
            &[location("A"), location("B")],
            &InspectionConfig::default(),
            now(),
        );

        assert_eq!(ids(&result.soon_need_inspection), ["A", "B"]);
        assert!(result.need_follow_up.is_empty());
        assert!(result.scheduled.is_empty());
        assert!(result.good.is_empty());
        assert!(matches!(
            result.soon_need_inspection[1],
            BucketEntry::NoEvents { .. }
        ));
    }

    #[test]
    fn score_threshold_boundary() {
        let config = InspectionConfig::default();
        let at_threshold = event("e1", "A", EventStatus::Completed, days_before(1), &["3"]);
        let below = event("e2", "A", EventStatus::Completed, days_before(1), &["5", "2"]);

        assert_eq!(classify_event(&at_threshold, &config, now()), Category::Good);
        assert_eq!(classify_event(&below, &config, now()), Category::NeedFollowUp);
    }

    #[test]
    fn elapsed_day_boundary() {
        let config = InspectionConfig::default();
        let fifteen = event("e1", "A", EventStatus::Completed, days_before(15), &[]);
        let sixteen = event("e2", "A", EventStatus::Completed, days_before(16), &[]);

        assert_eq!(classify_event(&fifteen, &config, now()), Category::Good);
        assert_eq!(
            classify_event(&sixteen, &config, now()),
            Category::SoonNeedInspection
        );
    }

    #[test]
    fn schedule_wins_over_low_score() {
        let scheduled = event("e1", "A", EventStatus::Schedule, days_before(-5), &["1"]);
        assert_eq!(
            classify_event(&scheduled, &InspectionConfig::default(), now()),
            Category::Scheduled
        );
    }

    #[test]
    fn only_positive_integer_values_count_as_scores() {
        let mut ev = event("e1", "A", EventStatus::Completed, days_before(1), &["1"]);
        ev.values[0].value_type = Some(ValueType::Number);
        assert!(!needs_follow_up(&ev, 3));

        ev.values[0].value_type = None;
        assert!(!needs_follow_up(&ev, 3));
    }

    #[test]
    fn blank_or_text_scores_do_not_trigger_follow_up() {
        let ev = event("e1", "A", EventStatus::Completed, days_before(1), &["", "n/a"]);
        assert!(!needs_follow_up(&ev, 3));
        let padded = event("e2", "A", EventStatus::Completed, days_before(1), &[" 2 "]);
        assert!(needs_follow_up(&padded, 3));
    }

    #[test]
    fn first_seen_wins_for_equal_timestamps() {
        let when = days_before(2);
        let events = [
            event("first", "A", EventStatus::Completed, when, &["1"]),
            event("second", "A", EventStatus::Completed, when, &["5"]),
        ];
        let result = categorize_at(&events, &[location("A")], &InspectionConfig::default(), now());

        assert_eq!(ids(&result.need_follow_up), ["A"]);
        assert!(result.good.is_empty());
        assert_eq!(
            result.need_follow_up[0].event().map(|e| e.event_id.as_str()),
            Some("first")
        );
    }

    #[test]
    fn most_recent_event_represents_school_regardless_of_input_order() {
        let events = [
            event("old", "A", EventStatus::Completed, days_before(40), &["1"]),
            event("new", "A", EventStatus::Completed, days_before(3), &["4"]),
        ];
        let result = categorize_at(&events, &[location("A")], &InspectionConfig::default(), now());

        assert_eq!(ids(&result.good), ["A"]);
        assert_eq!(result.good[0].event().unwrap().event_id, "new");
    }

    #[test]
    fn upcoming_schedule_represents_school() {
        let events = [
            event("done", "A", EventStatus::Completed, days_before(3), &["4"]),
            event("plan", "A", EventStatus::Schedule, days_before(-7), &[]),
        ];
        let result = categorize_at(&events, &[location("A")], &InspectionConfig::default(), now());
        assert_eq!(ids(&result.scheduled), ["A"]);
    }

    #[test]
    fn unparsable_timestamp_is_due_for_inspection() {
        let events = [
            event("bad", "A", EventStatus::Completed, None, &["4"]),
            event("good", "B", EventStatus::Completed, days_before(1), &["4"]),
        ];
        let result = categorize_at(
            &events,
            &[location("A"), location("B")],
            &InspectionConfig::default(),
            now(),
        );
        assert_eq!(ids(&result.soon_need_inspection), ["A"]);
        assert_eq!(ids(&result.good), ["B"]);
    }

    #[test]
    fn undated_events_sort_after_dated_ones() {
        let events = [
            event("undated", "A", EventStatus::Completed, None, &["1"]),
            event("dated", "A", EventStatus::Completed, days_before(1), &["4"]),
        ];
        let ordered: Vec<_> = order_by_recency(&events)
            .into_iter()
            .map(|e| e.event_id.as_str())
            .collect();
        assert_eq!(ordered, ["dated", "undated"]);
    }

    #[test]
    fn buckets_are_disjoint_and_cover_every_location() {
        let locations: Vec<Location> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|id| location(id))
            .collect();
        let events = [
            event("1", "A", EventStatus::Completed, days_before(2), &["1"]),
            event("2", "B", EventStatus::Schedule, days_before(-2), &[]),
            event("3", "C", EventStatus::Active, days_before(30), &["4"]),
            event("4", "D", EventStatus::Completed, days_before(5), &["5"]),
            event("5", "A", EventStatus::Schedule, days_before(10), &[]),
            event("6", "D", EventStatus::Completed, None, &[]),
        ];
        let result = categorize_at(&events, &locations, &InspectionConfig::default(), now());

        let mut seen = BTreeSet::new();
        for category in Category::ALL {
            for entry in result.bucket(category) {
                assert!(
                    seen.insert(entry.org_unit_id().to_string()),
                    "{} appears in more than one bucket",
                    entry.org_unit_id()
                );
            }
        }
        let expected: BTreeSet<String> = locations.iter().map(|l| l.id.clone()).collect();
        assert_eq!(seen, expected);
        assert_eq!(result.len(), locations.len());

        assert_eq!(result.category_of("A"), Some(Category::NeedFollowUp));
        assert_eq!(result.category_of("B"), Some(Category::Scheduled));
        assert_eq!(result.category_of("C"), Some(Category::SoonNeedInspection));
        assert_eq!(result.category_of("D"), Some(Category::Good));
        assert_eq!(result.category_of("E"), Some(Category::SoonNeedInspection));
        assert_eq!(result.category_of("Z"), None);
    }

    #[test]
    fn custom_thresholds_apply() {
        let config = InspectionConfig {
            follow_up_score_threshold: 4,
            inspection_due_days: 30,
            ..InspectionConfig::default()
        };
        let ev = event("e1", "A", EventStatus::Completed, days_before(20), &["3"]);
        assert_eq!(classify_event(&ev, &config, now()), Category::NeedFollowUp);

        let ev = event("e2", "A", EventStatus::Completed, days_before(20), &["4"]);
        assert_eq!(classify_event(&ev, &config, now()), Category::Good);
    }
}
