//! Derived lists and counters consumed by the planner and dashboard views.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categorize::order_by_recency;
use crate::dates::{cmp_undated_last, days_ago};
use crate::{BucketEntry, CategorizedEvents, Category, EnrichedEvent, EventStatus, Location, RawEvent};

/// Drops events whose org unit is not one of `locations`.
pub fn restrict_to_locations(events: Vec<RawEvent>, locations: &[Location]) -> Vec<RawEvent> {
    let known: HashSet<&str> = locations.iter().map(|l| l.id.as_str()).collect();
    events
        .into_iter()
        .filter(|event| known.contains(event.org_unit_id.as_str()))
        .collect()
}

/// Schools whose latest event is a scheduled visit, soonest visit first.
pub fn upcoming_visits(events: &[EnrichedEvent]) -> Vec<&EnrichedEvent> {
    let mut seen = HashSet::new();
    let mut visits: Vec<&EnrichedEvent> = order_by_recency(events)
        .into_iter()
        .filter(|event| seen.insert(event.org_unit_id.as_str()))
        .filter(|event| event.status == EventStatus::Schedule)
        .collect();
    visits.sort_by(|a, b| cmp_undated_last(a.occurred_at_utc, b.occurred_at_utc, false));
    visits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Recorded (non-scheduled) inspections, most recent first.
pub fn recent_inspections(events: &[EnrichedEvent], filter: StatusFilter) -> Vec<&EnrichedEvent> {
    order_by_recency(events)
        .into_iter()
        .filter(|event| event.status != EventStatus::Schedule)
        .filter(|event| match filter {
            StatusFilter::All => true,
            StatusFilter::Active => event.status == EventStatus::Active,
            StatusFilter::Completed => event.status == EventStatus::Completed,
        })
        .collect()
}

/// Legend counters for the map filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub all_schools: usize,
    pub need_follow_up: usize,
    pub soon_need_inspection: usize,
    pub scheduled: usize,
    pub good: usize,
}

impl CategoryCounts {
    pub fn from_categorized(categories: &CategorizedEvents, location_count: usize) -> Self {
        Self {
            all_schools: location_count,
            need_follow_up: categories.need_follow_up.len(),
            soon_need_inspection: categories.soon_need_inspection.len(),
            scheduled: categories.scheduled.len(),
            good: categories.good.len(),
        }
    }

    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::NeedFollowUp => self.need_follow_up,
            Category::SoonNeedInspection => self.soon_need_inspection,
            Category::Scheduled => self.scheduled,
            Category::Good => self.good,
        }
    }
}

/// Short sentence describing when a school was or will be visited.
pub fn visit_hint(entry: &BucketEntry, category: Category, now: DateTime<Utc>) -> String {
    let Some(occurred) = entry.event().and_then(|event| event.occurred_at_utc) else {
        return "No inspections recorded".to_string();
    };
    let days = days_ago(occurred, now);
    if category == Category::Scheduled {
        format!("Scheduled in {} days", -days)
    } else {
        format!("Last inspected {days} days ago")
    }
}
