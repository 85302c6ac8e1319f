//! Fetch cycles wiring the platform queries into the core pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use inspection_core::{
    DataElement, Generation, InspectionConfig, Location, PlannerSnapshot, RawEvent, ReportSnapshot,
    RequestGenerations,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::TrackerClient;
use crate::error::{TrackerError, TrackerResult};
use crate::parse::{parse_data_elements, parse_events, parse_org_units, parse_program_stage, StageElement};
use crate::payload::{InspectionSubmission, VisitRequest};
use crate::queries::{self, TrackerIds};

/// Loads dashboard and report data and sends inspection mutations.
pub struct Planner {
    client: TrackerClient,
    ids: TrackerIds,
    config: InspectionConfig,
    snapshot_generations: Arc<RequestGenerations>,
    report_generations: Arc<RequestGenerations>,
}

impl Planner {
    pub fn new(client: TrackerClient, ids: TrackerIds, config: InspectionConfig) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            ids,
            config,
            snapshot_generations: Arc::new(RequestGenerations::new()),
            report_generations: Arc::new(RequestGenerations::new()),
        })
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    pub fn ids(&self) -> &TrackerIds {
        &self.ids
    }

    /// Token source for planner loads; a newer planner load makes older ones stale.
    pub fn snapshot_generations(&self) -> Arc<RequestGenerations> {
        Arc::clone(&self.snapshot_generations)
    }

    /// Token source for report loads, independent of the planner's.
    pub fn report_generations(&self) -> Arc<RequestGenerations> {
        Arc::clone(&self.report_generations)
    }

    pub fn load_snapshot(&self) -> TrackerResult<PlannerSnapshot> {
        let generation = self.snapshot_generations.begin();
        self.load_snapshot_for(generation)
    }

    /// Fetches events, metadata and schools, then categorizes them. The result is
    /// discarded with `TrackerError::Stale` if `generation` was superseded meanwhile.
    pub fn load_snapshot_for(&self, generation: Generation) -> TrackerResult<PlannerSnapshot> {
        info!(%generation, "loading planner snapshot");
        let events = self.fetch_events(None)?;
        let elements = self.fetch_data_elements(queries::data_elements(&self.ids))?;
        let locations = self.fetch_locations()?;
        ensure_current(&self.snapshot_generations, generation)?;

        let snapshot = PlannerSnapshot::build(events, &elements, locations, &self.config);
        info!(
            %generation,
            schools = snapshot.counts.all_schools,
            need_follow_up = snapshot.counts.need_follow_up,
            "planner snapshot ready"
        );
        Ok(snapshot)
    }

    pub fn load_report(&self, school: Option<&str>) -> TrackerResult<ReportSnapshot> {
        let generation = self.report_generations.begin();
        self.load_report_for(school, generation)
    }

    /// Report over completed inspections, for one school or the whole cluster.
    pub fn load_report_for(
        &self,
        school: Option<&str>,
        generation: Generation,
    ) -> TrackerResult<ReportSnapshot> {
        info!(%generation, school = school.unwrap_or("all"), "loading report");
        let events = self.fetch_events(Some("COMPLETED"))?;
        let elements = self.fetch_data_elements(queries::report_data_elements(&self.ids))?;
        let schools = self.fetch_locations()?;
        ensure_current(&self.report_generations, generation)?;

        Ok(ReportSnapshot::build(events, &elements, schools, school, &self.config))
    }

    pub fn schedule_visit(&self, request: VisitRequest) -> TrackerResult<Value> {
        let org_unit = request.org_unit_id.clone();
        let payload = request.into_payload(&self.ids)?;
        let response = self.client.create_events(std::slice::from_ref(&payload))?;
        info!(%org_unit, date = %payload.occurred_at, "visit scheduled");
        Ok(response)
    }

    pub fn submit_inspection(&self, submission: InspectionSubmission) -> TrackerResult<Value> {
        let stage_elements: HashSet<String> = self
            .fetch_program_stage()?
            .into_iter()
            .map(|entry| entry.element.id)
            .collect();
        let org_unit = submission.org_unit_id.clone();
        let payload = submission.into_payload(&self.ids, &stage_elements)?;
        let response = self.client.create_events(std::slice::from_ref(&payload))?;
        info!(%org_unit, values = payload.data_values.len(), "inspection submitted");
        Ok(response)
    }

    /// Form layout of the inspection program stage, in sort order.
    pub fn fetch_program_stage(&self) -> TrackerResult<Vec<StageElement>> {
        let body = self.client.query(&queries::program_stage(&self.ids))?;
        Ok(parse_program_stage(&body)?)
    }

    fn fetch_events(&self, status: Option<&str>) -> TrackerResult<Vec<RawEvent>> {
        let body = self.client.query(&queries::events(&self.ids, status))?;
        Ok(parse_events(&body)?)
    }

    fn fetch_data_elements(&self, query: queries::Query) -> TrackerResult<Vec<DataElement>> {
        let body = self.client.query(&query)?;
        Ok(parse_data_elements(&body)?)
    }

    fn fetch_locations(&self) -> TrackerResult<Vec<Location>> {
        let body = self.client.query(&queries::cluster(&self.ids))?;
        Ok(parse_org_units(&body)?)
    }
}

fn ensure_current(generations: &RequestGenerations, generation: Generation) -> TrackerResult<()> {
    if generations.is_current(generation) {
        return Ok(());
    }
    warn!(%generation, latest = ?generations.latest(), "discarding stale response");
    Err(TrackerError::Stale { generation })
}
