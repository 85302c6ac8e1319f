use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use inspection_core::views::visit_hint;
use inspection_core::{Category, InspectionConfig, PlannerSnapshot, RawDataValue, ReportSnapshot};
use inspection_tracker::{
    planner_snapshot_from_str, report_from_str, ApiConfig, InspectionSubmission, Planner,
    TrackerClient, TrackerIds, VisitRequest,
};
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "inspection",
    about = "Plan and review school facility inspections."
)]
struct Cli {
    /// JSON file overriding the default thresholds and standards.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Categorize schools from saved API responses
    Categorize {
        #[command(flatten)]
        files: ResponseFiles,
    },
    /// Fetch live data and categorize schools
    Fetch,
    /// Schedule an inspection visit
    Schedule {
        /// Org unit id of the school
        school: String,
        /// Visit date (YYYY-MM-DD)
        date: String,
    },
    /// Submit a completed inspection
    Submit {
        /// Org unit id of the school
        school: String,
        /// Inspection date (YYYY-MM-DD)
        date: String,
        /// Data values as DATA_ELEMENT=VALUE
        #[arg(short, long = "value", value_parser = parse_data_value)]
        values: Vec<RawDataValue>,
    },
    /// Print the management report, live or from saved responses
    Report {
        /// Restrict the report to one school
        #[arg(long)]
        school: Option<String>,
        #[command(flatten)]
        files: OptionalResponseFiles,
    },
}

#[derive(clap::Args, Debug)]
struct ResponseFiles {
    /// `tracker/events` response
    #[arg(long)]
    events: PathBuf,
    /// Data element group response
    #[arg(long)]
    elements: PathBuf,
    /// Cluster org unit response
    #[arg(long)]
    org_units: PathBuf,
}

#[derive(clap::Args, Debug)]
struct OptionalResponseFiles {
    #[arg(long, requires_all = ["elements", "org_units"])]
    events: Option<PathBuf>,
    #[arg(long)]
    elements: Option<PathBuf>,
    #[arg(long)]
    org_units: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inspection=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    info!(
        due_days = config.inspection_due_days,
        threshold = config.follow_up_score_threshold,
        "configuration loaded"
    );

    match cli.command {
        Commands::Categorize { files } => {
            let snapshot = planner_snapshot_from_str(
                &read(&files.events)?,
                &read(&files.elements)?,
                &read(&files.org_units)?,
                &config,
            )?;
            print_snapshot(&snapshot, cli.json)?;
        }
        Commands::Fetch => {
            let snapshot = planner(config)?.load_snapshot()?;
            print_snapshot(&snapshot, cli.json)?;
        }
        Commands::Schedule { school, date } => {
            let response = planner(config)?.schedule_visit(VisitRequest {
                org_unit_id: school.clone(),
                date: date.clone(),
            })?;
            info!(%school, %date, "visit request accepted");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("Scheduled a visit to {school} on {date}");
            }
        }
        Commands::Submit {
            school,
            date,
            values,
        } => {
            let response = planner(config)?.submit_inspection(InspectionSubmission {
                org_unit_id: school.clone(),
                occurred_at: date,
                values,
            })?;
            info!(%school, "inspection accepted");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("Submitted inspection for {school}");
            }
        }
        Commands::Report { school, files } => {
            let report = match (files.events, files.elements, files.org_units) {
                (Some(events), Some(elements), Some(org_units)) => report_from_str(
                    &read(&events)?,
                    &read(&elements)?,
                    &read(&org_units)?,
                    school.as_deref(),
                    &config,
                )?,
                _ => planner(config)?.load_report(school.as_deref())?,
            };
            print_report(&report, cli.json)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<InspectionConfig> {
    let config: InspectionConfig = match path {
        Some(path) => serde_json::from_str(&read(path)?)
            .with_context(|| format!("Invalid config file {path:?}"))?,
        None => InspectionConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn planner(config: InspectionConfig) -> anyhow::Result<Planner> {
    let api = ApiConfig::from_env()?;
    let client = TrackerClient::new(api)?;
    Ok(Planner::new(client, TrackerIds::default(), config)?)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))
}

fn parse_data_value(raw: &str) -> Result<RawDataValue, String> {
    let (element, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected DATA_ELEMENT=VALUE, got {raw:?}"))?;
    Ok(RawDataValue {
        data_element_id: element.trim().to_string(),
        raw_value: value.trim().to_string(),
    })
}

fn print_snapshot(snapshot: &PlannerSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!(
        "Generated at: {}\nSchools: {}",
        snapshot.generated_at, snapshot.counts.all_schools
    );
    let now = Utc::now();
    for category in Category::ALL {
        let entries = snapshot.categories.bucket(category);
        println!("\n{} ({})", category.label(), entries.len());
        for entry in entries {
            println!(
                "  {:<32} {:<10} {}",
                entry.org_unit_name(),
                entry.status_label(),
                visit_hint(entry, category, now)
            );
        }
    }
    if !snapshot.upcoming.is_empty() {
        println!("\nUpcoming visits");
        for visit in &snapshot.upcoming {
            println!("  {}  {}", visit.occurred_at, visit.org_unit_name);
        }
    }
    Ok(())
}

fn print_report(report: &ReportSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let scope = report.school.as_deref().unwrap_or("all schools");
    println!("Report for {scope}: {} inspection(s)", report.inspections.len());
    match &report.condition {
        Some(condition) => {
            println!("Condition: {}% ({:?})", condition.percentage, condition.rating);
            for row in &condition.rows {
                println!("  {:<28} {}/{}", row.element, row.score, row.max_score);
            }
        }
        None => println!("Condition: no scores recorded"),
    }
    println!("Students: {}", report.resources.students);
    for ratio in &report.resources.ratios {
        let value = ratio
            .ratio
            .map(|r| format!("{r:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let verdict = if ratio.meets_standard { "ok" } else { "below standard" };
        println!(
            "  {:<12} total {:<8} ratio {:<8} standard {:<5} {}",
            ratio.resource, ratio.total, value, ratio.threshold, verdict
        );
    }
    Ok(())
}
