//! Blocking HTTP client for the tracker platform API.

use std::env;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{TrackerError, TrackerResult};
use crate::payload::{EventBatch, TrackerEventPayload};
use crate::queries::Query;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the platform lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Reads `TRACKER_BASE_URL`, `TRACKER_USERNAME`, `TRACKER_PASSWORD` and `TRACKER_TIMEOUT_SECS`.
    pub fn from_env() -> TrackerResult<Self> {
        let base_url = env::var("TRACKER_BASE_URL")
            .map_err(|_| TrackerError::Config("TRACKER_BASE_URL is not set".into()))?;
        let mut config = Self::new(base_url);
        config.username = env::var("TRACKER_USERNAME").ok();
        config.password = env::var("TRACKER_PASSWORD").ok();
        if let Ok(raw) = env::var("TRACKER_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| TrackerError::Config(format!("TRACKER_TIMEOUT_SECS={raw:?} is not a number")))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

pub struct TrackerClient {
    config: ApiConfig,
    client: Client,
}

impl TrackerClient {
    pub fn new(config: ApiConfig) -> TrackerResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(TrackerError::Config("base url is empty".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url_for(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_deref()),
            None => request,
        }
    }

    /// Runs one read query and returns the JSON body.
    pub fn query(&self, query: &Query) -> TrackerResult<Value> {
        let url = self.url_for(&query.resource);
        let started = Instant::now();
        debug!(resource = %query.resource, "query started");

        let query_error = |message: String| TrackerError::Query {
            resource: query.resource.clone(),
            message,
        };
        let response = self
            .authorize(self.client.get(&url).query(&query.params))
            .send()
            .map_err(|e| query_error(e.to_string()))?;
        let response = check_status(response).map_err(query_error)?;
        let body: Value = response.json().map_err(|e| TrackerError::Parse(e.to_string()))?;

        debug!(
            resource = %query.resource,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query finished"
        );
        Ok(body)
    }

    /// Posts `{"events": [..]}` to the `tracker` resource.
    pub fn create_events(&self, events: &[TrackerEventPayload]) -> TrackerResult<Value> {
        let url = self.url_for("tracker");
        let mutation_error = |message: String| TrackerError::Mutation { message };

        let response = self
            .authorize(
                self.client
                    .post(&url)
                    .query(&[("async", "false")])
                    .json(&EventBatch { events }),
            )
            .send()
            .map_err(|e| mutation_error(e.to_string()))?;
        let response = check_status(response).map_err(mutation_error)?;
        let body: Value = response.json().map_err(|e| TrackerError::Parse(e.to_string()))?;

        if body.get("status").and_then(Value::as_str) == Some("ERROR") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("import rejected")
                .to_string();
            warn!(%message, "tracker rejected events");
            return Err(mutation_error(message));
        }
        info!(count = events.len(), "tracker events created");
        Ok(body)
    }
}

fn check_status(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(format!("HTTP {status}: {}", body.trim()))
}
