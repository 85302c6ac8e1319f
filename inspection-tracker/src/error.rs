use inspection_core::{Generation, InspectionError};

/// Failures talking to the tracker platform. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("query {resource} failed: {message}")]
    Query { resource: String, message: String },
    #[error("mutation failed: {message}")]
    Mutation { message: String },
    #[error("response for request {generation} was superseded by a newer request")]
    Stale { generation: Generation },
    #[error("could not parse response: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Inspection(#[from] InspectionError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
