use thiserror::Error;

use crate::job::JobId;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Job not found: {0}")]
    NotFound(JobId),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
