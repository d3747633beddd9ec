//! Locator for a job log document: `gl-job-log:Job <id>?<json>`.
//!
//! The path part is for display only. The JSON query carries the exact
//! `(repository_root, job)` pair, so any root string survives the trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::JobId;

pub const JOB_LOG_URI_SCHEME: &str = "gl-job-log";

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Not a gl-job-log locator: {0}")]
    WrongScheme(String),
    #[error("Job log locator has no query: {0}")]
    MissingQuery(String),
    #[error("Invalid job log locator query: {0}")]
    InvalidQuery(#[from] serde_json::Error),
}

/// Keys serialize in sorted order: `job`, `repositoryRoot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLogUri {
    pub job: JobId,
    pub repository_root: String,
}

impl JobLogUri {
    pub fn new(repository_root: impl Into<String>, job: JobId) -> Self {
        Self {
            job,
            repository_root: repository_root.into(),
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of a u64 and a String cannot fail.
        let query = serde_json::to_string(self).unwrap_or_default();
        format!("{JOB_LOG_URI_SCHEME}:Job {}?{query}", self.job)
    }

    pub fn decode(locator: &str) -> Result<Self, LocatorError> {
        let rest = locator
            .strip_prefix(JOB_LOG_URI_SCHEME)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| LocatorError::WrongScheme(locator.to_string()))?;
        let (_, query) = rest
            .split_once('?')
            .ok_or_else(|| LocatorError::MissingQuery(locator.to_string()))?;
        Ok(serde_json::from_str(query)?)
    }
}

impl fmt::Display for JobLogUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for JobLogUri {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode() {
        let uri = JobLogUri::new("/home/me/project", 42);
        assert_eq!(
            uri.encode(),
            r#"gl-job-log:Job 42?{"job":42,"repositoryRoot":"/home/me/project"}"#
        );
    }

    #[test]
    fn test_decode() {
        let locator = r#"gl-job-log:Job 5?{"job":5,"repositoryRoot":"C:\\src"}"#;
        let uri = JobLogUri::decode(locator).unwrap();
        assert_eq!(uri, JobLogUri::new("C:\\src", 5));
    }

    #[test]
    fn test_root_with_question_mark() {
        let uri = JobLogUri::new("/tmp/what?now", 1);
        assert_eq!(JobLogUri::decode(&uri.encode()).unwrap(), uri);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            JobLogUri::decode("file:///tmp/x"),
            Err(LocatorError::WrongScheme(_))
        ));
        assert!(matches!(
            JobLogUri::decode("gl-job-log:Job 1"),
            Err(LocatorError::MissingQuery(_))
        ));
        assert!(matches!(
            JobLogUri::decode("gl-job-log:Job 1?{\"job\":-1}"),
            Err(LocatorError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_parse_via_from_str() {
        let uri: JobLogUri = r#"gl-job-log:Job 3?{"job":3,"repositoryRoot":""}"#.parse().unwrap();
        assert_eq!(uri.to_string(), uri.encode());
    }

    proptest! {
        #[test]
        fn locator_round_trips(root in any::<String>(), job in any::<u64>()) {
            let uri = JobLogUri::new(root, job);
            prop_assert_eq!(JobLogUri::decode(&uri.encode()).unwrap(), uri);
        }
    }
}
