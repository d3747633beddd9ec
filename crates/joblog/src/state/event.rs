use serde::Serialize;

use crate::client::JobStatus;
use crate::job::JobId;

/// Signals for the rest of the application, sent on a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobLogEvent {
    /// A refreshed job finished; branch and pipeline views should reload.
    JobNoLongerLive { job_id: JobId, status: JobStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json() {
        let event = JobLogEvent::JobNoLongerLive { job_id: 9, status: JobStatus::Canceled };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"job_no_longer_live","job_id":9,"status":"canceled"}"#
        );
    }
}
