//! Segmentation job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Segmentation job record
///
/// Structure shared between server (persists) and worker (completes).
///
/// The externally visible lifecycle is derived from `output_ref` alone:
/// a job reports 100% progress if and only if an output payload exists.
/// The `status` column is internal bookkeeping so operators can tell a
/// failed job apart from one that is still queued or running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationJob {
    pub id: Uuid,
    pub model_id: String,
    pub status: JobStatus,
    /// Blob store path of the raw `ModelInput` payload. Written before the
    /// record is inserted; never empty afterwards.
    pub input_ref: String,
    /// Blob store path of the serialized `ModelOutput`. Set exactly once,
    /// by the worker, on success. Mutually exclusive with `error`.
    pub output_ref: Option<String>,
    /// Short diagnostic recorded by the worker on failure.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SegmentationJob {
    /// Derived progress as reported on the wire: 100 when the output payload
    /// exists, 0 otherwise. Queued, running and failed jobs are
    /// indistinguishable to callers (legacy wire behavior).
    pub fn progress(&self) -> i32 {
        if self.output_ref.is_some() { 100 } else { 0 }
    }
}

/// Job execution status (internal; never exposed on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> JobStatus {
        match s {
            "Running" => JobStatus::Running,
            "Succeeded" => JobStatus::Succeeded,
            "Failed" => JobStatus::Failed,
            _ => JobStatus::Queued,
        }
    }
}

/// Terminal result of one dispatcher run.
///
/// The worker produces exactly one of these per claimed job, so a record can
/// never end up with both an output reference and an error.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded { output_ref: String },
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> SegmentationJob {
        SegmentationJob {
            id: Uuid::new_v4(),
            model_id: "phantom-box-v1".to_string(),
            status: JobStatus::Queued,
            input_ref: "segmentation/Segmentation_x.bin".to_string(),
            output_ref: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_progress_is_binary() {
        let mut j = job();
        assert_eq!(j.progress(), 0);

        j.status = JobStatus::Running;
        assert_eq!(j.progress(), 0);

        // A failed job still reports 0, not a distinct state.
        j.status = JobStatus::Failed;
        j.error = Some("decode failed".to_string());
        assert_eq!(j.progress(), 0);

        j.status = JobStatus::Succeeded;
        j.error = None;
        j.output_ref = Some("results/Result_x.bin".to_string());
        assert_eq!(j.progress(), 100);
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(s.as_str()), s);
        }
        assert_eq!(JobStatus::parse("garbage"), JobStatus::Queued);
    }
}
