//! Run results.
//!
//! `Engine::execute` never surfaces per-phase failures as errors; it returns
//! a [`RunSummary`] and callers inspect phase statuses directly.

use crate::graph::PhaseStatus;
use crate::pipeline::PhaseKind;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Terminal record of one phase node for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Pipeline name in display case.
    pub pipeline: String,
    pub phase: PhaseKind,
    pub status: PhaseStatus,
    /// Error description when the phase failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time spent running the module chain; zero for phases that never ran.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl PhaseReport {
    pub(crate) fn new(pipeline: &str, phase: PhaseKind, status: PhaseStatus) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            phase,
            status,
            error: None,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Token minted for this run, for log correlation.
    pub execution_id: Uuid,
    /// Wall-clock duration of the whole run.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// One report per phase node, in scheduler order.
    pub phases: Vec<PhaseReport>,
}

impl RunSummary {
    pub(crate) fn empty(execution_id: Uuid) -> Self {
        Self {
            execution_id,
            duration: Duration::ZERO,
            phases: Vec::new(),
        }
    }

    /// Status of one phase node, matched case-insensitively by pipeline name.
    pub fn status(&self, pipeline: &str, phase: PhaseKind) -> Option<PhaseStatus> {
        self.phases
            .iter()
            .find(|report| {
                report.phase == phase && report.pipeline.eq_ignore_ascii_case(pipeline)
            })
            .map(|report| report.status)
    }

    pub fn all_succeeded(&self) -> bool {
        self.phases.iter().all(|report| report.status.is_success())
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(PhaseStatus::Succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(PhaseStatus::Failed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(PhaseStatus::Skipped)
    }

    fn count(&self, status: PhaseStatus) -> usize {
        self.phases
            .iter()
            .filter(|report| report.status == status)
            .count()
    }
}

/// Tracks execution timing.
pub(crate) struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Serde helpers for Duration serialization as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(phases: Vec<PhaseReport>) -> RunSummary {
        RunSummary {
            execution_id: Uuid::new_v4(),
            duration: Duration::from_millis(5),
            phases,
        }
    }

    #[test]
    fn status_lookup_is_case_insensitive() {
        let summary = summary_with(vec![PhaseReport::new(
            "Posts",
            PhaseKind::Process,
            PhaseStatus::Succeeded,
        )]);

        assert_eq!(
            summary.status("posts", PhaseKind::Process),
            Some(PhaseStatus::Succeeded)
        );
        assert_eq!(summary.status("posts", PhaseKind::Output), None);
    }

    #[test]
    fn counts_partition_by_status() {
        let summary = summary_with(vec![
            PhaseReport::new("a", PhaseKind::Input, PhaseStatus::Succeeded),
            PhaseReport::new("a", PhaseKind::Process, PhaseStatus::Failed)
                .with_error("module failed"),
            PhaseReport::new("a", PhaseKind::Transform, PhaseStatus::Skipped),
            PhaseReport::new("a", PhaseKind::Output, PhaseStatus::Skipped),
        ]);

        assert_eq!(summary.succeeded_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.skipped_count(), 2);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn summary_serializes_durations_as_millis() {
        let summary = summary_with(vec![PhaseReport::new(
            "a",
            PhaseKind::Input,
            PhaseStatus::Succeeded,
        )
        .with_duration(Duration::from_millis(250))]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["duration"], 5);
        assert_eq!(json["phases"][0]["duration"], 250);
        assert_eq!(json["phases"][0]["status"], "succeeded");

        let parsed: RunSummary = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.phases[0].duration, Duration::from_millis(250));
    }
}
