use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{ProbeStatus, Target};

/// Outcome of one target within a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub target_id: Uuid,
    pub name: String,
    /// False when the schedule said the target was not due.
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProbeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl ProbeOutcome {
    fn base(target: &Target, executed: bool) -> Self {
        Self {
            target_id: target.id,
            name: target.name.clone(),
            executed,
            status: None,
            status_code: None,
            duration_ms: None,
            error: None,
            skip_reason: None,
        }
    }

    /// The target was not due; nothing was attempted.
    pub fn skipped(target: &Target, reason: impl Into<String>) -> Self {
        let mut outcome = Self::base(target, false);
        outcome.skip_reason = Some(reason.into());
        outcome
    }

    /// An HTTP response came back (any status code).
    pub fn completed(target: &Target, status: ProbeStatus, status_code: u16, duration_ms: u64) -> Self {
        let mut outcome = Self::base(target, true);
        outcome.status = Some(status);
        outcome.status_code = Some(status_code);
        outcome.duration_ms = Some(duration_ms);
        outcome
    }

    /// The attempt failed before a response was obtained (unparseable curl
    /// text or a transport error). No status code in this case.
    pub fn failed(target: &Target, error: String) -> Self {
        let mut outcome = Self::base(target, true);
        outcome.status = Some(ProbeStatus::Error);
        outcome.error = Some(error);
        outcome
    }
}

/// Summary of one sweep. Always produced, even when every target failed;
/// per-target degradation lives in `outcomes`.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub total: usize,
    pub executed: usize,
    pub skipped: usize,
    pub outcomes: Vec<ProbeOutcome>,
}

impl SweepReport {
    pub fn from_outcomes(outcomes: Vec<ProbeOutcome>) -> Self {
        let executed = outcomes.iter().filter(|o| o.executed).count();
        Self {
            total: outcomes.len(),
            executed,
            skipped: outcomes.len() - executed,
            outcomes,
        }
    }
}
