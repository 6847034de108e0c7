use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Fixed cadence classes a target can be probed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Hourly,
    Every6Hours,
    Daily,
    Weekly,
}

impl Schedule {
    /// Parse a schedule label. Anything unrecognized deliberately behaves
    /// like `daily` rather than failing.
    pub fn parse(value: &str) -> Self {
        match value {
            "hourly" => Self::Hourly,
            "every6hours" => Self::Every6Hours,
            "weekly" => Self::Weekly,
            "daily" => Self::Daily,
            _ => Self::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Every6Hours => "every6hours",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Minimum elapsed time before a target is due again. Shaded below the
    /// nominal period so trigger jitter cannot push a run into the next
    /// window.
    pub fn threshold(&self) -> Duration {
        let seconds = match self {
            Self::Hourly => 55 * MINUTE,
            Self::Every6Hours => 6 * HOUR - 5 * MINUTE,
            Self::Daily => DAY - 5 * MINUTE,
            Self::Weekly => 7 * DAY - HOUR,
        };
        Duration::from_secs(seconds)
    }

    /// Unshaded period, used only for the advisory next-run projection.
    pub fn nominal_period(&self) -> Duration {
        let seconds = match self {
            Self::Hourly => HOUR,
            Self::Every6Hours => 6 * HOUR,
            Self::Daily => DAY,
            Self::Weekly => 7 * DAY,
        };
        Duration::from_secs(seconds)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a target should be probed now. Never-run targets are always due.
pub fn is_due(schedule: Schedule, last_run: Option<SystemTime>, now: SystemTime) -> bool {
    let Some(last_run) = last_run else {
        return true;
    };
    let elapsed = now.duration_since(last_run).unwrap_or_default();
    elapsed >= schedule.threshold()
}

/// Projected next run, for display only. Execution is always gated by
/// [`is_due`] against the current time, so a missed sweep does not skew the
/// schedule.
pub fn next_run_time(schedule: Schedule, last_run: Option<SystemTime>, now: SystemTime) -> SystemTime {
    match last_run {
        Some(last_run) => last_run + schedule.nominal_period(),
        None => now,
    }
}
