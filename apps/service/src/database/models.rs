use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::Schedule;

/// How a target's outgoing request is constructed. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    Url,
    Curl,
}

impl TargetMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "url" => Some(Self::Url),
            "curl" => Some(Self::Curl),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Curl => "curl",
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest probe state of a target. `Pending` only exists before the first
/// completed attempt and never reappears afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Pending,
    Ok,
    Error,
}

impl ProbeStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "ok" => Some(Self::Ok),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One header entry on a url-mode target. Duplicate keys are allowed here;
/// later entries win when the list is merged into a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub key: String,
    pub value: String,
}

/// Target model - a monitored endpoint or curl-defined request.
///
/// Exactly one of the `(url, headers)` / `curl_command` branches is
/// meaningful, selected by `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    pub name: String,
    pub mode: TargetMode,
    pub url: Option<String>,
    pub headers: Vec<HeaderPair>,
    pub curl_command: Option<String>,
    pub schedule: Schedule,
    pub last_run_at: Option<SystemTime>,
    pub last_status: ProbeStatus,
    pub last_status_code: Option<u16>,
    pub last_duration_ms: Option<u64>,
    pub created_at: SystemTime,
}

/// Status fields written back after a probe attempt. Kept separate from
/// [`Target`] so persisting a result cannot overwrite the target's
/// definition (name, url, headers, curl command, schedule) with a stale
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRecord {
    pub last_run_at: SystemTime,
    pub last_status: ProbeStatus,
    pub last_status_code: Option<u16>,
    pub last_duration_ms: Option<u64>,
}

impl Target {
    /// Create a url-mode target, never run, pending.
    pub fn new_url(name: String, url: String, headers: Vec<HeaderPair>, schedule: Schedule) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            mode: TargetMode::Url,
            url: Some(url),
            headers,
            curl_command: None,
            schedule,
            last_run_at: None,
            last_status: ProbeStatus::Pending,
            last_status_code: None,
            last_duration_ms: None,
            created_at: SystemTime::now(),
        }
    }

    /// Create a curl-mode target, never run, pending.
    pub fn new_curl(name: String, curl_command: String, schedule: Schedule) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            mode: TargetMode::Curl,
            url: None,
            headers: Vec::new(),
            curl_command: Some(curl_command),
            schedule,
            last_run_at: None,
            last_status: ProbeStatus::Pending,
            last_status_code: None,
            last_duration_ms: None,
            created_at: SystemTime::now(),
        }
    }

    /// Convert SystemTime to Unix timestamp
    pub fn timestamp_to_i64(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// Convert Unix timestamp to SystemTime
    pub fn i64_to_timestamp(timestamp: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64)
    }
}
