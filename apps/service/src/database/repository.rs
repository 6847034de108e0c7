use anyhow::{Result, anyhow};
use async_trait::async_trait;
use libsql::{Row, params};
use uuid::Uuid;

use super::models::{HeaderPair, ProbeRecord, ProbeStatus, Target, TargetMode};
use crate::pool::{LibsqlManager, LibsqlPool};
use crate::schedule::Schedule;

/// The ordered collection of targets.
///
/// All mutation is identity-addressed: callers never write by position, so a
/// concurrent delete can shrink the collection without corrupting an
/// in-flight write-back for another target.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// All targets in insertion order.
    async fn list(&self) -> Result<Vec<Target>>;

    /// Append a new target to the end of the collection.
    async fn append(&self, target: &Target) -> Result<()>;

    /// Look up a single target by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Target>>;

    /// Replace the target with the given id. A missing id is a silent no-op:
    /// the target was deleted concurrently and must not be resurrected.
    async fn replace_by_id(&self, id: Uuid, target: &Target) -> Result<()>;

    /// Persist a probe attempt's status fields for the given id, leaving the
    /// target's definition untouched so an edit racing an in-flight probe is
    /// never clobbered. A missing id is a no-op.
    async fn record_probe(&self, id: Uuid, record: &ProbeRecord) -> Result<()>;

    /// Delete by id. Deleting an absent id is a no-op.
    async fn delete_by_id(&self, id: Uuid) -> Result<()>;
}

/// LibSQL-backed store implementation
pub struct LibsqlTargetStore {
    pool: LibsqlPool,
}

impl LibsqlTargetStore {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

const TARGET_COLUMNS: &str = "uuid, name, mode, url, headers, curl_command, schedule, \
     last_run_at, last_status, last_status_code, last_duration_ms, created_at";

fn row_to_target(row: &Row) -> Result<Target> {
    let uuid_str: String = row.get(0)?;
    let mode_str: String = row.get(2)?;
    let headers_json: String = row.get(4)?;
    let schedule_str: String = row.get(6)?;
    let status_str: String = row.get(8)?;

    let mode = TargetMode::parse(&mode_str)
        .ok_or_else(|| anyhow!("unknown target mode '{mode_str}'"))?;
    let last_status = ProbeStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("unknown probe status '{status_str}'"))?;
    let headers: Vec<HeaderPair> = serde_json::from_str(&headers_json)?;

    Ok(Target {
        id: Uuid::parse_str(&uuid_str)?,
        name: row.get(1)?,
        mode,
        url: row.get(3)?,
        headers,
        curl_command: row.get(5)?,
        schedule: Schedule::parse(&schedule_str),
        last_run_at: row.get::<Option<i64>>(7)?.map(Target::i64_to_timestamp),
        last_status,
        last_status_code: row.get::<Option<i64>>(9)?.map(|v| v as u16),
        last_duration_ms: row.get::<Option<i64>>(10)?.map(|v| v as u64),
        created_at: Target::i64_to_timestamp(row.get(11)?),
    })
}

#[async_trait]
impl TargetStore for LibsqlTargetStore {
    async fn list(&self) -> Result<Vec<Target>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY id ASC"))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut targets = Vec::new();

        while let Some(row) = rows.next().await? {
            targets.push(row_to_target(&row)?);
        }

        Ok(targets)
    }

    async fn append(&self, target: &Target) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO targets (uuid, name, mode, url, headers, curl_command, schedule, \
             last_run_at, last_status, last_status_code, last_duration_ms, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                target.id.to_string(),
                target.name.clone(),
                target.mode.as_str(),
                target.url.clone(),
                serde_json::to_string(&target.headers)?,
                target.curl_command.clone(),
                target.schedule.as_str(),
                target.last_run_at.map(Target::timestamp_to_i64),
                target.last_status.as_str(),
                target.last_status_code.map(|v| v as i64),
                target.last_duration_ms.map(|v| v as i64),
                Target::timestamp_to_i64(target.created_at),
            ],
        )
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Target>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE uuid = ?"))
            .await?;

        let mut rows = stmt.query(params![id.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row_to_target(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn replace_by_id(&self, id: Uuid, target: &Target) -> Result<()> {
        let conn = self.get_conn().await?;

        // Single identity-keyed UPDATE: atomic per row, affects zero rows when
        // the target is already gone. `mode` is immutable and never rewritten.
        conn.execute(
            "UPDATE targets SET name = ?, url = ?, headers = ?, curl_command = ?, \
             schedule = ?, last_run_at = ?, last_status = ?, last_status_code = ?, \
             last_duration_ms = ? WHERE uuid = ?",
            params![
                target.name.clone(),
                target.url.clone(),
                serde_json::to_string(&target.headers)?,
                target.curl_command.clone(),
                target.schedule.as_str(),
                target.last_run_at.map(Target::timestamp_to_i64),
                target.last_status.as_str(),
                target.last_status_code.map(|v| v as i64),
                target.last_duration_ms.map(|v| v as i64),
                id.to_string(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn record_probe(&self, id: Uuid, record: &ProbeRecord) -> Result<()> {
        let conn = self.get_conn().await?;

        // Touches only the status columns; definition fields stay whatever
        // the latest external edit made them.
        conn.execute(
            "UPDATE targets SET last_run_at = ?, last_status = ?, last_status_code = ?, \
             last_duration_ms = ? WHERE uuid = ?",
            params![
                Target::timestamp_to_i64(record.last_run_at),
                record.last_status.as_str(),
                record.last_status_code.map(|v| v as i64),
                record.last_duration_ms.map(|v| v as i64),
                id.to_string(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute("DELETE FROM targets WHERE uuid = ?", params![id.to_string()])
            .await?;
        Ok(())
    }
}
