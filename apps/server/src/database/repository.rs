use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;

use super::models::{MonitorRow, MonitorStatusRow};
use crate::models::Workspace;
use crate::pool::LibsqlPool;

/// Database trait for abstracting storage operations
#[async_trait]
pub trait Database: Send + Sync {
    /// Look a workspace up by its api key
    async fn workspace_by_api_key(&self, api_key: &str) -> Result<Option<Workspace>>;

    /// Fetch one monitor owned by a workspace, excluding soft-deleted rows
    async fn monitor_for_workspace(
        &self,
        monitor_id: i64,
        workspace_id: i64,
    ) -> Result<Option<MonitorRow>>;

    /// All last-known per-region status rows for a monitor
    async fn status_rows(&self, monitor_id: i64) -> Result<Vec<MonitorStatusRow>>;

    /// Count run records for a workspace created at or after `since`
    async fn count_runs_since(&self, workspace_id: i64, since: DateTime<Utc>) -> Result<i64>;

    /// Insert one run record and return its generated id, or `None` if the
    /// insert reported no created row
    async fn insert_run(
        &self,
        monitor_id: i64,
        workspace_id: i64,
        runned_at: DateTime<Utc>,
    ) -> Result<Option<i64>>;
}

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl Database for DatabaseImpl {
    async fn workspace_by_api_key(&self, api_key: &str) -> Result<Option<Workspace>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT id, slug, plan FROM workspaces WHERE api_key = ?1", params![api_key])
            .await?;

        if let Some(row) = rows.next().await? {
            let plan: String = row.get(2)?;

            Ok(Some(Workspace {
                id: row.get(0)?,
                slug: row.get(1)?,
                plan: plan.parse().map_err(anyhow::Error::new)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn monitor_for_workspace(
        &self,
        monitor_id: i64,
        workspace_id: i64,
    ) -> Result<Option<MonitorRow>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, workspace_id, name, job_type, url, method, body, headers, assertions, degraded_after, timeout, regions FROM monitors WHERE id = ?1 AND workspace_id = ?2 AND deleted_at IS NULL",
            )
            .await?;

        let mut rows = stmt.query(params![monitor_id, workspace_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(MonitorRow {
                id: row.get(0)?,
                workspace_id: row.get(1)?,
                name: row.get(2)?,
                job_type: row.get(3)?,
                url: row.get(4)?,
                method: row.get::<Option<String>>(5)?,
                body: row.get(6)?,
                headers: row.get(7)?,
                assertions: row.get::<Option<String>>(8)?,
                degraded_after: row.get::<Option<i64>>(9)?,
                timeout: row.get(10)?,
                regions: row.get(11)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn status_rows(&self, monitor_id: i64) -> Result<Vec<MonitorStatusRow>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT monitor_id, region, status FROM monitor_status WHERE monitor_id = ?1")
            .await?;

        let mut rows = stmt.query(params![monitor_id]).await?;
        let mut statuses = Vec::new();

        while let Some(row) = rows.next().await? {
            statuses.push(MonitorStatusRow {
                monitor_id: row.get(0)?,
                region: row.get(1)?,
                status: row.get(2)?,
            });
        }

        Ok(statuses)
    }

    async fn count_runs_since(&self, workspace_id: i64, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM monitor_runs WHERE workspace_id = ?1 AND created_at >= ?2",
                params![workspace_id, since.timestamp()],
            )
            .await?;

        let row = rows.next().await?.ok_or(libsql::Error::QueryReturnedNoRows)?;
        Ok(row.get(0)?)
    }

    async fn insert_run(
        &self,
        monitor_id: i64,
        workspace_id: i64,
        runned_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let conn = self.get_conn().await?;
        let timestamp = runned_at.timestamp();

        let affected = conn
            .execute(
                "INSERT INTO monitor_runs (monitor_id, workspace_id, runned_at, created_at) VALUES (?, ?, ?, ?)",
                params![monitor_id, workspace_id, timestamp, timestamp],
            )
            .await?;

        if affected == 0 {
            return Ok(None);
        }

        Ok(Some(conn.last_insert_rowid()))
    }
}
