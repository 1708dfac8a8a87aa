use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use crate::storage::with_timeout;
use crate::tasks::TaskStatus;

// ─── Row type ────────────────────────────────────────────────────────────────

/// A task as stored and as serialized in API responses (camelCase).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub status: String,
    /// RFC 3339 UTC, millisecond precision. Fixed-width, so lexicographic
    /// order equals chronological order.
    pub created_at: String,
    pub updated_at: String,
}

// ─── Task ids ────────────────────────────────────────────────────────────────

/// 5 random bytes drawn once per process, shared by every generated id.
static PROCESS_RANDOM: OnceLock<[u8; 5]> = OnceLock::new();
static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a 24-char hex task id: 4-byte big-endian unix timestamp,
/// 5 process-random bytes, 3-byte incrementing counter. The counter keeps ids
/// from the same process monotonic, so `ORDER BY created_at DESC, id DESC`
/// is a stable newest-first ordering even when timestamps collide.
pub fn generate_task_id() -> String {
    let random = PROCESS_RANDOM.get_or_init(|| {
        let mut bytes = [0u8; 5];
        OsRng.fill_bytes(&mut bytes);
        bytes
    });
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&(Utc::now().timestamp() as u32).to_be_bytes());
    bytes[4..9].copy_from_slice(random);
    bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
    hex::encode(bytes)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─── TaskStore ───────────────────────────────────────────────────────────────

/// CRUD queries against the `tasks` table. One atomic storage call per method;
/// no retries — failures surface to the service synchronously.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one task and return the full created row.
    pub async fn insert(&self, title: &str, status: TaskStatus) -> Result<TaskRow> {
        let now = now_rfc3339();
        let row = TaskRow {
            id: generate_task_id(),
            title: title.to_string(),
            status: status.as_str().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let pool = self.pool.clone();
        with_timeout(async {
            sqlx::query(
                "INSERT INTO tasks (id, title, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&row.id)
            .bind(&row.title)
            .bind(&row.status)
            .bind(&row.created_at)
            .bind(&row.updated_at)
            .execute(&pool)
            .await?;
            Ok(())
        })
        .await?;

        Ok(row)
    }

    /// One page of tasks, newest first (id as tiebreak for equal timestamps).
    pub async fn find_page(
        &self,
        filter: Option<TaskStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<TaskRow>> {
        let pool = self.pool.clone();
        with_timeout(async {
            let rows = match filter {
                Some(status) => {
                    sqlx::query_as(
                        "SELECT * FROM tasks WHERE status = ?
                         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    )
                    .bind(status.as_str())
                    .bind(limit)
                    .bind(skip)
                    .fetch_all(&pool)
                    .await?
                }
                None => {
                    sqlx::query_as(
                        "SELECT * FROM tasks ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    )
                    .bind(limit)
                    .bind(skip)
                    .fetch_all(&pool)
                    .await?
                }
            };
            Ok(rows)
        })
        .await
    }

    /// Count of tasks matching the filter, ignoring pagination.
    pub async fn count(&self, filter: Option<TaskStatus>) -> Result<i64> {
        let pool = self.pool.clone();
        with_timeout(async {
            let count: i64 = match filter {
                Some(status) => {
                    sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = ?")
                        .bind(status.as_str())
                        .fetch_one(&pool)
                        .await?
                }
                None => {
                    sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
                        .fetch_one(&pool)
                        .await?
                }
            };
            Ok(count)
        })
        .await
    }

    /// Set a task's status and refresh `updated_at`. Returns the updated row,
    /// or `None` if no row matched. One statement: the mutation and the
    /// read-back cannot be split by a concurrent delete.
    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>> {
        let pool = self.pool.clone();
        let now = now_rfc3339();
        with_timeout(async {
            let row = sqlx::query_as(
                "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
            )
            .bind(status.as_str())
            .bind(&now)
            .bind(id)
            .fetch_optional(&pool)
            .await?;
            Ok(row)
        })
        .await
    }

    /// Delete a task. Returns the removed row, or `None` if no row matched.
    /// One statement: of two racing deletes, exactly one gets the row back.
    pub async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<TaskRow>> {
        let pool = self.pool.clone();
        with_timeout(async {
            let row = sqlx::query_as("DELETE FROM tasks WHERE id = ? RETURNING *")
                .bind(id)
                .fetch_optional(&pool)
                .await?;
            Ok(row)
        })
        .await
    }
}
