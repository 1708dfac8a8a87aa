use serde::Serialize;

use crate::error::ApiError;
use crate::tasks::storage::{TaskRow, TaskStore};
use crate::tasks::{is_valid_task_id, TaskStatus};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;
const MAX_TITLE_CHARS: usize = 200;

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Derived paging info returned alongside every list result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_tasks: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    fn new(page: i64, limit: i64, total_tasks: i64) -> Self {
        Self {
            current_page: page,
            total_pages: (total_tasks + limit - 1) / limit,
            total_tasks,
            limit,
            // page is caller-controlled and can be i64::MAX; overflow means
            // the window is far past the end, so there is no next page.
            has_next_page: page.checked_mul(limit).is_some_and(|n| n < total_tasks),
            has_prev_page: page > 1,
        }
    }
}

// ─── TaskService ─────────────────────────────────────────────────────────────

/// Pure business logic for tasks: domain validation, query construction,
/// pagination arithmetic. Holds no state of its own beyond the store handle.
#[derive(Clone)]
pub struct TaskService {
    store: TaskStore,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    /// Create a task. Title is required (non-blank after trimming, at most
    /// 200 characters); status defaults to pending.
    pub async fn create(
        &self,
        title: Option<&str>,
        status: Option<&str>,
    ) -> Result<TaskRow, ApiError> {
        let title = title.map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(ApiError::validation("Task title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApiError::validation(
                "Task title cannot exceed 200 characters",
            ));
        }

        let status = match status {
            None => TaskStatus::Pending,
            Some(s) => TaskStatus::parse(s).ok_or_else(|| {
                ApiError::validation(format!(
                    "'{s}' is not a valid status, Use 'pending' or 'completed'"
                ))
            })?,
        };

        Ok(self.store.insert(title, status).await?)
    }

    /// List tasks newest-first with an optional status filter and
    /// page/limit windowing. Unrecognized filter values are ignored, not
    /// rejected — only out-of-range page/limit is a validation error.
    pub async fn list(
        &self,
        status: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<TaskRow>, Pagination), ApiError> {
        let filter = status.and_then(TaskStatus::parse);
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 || limit < 1 || limit > MAX_LIMIT {
            return Err(ApiError::validation(
                "Invalid pagination parameters. Page must be >= 1 and limit must be between 1 and 100",
            ));
        }

        // An offset that overflows i64 is past the end of any result set;
        // saturate so the query reads as an empty page instead of wrapping.
        let skip = (page - 1).checked_mul(limit).unwrap_or(i64::MAX);
        let tasks = self.store.find_page(filter, skip, limit).await?;
        let total_tasks = self.store.count(filter).await?;

        Ok((tasks, Pagination::new(page, limit, total_tasks)))
    }

    /// Set a task's status. Id format and status value are checked before any
    /// storage call; a well-formed id with no matching row is not-found.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<TaskRow, ApiError> {
        if !is_valid_task_id(id) {
            return Err(ApiError::validation("Invalid task ID format"));
        }
        let status = TaskStatus::parse(status).ok_or_else(|| {
            ApiError::validation("Status must be either 'pending' or 'completed'")
        })?;

        self.store
            .find_by_id_and_update(id, status)
            .await?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    /// Delete a task permanently. Reports not-found for an absent record
    /// rather than silently succeeding.
    pub async fn delete(&self, id: &str) -> Result<TaskRow, ApiError> {
        if !is_valid_task_id(id) {
            return Err(ApiError::validation("Invalid task ID format"));
        }

        self.store
            .find_by_id_and_delete(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }
}
