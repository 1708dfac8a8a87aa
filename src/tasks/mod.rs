pub mod service;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use service::TaskService;
pub use storage::{TaskRow, TaskStore};

/// Task lifecycle state. The only mutable field on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parse a status string. Returns `None` for anything outside the
    /// two-value enumeration — callers decide whether that is an error
    /// (update/create) or a no-op (list filter).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Task ids are 24-character hex strings (the storage engine's format).
/// Checked before any storage call so malformed ids never reach a query.
pub fn is_valid_task_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
