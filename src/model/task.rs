//! Canonical task record and its input shapes

use serde::{Deserialize, Serialize};

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Blocked,
}

impl TaskStatus {
    /// Canonical wire form, also what gets written back to the status column
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a synced task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// External identifier of the connection the task was synced from
    pub connection_id: String,

    /// When the sync that produced this record completed (RFC 3339)
    pub synced_at: String,
}

/// Canonical task record
///
/// The `id` is derived from (connection id, ordinal position within the sync
/// that produced it) and is NOT stable across structural row changes: an
/// insert or delete shifts every subsequent id. Callers must not hold on to
/// ids across sync boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub due_date: String,

    /// 1-based physical row address in the backing table
    pub row_index: u32,

    pub source: SourceMetadata,
}

impl Task {
    /// Derive the deterministic task id for an ordinal within a sync
    pub fn derive_id(connection_id: &str, ordinal: usize) -> String {
        format!("{}:{}", connection_id, ordinal)
    }

    /// Apply a patch, routing free-text status/priority through the normalizers
    pub fn merged(&self, patch: &TaskPatch) -> Task {
        let mut task = self.clone();
        if let Some(ref title) = patch.title {
            task.title = title.clone();
        }
        if let Some(ref status) = patch.status {
            task.status = crate::transform::normalize_status(status);
        }
        if let Some(ref priority) = patch.priority {
            task.priority = crate::transform::normalize_priority(priority);
        }
        if let Some(ref description) = patch.description {
            task.description = description.clone();
        }
        if let Some(ref assignee) = patch.assignee {
            task.assignee = assignee.clone();
        }
        if let Some(ref due_date) = patch.due_date {
            task.due_date = due_date.clone();
        }
        task
    }
}

/// Input for creating a task
///
/// Free-text fields; status and priority are normalized on write and again
/// on the resync that follows the remote append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Partial update for a task; every field optional, raw text as entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: Task::derive_id("sheet-1", 0),
            title: "Write report".to_string(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            description: String::new(),
            assignee: String::new(),
            due_date: String::new(),
            row_index: 2,
            source: SourceMetadata {
                connection_id: "sheet-1".to_string(),
                synced_at: "2026-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(Task::derive_id("abc", 0), "abc:0");
        assert_eq!(Task::derive_id("abc", 12), "abc:12");
    }

    #[test]
    fn test_merged_normalizes_status_and_priority() {
        let task = sample_task();
        let patch = TaskPatch {
            status: Some("Complete".to_string()),
            priority: Some("urgent".to_string()),
            ..Default::default()
        };

        let merged = task.merged(&patch);
        assert_eq!(merged.status, TaskStatus::Done);
        assert_eq!(merged.priority, TaskPriority::High);
        // Untouched fields survive
        assert_eq!(merged.title, "Write report");
        assert_eq!(merged.row_index, 2);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let task = sample_task();
        let merged = task.merged(&TaskPatch::default());
        assert_eq!(merged, task);
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_status_round_trips_through_serde() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }
}
