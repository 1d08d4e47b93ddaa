//! Row ↔ Task transformation
//!
//! Pure functions converting raw tabular rows into canonical task records and
//! back. All schema and vocabulary normalization lives here; nothing in this
//! module touches the network or the cache.
//!
//! Column contract: A=title, B=status, C=description, D=assignee, E=priority,
//! F=due date. Missing trailing columns default to empty (priority to Medium).

use crate::model::{SourceMetadata, Task, TaskDraft, TaskPriority, TaskStatus};
use chrono::Utc;

/// Synthesized header set for columns A..F
pub const DEFAULT_HEADER: [&str; 6] = [
    "Task",
    "Status",
    "Description",
    "Assignee",
    "Priority",
    "Due Date",
];

/// Decide whether row 0 is a header row
///
/// Row 0 is a header iff its first cell case-insensitively contains "task"
/// or its second cell contains "status". Anything else is data from row 0.
pub fn detect_header(rows: &[Vec<String>]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };

    let cell = |i: usize| first.get(i).map(|c| c.to_lowercase()).unwrap_or_default();

    cell(0).contains("task") || cell(1).contains("status")
}

/// Offset from data ordinal to 1-based physical row address
///
/// Every code path that writes back must compute the same offset: +2 when a
/// header row occupies row 1, +1 otherwise.
pub fn data_row_offset(header_present: bool) -> u32 {
    if header_present {
        2
    } else {
        1
    }
}

/// Parse one raw row into a task
///
/// Returns `None` when the title cell is empty or whitespace-only; the row is
/// silently dropped, which is a filtering decision rather than a fault.
pub fn parse_row(
    row: &[String],
    ordinal: usize,
    header_present: bool,
    connection_id: &str,
    synced_at: &str,
) -> Option<Task> {
    let cell = |i: usize| row.get(i).map(|c| c.trim()).unwrap_or_default();

    let title = cell(0);
    if title.is_empty() {
        return None;
    }

    Some(Task {
        id: Task::derive_id(connection_id, ordinal),
        title: title.to_string(),
        status: normalize_status(cell(1)),
        description: cell(2).to_string(),
        assignee: cell(3).to_string(),
        priority: normalize_priority(cell(4)),
        due_date: cell(5).to_string(),
        row_index: ordinal as u32 + data_row_offset(header_present),
        source: SourceMetadata {
            connection_id: connection_id.to_string(),
            synced_at: synced_at.to_string(),
        },
    })
}

/// Transform a full raw payload into the canonical task list
///
/// Detects the header, then parses every data row in order. Ordinals count
/// data rows only, so task ids stay deterministic for a given payload.
pub fn rows_to_tasks(rows: &[Vec<String>], connection_id: &str) -> Vec<Task> {
    let header_present = detect_header(rows);
    let data_rows = if header_present { &rows[1..] } else { rows };
    let synced_at = Utc::now().to_rfc3339();

    data_rows
        .iter()
        .enumerate()
        .filter_map(|(ordinal, row)| {
            parse_row(row, ordinal, header_present, connection_id, &synced_at)
        })
        .collect()
}

/// Map free-text status vocabulary onto the canonical enum
///
/// Total and idempotent: any input maps to one of the four statuses, and the
/// canonical spellings map to themselves.
pub fn normalize_status(raw: &str) -> TaskStatus {
    match raw.trim().to_lowercase().as_str() {
        "pending" | "todo" | "to do" | "not started" | "new" | "open" => TaskStatus::Pending,
        "in_progress" | "in-progress" | "in progress" | "inprogress" | "working" | "doing"
        | "active" | "started" => TaskStatus::InProgress,
        "done" | "completed" | "finished" | "complete" | "closed" | "resolved" => TaskStatus::Done,
        "blocked" | "stuck" | "on hold" | "waiting" | "paused" | "hold" => TaskStatus::Blocked,
        _ => TaskStatus::Pending,
    }
}

/// Map free-text priority vocabulary onto the canonical enum
pub fn normalize_priority(raw: &str) -> TaskPriority {
    match raw.trim().to_lowercase().as_str() {
        "high" | "urgent" | "critical" | "3" => TaskPriority::High,
        "low" | "minor" | "1" => TaskPriority::Low,
        "medium" | "normal" | "med" | "2" => TaskPriority::Medium,
        _ => TaskPriority::Medium,
    }
}

/// Serialize a task back into its A..F row form
pub fn task_to_row(task: &Task) -> Vec<String> {
    vec![
        task.title.clone(),
        task.status.as_str().to_string(),
        task.description.clone(),
        task.assignee.clone(),
        task.priority.as_str().to_string(),
        task.due_date.clone(),
    ]
}

/// Serialize a create draft into its A..F row form, normalizing vocabulary
pub fn draft_to_row(draft: &TaskDraft) -> Vec<String> {
    vec![
        draft.title.trim().to_string(),
        normalize_status(draft.status.as_deref().unwrap_or(""))
            .as_str()
            .to_string(),
        draft.description.clone().unwrap_or_default(),
        draft.assignee.clone().unwrap_or_default(),
        normalize_priority(draft.priority.as_deref().unwrap_or(""))
            .as_str()
            .to_string(),
        draft.due_date.clone().unwrap_or_default(),
    ]
}
