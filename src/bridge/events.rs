//! Events emitted by the sync bridge
//!
//! One typed enum over a broadcast channel instead of stringly-named
//! listener registration; payload shapes are checked at compile time and a
//! misbehaving subscriber can never affect the emitter or other subscribers.

use crate::model::{Connection, Task, TaskDraft, TaskPatch};
use chrono::{DateTime, Utc};

/// Events emitted by the sync bridge
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// A sheet was bound and its initial sync completed
    SheetConnected(Connection),

    /// The active sheet was unbound and the cache cleared
    SheetDisconnected,

    /// A sync attempt started (manual or timer-driven)
    SyncStarted,

    /// The task cache changed; payload is the full current list
    TasksUpdated(Vec<Task>),

    /// A sync attempt finished successfully
    SyncCompleted,

    /// A sync attempt failed; the cache keeps its last successful state
    SyncError {
        message: String,
        connection_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A task was appended to the remote source
    TaskCreated(TaskDraft),

    /// A task row was overwritten and the cache patched optimistically
    TaskUpdated { id: String, updates: TaskPatch },

    /// A task row was structurally removed
    TaskDeleted(String),

    /// A mutating operation failed
    TaskError {
        operation: String,
        message: String,
        context: Option<String>,
    },
}
