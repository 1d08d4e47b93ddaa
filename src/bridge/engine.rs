//! Sync bridge implementation

use super::events::BridgeEvent;
use crate::adapter::TableAdapter;
use crate::config::SheetConfig;
use crate::error::SheetBridgeError;
use crate::model::{Connection, SavedConnection, SyncState, Task, TaskDraft, TaskPatch};
use crate::registry::AdapterRegistry;
use crate::store::KeyValueStore;
use crate::transform;
use crate::Result;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default background refresh interval (30 seconds)
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Default range fetched on every sync
const DEFAULT_FETCH_RANGE: &str = "A1:F1000";

/// Range probed for emptiness before the first bind
const HEADER_PROBE_RANGE: &str = "A1:F1";

/// Default event broadcast channel capacity
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Store key holding the descriptor of the currently bound sheet
const ACTIVE_CONNECTION_KEY: &str = "active_connection";

/// Sync bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Background refresh interval
    pub sync_interval: Duration,

    /// Range fetched on every sync
    pub fetch_range: String,

    /// Event broadcast channel capacity
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sync_interval: DEFAULT_SYNC_INTERVAL,
            fetch_range: DEFAULT_FETCH_RANGE.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Set the background refresh interval
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Set the range fetched on every sync
    pub fn with_fetch_range(mut self, range: impl Into<String>) -> Self {
        self.fetch_range = range.into();
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Sub-state while a sheet is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedPhase {
    Idle,
    Syncing,
    Error,
}

/// Bridge lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Disconnected,
    Connecting,
    Connected(ConnectedPhase),
}

struct BridgeState {
    connection: Option<Connection>,
    adapter: Option<Arc<dyn TableAdapter>>,
    tasks: Vec<Task>,
    phase: BridgePhase,
    is_loading: bool,
    last_sync_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
    timer: Option<JoinHandle<()>>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self {
            connection: None,
            adapter: None,
            tasks: Vec::new(),
            phase: BridgePhase::Disconnected,
            is_loading: false,
            last_sync_time: None,
            last_error: None,
            timer: None,
        }
    }
}

struct BridgeInner {
    config: BridgeConfig,
    registry: Arc<AdapterRegistry>,
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<BridgeEvent>,
    // Never held across an await: syncs race freely and the last completed
    // write wins the cache.
    state: Mutex<BridgeState>,
}

/// The spreadsheet-backed task synchronization engine
///
/// An explicit service object constructed from injected dependencies; clones
/// share the same underlying state, so one can live in a timer task while
/// another serves callers.
#[derive(Clone)]
pub struct SyncBridge {
    inner: Arc<BridgeInner>,
}

impl SyncBridge {
    /// Create a new bridge over an adapter registry and a state store
    pub fn new(
        registry: Arc<AdapterRegistry>,
        store: Arc<dyn KeyValueStore>,
        config: BridgeConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);

        Self {
            inner: Arc::new(BridgeInner {
                config,
                registry,
                store,
                events,
                state: Mutex::new(BridgeState::default()),
            }),
        }
    }

    /// Get an event subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.events.subscribe()
    }

    /// Send an event, logging if dropped due to no receivers
    fn send_event(&self, event: BridgeEvent) {
        match self.inner.events.send(event) {
            Ok(receiver_count) => {
                if receiver_count == 0 {
                    debug!("Event sent but no receivers subscribed");
                }
            }
            Err(e) => {
                debug!(error = %e, "Event dropped - no receivers");
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BridgeState> {
        self.inner.state.lock().expect("bridge state lock poisoned")
    }

    /// Bind a sheet: persist the descriptor, initialize an empty sheet with a
    /// header row, run the initial sync, and start the background timer
    pub async fn connect(&self, sheet: SheetConfig) -> Result<Connection> {
        info!(spreadsheet = %sheet.spreadsheet_id, "Connecting sheet");
        self.lock_state().phase = BridgePhase::Connecting;

        match self.bind(sheet).await {
            Ok(connection) => {
                self.spawn_timer();
                self.send_event(BridgeEvent::SheetConnected(connection.clone()));
                Ok(connection)
            }
            Err(e) => {
                let mut state = self.lock_state();
                if state.connection.is_none() {
                    state.phase = BridgePhase::Disconnected;
                }
                Err(e)
            }
        }
    }

    async fn bind(&self, sheet: SheetConfig) -> Result<Connection> {
        let adapter = self.inner.registry.get_adapter(&sheet)?;

        // Validate reachability and credentials before binding anything
        let probe = adapter.test_connection().await?;
        let display_name = if probe.title.is_empty() {
            sheet.spreadsheet_id.clone()
        } else {
            probe.title
        };

        let connection = Connection::new(
            sheet.spreadsheet_id.clone(),
            display_name,
            sheet.canonical_url(),
        );

        self.inner.store.set(
            ACTIVE_CONNECTION_KEY,
            &serde_json::to_string(&SavedConnection::from(&connection))?,
        )?;

        // An empty sheet gets a synthetic header row, written exactly once
        // before the first sync read
        let probe_payload = adapter.fetch_all(HEADER_PROBE_RANGE).await?;
        if probe_payload.is_empty() {
            info!("Sheet is empty, writing header row");
            let header = transform::DEFAULT_HEADER
                .iter()
                .map(|h| h.to_string())
                .collect();
            adapter.update_range(1, header).await?;
        }

        {
            let mut state = self.lock_state();
            state.connection = Some(connection.clone());
            state.adapter = Some(adapter);
            state.phase = BridgePhase::Connected(ConnectedPhase::Idle);
        }

        self.sync_from_source().await?;
        Ok(connection)
    }

    /// Unbind the sheet: clear the connection and cache, cancel the timer
    ///
    /// Only future scheduled syncs are prevented; a sync already in flight is
    /// not cancelled and will still write its result when it completes.
    pub fn disconnect(&self) -> Result<()> {
        let timer = {
            let mut state = self.lock_state();
            let timer = state.timer.take();
            *state = BridgeState::default();
            timer
        };

        if let Some(timer) = timer {
            timer.abort();
        }

        self.inner.store.remove(ACTIVE_CONNECTION_KEY)?;

        info!("Sheet disconnected");
        self.send_event(BridgeEvent::SheetDisconnected);
        Ok(())
    }

    /// Read the persisted descriptor of the currently bound sheet, if any
    pub fn persisted_connection(&self) -> Result<Option<SavedConnection>> {
        match self.inner.store.get(ACTIVE_CONNECTION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Fetch, transform, and replace the task cache wholesale
    ///
    /// On failure the cache keeps its last successful state; the error is
    /// emitted as an event and re-thrown.
    pub async fn sync_from_source(&self) -> Result<Vec<Task>> {
        self.send_event(BridgeEvent::SyncStarted);

        let (adapter, connection_id) = {
            let mut state = self.lock_state();
            match (&state.adapter, &state.connection) {
                (Some(adapter), Some(connection)) => {
                    let bound = (adapter.clone(), connection.external_id.clone());
                    state.is_loading = true;
                    state.phase = BridgePhase::Connected(ConnectedPhase::Syncing);
                    bound
                }
                _ => {
                    let e = SheetBridgeError::NotConnected;
                    self.emit_sync_error(&e, String::new());
                    return Err(e);
                }
            }
        };

        debug!(connection = %connection_id, "Sync started");

        let payload = match adapter.fetch_all(&self.inner.config.fetch_range).await {
            Ok(payload) => payload,
            Err(e) => {
                {
                    let mut state = self.lock_state();
                    state.is_loading = false;
                    state.last_error = Some(e.to_string());
                    state.phase = BridgePhase::Connected(ConnectedPhase::Error);
                }
                self.emit_sync_error(&e, connection_id);
                return Err(e);
            }
        };

        let tasks = transform::rows_to_tasks(&payload.values, &connection_id);

        let snapshot = {
            let mut state = self.lock_state();
            state.tasks = tasks;
            state.is_loading = false;
            state.last_sync_time = Some(Utc::now());
            state.last_error = None;
            state.phase = BridgePhase::Connected(ConnectedPhase::Idle);
            state.tasks.clone()
        };

        info!(tasks = snapshot.len(), "Sync completed");
        self.send_event(BridgeEvent::TasksUpdated(snapshot.clone()));
        self.send_event(BridgeEvent::SyncCompleted);
        Ok(snapshot)
    }

    /// Caller-triggered refresh; identical to a timer-driven sync
    pub async fn manual_sync(&self) -> Result<Vec<Task>> {
        self.sync_from_source().await
    }

    /// Append a task to the remote source, then resync
    ///
    /// No optimistic local insert: the remote source assigns the row's final
    /// position, so only the forced resync can report it.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<()> {
        if draft.title.trim().is_empty() {
            let e = SheetBridgeError::InvalidTask("title must not be empty".to_string());
            self.emit_task_error("create", &e, None);
            return Err(e);
        }

        let adapter = self.require_adapter("create", Some(draft.title.as_str()))?;

        let row = transform::draft_to_row(&draft);
        if let Err(e) = adapter.append(row).await {
            self.emit_task_error("create", &e, Some(draft.title.clone()));
            return Err(e);
        }

        info!(title = %draft.title, "Task created");
        self.send_event(BridgeEvent::TaskCreated(draft));

        self.sync_from_source().await?;
        Ok(())
    }

    /// Overwrite a task's row, then optimistically patch the cache
    ///
    /// The single code path where the cache can diverge from the remote
    /// source between syncs.
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let adapter = self.require_adapter("update", Some(id))?;

        let current = {
            let state = self.lock_state();
            state.tasks.iter().find(|t| t.id == id).cloned()
        };
        let Some(current) = current else {
            let e = SheetBridgeError::TaskNotFound(id.to_string());
            self.emit_task_error("update", &e, Some(id.to_string()));
            return Err(e);
        };

        let merged = current.merged(&patch);
        let values = transform::task_to_row(&merged);

        if let Err(e) = adapter.update_range(current.row_index, values).await {
            self.emit_task_error("update", &e, Some(id.to_string()));
            return Err(e);
        }

        let snapshot = {
            let mut state = self.lock_state();
            if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == id) {
                *slot = merged.clone();
            }
            state.tasks.clone()
        };

        info!(id = %id, row_index = merged.row_index, "Task updated");
        self.send_event(BridgeEvent::TasksUpdated(snapshot));
        self.send_event(BridgeEvent::TaskUpdated {
            id: id.to_string(),
            updates: patch,
        });

        Ok(merged)
    }

    /// Structurally remove a task's row, then resync
    ///
    /// The resync is required: deletion invalidates every cached row index
    /// greater than the deleted one.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let adapter = self.require_adapter("delete", Some(id))?;

        let row_index = {
            let state = self.lock_state();
            state.tasks.iter().find(|t| t.id == id).map(|t| t.row_index)
        };
        let Some(row_index) = row_index else {
            let e = SheetBridgeError::TaskNotFound(id.to_string());
            self.emit_task_error("delete", &e, Some(id.to_string()));
            return Err(e);
        };

        if let Err(e) = adapter.delete_row(row_index).await {
            self.emit_task_error("delete", &e, Some(id.to_string()));
            return Err(e);
        }

        info!(id = %id, row_index, "Task deleted");
        self.send_event(BridgeEvent::TaskDeleted(id.to_string()));

        self.sync_from_source().await?;
        Ok(())
    }

    /// Snapshot of the task cache
    pub fn tasks(&self) -> Vec<Task> {
        self.lock_state().tasks.clone()
    }

    /// Derived sync status snapshot
    pub fn sync_state(&self) -> SyncState {
        let state = self.lock_state();
        SyncState {
            is_loading: state.is_loading,
            last_sync_time: state.last_sync_time,
            task_count: state.tasks.len(),
            last_error: state.last_error.clone(),
        }
    }

    /// The active connection descriptor, if bound
    pub fn connection(&self) -> Option<Connection> {
        self.lock_state().connection.clone()
    }

    pub fn phase(&self) -> BridgePhase {
        self.lock_state().phase
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.phase(), BridgePhase::Connected(_))
    }

    fn require_adapter(
        &self,
        operation: &str,
        context: Option<&str>,
    ) -> Result<Arc<dyn TableAdapter>> {
        let adapter = self.lock_state().adapter.clone();
        adapter.ok_or_else(|| {
            let e = SheetBridgeError::NotConnected;
            self.emit_task_error(operation, &e, context.map(|c| c.to_string()));
            e
        })
    }

    fn emit_sync_error(&self, error: &SheetBridgeError, connection_id: String) {
        warn!(error = %error, "Sync failed");
        self.send_event(BridgeEvent::SyncError {
            message: error.to_string(),
            connection_id,
            timestamp: Utc::now(),
        });
    }

    fn emit_task_error(&self, operation: &str, error: &SheetBridgeError, context: Option<String>) {
        warn!(operation, error = %error, "Task operation failed");
        self.send_event(BridgeEvent::TaskError {
            operation: operation.to_string(),
            message: error.to_string(),
            context,
        });
    }

    /// Start the fixed-interval background refresh
    ///
    /// Each tick spawns the sync as a detached task, so aborting the timer on
    /// disconnect never cancels a sync already in flight.
    fn spawn_timer(&self) {
        let weak: Weak<BridgeInner> = Arc::downgrade(&self.inner);
        let interval_duration = self.inner.config.sync_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial sync already
            // ran during connect
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let bridge = SyncBridge { inner };
                tokio::spawn(async move {
                    if let Err(e) = bridge.sync_from_source().await {
                        debug!(error = %e, "Scheduled sync failed");
                    }
                });
            }
        });

        let mut state = self.lock_state();
        if let Some(old) = state.timer.replace(handle) {
            old.abort();
        }
    }
}
