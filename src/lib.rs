//! sheetbridge - Spreadsheet-Backed Task Synchronization Engine
//!
//! sheetbridge keeps a list of typed task records in sync with an externally
//! hosted spreadsheet reached over a network API. The spreadsheet is the data
//! of record: every sync rebuilds the in-memory task cache wholesale from the
//! remote rows, and mutations are written back through whichever credential
//! channel is available (bearer token, read-only key, or webhook).
//!
//! # Architecture
//!
//! - **model**: Canonical task records, connection descriptor, sync state
//! - **transform**: Pure row ↔ task conversion and vocabulary normalization
//! - **adapter**: Remote tabular API proxy with capability-probed credentials
//! - **bridge**: Stateful orchestrator (cache, refresh timer, event channel)
//! - **registry**: Memoized adapter factory and saved-connection bookkeeping
//! - **store**: Persisted key/value state (SQLite, in-memory)
//! - **config**: Per-sheet settings and the user-level YAML config file
//! - **retry**: Caller-side retry policy for remote failures

// Core modules
pub mod config;
pub mod error;
pub mod model;
pub mod transform;

// Components
pub mod adapter;
pub mod bridge;
pub mod registry;
pub mod store;

// Utilities
pub mod logging;
pub mod retry;

// Re-exports
pub use error::{Result, SheetBridgeError};
