//! Sync Bridge
//!
//! Stateful orchestrator composing the adapter and the transformer: owns the
//! active connection, the in-memory task cache, the background refresh timer,
//! and the event channel.
//!
//! # Lifecycle
//!
//! `Disconnected → Connecting → Connected{Idle | Syncing | Error}`. The only
//! way out of `Connected` is an explicit [`SyncBridge::disconnect`].
//!
//! # Consistency
//!
//! Every completed sync replaces the task cache wholesale. The single
//! exception is the optimistic merge inside [`SyncBridge::update_task`],
//! which patches one cached entry without waiting for a resync. Overlapping
//! syncs are not serialized: whichever response lands last wins the cache.
//!
//! # Example
//!
//! ```ignore
//! use sheetbridge::bridge::{BridgeConfig, SyncBridge};
//! use sheetbridge::config::SheetConfig;
//! use sheetbridge::registry::AdapterRegistry;
//! use sheetbridge::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = SyncBridge::new(
//!         Arc::new(AdapterRegistry::with_defaults()),
//!         Arc::new(MemoryStore::new()),
//!         BridgeConfig::default(),
//!     );
//!
//!     let mut events = bridge.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     bridge.connect(SheetConfig::new("my-sheet-id")).await?;
//!     for task in bridge.tasks() {
//!         println!("{} [{}]", task.title, task.status);
//!     }
//!     Ok(())
//! }
//! ```

mod engine;
mod events;

pub use engine::{BridgeConfig, BridgePhase, ConnectedPhase, SyncBridge, DEFAULT_SYNC_INTERVAL};
pub use events::BridgeEvent;
