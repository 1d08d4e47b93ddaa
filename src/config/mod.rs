//! Configuration
//!
//! Per-sheet connection settings plus the user-level config file at
//! `~/.config/sheetbridge/config.yaml`.

mod sheet_config;

pub use sheet_config::{SheetBridgeConfig, SheetConfig, DEFAULT_BASE_URL};
