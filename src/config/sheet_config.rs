//! sheetbridge configuration file handling
//!
//! Loads and manages the ~/.config/sheetbridge/config.yaml file with support
//! for multiple saved sheet configurations.

use crate::adapter::CredentialSet;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default endpoint of the remote tabular API
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_sync_interval_secs() -> u64 {
    30
}

fn default_state_db() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("sheetbridge");
    path.push("state.db");
    path
}

/// Connection settings for one spreadsheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// External spreadsheet identifier
    pub spreadsheet_id: String,

    /// Tab within the spreadsheet; `None` uses the first tab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,

    /// API endpoint, overridable for self-hosted gateways and tests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credentials available to this sheet
    #[serde(default)]
    pub credentials: CredentialSet,
}

impl SheetConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: None,
            base_url: default_base_url(),
            credentials: CredentialSet::default(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialSet) -> Self {
        self.credentials = credentials;
        self
    }

    /// URL a person would open to view the sheet
    pub fn canonical_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id
        )
    }
}

/// sheetbridge configuration
///
/// Represents the complete ~/.config/sheetbridge/config.yaml file: saved
/// sheet configurations, the refresh cadence, and the state database path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetBridgeConfig {
    /// Saved sheet configurations
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,

    /// Background refresh interval in seconds
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Path to the persisted-state database
    #[serde(default = "default_state_db")]
    pub state_db: PathBuf,
}

impl Default for SheetBridgeConfig {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            sync_interval_secs: default_sync_interval_secs(),
            state_db: default_state_db(),
        }
    }
}

impl SheetBridgeConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file path (~/.config/sheetbridge/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("sheetbridge");
        path.push("config.yaml");
        path
    }

    /// Load configuration from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::SheetBridgeError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading sheetbridge configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            sheets = config.sheets.len(),
            sync_interval_secs = config.sync_interval_secs,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save_default(&self) -> Result<()> {
        self.save(Self::default_path())
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Look up a saved sheet by its identifier
    pub fn get_sheet(&self, spreadsheet_id: &str) -> Option<&SheetConfig> {
        self.sheets
            .iter()
            .find(|s| s.spreadsheet_id == spreadsheet_id)
    }

    /// Add or replace a saved sheet configuration
    pub fn upsert_sheet(&mut self, config: SheetConfig) {
        self.sheets
            .retain(|s| s.spreadsheet_id != config.spreadsheet_id);
        self.sheets.push(config);
    }

    /// Remove a saved sheet configuration, returning it if present
    pub fn remove_sheet(&mut self, spreadsheet_id: &str) -> Option<SheetConfig> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.spreadsheet_id == spreadsheet_id)?;
        Some(self.sheets.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sheet_config_defaults() {
        let config = SheetConfig::new("sheet-123");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.sheet_name.is_none());
        assert_eq!(
            config.canonical_url(),
            format!("{}/sheet-123", DEFAULT_BASE_URL)
        );
    }

    #[test]
    fn test_config_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut config = SheetBridgeConfig::new();
        config.upsert_sheet(SheetConfig::new("sheet-a").with_sheet_name("Tasks"));
        config.upsert_sheet(SheetConfig::new("sheet-b"));
        config.save(&config_path).unwrap();

        let loaded = SheetBridgeConfig::load(&config_path).unwrap();
        assert_eq!(loaded.sheets.len(), 2);
        assert_eq!(loaded.sync_interval_secs, 30);
        assert_eq!(
            loaded.get_sheet("sheet-a").unwrap().sheet_name.as_deref(),
            Some("Tasks")
        );
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut config = SheetBridgeConfig::new();
        config.upsert_sheet(SheetConfig::new("sheet-a"));
        config.upsert_sheet(SheetConfig::new("sheet-a").with_sheet_name("Renamed"));

        assert_eq!(config.sheets.len(), 1);
        assert_eq!(
            config.get_sheet("sheet-a").unwrap().sheet_name.as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn test_remove_sheet() {
        let mut config = SheetBridgeConfig::new();
        config.upsert_sheet(SheetConfig::new("sheet-a"));

        assert!(config.remove_sheet("sheet-a").is_some());
        assert!(config.remove_sheet("sheet-a").is_none());
        assert!(config.sheets.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = SheetBridgeConfig::load(temp_dir.path().join("absent.yaml"));
        assert!(result.is_err());
    }
}
