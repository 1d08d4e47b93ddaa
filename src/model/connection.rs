//! Connection descriptor and derived sync state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor of the currently bound sheet
///
/// One active connection per bridge instance; created by `connect()`,
/// destroyed by `disconnect()`. Persisted as JSON in the key/value store so
/// a restart can re-bind the same sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// External spreadsheet identifier
    pub external_id: String,

    /// Human-readable title reported by the remote source
    pub display_name: String,

    /// Canonical URL for opening the sheet in a browser
    pub canonical_url: String,

    /// When the connection was established (RFC 3339)
    pub connected_at: String,
}

impl Connection {
    pub fn new(
        external_id: impl Into<String>,
        display_name: impl Into<String>,
        canonical_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
            canonical_url: canonical_url.into(),
            connected_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A previously connected sheet, remembered per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub id: String,
    pub name: String,
    pub url: String,
    pub connected_at: String,
    #[serde(default)]
    pub last_accessed_at: Option<String>,
}

impl From<&Connection> for SavedConnection {
    fn from(conn: &Connection) -> Self {
        Self {
            id: conn.external_id.clone(),
            name: conn.display_name.clone(),
            url: conn.canonical_url.clone(),
            connected_at: conn.connected_at.clone(),
            last_accessed_at: None,
        }
    }
}

/// Ephemeral snapshot of the bridge's sync status; derived, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub is_loading: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub task_count: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_serialization() {
        let conn = Connection::new("sheet-123", "Team Tasks", "https://example.com/sheet-123");
        let json = serde_json::to_string(&conn).unwrap();
        let back: Connection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conn);
    }

    #[test]
    fn test_saved_connection_from_connection() {
        let conn = Connection::new("sheet-123", "Team Tasks", "https://example.com/sheet-123");
        let saved = SavedConnection::from(&conn);
        assert_eq!(saved.id, "sheet-123");
        assert_eq!(saved.name, "Team Tasks");
        assert!(saved.last_accessed_at.is_none());
    }
}
