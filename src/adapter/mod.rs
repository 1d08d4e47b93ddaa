//! Spreadsheet Adapter
//!
//! Per-connection proxy issuing read/append/update/delete operations against
//! the remote tabular API, selecting among available credentials.
//!
//! The [`TableAdapter`] trait is the seam the bridge depends on; the shipped
//! implementation is [`SheetsAdapter`] over HTTP, and tests substitute
//! in-memory fakes.

mod credentials;
mod sheets;
mod webhook;

pub use credentials::{CredentialSet, ReadAuth, ResolvedCredentials, WriteAuth};
pub use sheets::SheetsAdapter;
pub use webhook::{WebhookAction, WebhookClient, WebhookRequest, WebhookTask};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw table payload as returned verbatim by the remote source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTablePayload {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
    #[serde(default)]
    pub range: String,
    #[serde(default, rename = "majorDimension")]
    pub major_dimension: String,
}

impl RawTablePayload {
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|row| {
            row.iter().all(|cell| cell.trim().is_empty())
        })
    }
}

/// Receipt for a write issued to the remote source
#[derive(Debug, Clone, Default)]
pub struct WriteReceipt {
    /// Range the remote source reports it touched, when it reports one
    pub updated_range: Option<String>,
    pub updated_rows: u32,
}

/// Result of probing a sheet before the first bind
#[derive(Debug, Clone)]
pub struct ConnectionProbe {
    pub success: bool,
    pub title: String,
    pub sheet_names: Vec<String>,
}

/// Async proxy for one remote tabular data source
///
/// Row indexes are 1-based physical addresses. `delete_row` shifts every
/// subsequent row up by one on the remote side; renumbering cached tasks is
/// the caller's responsibility.
#[async_trait]
pub trait TableAdapter: Send + Sync {
    /// Fetch all values in a range
    async fn fetch_all(&self, range: &str) -> Result<RawTablePayload>;

    /// Append one row at the end of the data range
    async fn append(&self, row: Vec<String>) -> Result<WriteReceipt>;

    /// Overwrite exactly the columns supplied, starting at column A of the row
    async fn update_range(&self, row_index: u32, values: Vec<String>) -> Result<()>;

    /// Structurally remove a row; subsequent rows shift up by one
    async fn delete_row(&self, row_index: u32) -> Result<()>;

    /// Validate reachability and credentials without mutating state
    async fn test_connection(&self) -> Result<ConnectionProbe>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_emptiness() {
        let empty = RawTablePayload {
            values: vec![],
            range: "A1:F1".to_string(),
            major_dimension: "ROWS".to_string(),
        };
        assert!(empty.is_empty());

        let blank_cells = RawTablePayload {
            values: vec![vec!["".to_string(), "  ".to_string()]],
            range: String::new(),
            major_dimension: String::new(),
        };
        assert!(blank_cells.is_empty());

        let populated = RawTablePayload {
            values: vec![vec!["Task".to_string()]],
            range: String::new(),
            major_dimension: String::new(),
        };
        assert!(!populated.is_empty());
    }

    #[test]
    fn test_payload_deserializes_without_values() {
        // The remote API omits `values` entirely for an empty range
        let payload: RawTablePayload =
            serde_json::from_str(r#"{"range":"Sheet1!A1:F1","majorDimension":"ROWS"}"#).unwrap();
        assert!(payload.values.is_empty());
        assert_eq!(payload.range, "Sheet1!A1:F1");
    }
}
