//! HTTP adapter for the remote spreadsheet API

use super::credentials::{ReadAuth, ResolvedCredentials, WriteAuth};
use super::webhook::{WebhookAction, WebhookClient, WebhookRequest, WebhookTask};
use super::{ConnectionProbe, RawTablePayload, TableAdapter, WriteReceipt};
use crate::config::SheetConfig;
use crate::error::SheetBridgeError;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for value reads
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for append/update/structural operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Spreadsheet API client for one bound sheet
///
/// Credentials are probed once at construction; the structural grid id needed
/// by the delete path is resolved lazily from a metadata read and cached for
/// the adapter's lifetime (registry memoization makes that cache shared).
pub struct SheetsAdapter {
    client: Client,
    config: SheetConfig,
    credentials: ResolvedCredentials,
    grid_id: Mutex<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: AppendUpdates,
}

#[derive(Debug, Default, Deserialize)]
struct AppendUpdates {
    #[serde(default, rename = "updatedRange")]
    updated_range: Option<String>,
    #[serde(default, rename = "updatedRows")]
    updated_rows: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SheetMetadata {
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: TabProperties,
}

#[derive(Debug, Default, Deserialize)]
struct TabProperties {
    #[serde(default, rename = "sheetId")]
    sheet_id: Option<i64>,
    #[serde(default)]
    title: String,
}

impl SheetsAdapter {
    /// Create a new adapter, probing credentials once
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: SheetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("sheetbridge/0.3"),
                );
                headers
            })
            .build()?;

        let credentials = config.credentials.resolve(Utc::now());

        Ok(Self {
            client,
            config,
            credentials,
            grid_id: Mutex::new(None),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.config.spreadsheet_id
    }

    pub fn can_write(&self) -> bool {
        self.credentials.write.is_some()
    }

    /// Prefix a cell range with the configured tab name
    fn range_ref(&self, range: &str) -> String {
        match self.config.sheet_name {
            Some(ref name) => format!("{}!{}", name, range),
            None => range.to_string(),
        }
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.spreadsheet_id
        )
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(&self.range_ref(range))
        )
    }

    fn read_auth(&self) -> Result<&ReadAuth> {
        self.credentials
            .read
            .as_ref()
            .ok_or(SheetBridgeError::NoAuthentication)
    }

    fn write_auth(&self) -> Result<&WriteAuth> {
        self.credentials.write.as_ref().ok_or_else(|| {
            SheetBridgeError::Permission(
                "write requires a bearer token or a webhook endpoint".to_string(),
            )
        })
    }

    fn apply_read_auth(&self, request: RequestBuilder, auth: &ReadAuth) -> RequestBuilder {
        match auth {
            ReadAuth::Bearer(token) => request.bearer_auth(token),
            ReadAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
        }
    }

    /// Surface a non-success response as a typed remote error
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SheetBridgeError::RemoteHttp {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn fetch_metadata(&self) -> Result<SheetMetadata> {
        let auth = self.read_auth()?;
        let url = self.spreadsheet_url();

        debug!(spreadsheet = %self.config.spreadsheet_id, "Fetching sheet metadata");

        let request = self
            .apply_read_auth(self.client.get(&url), auth)
            .query(&[("fields", "properties.title,sheets.properties")])
            .timeout(GET_TIMEOUT);

        let response = Self::check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Resolve the backing table's internal structural id, caching the result
    async fn resolve_grid_id(&self) -> Result<i64> {
        if let Some(id) = *self.grid_id.lock().expect("grid id lock poisoned") {
            return Ok(id);
        }

        let metadata = self.fetch_metadata().await?;
        let wanted = self.config.sheet_name.as_deref();

        let id = metadata
            .sheets
            .iter()
            .filter(|s| wanted.is_none_or(|name| s.properties.title == name))
            .find_map(|s| s.properties.sheet_id)
            .ok_or_else(|| {
                SheetBridgeError::MissingMetadata(format!(
                    "no structural id for sheet {:?} in spreadsheet {}",
                    wanted.unwrap_or("<first>"),
                    self.config.spreadsheet_id
                ))
            })?;

        *self.grid_id.lock().expect("grid id lock poisoned") = Some(id);
        Ok(id)
    }

    fn webhook_client(&self, url: &str) -> WebhookClient {
        WebhookClient::new(self.client.clone(), url)
    }

    /// Compute the `A{row}:{col}{row}` reference covering `width` columns
    fn row_range(row_index: u32, width: usize) -> String {
        let last = (b'A' + (width.saturating_sub(1).min(25)) as u8) as char;
        format!("A{}:{}{}", row_index, last, row_index)
    }
}

#[async_trait]
impl TableAdapter for SheetsAdapter {
    async fn fetch_all(&self, range: &str) -> Result<RawTablePayload> {
        let auth = self.read_auth()?;
        let url = self.values_url(range);

        debug!(range = %range, "Fetching sheet values");

        let request = self
            .apply_read_auth(self.client.get(&url), auth)
            .timeout(GET_TIMEOUT);
        let response = Self::check_status(request.send().await?).await?;
        let payload: RawTablePayload = response.json().await?;

        debug!(rows = payload.values.len(), "Sheet values fetched");
        Ok(payload)
    }

    async fn append(&self, row: Vec<String>) -> Result<WriteReceipt> {
        match self.write_auth()? {
            WriteAuth::Bearer(token) => {
                let url = format!("{}:append", self.values_url("A:F"));
                let body = serde_json::json!({ "values": [row] });

                let request = self
                    .client
                    .post(&url)
                    .bearer_auth(token)
                    .query(&[
                        ("valueInputOption", "USER_ENTERED"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&body)
                    .timeout(WRITE_TIMEOUT);

                let response = Self::check_status(request.send().await?).await?;
                let parsed: AppendResponse = response.json().await?;

                info!(range = ?parsed.updates.updated_range, "Row appended");
                Ok(WriteReceipt {
                    updated_range: parsed.updates.updated_range,
                    updated_rows: parsed.updates.updated_rows.max(1),
                })
            }
            WriteAuth::Webhook(url) => {
                self.webhook_client(url)
                    .dispatch(WebhookRequest {
                        action: WebhookAction::Add,
                        row_index: None,
                        task: Some(WebhookTask::from_row(&row)),
                    })
                    .await?;
                Ok(WriteReceipt {
                    updated_range: None,
                    updated_rows: 1,
                })
            }
        }
    }

    async fn update_range(&self, row_index: u32, values: Vec<String>) -> Result<()> {
        match self.write_auth()? {
            WriteAuth::Bearer(token) => {
                let range = Self::row_range(row_index, values.len());
                let url = self.values_url(&range);
                let body = serde_json::json!({ "values": [values] });

                debug!(range = %range, "Updating row");

                let request = self
                    .client
                    .put(&url)
                    .bearer_auth(token)
                    .query(&[("valueInputOption", "USER_ENTERED")])
                    .json(&body)
                    .timeout(WRITE_TIMEOUT);

                Self::check_status(request.send().await?).await?;
                Ok(())
            }
            WriteAuth::Webhook(url) => {
                self.webhook_client(url)
                    .dispatch(WebhookRequest {
                        action: WebhookAction::Update,
                        row_index: Some(row_index),
                        task: Some(WebhookTask::from_row(&values)),
                    })
                    .await
            }
        }
    }

    async fn delete_row(&self, row_index: u32) -> Result<()> {
        match self.write_auth()? {
            WriteAuth::Bearer(token) => {
                // Step 1: resolve the internal grid id from table metadata
                let grid_id = self.resolve_grid_id().await?;

                // Step 2: structural removal; the interval is half-open and
                // 0-based, so physical row N maps to [N-1, N)
                let url = format!("{}:batchUpdate", self.spreadsheet_url());
                let body = serde_json::json!({
                    "requests": [{
                        "deleteDimension": {
                            "range": {
                                "sheetId": grid_id,
                                "dimension": "ROWS",
                                "startIndex": row_index.saturating_sub(1),
                                "endIndex": row_index,
                            }
                        }
                    }]
                });

                info!(row_index, grid_id, "Deleting row");

                let request = self
                    .client
                    .post(&url)
                    .bearer_auth(token)
                    .json(&body)
                    .timeout(WRITE_TIMEOUT);

                Self::check_status(request.send().await?).await?;
                Ok(())
            }
            WriteAuth::Webhook(url) => {
                self.webhook_client(url)
                    .dispatch(WebhookRequest {
                        action: WebhookAction::Delete,
                        row_index: Some(row_index),
                        task: None,
                    })
                    .await
            }
        }
    }

    async fn test_connection(&self) -> Result<ConnectionProbe> {
        let metadata = self.fetch_metadata().await?;

        Ok(ConnectionProbe {
            success: true,
            title: metadata.properties.title,
            sheet_names: metadata
                .sheets
                .into_iter()
                .map(|s| s.properties.title)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CredentialSet;

    fn test_config(credentials: CredentialSet) -> SheetConfig {
        SheetConfig::new("sheet-123").with_credentials(credentials)
    }

    #[test]
    fn test_adapter_creation() {
        let adapter =
            SheetsAdapter::new(test_config(CredentialSet::default().with_api_key("key")))
                .expect("Failed to create adapter");
        assert_eq!(adapter.spreadsheet_id(), "sheet-123");
        assert!(!adapter.can_write());
    }

    #[test]
    fn test_bearer_enables_writes() {
        let adapter =
            SheetsAdapter::new(test_config(CredentialSet::default().with_bearer("tok")))
                .expect("Failed to create adapter");
        assert!(adapter.can_write());
    }

    #[test]
    fn test_range_ref_with_tab_name() {
        let config = SheetConfig::new("sheet-123")
            .with_sheet_name("Tasks")
            .with_credentials(CredentialSet::default().with_api_key("key"));
        let adapter = SheetsAdapter::new(config).unwrap();

        assert_eq!(adapter.range_ref("A1:F1000"), "Tasks!A1:F1000");
        assert!(adapter.values_url("A1:F1000").ends_with("Tasks%21A1%3AF1000"));
    }

    #[test]
    fn test_row_range() {
        assert_eq!(SheetsAdapter::row_range(4, 6), "A4:F4");
        assert_eq!(SheetsAdapter::row_range(12, 2), "A12:B12");
        assert_eq!(SheetsAdapter::row_range(1, 1), "A1:A1");
    }

    #[tokio::test]
    async fn test_reads_without_credentials_fail() {
        let adapter = SheetsAdapter::new(test_config(CredentialSet::default())).unwrap();
        let err = adapter.fetch_all("A1:F10").await.unwrap_err();
        assert!(matches!(err, SheetBridgeError::NoAuthentication));
    }

    #[tokio::test]
    async fn test_writes_with_read_only_key_fail() {
        let adapter =
            SheetsAdapter::new(test_config(CredentialSet::default().with_api_key("key"))).unwrap();
        let err = adapter.append(vec!["Buy milk".to_string()]).await.unwrap_err();
        assert!(matches!(err, SheetBridgeError::Permission(_)));
    }
}
