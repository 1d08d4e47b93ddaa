//! Webhook write channel
//!
//! Fallback write path for configurations that only hold a read-only key:
//! mutations are posted to an externally hosted endpoint that owns the
//! privileged write access to the sheet.

use crate::error::SheetBridgeError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for webhook calls
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// Mutation kind understood by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookAction {
    Add,
    Update,
    Delete,
}

/// Task fields as the webhook protocol names them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTask {
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl WebhookTask {
    /// Build from an A..F row (title, status, description, assignee, priority, due date)
    pub fn from_row(row: &[String]) -> Self {
        let opt = |i: usize| {
            row.get(i)
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.to_string())
        };
        Self {
            title: row.first().cloned().unwrap_or_default(),
            status: row.get(1).cloned().unwrap_or_default(),
            description: opt(2),
            assignee: opt(3),
            priority: opt(4),
            due_date: opt(5),
        }
    }
}

/// Request envelope posted to the endpoint
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRequest {
    pub action: WebhookAction,
    #[serde(rename = "rowIndex", skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<WebhookTask>,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for one webhook endpoint
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Post one mutation and interpret the `{success, error?}` envelope
    pub async fn dispatch(&self, request: WebhookRequest) -> Result<()> {
        debug!(action = ?request.action, row_index = ?request.row_index, "Dispatching webhook mutation");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(WEBHOOK_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetBridgeError::RemoteHttp {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: WebhookResponse = response.json().await?;
        if !envelope.success {
            return Err(SheetBridgeError::Webhook(
                envelope.error.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }

        info!(action = ?request.action, "Webhook mutation accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&WebhookAction::Add).unwrap(),
            "\"ADD\""
        );
        assert_eq!(
            serde_json::to_string(&WebhookAction::Delete).unwrap(),
            "\"DELETE\""
        );
    }

    #[test]
    fn test_request_envelope_shape() {
        let request = WebhookRequest {
            action: WebhookAction::Update,
            row_index: Some(4),
            task: Some(WebhookTask::from_row(&[
                "Buy milk".to_string(),
                "pending".to_string(),
            ])),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "UPDATE");
        assert_eq!(json["rowIndex"], 4);
        assert_eq!(json["task"]["title"], "Buy milk");
        // Empty optional columns are omitted, not sent as nulls
        assert!(json["task"].get("description").is_none());
    }

    #[test]
    fn test_webhook_task_from_sparse_row() {
        let task = WebhookTask::from_row(&[
            "Title".to_string(),
            "done".to_string(),
            "".to_string(),
            "alice".to_string(),
        ]);
        assert_eq!(task.title, "Title");
        assert!(task.description.is_none());
        assert_eq!(task.assignee.as_deref(), Some("alice"));
        assert!(task.due_date.is_none());
    }
}
