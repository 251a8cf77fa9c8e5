//! Thin JSON-over-POST client for the user's webhook.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{HookPromptError, Result};

pub const PROBE_MESSAGE: &str = "This is a test message from your application";

/// Fixed body sent by the webhook test action.
pub fn probe_payload() -> Value {
    json!({
        "action": "test",
        "message": PROBE_MESSAGE,
    })
}

pub fn prompt_payload(prompt: &str) -> Value {
    json!({ "prompt": prompt })
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookReply {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body, or `{"message": status_text}` when the body is not JSON.
    pub body: Value,
}

impl WebhookReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `"<code> <reason>"`, as shown in failure notices.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.status_text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Sends one POST. Only transport failures are errors; any HTTP status
    /// comes back as a [`WebhookReply`].
    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookReply> {
        info!(url = %url, "Webhook request");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(payload)
            .send()
            .await
            .map_err(|e| HookPromptError::Http(e.to_string()))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        info!(url = %url, status = %status.as_u16(), "Webhook response");

        let body = match response.text().await {
            Ok(text) => parse_body(&text, &status_text),
            Err(err) => {
                debug!("Webhook body could not be read: {}", err);
                fallback_body(&status_text)
            }
        };

        Ok(WebhookReply {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

/// Never fails: anything that is not JSON becomes the status-text fallback.
pub fn parse_body(text: &str, status_text: &str) -> Value {
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| fallback_body(status_text))
}

fn fallback_body(status_text: &str) -> Value {
    json!({ "message": status_text })
}
