use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{HookPromptError, Result};
use crate::notice::Notice;
use crate::services::single_flight::InFlight;
use crate::storage::{Storage, WEBHOOK_URL_KEY};
use crate::webhook::{probe_payload, WebhookClient};

pub const SAVE_SUCCESS: &str = "Webhook URL saved successfully";
pub const MISSING_URL: &str = "Please enter a webhook URL";
pub const INVALID_URL: &str = "Please enter a valid URL";
pub const MISSING_URL_FOR_TEST: &str = "Please enter a webhook URL first";
pub const TEST_SUCCESS: &str = "Webhook test successful!";

/// Result of a successful save, handed to whoever owns the active URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedWebhook {
    pub url: String,
    pub notice: Notice,
}

/// Editable webhook URL plus the open/closed state of its editing panel.
pub struct WebhookConfig {
    storage: Arc<dyn Storage>,
    url: String,
    open: bool,
}

impl WebhookConfig {
    /// Starts from the persisted URL, or empty when none was saved.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let url = storage.get(WEBHOOK_URL_KEY)?.unwrap_or_default();
        Ok(Self {
            storage,
            url,
            open: false,
        })
    }

    pub fn empty(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            url: String::new(),
            open: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Persists `url` verbatim. Empty or non-absolute URLs are rejected and
    /// leave the stored value untouched.
    pub fn save(&mut self, url: &str) -> Result<SavedWebhook> {
        validate_webhook_url(url)?;

        self.storage.set(WEBHOOK_URL_KEY, url)?;
        self.url = url.to_string();
        self.open = false;
        info!(url = %url, "Webhook URL saved");

        Ok(SavedWebhook {
            url: url.to_string(),
            notice: Notice::success(SAVE_SUCCESS),
        })
    }

    /// Saves whatever is currently in the editable field.
    pub fn save_current(&mut self) -> Result<SavedWebhook> {
        let url = self.url.clone();
        self.save(&url)
    }
}

pub fn validate_webhook_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(HookPromptError::Validation(MISSING_URL.to_string()));
    }
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|_| HookPromptError::Validation(INVALID_URL.to_string()))
}

/// Sends the fixed probe payload. Never touches storage.
#[derive(Debug, Default)]
pub struct WebhookTester {
    client: WebhookClient,
    in_flight: InFlight,
}

impl WebhookTester {
    pub fn new(client: WebhookClient) -> Self {
        Self {
            client,
            in_flight: InFlight::new(),
        }
    }

    pub fn is_testing(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub async fn test(&self, url: &str) -> Result<Notice> {
        if url.is_empty() {
            return Err(HookPromptError::Validation(MISSING_URL_FOR_TEST.to_string()));
        }
        let _guard = self.in_flight.try_begin().ok_or_else(|| {
            HookPromptError::Busy("A webhook test is already running".to_string())
        })?;

        let reply = self
            .client
            .post_json(url, &probe_payload())
            .await
            .map_err(|err| {
                warn!(url = %url, "Webhook test could not be sent: {}", err);
                HookPromptError::Http(format!("Webhook test failed: {}", err.user_message()))
            })?;

        if reply.is_success() {
            Ok(Notice::success(TEST_SUCCESS))
        } else {
            warn!(url = %url, status = reply.status, "Webhook test rejected");
            Err(HookPromptError::Http(format!(
                "Webhook test failed: {}",
                reply.status_line()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn config_with(stored: Option<&str>) -> (Arc<MemoryStorage>, WebhookConfig) {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(url) = stored {
            storage.set(WEBHOOK_URL_KEY, url).unwrap();
        }
        let config = WebhookConfig::load(storage.clone()).unwrap();
        (storage, config)
    }

    #[test]
    fn load_without_saved_url_starts_empty() {
        let (_, config) = config_with(None);
        assert_eq!(config.url(), "");
        assert!(!config.is_open());
    }

    #[test]
    fn load_reads_the_persisted_url() {
        let (_, config) = config_with(Some("https://n8n.example/webhook/abc"));
        assert_eq!(config.url(), "https://n8n.example/webhook/abc");
    }

    #[test]
    fn invalid_urls_leave_storage_unchanged() {
        let (storage, mut config) = config_with(Some("https://kept.example/hook"));
        for bad in ["", "not a url", "/relative/path", "example.com/hook", "http://"] {
            let err = config.save(bad).unwrap_err();
            assert!(matches!(err, HookPromptError::Validation(_)), "{bad:?}");
            assert_eq!(
                storage.get(WEBHOOK_URL_KEY).unwrap().as_deref(),
                Some("https://kept.example/hook")
            );
        }
        assert_eq!(config.save("").unwrap_err().user_message(), MISSING_URL);
        assert_eq!(config.save("nope").unwrap_err().user_message(), INVALID_URL);
    }

    #[test]
    fn saving_twice_is_idempotent_and_closes_the_panel() {
        let (storage, mut config) = config_with(None);
        config.set_open(true);

        let first = config.save("https://n8n.example/webhook/1").unwrap();
        config.set_open(true);
        let second = config.save("https://n8n.example/webhook/1").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.notice, Notice::success(SAVE_SUCCESS));
        assert!(!config.is_open());
        assert_eq!(
            storage.get(WEBHOOK_URL_KEY).unwrap().as_deref(),
            Some("https://n8n.example/webhook/1")
        );
    }

    #[test]
    fn save_current_uses_the_edited_value() {
        let (storage, mut config) = config_with(None);
        config.set_url("http://localhost:5678/webhook/x");
        let saved = config.save_current().unwrap();
        assert_eq!(saved.url, "http://localhost:5678/webhook/x");
        assert_eq!(
            storage.get(WEBHOOK_URL_KEY).unwrap().as_deref(),
            Some("http://localhost:5678/webhook/x")
        );
    }

    #[tokio::test]
    async fn test_with_empty_url_fails_fast() {
        let tester = WebhookTester::default();
        let err = tester.test("").await.unwrap_err();
        assert_eq!(err.user_message(), MISSING_URL_FOR_TEST);
        assert!(!tester.is_testing());
    }
}
