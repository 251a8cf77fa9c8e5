use std::sync::Arc;

use tracing::{info, warn};

use crate::domains::history::{HistoryItem, HistoryList, ResponsePayload};
use crate::error::Result;
use crate::notice::Notice;
use crate::services::prompt_input::{PromptInput, Submission};
use crate::storage::{Storage, HISTORY_KEY, WEBHOOK_URL_KEY};

pub const HISTORY_CLEARED: &str = "History cleared";

/// Root state: the active webhook URL and the persisted history.
pub struct Session {
    storage: Arc<dyn Storage>,
    webhook_url: String,
    history: HistoryList,
}

impl Session {
    /// Reads both keys once. An unreadable history is dropped, not reported.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let webhook_url = storage.get(WEBHOOK_URL_KEY)?.unwrap_or_default();
        let history = match storage.get(HISTORY_KEY)? {
            Some(raw) => HistoryList::from_json(&raw).unwrap_or_else(|err| {
                warn!("Failed to parse persisted history, starting empty: {}", err);
                HistoryList::new()
            }),
            None => HistoryList::new(),
        };

        info!(
            configured = !webhook_url.is_empty(),
            entries = history.len(),
            "Session loaded"
        );
        Ok(Self {
            storage,
            webhook_url,
            history,
        })
    }

    /// No URL and no history; used when the store cannot be read at startup.
    pub fn empty(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            webhook_url: String::new(),
            history: HistoryList::new(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    pub fn on_webhook_saved(&mut self, url: impl Into<String>) {
        self.webhook_url = url.into();
    }

    /// Prepends a fresh entry, keeps the newest ten, and writes the list back.
    pub fn on_prompt_sent(
        &mut self,
        prompt: &str,
        response: Option<ResponsePayload>,
    ) -> Result<&HistoryItem> {
        let mut updated = self.history.clone();
        updated.push_front(HistoryItem::new(prompt, response));
        self.storage.set(HISTORY_KEY, &updated.to_json()?)?;
        self.history = updated;

        let newest = &self.history.items()[0];
        info!(id = %newest.id, entries = self.history.len(), "History entry recorded");
        Ok(newest)
    }

    pub fn record(&mut self, submission: &Submission) -> Result<&HistoryItem> {
        self.on_prompt_sent(&submission.prompt, submission.response.clone())
    }

    /// Submits through `input` against the active URL and records the outcome.
    /// Rejected input leaves the history untouched.
    pub async fn send_prompt(&mut self, input: &PromptInput, prompt: &str) -> Result<Submission> {
        let submission = input.submit(prompt, &self.webhook_url).await?;
        self.record(&submission)?;
        Ok(submission)
    }

    /// Empties the list and deletes the stored key rather than writing `[]`.
    pub fn clear_history(&mut self) -> Result<Notice> {
        self.history = HistoryList::new();
        self.storage.remove(HISTORY_KEY)?;
        info!("History cleared");
        Ok(Notice::success(HISTORY_CLEARED))
    }
}
