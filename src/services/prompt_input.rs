use tracing::{info, warn};

use crate::domains::history::ResponsePayload;
use crate::error::{HookPromptError, Result};
use crate::notice::Notice;
use crate::services::single_flight::InFlight;
use crate::webhook::{prompt_payload, WebhookClient};

pub const EMPTY_PROMPT: &str = "Please enter a prompt";
pub const MISSING_WEBHOOK: &str = "Please configure your n8n webhook URL first";
pub const SEND_SUCCESS: &str = "Prompt sent successfully!";

/// A submission that reached the network, whatever the outcome. Each one
/// becomes exactly one history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The prompt as typed, before trimming.
    pub prompt: String,
    /// Present only when the webhook answered with a 2xx status.
    pub response: Option<ResponsePayload>,
    pub notice: Notice,
}

impl Submission {
    pub fn succeeded(&self) -> bool {
        self.notice.is_success()
    }
}

#[derive(Debug, Default)]
pub struct PromptInput {
    client: WebhookClient,
    in_flight: InFlight,
}

impl PromptInput {
    pub fn new(client: WebhookClient) -> Self {
        Self {
            client,
            in_flight: InFlight::new(),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Validation failures and a concurrent submission are `Err` and make no
    /// request. Everything after the request was attempted is a [`Submission`].
    pub async fn submit(&self, prompt: &str, webhook_url: &str) -> Result<Submission> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(HookPromptError::Validation(EMPTY_PROMPT.to_string()));
        }
        if webhook_url.is_empty() {
            return Err(HookPromptError::Validation(MISSING_WEBHOOK.to_string()));
        }
        let _guard = self.in_flight.try_begin().ok_or_else(|| {
            HookPromptError::Busy("A prompt is already being sent".to_string())
        })?;

        let submission = match self
            .client
            .post_json(webhook_url, &prompt_payload(trimmed))
            .await
        {
            Ok(reply) if reply.is_success() => {
                info!(status = reply.status, "Prompt delivered");
                Submission {
                    prompt: prompt.to_string(),
                    response: ResponsePayload::from_json(reply.body),
                    notice: Notice::success(SEND_SUCCESS),
                }
            }
            Ok(reply) => {
                warn!(status = reply.status, "Webhook rejected prompt");
                Submission {
                    prompt: prompt.to_string(),
                    response: None,
                    notice: Notice::error(format!(
                        "Failed to send prompt: {}",
                        reply.status_line()
                    )),
                }
            }
            Err(err) => {
                warn!("Prompt could not be sent: {}", err);
                Submission {
                    prompt: prompt.to_string(),
                    response: None,
                    notice: Notice::error(format!(
                        "Failed to send prompt: {}",
                        err.user_message()
                    )),
                }
            }
        };

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_prompts_are_rejected_before_any_request() {
        let input = PromptInput::default();
        for prompt in ["", "   ", "\n\t "] {
            // An unroutable URL: reaching the network would not yield a validation error.
            let err = input
                .submit(prompt, "http://127.0.0.1:1/hook")
                .await
                .unwrap_err();
            assert!(matches!(err, HookPromptError::Validation(_)));
            assert_eq!(err.user_message(), EMPTY_PROMPT);
        }
    }

    #[tokio::test]
    async fn missing_webhook_is_rejected() {
        let input = PromptInput::default();
        let err = input.submit("test", "").await.unwrap_err();
        assert_eq!(err.user_message(), MISSING_WEBHOOK);
        assert!(!input.is_sending());
    }
}
