pub mod prompt_input;
pub mod session;
pub mod single_flight;
pub mod webhook_config;

pub use prompt_input::{PromptInput, Submission};
pub use session::Session;
pub use webhook_config::{SavedWebhook, WebhookConfig, WebhookTester};
