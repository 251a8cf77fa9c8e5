use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookPromptError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("busy: {0}")]
    Busy(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl HookPromptError {
    /// The message without the category prefix, for status lines.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Validation(msg)
            | Self::Busy(msg)
            | Self::Http(msg)
            | Self::Serialization(msg)
            | Self::Storage(msg)
            | Self::Runtime(msg) => msg,
        }
    }
}

impl From<serde_json::Error> for HookPromptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub use crate::Result;
