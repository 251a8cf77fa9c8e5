pub mod domains;
pub mod error;
pub mod iced_ui;
pub mod logging;
pub mod notice;
pub mod render;
pub mod runtime_paths;
pub mod services;
pub mod storage;
pub mod webhook;

pub use error::HookPromptError;

pub type Result<T> = std::result::Result<T, HookPromptError>;
