use thiserror::Error;

use crate::config::{CI_PASSWORD_VAR, SESSION_PASSWORD_VAR};

#[derive(Debug, Error)]
pub enum AskpassError {
    #[error(
        "No password available. Set {} or {}, run `sudo-askpass store`, \
         or run sudo from a terminal.",
        CI_PASSWORD_VAR,
        SESSION_PASSWORD_VAR
    )]
    NoPassword,

    #[error("{backend} operation failed: {detail}")]
    Store {
        backend: &'static str,
        detail: String,
    },

    #[error("`{0}` is not installed or not on PATH.")]
    ToolMissing(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AskpassError {
    pub fn store(backend: &'static str, detail: impl Into<String>) -> Self {
        Self::Store {
            backend,
            detail: detail.into(),
        }
    }
}
