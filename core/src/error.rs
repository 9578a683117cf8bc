//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The record store answered, but reported the operation as unsuccessful
    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl Error {
    /// True for validation failures that were caught before any request was sent
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Message suitable for a notification, without the variant prefix
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::Remote(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_) | Self::ProjectNotFound(_))
    }
}
