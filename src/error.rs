//! Error types for the Bitfinex client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, BitfxError>;

#[derive(Debug, Error)]
pub enum BitfxError {
    /// Upstream answered with a content type or top-level body shape the
    /// client cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BitfxError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for BitfxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timeout: {err}"))
        } else if err.is_connect() {
            Self::Transport(format!("connection failed: {err}"))
        } else {
            Self::Transport(format!("request failed: {err}"))
        }
    }
}
