//! Error type for the HTTP relay.

use std::error::Error as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),
    #[error("{0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Human-readable description used in the tool output.
    ///
    /// Falls back to `Unknown error` when the underlying error carries no description.
    #[must_use]
    pub fn message(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            msg
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(describe_reqwest_error(&value))
    }
}

/// Flatten a `reqwest::Error` and its source chain into one line.
///
/// `reqwest` only prints the outermost layer ("error sending request for url ..."), which hides
/// the actual cause (connection refused, DNS failure, TLS failure).
pub(crate) fn describe_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !msg.ends_with(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}
