use std::path::PathBuf;

use thiserror::Error;

/// Failures at the input boundary. Graph construction and layout never fail;
/// everything that can go wrong happens while reading records or config.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid topic name format: {0}")]
    InvalidTopicName(String),
    #[error("invalid subscription name format: {0}")]
    InvalidSubscriptionName(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid {what} document: {source}")]
    Json {
        what: &'static str,
        source: serde_json::Error,
    },
}
