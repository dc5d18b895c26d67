//! Custom error types for the dataset agent.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Status lookup failed: {0}")]
    StatusLookup(String),

    #[error("Fetch failed for endpoint '{endpoint}': {reason}")]
    Fetch { endpoint: String, reason: String },

    #[error("Request timed out for endpoint '{endpoint}'")]
    Timeout { endpoint: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Column '{0}' not present in cached payload")]
    UnknownColumn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed status payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed tabular payload: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
