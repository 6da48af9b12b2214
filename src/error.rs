use crate::models::TodoId;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service responded with {status}: {body}")]
    Service { status: StatusCode, body: String },
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("image upload failed: {0}")]
    Upload(String),
}

impl ApiError {
    /// True for failures of the transport or the service itself, as opposed
    /// to a missing item or rejected input.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Service { .. })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("todo {0} is not in the current view")]
    UnknownItem(TodoId),
    #[error("todo {0} is still being saved")]
    InFlight(TodoId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{name} is not a valid number: {value}")]
    Number { name: &'static str, value: String },
}
