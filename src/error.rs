use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("helpdesk responded with status {status} for {url}\n{body}")]
    HelpdeskStatus {
        status: String,
        url: String,
        body: String,
    },
    #[error("helpdesk request failed: {0}")]
    HelpdeskTransport(String),
    #[error("unexpected helpdesk response: {0}")]
    HelpdeskResponse(String),
    #[error("failed to encode helpdesk request: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
