//! Error types for calls to the chat-completion endpoint

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI endpoint is not configured")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI endpoint returned no content")]
    EmptyResponse,

    #[error("AI response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AI response failed validation: {0}")]
    Schema(String),
}
