use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {status}")]
    Status { status: u16 },

    #[error("not connected")]
    Offline,

    #[error("idea {0} must not be blank")]
    Blank(&'static str),
}

pub type ClientResult<T> = Result<T, ClientError>;
