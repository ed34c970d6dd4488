use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url `{value}`: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
}
