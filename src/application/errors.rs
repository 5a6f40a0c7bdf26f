use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Failed to encode {what}: {reason}")]
    Encode { what: String, reason: String },

    #[error("No seed data is defined for key {0}")]
    UnknownKey(String),

    #[error("Unauthorized: the backend rejected the bearer token")]
    Unauthorized,

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend reported failure: {0}")]
    Backend(String),
}

impl DataError {
    pub fn decode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DataError::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DataError::Encode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DataError::decode("response body", err)
        } else {
            DataError::Transport(err.to_string())
        }
    }
}
