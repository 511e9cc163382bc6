use thiserror::Error;

/// Everything that can go wrong while mutating or persisting a mailbox.
///
/// Missing ids are never errors; mutators treat them as no-ops.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid category: {0:?}")]
    InvalidCategory(String),

    #[error("attachment encoding failed: {0}")]
    Encoding(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for MailError {
    fn from(err: rusqlite::Error) -> Self {
        MailError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailError>;
