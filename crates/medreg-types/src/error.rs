use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("record is missing the `{0}` field")]
    MissingRecordId(&'static str),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
