use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The document root is not a JSON object.
    #[error("ledger document must be a JSON object")]
    NotAnObject,
    /// A top-level field every document has to carry is absent.
    #[error("ledger document has no `{0}` field")]
    MissingField(&'static str),
    /// A history entry carries no month label, so it cannot be keyed.
    #[error("history entry {index} has no month label")]
    MissingMonth { index: usize },
    #[error("malformed ledger document: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
