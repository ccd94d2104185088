use thiserror::Error;

use crate::core::{IngestError, Ledger};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode ledger: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored ledger is invalid: {0}")]
    Ingest(#[from] IngestError),
    #[error("could not write csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Somewhere a ledger is loaded from at startup and saved to after changes.
pub trait LedgerStore {
    fn read(&self) -> Result<Ledger>;
    fn save(&self, ledger: &Ledger) -> Result<()>;
}
