pub mod record;
pub mod targets;
pub mod label;
pub mod ledger;
pub mod engine;
pub mod analysis;
pub mod evolution;
pub mod ingest;
pub mod error;

pub use record::{Amount, MonthlyRecord, Wallet, CryptoHoldings, Distribution};
pub use targets::{AllocationTargets, Category, CategoryValues};
pub use ledger::{Ledger, LedgerSnapshot, UpsertOutcome};
pub use error::IngestError;
