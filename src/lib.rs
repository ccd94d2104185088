mod core;
pub mod backend;
pub mod logging;

pub use crate::core::{Ledger, LedgerSnapshot, MonthlyRecord, AllocationTargets, Category, Wallet};
pub use crate::core::{record, targets, label, ledger, engine, analysis, evolution, ingest, error};
