mod json_store;
mod interface;
mod csv_export;

pub use interface::{LedgerStore, Result, BackendError};
pub use json_store::JsonStore;
pub use csv_export::{write_csv, to_csv_string};
