use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backend::interface::{LedgerStore, Result};
use crate::core::{ingest, Ledger};

/// Keeps a ledger as a single JSON document on disk.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> JsonStore {
        JsonStore { path: path.as_ref().to_owned() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_owned();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonStore {
    /// A missing file reads as an empty ledger.
    fn read(&self) -> Result<Ledger> {
        if !self.path.exists() {
            log::info!("{} does not exist, starting an empty ledger", self.path.display());
            return Ok(Ledger::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let snapshot = ingest::parse_str(&text)?;
        log::info!("loaded {} months from {}", snapshot.history.len(), self.path.display());
        Ok(Ledger::from_snapshot(snapshot))
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            serde_json::to_writer_pretty(&mut file, ledger.snapshot())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        log::info!("saved ledger version {} to {}", ledger.version(), self.path.display());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::JsonStore;
    use crate::backend::{BackendError, LedgerStore};
    use crate::core::{AllocationTargets, CryptoHoldings, Ledger, MonthlyRecord, Wallet};

    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.set_targets(AllocationTargets::new(15.0, 35.0, 10.0, 40.0));
        ledger.upsert_month(MonthlyRecord {
            income: 3200.0,
            expenses: 2100.5,
            cash_balance: 4500.0,
            brokerage_balance_a: 12000.0,
            index_funds_balance: 15000.0,
            crypto_holdings: CryptoHoldings::new().with(Wallet::Binance, 2500.0),
            ..MonthlyRecord::new("2024-07")
        });
        ledger.upsert_month(MonthlyRecord::new("2024-08"));
        ledger.select_month("2024-07");
        ledger
    }

    #[fixture]
    fn ledger_json() -> serde_json::Value {
        let empty_wallets = json!({"binance": 0.0, "coinbase": 0.0, "kraken": 0.0, "coldStorage": 0.0});
        json!({
            "targets": {"cash": 15.0, "interestBearing": 35.0, "crypto": 10.0, "indexFunds": 40.0},
            "history": [
                {
                    "month": "2024-07",
                    "income": 3200.0,
                    "expenses": 2100.5,
                    "cashBalance": 4500.0,
                    "brokerageBalanceA": 12000.0,
                    "brokerageBalanceB": 0.0,
                    "indexFundsBalance": 15000.0,
                    "otherCashBalance": 0.0,
                    "cryptoHoldings": {"binance": 2500.0, "coinbase": 0.0, "kraken": 0.0, "coldStorage": 0.0}
                },
                {
                    "month": "2024-08",
                    "income": 0.0,
                    "expenses": 0.0,
                    "cashBalance": 0.0,
                    "brokerageBalanceA": 0.0,
                    "brokerageBalanceB": 0.0,
                    "indexFundsBalance": 0.0,
                    "otherCashBalance": 0.0,
                    "cryptoHoldings": empty_wallets
                }
            ],
            "selectedMonth": "2024-07"
        })
    }

    #[rstest]
    fn ledger_serialize(ledger: Ledger, ledger_json: serde_json::Value) {
        let serialised = serde_json::to_value(ledger.snapshot()).unwrap();
        assert_eq!(serialised, ledger_json);
    }

    #[rstest]
    fn save_then_read(ledger: Ledger) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("ledger.json"));

        store.save(&ledger).unwrap();
        let restored = store.read().unwrap();

        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert!(!dir.path().join("ledger.json.tmp").exists());
    }

    #[test]
    fn negative_wallet_survives_save_and_read() {
        let mut ledger = Ledger::new();
        ledger.upsert_month(MonthlyRecord {
            cash_balance: 100.0,
            crypto_holdings: CryptoHoldings::new().with(Wallet::Binance, -40.0),
            ..MonthlyRecord::new("Jan")
        });
        let before = ledger.get_months()[0].total_wealth();

        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("ledger.json"));
        store.save(&ledger).unwrap();
        let restored = store.read().unwrap();

        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert_eq!(restored.get_months()[0].total_wealth(), before);
        assert_eq!(before, 100.0);
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("absent.json"));

        let ledger = store.read().unwrap();
        assert!(ledger.get_months().is_empty());
    }

    #[test]
    fn invalid_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"history": []}"#).unwrap();

        let result = JsonStore::new(&path).read();
        assert!(matches!(result, Err(BackendError::Ingest(..))));
    }
}
