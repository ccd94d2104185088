use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::core::targets::CategoryValues;

pub type Amount = f64;

/// The crypto wallets tracked on every record. The set is closed: a record
/// always carries a balance for each of them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Wallet {
    Binance,
    Coinbase,
    Kraken,
    ColdStorage,
}

impl Wallet {
    pub const ALL: [Wallet; 4] = [Wallet::Binance, Wallet::Coinbase, Wallet::Kraken, Wallet::ColdStorage];

    pub fn key(&self) -> &'static str {
        match self {
            Wallet::Binance => "binance",
            Wallet::Coinbase => "coinbase",
            Wallet::Kraken => "kraken",
            Wallet::ColdStorage => "coldStorage",
        }
    }

    /// Case-insensitive lookup by serialised key.
    pub fn from_key(key: &str) -> Option<Wallet> {
        Wallet::ALL.into_iter()
            .find(|wallet| wallet.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Balance per wallet. Every wallet of [`Wallet::ALL`] is present; wallets
/// missing from the input are stored as zero.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Wallet, Amount>", into = "BTreeMap<Wallet, Amount>")]
pub struct CryptoHoldings {
    balances: BTreeMap<Wallet, Amount>,
}

impl CryptoHoldings {
    pub fn new() -> CryptoHoldings {
        CryptoHoldings {
            balances: Wallet::ALL.into_iter().map(|wallet| (wallet, 0.0)).collect(),
        }
    }

    pub fn with(mut self, wallet: Wallet, balance: Amount) -> CryptoHoldings {
        self.set(wallet, balance);
        self
    }

    pub fn get(&self, wallet: Wallet) -> Amount {
        self.balances.get(&wallet).copied().unwrap_or(0.0)
    }

    /// Wallet balances are never negative; a negative balance is stored as zero.
    pub fn set(&mut self, wallet: Wallet, balance: Amount) {
        let balance = if balance < 0.0 {
            log::warn!("negative {} balance {} clamped to 0", wallet, balance);
            0.0
        } else {
            balance
        };
        self.balances.insert(wallet, balance);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Wallet, Amount)> + '_ {
        self.balances.iter().map(|(wallet, balance)| (*wallet, *balance))
    }

    pub fn total(&self) -> Amount {
        self.balances.values().sum()
    }
}

impl Default for CryptoHoldings {
    fn default() -> Self {
        CryptoHoldings::new()
    }
}

impl From<BTreeMap<Wallet, Amount>> for CryptoHoldings {
    fn from(map: BTreeMap<Wallet, Amount>) -> Self {
        let mut holdings = CryptoHoldings::new();
        for (wallet, balance) in map {
            holdings.set(wallet, balance);
        }
        holdings
    }
}

impl From<CryptoHoldings> for BTreeMap<Wallet, Amount> {
    fn from(holdings: CryptoHoldings) -> Self {
        holdings.balances
    }
}

/// Breakdown of a month's wealth into allocation categories, with the
/// crypto aggregate also kept per wallet.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub cash: Amount,
    pub interest_bearing: Amount,
    pub crypto: Amount,
    pub index_funds: Amount,
    pub crypto_by_wallet: CryptoHoldings,
}

impl Distribution {
    pub fn total(&self) -> Amount {
        self.cash + self.interest_bearing + self.crypto + self.index_funds
    }

    pub fn amounts(&self) -> CategoryValues {
        CategoryValues {
            cash: self.cash,
            interest_bearing: self.interest_bearing,
            crypto: self.crypto,
            index_funds: self.index_funds,
        }
    }

    /// Each category as a percentage of the total; all zero when the total is zero.
    pub fn percentages(&self) -> CategoryValues {
        let total = self.total();
        if total == 0.0 {
            return CategoryValues::default();
        }
        self.amounts().map(|_, amount| amount / total * 100.0)
    }
}

/// One month of the ledger. `total`, `distribution_snapshot` and `return_pct`
/// are memoised outputs and never feed back into computations.
#[skip_serializing_none]
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month: String,
    pub income: Amount,
    pub expenses: Amount,
    pub cash_balance: Amount,
    pub brokerage_balance_a: Amount,
    pub brokerage_balance_b: Amount,
    pub index_funds_balance: Amount,
    pub other_cash_balance: Amount,
    pub crypto_holdings: CryptoHoldings,
    pub total: Option<Amount>,
    pub distribution_snapshot: Option<Distribution>,
    pub return_pct: Option<f64>,
}

impl MonthlyRecord {
    pub fn new(month: &str) -> MonthlyRecord {
        MonthlyRecord { month: month.to_owned(), ..Default::default() }
    }

    pub fn named_buckets(&self) -> [Amount; 5] {
        [
            self.cash_balance,
            self.brokerage_balance_a,
            self.brokerage_balance_b,
            self.index_funds_balance,
            self.other_cash_balance,
        ]
    }

    /// Sum of every named bucket plus every wallet balance.
    pub fn total_wealth(&self) -> Amount {
        let total = self.named_buckets().iter().sum::<Amount>() + self.crypto_holdings.total();
        if let Some(memo) = self.total {
            if memo != total {
                log::debug!("ignoring stale memoised total {} for {} (actual {})", memo, self.month, total);
            }
        }
        total
    }

    pub fn distribution(&self) -> Distribution {
        Distribution {
            cash: self.cash_balance + self.other_cash_balance,
            interest_bearing: self.brokerage_balance_a + self.brokerage_balance_b,
            crypto: self.crypto_holdings.total(),
            index_funds: self.index_funds_balance,
            crypto_by_wallet: self.crypto_holdings.clone(),
        }
    }

    pub fn net_savings(&self) -> Amount {
        self.income - self.expenses
    }

    pub fn clear_memoised(&mut self) {
        self.total = None;
        self.distribution_snapshot = None;
        self.return_pct = None;
    }
}
