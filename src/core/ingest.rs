//! Validated construction of a [`LedgerSnapshot`] from a loosely shaped JSON
//! document, such as one fetched from a remote store or written by an older
//! version of the tracker. Missing buckets and wallets become explicit zeros;
//! a document without `targets` or `history` is rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{IngestError, IngestResult};
use crate::core::label;
use crate::core::ledger::LedgerSnapshot;
use crate::core::record::{Amount, CryptoHoldings, Distribution, MonthlyRecord, Wallet};
use crate::core::targets::AllocationTargets;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    targets: RawTargets,
    history: Vec<RawRecord>,
    #[serde(default)]
    selected_month: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTargets {
    #[serde(default, alias = "liquidez")]
    cash: Option<f64>,
    #[serde(default, alias = "cuentasRemuneradas")]
    interest_bearing: Option<f64>,
    #[serde(default, alias = "cryptos")]
    crypto: Option<f64>,
    #[serde(default, alias = "fondosIndexados")]
    index_funds: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default, alias = "fecha", alias = "label")]
    month: Option<String>,
    #[serde(default, alias = "ingresos")]
    income: Option<Amount>,
    #[serde(default, alias = "gastos")]
    expenses: Option<Amount>,
    #[serde(default, alias = "sabadell")]
    cash_balance: Option<Amount>,
    #[serde(default, alias = "tradeRepublic")]
    brokerage_balance_a: Option<Amount>,
    #[serde(default, alias = "myInvestor")]
    brokerage_balance_b: Option<Amount>,
    #[serde(default, alias = "fondosIndexados")]
    index_funds_balance: Option<Amount>,
    #[serde(default, alias = "zen")]
    other_cash_balance: Option<Amount>,
    #[serde(default, alias = "cryptos")]
    crypto_holdings: Option<BTreeMap<String, Option<Amount>>>,
    #[serde(default)]
    total: Option<Amount>,
    #[serde(default)]
    distribution_snapshot: Option<Value>,
    #[serde(default)]
    return_pct: Option<f64>,
}

fn targets_from_raw(raw: RawTargets) -> AllocationTargets {
    let fill = |value: Option<f64>, name: &str| {
        value.unwrap_or_else(|| {
            log::warn!("target for {} missing, using 0", name);
            0.0
        })
    };
    AllocationTargets {
        cash: fill(raw.cash, "cash"),
        interest_bearing: fill(raw.interest_bearing, "interestBearing"),
        crypto: fill(raw.crypto, "crypto"),
        index_funds: fill(raw.index_funds, "indexFunds"),
    }
}

/// Keys are visited in sorted order, so when two keys name the same wallet
/// the later one in that order wins.
fn holdings_from_raw(month: &str, raw: Option<BTreeMap<String, Option<Amount>>>) -> CryptoHoldings {
    let mut holdings = CryptoHoldings::new();
    let mut seen = BTreeSet::new();
    for (key, balance) in raw.unwrap_or_default() {
        let Some(wallet) = Wallet::from_key(&key) else {
            log::warn!("{}: dropping unknown wallet {}", month, key);
            continue;
        };
        if !seen.insert(wallet) {
            log::warn!("{}: wallet {} given more than once, using {}", month, wallet, key);
        }
        holdings.set(wallet, balance.unwrap_or(0.0));
    }
    holdings
}

/// Records sharing a label exactly are merged: the last one wins and takes
/// the position of the first.
fn merge_duplicates(records: Vec<MonthlyRecord>) -> Vec<MonthlyRecord> {
    let mut merged: Vec<MonthlyRecord> = Vec::with_capacity(records.len());
    for record in records {
        match merged.iter_mut().find(|existing| existing.month == record.month) {
            Some(existing) => {
                log::warn!("month {} appears more than once, keeping the last", record.month);
                *existing = record;
            },
            None => merged.push(record),
        }
    }
    merged
}

fn record_from_raw(index: usize, raw: RawRecord) -> IngestResult<MonthlyRecord> {
    let month = raw.month
        .filter(|month| !month.trim().is_empty())
        .ok_or(IngestError::MissingMonth { index })?;

    let distribution_snapshot = raw.distribution_snapshot
        .and_then(|value| match serde_json::from_value::<Distribution>(value) {
            Ok(dist) => Some(dist),
            Err(err) => {
                log::warn!("{}: ignoring unreadable distribution snapshot: {}", month, err);
                None
            },
        });

    Ok(MonthlyRecord {
        income: raw.income.unwrap_or(0.0),
        expenses: raw.expenses.unwrap_or(0.0),
        cash_balance: raw.cash_balance.unwrap_or(0.0),
        brokerage_balance_a: raw.brokerage_balance_a.unwrap_or(0.0),
        brokerage_balance_b: raw.brokerage_balance_b.unwrap_or(0.0),
        index_funds_balance: raw.index_funds_balance.unwrap_or(0.0),
        other_cash_balance: raw.other_cash_balance.unwrap_or(0.0),
        crypto_holdings: holdings_from_raw(&month, raw.crypto_holdings),
        total: raw.total,
        distribution_snapshot,
        return_pct: raw.return_pct,
        month,
    })
}

pub fn parse_document(document: Value) -> IngestResult<LedgerSnapshot> {
    let Some(object) = document.as_object() else {
        return Err(IngestError::NotAnObject);
    };
    for field in ["targets", "history"] {
        if object.get(field).map_or(true, Value::is_null) {
            return Err(IngestError::MissingField(field));
        }
    }

    let raw: RawDocument = serde_json::from_value(document)?;
    let history = raw.history.into_iter()
        .enumerate()
        .map(|(index, record)| record_from_raw(index, record))
        .collect::<IngestResult<Vec<_>>>()?;
    let history = merge_duplicates(history);

    let selected_month = raw.selected_month
        .filter(|month| !month.trim().is_empty())
        .unwrap_or_else(label::current_month);

    log::debug!("ingested {} months", history.len());
    Ok(LedgerSnapshot { targets: targets_from_raw(raw.targets), history, selected_month })
}

pub fn parse_str(text: &str) -> IngestResult<LedgerSnapshot> {
    parse_document(serde_json::from_str(text)?)
}
