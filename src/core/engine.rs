//! Derivations over a [`LedgerSnapshot`]. Every function here is total: a
//! missing month, a zero denominator or an empty ledger yields zero values.

use serde::Serialize;

use crate::core::ledger::LedgerSnapshot;
use crate::core::record::{Amount, Distribution, MonthlyRecord};
use crate::core::targets::CategoryValues;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `previous` to `current`; zero when `previous` is zero.
pub fn growth_pct(previous: Amount, current: Amount) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub fn total_wealth(snapshot: &LedgerSnapshot, month: &str) -> Amount {
    snapshot.find_month(month)
        .map(|(_, record)| record.total_wealth())
        .unwrap_or(0.0)
}

pub fn distribution(snapshot: &LedgerSnapshot, month: &str) -> Distribution {
    snapshot.find_month(month)
        .map(|(_, record)| record.distribution())
        .unwrap_or_default()
}

pub fn selected_distribution(snapshot: &LedgerSnapshot) -> Distribution {
    distribution(snapshot, &snapshot.selected_month)
}

pub fn percentages(snapshot: &LedgerSnapshot, month: &str) -> CategoryValues {
    distribution(snapshot, month).percentages()
}

pub fn selected_percentages(snapshot: &LedgerSnapshot) -> CategoryValues {
    percentages(snapshot, &snapshot.selected_month)
}

fn return_at(snapshot: &LedgerSnapshot, index: usize) -> f64 {
    let (Some(current), Some(previous)) = (snapshot.history.get(index), snapshot.previous(index)) else {
        return 0.0;
    };
    round2(growth_pct(previous.total_wealth(), current.total_wealth()))
}

/// Return against the record just before `month` in ledger order, rounded
/// to two decimals.
pub fn month_over_month_return(snapshot: &LedgerSnapshot, month: &str) -> f64 {
    snapshot.find_month(month)
        .map(|(index, _)| return_at(snapshot, index))
        .unwrap_or(0.0)
}

/// Compound growth between the first and last months with a nonzero total,
/// projected to twelve months. Months are assumed to be evenly spaced in
/// ledger order.
pub fn annualized_return(snapshot: &LedgerSnapshot) -> f64 {
    let totals: Vec<Amount> = snapshot.history.iter().map(MonthlyRecord::total_wealth).collect();
    let first = totals.iter().position(|total| *total != 0.0);
    let last = totals.iter().rposition(|total| *total != 0.0);

    let (Some(first), Some(last)) = (first, last) else {
        return 0.0;
    };
    if first >= last {
        return 0.0;
    }

    let ratio = totals[last] / totals[first];
    let months = (last - first) as f64;
    let annualized = (ratio.powf(12.0 / months) - 1.0) * 100.0;
    if ratio <= 0.0 || !annualized.is_finite() {
        log::debug!("annualized return undefined for {} -> {}", totals[first], totals[last]);
        return 0.0;
    }
    annualized
}

/// Figures shown for one month.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: String,
    pub total: Amount,
    pub income: Amount,
    pub expenses: Amount,
    pub net_savings: Amount,
    pub savings_rate: f64,
    pub change: Amount,
    pub return_pct: f64,
}

pub fn month_summary(snapshot: &LedgerSnapshot, month: &str) -> MonthSummary {
    let Some((index, record)) = snapshot.find_month(month) else {
        return MonthSummary { month: month.to_owned(), ..Default::default() };
    };

    let total = record.total_wealth();
    let net_savings = record.net_savings();
    let savings_rate = if record.income == 0.0 { 0.0 } else { round2(net_savings / record.income * 100.0) };
    let change = snapshot.previous(index)
        .map(|previous| total - previous.total_wealth())
        .unwrap_or(0.0);

    MonthSummary {
        month: record.month.clone(),
        total,
        income: record.income,
        expenses: record.expenses,
        net_savings,
        savings_rate,
        change,
        return_pct: return_at(snapshot, index),
    }
}

pub fn selected_summary(snapshot: &LedgerSnapshot) -> MonthSummary {
    month_summary(snapshot, &snapshot.selected_month)
}

/// Movement from one month to another, in either direction.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthComparison {
    pub from: String,
    pub to: String,
    pub total_difference: Amount,
    pub income_difference: Amount,
    pub change_pct: f64,
}

/// `None` unless both months are in the ledger. The percentage is rounded to
/// two decimals and is zero when `from` holds no wealth.
pub fn compare_months(snapshot: &LedgerSnapshot, from: &str, to: &str) -> Option<MonthComparison> {
    let (_, from) = snapshot.find_month(from)?;
    let (_, to) = snapshot.find_month(to)?;
    let (from_total, to_total) = (from.total_wealth(), to.total_wealth());

    Some(MonthComparison {
        from: from.month.clone(),
        to: to.month.clone(),
        total_difference: to_total - from_total,
        income_difference: to.income - from.income,
        change_pct: round2(growth_pct(from_total, to_total)),
    })
}

/// Copy of the history with the memoised fields filled in from the base fields.
pub fn annotate(snapshot: &LedgerSnapshot) -> Vec<MonthlyRecord> {
    snapshot.history.iter()
        .enumerate()
        .map(|(index, record)| {
            let mut record = record.clone();
            record.total = Some(record.total_wealth());
            record.distribution_snapshot = Some(record.distribution());
            record.return_pct = Some(return_at(snapshot, index));
            record
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::Ledger;
    use crate::core::record::{CryptoHoldings, Wallet};

    use rstest::{fixture, rstest};

    fn month(label: &str, cash: f64, crypto: f64) -> MonthlyRecord {
        MonthlyRecord {
            cash_balance: cash,
            crypto_holdings: CryptoHoldings::new().with(Wallet::Binance, crypto),
            ..MonthlyRecord::new(label)
        }
    }

    fn snapshot_of(records: Vec<MonthlyRecord>) -> LedgerSnapshot {
        let mut ledger = Ledger::new();
        for record in records {
            ledger.upsert_month(record);
        }
        ledger.into_snapshot()
    }

    #[fixture]
    fn two_months() -> LedgerSnapshot {
        snapshot_of(vec![month("Jan", 1000.0, 500.0), month("Feb", 1100.0, 600.0)])
    }

    #[rstest]
    fn totals_per_month(two_months: LedgerSnapshot) {
        assert_eq!(total_wealth(&two_months, "Jan"), 1500.0);
        assert_eq!(total_wealth(&two_months, "feb"), 1700.0);
        assert_eq!(total_wealth(&two_months, "Mar"), 0.0);
    }

    #[rstest]
    fn month_over_month(two_months: LedgerSnapshot) {
        assert_eq!(month_over_month_return(&two_months, "Feb"), 13.33);
        assert_eq!(month_over_month_return(&two_months, "Jan"), 0.0);
        assert_eq!(month_over_month_return(&two_months, "Mar"), 0.0);
    }

    #[test]
    fn month_over_month_after_empty_month_is_zero() {
        let snapshot = snapshot_of(vec![month("Jan", 0.0, 0.0), month("Feb", 900.0, 0.0)]);
        assert_eq!(month_over_month_return(&snapshot, "Feb"), 0.0);
    }

    #[test]
    fn month_over_month_uses_ledger_order() {
        let snapshot = snapshot_of(vec![month("Mar", 200.0, 0.0), month("Jan", 100.0, 0.0)]);
        assert_eq!(month_over_month_return(&snapshot, "Jan"), -50.0);
        assert_eq!(month_over_month_return(&snapshot, "Mar"), 0.0);
    }

    #[rstest]
    #[case(vec![], 0.0)]
    #[case(vec![month("Jan", 1000.0, 0.0)], 0.0)]
    #[case(vec![month("Jan", 0.0, 0.0), month("Feb", 1000.0, 0.0), month("Mar", 0.0, 0.0)], 0.0)]
    #[case(vec![month("Jan", 1000.0, 0.0), month("Feb", 1000.0, 0.0)], 0.0)]
    fn annualized_degenerate(#[case] records: Vec<MonthlyRecord>, #[case] expected: f64) {
        assert_eq!(annualized_return(&snapshot_of(records)), expected);
    }

    #[test]
    fn annualized_compounds_over_ledger_positions() {
        // 12 months of 1% growth starting after an empty month
        let mut records = vec![month("start", 0.0, 0.0)];
        let mut total: f64 = 1000.0;
        for i in 0..13 {
            records.push(month(&format!("m{}", i), total, 0.0));
            total *= 1.01;
        }
        let expected = (1.01f64.powi(12) - 1.0) * 100.0;
        let annualized = annualized_return(&snapshot_of(records));
        assert!((annualized - expected).abs() < 1e-6);
        assert!((annualized - 12.682_503).abs() < 1e-5);
    }

    #[test]
    fn annualized_doubling_over_six_months() {
        let records = vec![month("Jan", 1000.0, 0.0), month("Apr", 1500.0, 0.0), month("Jul", 2000.0, 0.0)];
        // two steps: (2000/1000)^(12/2) - 1 = 63
        assert_eq!(annualized_return(&snapshot_of(records)), 6300.0);
    }

    #[test]
    fn annualized_is_not_rounded() {
        let records = vec![month("Jan", 3000.0, 0.0), month("Feb", 3001.0, 0.0)];
        let expected = ((3001.0f64 / 3000.0).powf(12.0) - 1.0) * 100.0;
        assert_eq!(annualized_return(&snapshot_of(records)), expected);
        assert_ne!(expected, round2(expected));
    }

    #[test]
    fn annualized_with_negative_start_is_zero() {
        let records = vec![month("Jan", -1000.0, 0.0), month("Feb", 500.0, 0.0)];
        assert_eq!(annualized_return(&snapshot_of(records)), 0.0);
    }

    #[rstest]
    fn selected_distribution_and_percentages(mut two_months: LedgerSnapshot) {
        two_months.selected_month = "Jan".to_owned();
        let dist = selected_distribution(&two_months);
        assert_eq!(dist.cash, 1000.0);
        assert_eq!(dist.crypto, 500.0);

        let pct = selected_percentages(&two_months);
        assert!((pct.cash - 66.666_666).abs() < 1e-3);
        assert!((pct.crypto - 33.333_333).abs() < 1e-3);
        assert_eq!(pct.index_funds, 0.0);
    }

    #[rstest]
    fn unknown_selection_is_zeroed(mut two_months: LedgerSnapshot) {
        two_months.selected_month = "Never".to_owned();

        let summary = selected_summary(&two_months);
        assert_eq!(summary, MonthSummary { month: "Never".to_owned(), ..Default::default() });
        assert_eq!(selected_percentages(&two_months), CategoryValues::default());
        assert_eq!(selected_distribution(&two_months).total(), 0.0);
    }

    #[test]
    fn summary_of_month() {
        let mut feb = month("Feb", 1100.0, 600.0);
        feb.income = 2000.0;
        feb.expenses = 1500.0;
        let snapshot = snapshot_of(vec![month("Jan", 1000.0, 500.0), feb]);

        let summary = month_summary(&snapshot, "FEB");
        assert_eq!(summary.month, "Feb");
        assert_eq!(summary.total, 1700.0);
        assert_eq!(summary.net_savings, 500.0);
        assert_eq!(summary.savings_rate, 25.0);
        assert_eq!(summary.change, 200.0);
        assert_eq!(summary.return_pct, 13.33);
    }

    #[test]
    fn compare_two_months() {
        let mut jan = month("Jan", 1000.0, 0.0);
        jan.income = 2000.0;
        let mut mar = month("Mar", 1100.0, 400.0);
        mar.income = 2300.0;
        let snapshot = snapshot_of(vec![jan, month("Feb", 50.0, 0.0), mar]);

        let forward = compare_months(&snapshot, "jan", "MAR").unwrap();
        assert_eq!(forward, MonthComparison {
            from: "Jan".to_owned(),
            to: "Mar".to_owned(),
            total_difference: 500.0,
            income_difference: 300.0,
            change_pct: 50.0,
        });

        let backward = compare_months(&snapshot, "Mar", "Feb").unwrap();
        assert_eq!(backward.total_difference, -1450.0);
        assert_eq!(backward.change_pct, -96.67);
    }

    #[test]
    fn compare_with_missing_or_empty_month() {
        let snapshot = snapshot_of(vec![month("Jan", 0.0, 0.0), month("Feb", 800.0, 0.0)]);

        assert_eq!(compare_months(&snapshot, "Jan", "Dec"), None);
        assert_eq!(compare_months(&snapshot, "Dec", "Feb"), None);

        let from_empty = compare_months(&snapshot, "Jan", "Feb").unwrap();
        assert_eq!(from_empty.total_difference, 800.0);
        assert_eq!(from_empty.change_pct, 0.0);
    }

    #[rstest]
    fn annotate_fills_memoised_fields(two_months: LedgerSnapshot) {
        let annotated = annotate(&two_months);
        assert_eq!(annotated[0].total, Some(1500.0));
        assert_eq!(annotated[0].return_pct, Some(0.0));
        assert_eq!(annotated[1].return_pct, Some(13.33));
        assert_eq!(annotated[1].distribution_snapshot.as_ref().unwrap().cash, 1100.0);
        // the snapshot itself is untouched
        assert_eq!(two_months.history[0].total, None);
    }

    #[test]
    fn empty_ledger() {
        let snapshot = LedgerSnapshot::default();
        assert_eq!(total_wealth(&snapshot, "Jan"), 0.0);
        assert_eq!(annualized_return(&snapshot), 0.0);
        assert!(annotate(&snapshot).is_empty());
    }
}
