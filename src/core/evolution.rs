use serde::Serialize;

use crate::core::engine::{growth_pct, round2};
use crate::core::ledger::LedgerSnapshot;
use crate::core::record::{Amount, MonthlyRecord};

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct EvolutionPoint<'a> {
    pub month: &'a str,
    pub total: Amount,
}

/// Total wealth per month, oldest first. Totals are computed while iterating
/// and the series can be iterated any number of times.
#[derive(Clone, Debug)]
pub struct EvolutionSeries<'a> {
    history: &'a [MonthlyRecord],
    order: Vec<usize>,
}

impl<'a> EvolutionSeries<'a> {
    pub fn new(snapshot: &'a LedgerSnapshot) -> EvolutionSeries<'a> {
        EvolutionSeries { history: &snapshot.history, order: snapshot.chronological_order() }
    }

    /// Only the last `months` months of the chronological series.
    pub fn trailing(snapshot: &'a LedgerSnapshot, months: usize) -> EvolutionSeries<'a> {
        let mut series = EvolutionSeries::new(snapshot);
        let skip = series.order.len().saturating_sub(months);
        series.order.drain(..skip);
        series
    }

    pub fn window(snapshot: &'a LedgerSnapshot, months: Option<usize>) -> EvolutionSeries<'a> {
        match months {
            Some(months) => EvolutionSeries::trailing(snapshot, months),
            None => EvolutionSeries::new(snapshot),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a MonthlyRecord> + '_ {
        let history = self.history;
        self.order.iter().map(move |&index| &history[index])
    }

    pub fn iter(&self) -> Points<'_, 'a> {
        Points { history: self.history, order: self.order.iter() }
    }
}

pub struct Points<'s, 'a> {
    history: &'a [MonthlyRecord],
    order: std::slice::Iter<'s, usize>,
}

impl<'s, 'a> Iterator for Points<'s, 'a> {
    type Item = EvolutionPoint<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = &self.history[*self.order.next()?];
        Some(EvolutionPoint { month: &record.month, total: record.total_wealth() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<'s, 'a> IntoIterator for &'s EvolutionSeries<'a> {
    type Item = EvolutionPoint<'a>;
    type IntoIter = Points<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One line of the history export. Amounts are raw numbers.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ExportRow {
    pub month: String,
    pub total: Amount,
    pub change: Amount,
    pub growth_pct: f64,
    pub cash: Amount,
    pub interest_bearing: Amount,
    pub crypto: Amount,
    pub index_funds: Amount,
    pub income: Amount,
    pub expenses: Amount,
    pub net_savings: Amount,
}

/// Export rows in series order; change and growth compare with the
/// previous row of the series and are zero on the first one.
pub fn export_rows(series: &EvolutionSeries) -> Vec<ExportRow> {
    let mut previous: Option<Amount> = None;
    series.records()
        .map(|record| {
            let total = record.total_wealth();
            let dist = record.distribution();
            let (change, growth) = match previous {
                Some(prev) => (total - prev, round2(growth_pct(prev, total))),
                None => (0.0, 0.0),
            };
            previous = Some(total);
            ExportRow {
                month: record.month.clone(),
                total,
                change,
                growth_pct: growth,
                cash: dist.cash,
                interest_bearing: dist.interest_bearing,
                crypto: dist.crypto,
                index_funds: dist.index_funds,
                income: record.income,
                expenses: record.expenses,
                net_savings: record.net_savings(),
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::{export_rows, EvolutionPoint, EvolutionSeries};
    use crate::core::ledger::{Ledger, LedgerSnapshot};
    use crate::core::record::MonthlyRecord;

    use rstest::{fixture, rstest};

    fn month(label: &str, cash: f64) -> MonthlyRecord {
        MonthlyRecord { cash_balance: cash, ..MonthlyRecord::new(label) }
    }

    #[fixture]
    fn out_of_order() -> LedgerSnapshot {
        let mut ledger = Ledger::new();
        for (label, cash) in [("2024-03", 300.0), ("2024-01", 100.0), ("2024-02", 200.0), ("2023-12", 50.0)] {
            ledger.upsert_month(month(label, cash));
        }
        ledger.into_snapshot()
    }

    #[rstest]
    fn series_is_chronological(out_of_order: LedgerSnapshot) {
        let series = EvolutionSeries::new(&out_of_order);
        let months: Vec<_> = series.iter().map(|p| p.month).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn yearless_series_crosses_year_end() {
        let mut ledger = Ledger::new();
        for (label, cash) in [("Nov", 100.0), ("Dec", 200.0), ("Jan", 300.0)] {
            ledger.upsert_month(month(label, cash));
        }
        let snapshot = ledger.into_snapshot();

        let series = EvolutionSeries::new(&snapshot);
        let months: Vec<_> = series.iter().map(|p| p.month).collect();
        assert_eq!(months, vec!["Nov", "Dec", "Jan"]);

        let rows = export_rows(&series);
        assert_eq!(rows[2].change, 100.0);
        assert_eq!(rows[2].growth_pct, 50.0);
    }

    #[rstest]
    fn series_restarts(out_of_order: LedgerSnapshot) {
        let series = EvolutionSeries::new(&out_of_order);
        let first: Vec<EvolutionPoint> = series.iter().collect();
        let second: Vec<EvolutionPoint> = (&series).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first[3], EvolutionPoint { month: "2024-03", total: 300.0 });
    }

    #[rstest]
    #[case(2, vec!["2024-02", "2024-03"])]
    #[case(10, vec!["2023-12", "2024-01", "2024-02", "2024-03"])]
    #[case(0, vec![])]
    fn trailing_window(out_of_order: LedgerSnapshot, #[case] months: usize, #[case] expected: Vec<&str>) {
        let series = EvolutionSeries::trailing(&out_of_order, months);
        let labels: Vec<_> = series.iter().map(|p| p.month).collect();
        assert_eq!(labels, expected);
        assert_eq!(series.len(), expected.len());
    }

    #[test]
    fn empty_ledger_has_empty_series() {
        let snapshot = LedgerSnapshot::default();
        let series = EvolutionSeries::new(&snapshot);
        assert!(series.is_empty());
        assert_eq!(series.iter().count(), 0);
        assert!(export_rows(&series).is_empty());
    }

    #[rstest]
    fn export_compares_with_previous_row(out_of_order: LedgerSnapshot) {
        let rows = export_rows(&EvolutionSeries::new(&out_of_order));

        assert_eq!(rows[0].month, "2023-12");
        assert_eq!(rows[0].change, 0.0);
        assert_eq!(rows[0].growth_pct, 0.0);
        assert_eq!(rows[1].change, 50.0);
        assert_eq!(rows[1].growth_pct, 100.0);
        assert_eq!(rows[3].change, 100.0);
        assert_eq!(rows[3].growth_pct, 50.0);
        assert_eq!(rows[3].cash, 300.0);
    }

    #[test]
    fn export_growth_after_empty_month_is_zero() {
        let mut ledger = Ledger::new();
        ledger.upsert_month(month("2024-01", 0.0));
        let mut feb = month("2024-02", 100.0);
        feb.income = 3000.0;
        feb.expenses = 1200.0;
        ledger.upsert_month(feb);
        let snapshot = ledger.into_snapshot();

        let rows = export_rows(&EvolutionSeries::new(&snapshot));
        assert_eq!(rows[1].change, 100.0);
        assert_eq!(rows[1].growth_pct, 0.0);
        assert_eq!(rows[1].net_savings, 1800.0);
    }
}
