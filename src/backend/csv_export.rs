use std::io;

use crate::backend::interface::{BackendError, Result};
use crate::core::evolution::{export_rows, EvolutionSeries};

/// Writes one header line and one row per month of the series.
pub fn write_csv<W: io::Write>(series: &EvolutionSeries, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let rows = export_rows(series);
    if rows.is_empty() {
        // serde only emits the header together with the first record
        csv_writer.write_record(HEADER)?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(series: &EvolutionSeries) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(series, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| BackendError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

const HEADER: [&str; 11] = [
    "month",
    "total",
    "change",
    "growth_pct",
    "cash",
    "interest_bearing",
    "crypto",
    "index_funds",
    "income",
    "expenses",
    "net_savings",
];


#[cfg(test)]
mod tests {
    use super::{to_csv_string, HEADER};
    use crate::core::evolution::EvolutionSeries;
    use crate::core::{Ledger, LedgerSnapshot, MonthlyRecord};

    #[test]
    fn empty_series_has_only_header() {
        let snapshot = LedgerSnapshot::default();
        let text = to_csv_string(&EvolutionSeries::new(&snapshot)).unwrap();
        assert_eq!(text, format!("{}\n", HEADER.join(",")));
    }

    #[test]
    fn rows_are_raw_numbers() {
        let mut ledger = Ledger::new();
        ledger.upsert_month(MonthlyRecord { cash_balance: 2000.0, income: 100.0, ..MonthlyRecord::new("Feb 2024") });
        ledger.upsert_month(MonthlyRecord { cash_balance: 1000.0, ..MonthlyRecord::new("Jan 2024") });
        let snapshot = ledger.into_snapshot();

        let text = to_csv_string(&EvolutionSeries::new(&snapshot)).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "Jan 2024,1000.0,0.0,0.0,1000.0,0.0,0.0,0.0,0.0,0.0,0.0");
        assert_eq!(lines[2], "Feb 2024,2000.0,1000.0,100.0,2000.0,0.0,0.0,0.0,100.0,0.0,100.0");
    }
}
