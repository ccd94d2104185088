//! Month labels are opaque strings compared without regard to case. They are
//! only interpreted as dates to order the evolution series chronologically.

use chrono::{Datelike, Local, NaiveDate};

const MONTH_NAMES: [[&str; 2]; 12] = [
    ["january", "enero"],
    ["february", "febrero"],
    ["march", "marzo"],
    ["april", "abril"],
    ["may", "mayo"],
    ["june", "junio"],
    ["july", "julio"],
    ["august", "agosto"],
    ["september", "septiembre"],
    ["october", "octubre"],
    ["november", "noviembre"],
    ["december", "diciembre"],
];

pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

pub fn same_month(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Full English name of the current calendar month, e.g. "October".
pub fn current_month() -> String {
    Local::now().format("%B").to_string()
}

/// Calendar position parsed out of a label. Either part may be unknown.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct MonthKey {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl MonthKey {
    pub fn parse(label: &str) -> MonthKey {
        let label = label.trim();
        if let Some(key) = parse_iso(label) {
            return key;
        }

        let mut tokens = label
            .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
            .filter(|token| !token.is_empty());
        let month = tokens.next().and_then(month_from_name);
        let year = tokens.next().and_then(|token| token.parse::<i32>().ok());
        MonthKey { year, month }
    }
}

fn parse_iso(label: &str) -> Option<MonthKey> {
    let head = label.get(..10).unwrap_or(label);
    let date = match NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => NaiveDate::parse_from_str(&format!("{}-01", label.get(..7)?), "%Y-%m-%d").ok()?,
    };
    Some(MonthKey { year: Some(date.year()), month: Some(date.month()) })
}

fn month_from_name(token: &str) -> Option<u32> {
    let token = token.trim_end_matches(|c| c == '.' || c == ',').to_lowercase();
    if token.len() < 3 {
        return None;
    }
    MONTH_NAMES.iter()
        .position(|names| names.iter().any(|name| *name == token || (token.len() == 3 && name.starts_with(&token))))
        .map(|index| index as u32 + 1)
}

/// Position of a label in the chronological series. Fields compare in
/// declaration order: year, then the number of times a year-less sequence
/// wrapped past December, then month, then ledger position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ChronoKey {
    year: Option<i32>,
    wrap: u32,
    month: Option<u32>,
    position: usize,
}

/// Sort keys for labels given in ledger order. A label without a year takes
/// the year of the label before it, moving to the next year when the month
/// goes backwards; a label without a month sorts right after the one before it.
pub fn chronological_keys<'a, I>(labels: I) -> Vec<ChronoKey>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut previous: Option<ChronoKey> = None;
    labels.into_iter()
        .enumerate()
        .map(|(position, label)| {
            let parsed = MonthKey::parse(label);
            let key = match (parsed.year, parsed.month, previous) {
                (Some(_), _, _) | (None, _, None) =>
                    ChronoKey { year: parsed.year, wrap: 0, month: parsed.month, position },
                (None, None, Some(prev)) => ChronoKey { position, ..prev },
                (None, Some(month), Some(prev)) => {
                    let wrapped = prev.month.map_or(false, |prev_month| month < prev_month);
                    match (wrapped, prev.year) {
                        (true, Some(year)) => ChronoKey { year: Some(year + 1), wrap: 0, month: Some(month), position },
                        (true, None) => ChronoKey { year: None, wrap: prev.wrap + 1, month: Some(month), position },
                        (false, _) => ChronoKey { year: prev.year, wrap: prev.wrap, month: Some(month), position },
                    }
                },
            };
            previous = Some(key);
            key
        })
        .collect()
}
