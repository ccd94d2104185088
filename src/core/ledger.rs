use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::label;
use crate::core::record::MonthlyRecord;
use crate::core::targets::AllocationTargets;

/// Everything the store holds, in the shape it is persisted in.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub targets: AllocationTargets,
    pub history: Vec<MonthlyRecord>,
    pub selected_month: String,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        LedgerSnapshot {
            targets: AllocationTargets::default(),
            history: Vec::new(),
            selected_month: label::current_month(),
        }
    }
}

impl LedgerSnapshot {
    /// First record, in ledger order, whose label matches ignoring case.
    pub fn find_month(&self, month: &str) -> Option<(usize, &MonthlyRecord)> {
        self.history.iter()
            .enumerate()
            .find(|(_, record)| label::same_month(&record.month, month))
    }

    pub fn selected(&self) -> Option<(usize, &MonthlyRecord)> {
        self.find_month(&self.selected_month)
    }

    /// Record just before `index` in ledger order.
    pub fn previous(&self, index: usize) -> Option<&MonthlyRecord> {
        index.checked_sub(1).and_then(|prev| self.history.get(prev))
    }

    /// Indices into `history`, sorted oldest month first.
    pub fn chronological_order(&self) -> Vec<usize> {
        let keys = label::chronological_keys(self.history.iter().map(|record| record.month.as_str()));
        let mut order: Vec<usize> = (0..self.history.len()).collect();
        order.sort_by_key(|&index| keys[index]);
        order
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    /// Appended, but another record already has the same label once case is ignored.
    Collided { existing: String },
}

/// Authoritative holder of the monthly history, the allocation targets and
/// the selected month. Every mutation bumps `version`.
#[derive(Debug, Default)]
pub struct Ledger {
    state: LedgerSnapshot,
    version: u64,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Ledger {
        let ledger = Ledger { state: snapshot, version: 0 };
        for group in ledger.label_collisions() {
            log::warn!("month labels differ only by case: {}", group.join(", "));
        }
        ledger
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.state
    }

    pub fn into_snapshot(self) -> LedgerSnapshot {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get_months(&self) -> &[MonthlyRecord] {
        &self.state.history
    }

    pub fn get_targets(&self) -> &AllocationTargets {
        &self.state.targets
    }

    pub fn get_selected_month(&self) -> &str {
        &self.state.selected_month
    }

    /// Replaces the record with the same label, keeping its position, or
    /// appends a new one. Memoised fields on the incoming record are dropped.
    pub fn upsert_month(&mut self, mut record: MonthlyRecord) -> UpsertOutcome {
        record.clear_memoised();
        self.version += 1;

        if let Some(existing) = self.state.history.iter_mut().find(|r| r.month == record.month) {
            log::debug!("replacing month {}", record.month);
            *existing = record;
            return UpsertOutcome::Replaced;
        }

        let outcome = match self.state.find_month(&record.month) {
            Some((_, existing)) => {
                log::warn!("month {} collides with existing label {}", record.month, existing.month);
                UpsertOutcome::Collided { existing: existing.month.clone() }
            },
            None => UpsertOutcome::Inserted,
        };
        log::debug!("appending month {}", record.month);
        self.state.history.push(record);
        outcome
    }

    pub fn set_targets(&mut self, targets: AllocationTargets) {
        let sum = targets.sum();
        if (sum - 100.0).abs() > f64::EPSILON {
            log::warn!("allocation targets add up to {}%", sum);
        }
        self.state.targets = targets;
        self.version += 1;
    }

    /// Points the selection at `month`. Empty labels are ignored; labels not
    /// in the ledger are accepted.
    pub fn select_month(&mut self, month: &str) -> bool {
        if month.is_empty() {
            return false;
        }
        self.state.selected_month = month.to_owned();
        self.version += 1;
        true
    }

    /// Groups of labels that are equal once case is ignored.
    pub fn label_collisions(&self) -> Vec<Vec<&str>> {
        let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for record in &self.state.history {
            groups.entry(label::normalize(&record.month)).or_default().push(&record.month);
        }
        groups.into_values().filter(|group| group.len() > 1).collect()
    }
}
