use std::fmt;

use serde::Serialize;

use crate::core::engine;
use crate::core::ledger::LedgerSnapshot;
use crate::core::targets::{AllocationTargets, Category, CategoryValues};

/// Largest deviation, in percentage points, still considered on target.
pub const ON_TARGET_BAND: f64 = 2.0;
const MODERATE_BAND: f64 = 5.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviationStatus {
    OnTarget,
    OverTarget,
    UnderTarget,
}

impl fmt::Display for DeviationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeviationStatus::OnTarget => "on target",
            DeviationStatus::OverTarget => "over target",
            DeviationStatus::UnderTarget => "under target",
        };
        write!(f, "{}", text)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

pub fn classify_deviation(deviation: f64) -> DeviationStatus {
    if deviation.abs() <= ON_TARGET_BAND {
        DeviationStatus::OnTarget
    } else if deviation > ON_TARGET_BAND {
        DeviationStatus::OverTarget
    } else {
        DeviationStatus::UnderTarget
    }
}

pub fn classify(actual_pct: f64, target_pct: f64) -> DeviationStatus {
    classify_deviation(actual_pct - target_pct)
}

/// How much of the target the actual share reaches, as a percentage; zero
/// for a zero target.
pub fn compliance(actual_pct: f64, target_pct: f64) -> f64 {
    if target_pct == 0.0 {
        return 0.0;
    }
    actual_pct / target_pct * 100.0
}

pub fn severity(deviation: f64) -> Severity {
    match deviation.abs() {
        d if d <= ON_TARGET_BAND => Severity::Low,
        d if d <= MODERATE_BAND => Severity::Moderate,
        _ => Severity::High,
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub category: Category,
    pub actual: f64,
    pub target: f64,
    pub deviation: f64,
    pub compliance: f64,
    pub status: DeviationStatus,
    pub severity: Severity,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationReport {
    pub deviations: Vec<Deviation>,
    pub on_target: usize,
    pub over_target: usize,
    pub under_target: usize,
}

impl DeviationReport {
    pub fn get(&self, category: Category) -> Option<&Deviation> {
        self.deviations.iter().find(|d| d.category == category)
    }

    fn deviation_of(&self, category: Category) -> f64 {
        self.get(category).map(|d| d.deviation).unwrap_or(0.0)
    }
}

pub fn deviations(actual_pct: &CategoryValues, targets: &AllocationTargets) -> DeviationReport {
    let mut report = DeviationReport::default();
    for (category, actual) in actual_pct.iter() {
        let target = targets.get(category);
        let deviation = actual - target;
        let status = classify_deviation(deviation);
        match status {
            DeviationStatus::OnTarget => report.on_target += 1,
            DeviationStatus::OverTarget => report.over_target += 1,
            DeviationStatus::UnderTarget => report.under_target += 1,
        }
        report.deviations.push(Deviation {
            category,
            actual,
            target,
            deviation,
            compliance: compliance(actual, target),
            status,
            severity: severity(deviation),
        });
    }
    report
}

/// Deviations of the selected month's allocation from the targets.
pub fn selected_deviations(snapshot: &LedgerSnapshot) -> DeviationReport {
    deviations(&engine::selected_percentages(snapshot), &snapshot.targets)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Recommendation {
    BuildLiquidityBuffer,
    InvestIdleCash,
    ReduceCryptoExposure,
    IncreaseIndexFunds,
    Balanced,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::BuildLiquidityBuffer =>
                "Consider holding more cash to build a stronger emergency buffer",
            Recommendation::InvestIdleCash =>
                "Too much is sitting in cash, consider investing part of it in higher-yielding assets",
            Recommendation::ReduceCryptoExposure =>
                "Crypto weighs more than planned, consider reducing it to lower volatility",
            Recommendation::IncreaseIndexFunds =>
                "Index funds offer cheap diversification, consider raising their share",
            Recommendation::Balanced =>
                "Your distribution is balanced against the targets",
        };
        write!(f, "{}", text)
    }
}

enum Threshold {
    Below(f64),
    Above(f64),
}

const RULES: [(Category, Threshold, Recommendation); 4] = [
    (Category::Cash, Threshold::Below(-5.0), Recommendation::BuildLiquidityBuffer),
    (Category::Cash, Threshold::Above(10.0), Recommendation::InvestIdleCash),
    (Category::Crypto, Threshold::Above(5.0), Recommendation::ReduceCryptoExposure),
    (Category::IndexFunds, Threshold::Below(-5.0), Recommendation::IncreaseIndexFunds),
];

/// Every rule that fires for the report, or just `Balanced` when none does.
pub fn recommendations(report: &DeviationReport) -> Vec<Recommendation> {
    let fired: Vec<Recommendation> = RULES.iter()
        .filter(|(category, threshold, _)| {
            let deviation = report.deviation_of(*category);
            match threshold {
                Threshold::Below(limit) => deviation < *limit,
                Threshold::Above(limit) => deviation > *limit,
            }
        })
        .map(|(_, _, recommendation)| *recommendation)
        .collect();

    if fired.is_empty() {
        vec![Recommendation::Balanced]
    } else {
        fired
    }
}
