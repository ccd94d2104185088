use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::record::Amount;

/// Allocation categories a month's wealth is split into.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Cash,
    InterestBearing,
    Crypto,
    IndexFunds,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Cash,
        Category::InterestBearing,
        Category::Crypto,
        Category::IndexFunds,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Cash => "Cash",
            Category::InterestBearing => "Interest-bearing accounts",
            Category::Crypto => "Crypto",
            Category::IndexFunds => "Index funds",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One number per category: amounts, percentages or targets.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryValues {
    pub cash: f64,
    pub interest_bearing: f64,
    pub crypto: f64,
    pub index_funds: f64,
}

/// Target percentage per category. Nothing forces the targets to add up to 100.
pub type AllocationTargets = CategoryValues;

impl CategoryValues {
    pub fn new(cash: f64, interest_bearing: f64, crypto: f64, index_funds: f64) -> CategoryValues {
        CategoryValues { cash, interest_bearing, crypto, index_funds }
    }

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Cash => self.cash,
            Category::InterestBearing => self.interest_bearing,
            Category::Crypto => self.crypto,
            Category::IndexFunds => self.index_funds,
        }
    }

    pub fn map<F>(&self, mut f: F) -> CategoryValues
    where
        F: FnMut(Category, f64) -> f64,
    {
        CategoryValues {
            cash: f(Category::Cash, self.cash),
            interest_bearing: f(Category::InterestBearing, self.interest_bearing),
            crypto: f(Category::Crypto, self.crypto),
            index_funds: f(Category::IndexFunds, self.index_funds),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(move |category| (category, self.get(category)))
    }

    pub fn sum(&self) -> Amount {
        self.cash + self.interest_bearing + self.crypto + self.index_funds
    }
}


#[cfg(test)]
mod tests {
    use super::{AllocationTargets, Category, CategoryValues};

    use serde_json::json;

    #[test]
    fn targets_serialize_by_category() {
        let targets = AllocationTargets::new(15.0, 20.0, 5.0, 60.0);
        let value = serde_json::to_value(targets).unwrap();
        assert_eq!(value, json!({"cash": 15.0, "interestBearing": 20.0, "crypto": 5.0, "indexFunds": 60.0}));
    }

    #[test]
    fn map_and_get_agree() {
        let values = CategoryValues::new(1.0, 2.0, 3.0, 4.0);
        let doubled = values.map(|_, v| v * 2.0);
        for (category, value) in values.iter() {
            assert_eq!(doubled.get(category), value * 2.0);
        }
        assert_eq!(doubled.sum(), 20.0);
    }

    #[test]
    fn drift_is_allowed() {
        let targets = AllocationTargets::new(50.0, 50.0, 50.0, 0.0);
        assert_eq!(targets.sum(), 150.0);
        assert_eq!(targets.get(Category::Crypto), 50.0);
    }
}
