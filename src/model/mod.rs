//! Types that represent the core data model, such as `Transaction`, `Rule` and the category
//! registry.
mod amount;
mod category;
mod rule;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::{CategoryRegistry, DEFAULT_CATEGORIES};
pub use rule::{Rule, RuleLoadReport, RuleStore, SkippedRule, Timestamp};
use serde::{Deserialize, Serialize};
pub use transaction::{Transaction, TransactionColumn, Transactions};

/// Represents the three artifacts of a dashboard as one unit.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardData {
    pub(crate) transactions: Transactions,
    pub(crate) categories: CategoryRegistry,
    pub(crate) rules: RuleStore,
}

impl DashboardData {
    pub fn new(transactions: Transactions, categories: CategoryRegistry, rules: RuleStore) -> Self {
        Self {
            transactions,
            categories,
            rules,
        }
    }

    pub fn transactions(&self) -> &Transactions {
        &self.transactions
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }
}
