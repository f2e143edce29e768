use crate::engine::Matcher;
use crate::model::{RuleStore, Transactions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A description that no rule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Uncovered {
    pub description: String,
    /// The category of the first transaction with this description.
    pub current_category: String,
    pub occurrence_count: usize,
}

/// Lists every distinct description that no rule covers, using the same containment test as the
/// matcher. Descriptions are compared exactly when grouping, so `"Uber"` and `"UBER"` are two
/// entries. Results are in order of first occurrence in `transactions`.
pub fn find_uncovered(transactions: &Transactions, rules: &RuleStore) -> Vec<Uncovered> {
    let matcher = Matcher::new(rules);
    let mut found: Vec<Uncovered> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut covered: HashMap<&str, bool> = HashMap::new();

    for txn in transactions.data() {
        let description = txn.description();
        let is_covered = *covered
            .entry(description)
            .or_insert_with(|| matcher.covers(description));
        if is_covered {
            continue;
        }
        match positions.get(description) {
            Some(&ix) => found[ix].occurrence_count += 1,
            None => {
                positions.insert(description, found.len());
                found.push(Uncovered {
                    description: description.to_string(),
                    current_category: txn.category().to_string(),
                    occurrence_count: 1,
                });
            }
        }
    }
    found
}
