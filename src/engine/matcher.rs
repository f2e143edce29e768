//! Resolves a transaction description to a category using the rule store.
//!
//! A rule applies to a description when, ignoring case, the rule key contains the description or
//! the description contains the rule key. Blank keys and blank descriptions never match. The same
//! test is used for single lookups, bulk re-categorization and coverage.
//!
//! When several rules apply, the longest key (counted in characters) wins. Among keys of equal
//! length the lexicographically smallest key wins. Rules whose category is empty take part in
//! coverage but are never used to assign a category.

use crate::model::{Rule, RuleStore, Transactions};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::trace;

/// The rule that decided a description's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match<'a> {
    pub key: &'a str,
    pub category: &'a str,
}

/// A rule store prepared for repeated matching. Keys are lower-cased once and held in priority
/// order, so the first applicable entry is the winner.
#[derive(Debug, Clone)]
pub struct Matcher<'a> {
    entries: Vec<Entry<'a>>,
}

#[derive(Debug, Clone)]
struct Entry<'a> {
    key: &'a str,
    folded: String,
    rule: &'a Rule,
}

impl<'a> Matcher<'a> {
    pub fn new(rules: &'a RuleStore) -> Self {
        let mut entries: Vec<Entry<'a>> = rules
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, rule)| Entry {
                key: key.as_str(),
                folded: key.to_lowercase(),
                rule,
            })
            .collect();
        entries.sort_by(|a, b| priority(a.key, b.key));
        Self { entries }
    }

    /// Returns the winning rule for `description`, or `None` if the description is
    /// uncategorized.
    pub fn categorize(&self, description: &str) -> Option<Match<'a>> {
        let folded = fold(description)?;
        self.entries
            .iter()
            .filter(|e| !e.rule.category().is_empty())
            .find(|e| contains_either(&e.folded, &folded))
            .map(|e| Match {
                key: e.key,
                category: e.rule.category(),
            })
    }

    /// True if any rule applies to `description`, including rules with an empty category.
    pub fn covers(&self, description: &str) -> bool {
        match fold(description) {
            Some(folded) => self.entries.iter().any(|e| contains_either(&e.folded, &folded)),
            None => false,
        }
    }

    /// Overwrites the category of every transaction that some rule categorizes. Transactions no
    /// rule categorizes keep their current category. Returns the number of rows that changed.
    pub fn apply(&self, transactions: &mut Transactions) -> usize {
        let mut changed = 0;
        for txn in transactions.data_mut() {
            if let Some(m) = self.categorize(&txn.description) {
                if txn.category != m.category {
                    trace!(
                        "'{}' moves from '{}' to '{}' by rule '{}'",
                        txn.description,
                        txn.category,
                        m.category,
                        m.key
                    );
                    txn.category = m.category.to_string();
                    changed += 1;
                }
            }
        }
        changed
    }
}

/// Returns the category for `description`, or `None` if no rule categorizes it.
pub fn categorize<'a>(description: &str, rules: &'a RuleStore) -> Option<&'a str> {
    Matcher::new(rules).categorize(description).map(|m| m.category)
}

/// Re-applies `rules` to every transaction. See `Matcher::apply`.
pub fn recategorize(transactions: &mut Transactions, rules: &RuleStore) -> usize {
    Matcher::new(rules).apply(transactions)
}

/// The bidirectional containment test on two raw strings. Both are folded to lower case first.
pub fn rule_applies(key: &str, description: &str) -> bool {
    match (fold(key), fold(description)) {
        (Some(k), Some(d)) => contains_either(&k, &d),
        _ => false,
    }
}

fn fold(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_lowercase())
    }
}

fn contains_either(key: &str, description: &str) -> bool {
    description.contains(key) || key.contains(description)
}

fn priority(a: &str, b: &str) -> Ordering {
    b.chars()
        .count()
        .cmp(&a.chars().count())
        .then_with(|| a.cmp(b))
}
