//! Category registry changes that cascade into rules and transactions.
//!
//! Every function here takes the current data by reference and returns a new copy. The caller
//! swaps the copy in as a whole, so no reader sees a rule or transaction that names a category
//! the registry no longer has.

use crate::error::{Error, ErrorType};
use crate::model::{CategoryRegistry, DashboardData, Rule, Timestamp};
use crate::Result;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a cascading registry change touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CascadeReport {
    /// Rule keys whose category was changed.
    pub rules: Vec<String>,
    /// Row positions of transactions whose category was changed.
    pub transactions: Vec<usize>,
    /// Transactions that changed category when the rules were re-applied afterwards.
    #[serde(default)]
    pub recategorized: usize,
}

/// A rule or transaction whose category is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DanglingReference {
    Rule { key: String, category: String },
    Transaction { row: usize, category: String },
}

/// Adds `names` to the end of the registry. Blank names and names already present are skipped.
/// Returns the new registry and the names that were actually added.
pub fn add_categories<S: AsRef<str>>(
    registry: &CategoryRegistry,
    names: &[S],
) -> (CategoryRegistry, Vec<String>) {
    let mut next = registry.clone();
    let mut added = Vec::new();
    for name in names {
        if let Some(stored) = next.insert(name.as_ref()) {
            added.push(stored.to_string());
        }
    }
    debug!("Added {} categories", added.len());
    (next, added)
}

/// Removes `names` from the registry and blanks the category of every rule and transaction that
/// used one of them. Rules are kept; only their category is cleared, and their timestamp moves to
/// `now`. Fails with `InvalidCategoryReference` and changes nothing if any name is not in the
/// registry.
pub fn delete_categories<S: AsRef<str>>(
    data: &DashboardData,
    names: &[S],
    now: Timestamp,
) -> Result<(DashboardData, CascadeReport)> {
    let names: Vec<String> = names.iter().map(|s| s.as_ref().to_string()).collect();
    let unknown: Vec<&str> = names
        .iter()
        .filter(|n| !data.categories.contains(n))
        .map(|n| n.as_str())
        .collect();
    if !unknown.is_empty() {
        return Err(Error::new(
            ErrorType::InvalidCategoryReference,
            anyhow!("Cannot delete unknown categories {unknown:?}"),
        ));
    }

    let mut next = data.clone();
    next.categories.remove_all(&names);
    let report = replace_category(&mut next, |c| names.iter().any(|n| n == c), "", now);

    info!(
        "Deleted {} categories, cleared {} rules and {} transactions",
        names.len(),
        report.rules.len(),
        report.transactions.len()
    );
    Ok((next, report))
}

/// Renames `old` to `new` in the registry, keeping its position, and moves every rule and
/// transaction that used `old` over to `new`. Changed rules get `now` as their timestamp.
pub fn rename_category(
    data: &DashboardData,
    old: &str,
    new: &str,
    now: Timestamp,
) -> Result<(DashboardData, CascadeReport)> {
    let new = new.trim();
    if !data.categories.contains(old) {
        return Err(Error::new(
            ErrorType::InvalidCategoryReference,
            anyhow!("Cannot rename unknown category '{old}'"),
        ));
    }
    if new.is_empty() {
        return Err(Error::new(
            ErrorType::InvalidInput,
            anyhow!("A category name may not be empty"),
        ));
    }
    if old == new {
        return Ok((data.clone(), CascadeReport::default()));
    }
    if data.categories.contains(new) {
        return Err(Error::new(
            ErrorType::InvalidInput,
            anyhow!("A category named '{new}' already exists"),
        ));
    }

    let mut next = data.clone();
    next.categories.rename(old, new);
    let report = replace_category(&mut next, |c| c == old, new, now);

    info!(
        "Renamed category '{old}' to '{new}', updated {} rules and {} transactions",
        report.rules.len(),
        report.transactions.len()
    );
    Ok((next, report))
}

/// Lists every rule and transaction whose category is neither empty nor in the registry.
pub fn dangling_references(data: &DashboardData) -> Vec<DanglingReference> {
    let mut found: Vec<DanglingReference> = data
        .rules
        .iter()
        .filter(|(_, rule)| !data.categories.accepts(rule.category()))
        .map(|(key, rule)| DanglingReference::Rule {
            key: key.clone(),
            category: rule.category().to_string(),
        })
        .collect();
    found.extend(
        data.transactions
            .data()
            .iter()
            .enumerate()
            .filter(|(_, txn)| !data.categories.accepts(txn.category()))
            .map(|(row, txn)| DanglingReference::Transaction {
                row,
                category: txn.category().to_string(),
            }),
    );
    found
}

fn replace_category<F>(
    data: &mut DashboardData,
    matches: F,
    replacement: &str,
    now: Timestamp,
) -> CascadeReport
where
    F: Fn(&str) -> bool,
{
    let mut report = CascadeReport::default();
    for (key, rule) in data.rules.iter_mut() {
        if matches(rule.category()) {
            *rule = Rule::new(replacement, now);
            report.rules.push(key.clone());
        }
    }
    for (row, txn) in data.transactions.data_mut().iter_mut().enumerate() {
        if matches(&txn.category) {
            txn.category = replacement.to_string();
            report.transactions.push(row);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RuleStore, Transaction, Transactions};
    use std::str::FromStr;

    fn t1() -> Timestamp {
        Timestamp::from_str("2024-01-01 00:00:00").unwrap()
    }

    fn t2() -> Timestamp {
        Timestamp::from_str("2024-06-30 18:45:00").unwrap()
    }

    fn txn(description: &str, category: &str) -> Transaction {
        Transaction {
            description: description.to_string(),
            category: category.to_string(),
            ..Transaction::default()
        }
    }

    fn shopping_data() -> DashboardData {
        let mut rules = RuleStore::new();
        rules.insert("AMAZON", Rule::new("Shopping", t1()));
        rules.insert("TARGET", Rule::new("Shopping", t1()));
        rules.insert("SHELL", Rule::new("Gas", t1()));
        let transactions = Transactions::from_data(vec![
            txn("AMAZON MKTPLACE", "Shopping"),
            txn("SHELL OIL", "Gas"),
            txn("TARGET 0012", "Shopping"),
            txn("ETSY", "Shopping"),
            txn("MYSTERY", ""),
        ]);
        DashboardData::new(
            transactions,
            CategoryRegistry::new(vec!["Gas", "Shopping", "Travel"]),
            rules,
        )
    }

    #[test]
    fn test_delete_shopping_scenario() {
        let data = shopping_data();
        let (next, report) = delete_categories(&data, &["Shopping"], t2()).unwrap();

        assert!(!next.categories().contains("Shopping"));
        assert_eq!(next.categories().names(), &["Gas", "Travel"]);
        assert!(next.rules().iter().all(|(_, r)| r.category() != "Shopping"));
        assert!(next
            .transactions()
            .data()
            .iter()
            .all(|t| t.category() != "Shopping"));

        assert_eq!(report.rules, vec!["AMAZON".to_string(), "TARGET".to_string()]);
        assert_eq!(report.transactions, vec![0, 2, 3]);
        // the rules survive with an empty category
        assert_eq!(next.rules().get("AMAZON").unwrap(), &Rule::new("", t2()));
        assert_eq!(next.rules().get("SHELL").unwrap(), &Rule::new("Gas", t1()));
        assert_eq!(next.transactions().data()[1].category(), "Gas");
        assert!(dangling_references(&next).is_empty());
    }

    #[test]
    fn test_delete_unknown_changes_nothing() {
        let data = shopping_data();
        let err = delete_categories(&data, &["Shopping", "Nope"], t2()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidCategoryReference);
        assert_eq!(data, shopping_data());
    }

    #[test]
    fn test_add_categories() {
        let registry = CategoryRegistry::new(vec!["Gas"]);
        let (next, added) = add_categories(&registry, &["Travel", "Gas", " ", "Pets", "Travel"]);
        assert_eq!(added, vec!["Travel".to_string(), "Pets".to_string()]);
        assert_eq!(next.names(), &["Gas", "Travel", "Pets"]);
        assert_eq!(registry.names(), &["Gas"]);
    }

    #[test]
    fn test_rename_cascades() {
        let data = shopping_data();
        let (next, report) = rename_category(&data, "Shopping", "Retail", t2()).unwrap();
        assert_eq!(next.categories().names(), &["Gas", "Retail", "Travel"]);
        assert_eq!(next.rules().get("TARGET").unwrap(), &Rule::new("Retail", t2()));
        assert_eq!(report.transactions, vec![0, 2, 3]);
        assert_eq!(next.transactions().data()[3].category(), "Retail");
        assert!(dangling_references(&next).is_empty());
    }

    #[test]
    fn test_rename_rejections() {
        let data = shopping_data();
        let err = rename_category(&data, "Pets", "Animals", t2()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidCategoryReference);
        let err = rename_category(&data, "Shopping", "Gas", t2()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
        let err = rename_category(&data, "Shopping", "  ", t2()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
    }

    #[test]
    fn test_dangling_references() {
        let mut data = shopping_data();
        data.categories = CategoryRegistry::new(vec!["Gas"]);
        let found = dangling_references(&data);
        assert_eq!(found.len(), 5);
        assert_eq!(
            found[0],
            DanglingReference::Rule {
                key: "AMAZON".into(),
                category: "Shopping".into()
            }
        );
        assert_eq!(
            found[2],
            DanglingReference::Transaction {
                row: 0,
                category: "Shopping".into()
            }
        );
    }
}
