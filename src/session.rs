//! The per-user context that every engine operation runs against.
//!
//! A `Session` owns one copy of the dashboard data. Mutating methods compute the complete new
//! state first and swap it in only on success, so a failed call leaves the session as it was.

use crate::engine::{
    self, CascadeReport, DanglingReference, EditSummary, RuleEdit, Uncovered,
};
use crate::error::{Error, ErrorType};
use crate::model::{DashboardData, Timestamp};
use crate::Result;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// The result of `Session::apply_rule_edits`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleEditOutcome {
    pub edits: EditSummary,
    /// How many transactions changed category when the new rules were applied.
    pub recategorized: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    user: String,
    data: DashboardData,
}

impl Session {
    /// Starts a session for `user` over `data`. Rules or transactions that name a category the
    /// registry does not have are logged; they are left as they are.
    pub fn new(user: impl Into<String>, data: DashboardData) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            user: user.into(),
            data,
        };
        let dangling = session.dangling_references();
        if !dangling.is_empty() {
            warn!(
                "{} rules or transactions refer to categories that are not in the category list",
                dangling.len()
            );
        }
        debug!("Session {} started for {}", session.id, session.user);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    pub fn into_data(self) -> DashboardData {
        self.data
    }

    /// Returns the category the rules assign to `description`, if any.
    pub fn categorize(&self, description: &str) -> Option<&str> {
        engine::categorize(description, &self.data.rules)
    }

    pub fn find_uncovered(&self) -> Vec<Uncovered> {
        engine::find_uncovered(&self.data.transactions, &self.data.rules)
    }

    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        engine::dangling_references(&self.data)
    }

    /// Applies a batch of rule edits and re-applies the resulting rules to every transaction.
    /// The new rules and the re-categorized transactions are swapped in together.
    pub fn apply_rule_edits(&mut self, edits: &[RuleEdit]) -> Result<RuleEditOutcome> {
        self.apply_rule_edits_at(edits, Timestamp::now())
    }

    pub(crate) fn apply_rule_edits_at(
        &mut self,
        edits: &[RuleEdit],
        now: Timestamp,
    ) -> Result<RuleEditOutcome> {
        let (rules, summary) =
            engine::apply_edits(&self.data.rules, edits, &self.data.categories, now)?;
        let mut transactions = self.data.transactions.clone();
        let recategorized = engine::recategorize(&mut transactions, &rules);
        self.data.rules = rules;
        self.data.transactions = transactions;
        Ok(RuleEditOutcome {
            edits: summary,
            recategorized,
        })
    }

    /// Re-applies the current rules to every transaction. Returns the number that changed.
    pub fn recategorize(&mut self) -> usize {
        engine::recategorize(&mut self.data.transactions, &self.data.rules)
    }

    /// Adds categories to the registry and returns the ones that were new.
    pub fn add_categories<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let (categories, added) = engine::add_categories(&self.data.categories, names);
        self.data.categories = categories;
        added
    }

    /// Deletes categories, then re-applies the rules so that rows blanked by the cascade pick up
    /// any other rule that still matches them.
    pub fn delete_categories<S: AsRef<str>>(&mut self, names: &[S]) -> Result<CascadeReport> {
        let (data, report) = engine::delete_categories(&self.data, names, Timestamp::now())?;
        Ok(self.swap_in(data, report))
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<CascadeReport> {
        let (data, report) = engine::rename_category(&self.data, old, new, Timestamp::now())?;
        Ok(self.swap_in(data, report))
    }

    fn swap_in(&mut self, mut data: DashboardData, mut report: CascadeReport) -> CascadeReport {
        report.recategorized = engine::recategorize(&mut data.transactions, &data.rules);
        self.data = data;
        report
    }

    /// Sets the memo of transactions by row position. Either every row exists and all memos are
    /// set, or nothing changes. Returns the number of memos that actually changed.
    pub fn set_memos(&mut self, memos: &BTreeMap<usize, String>) -> Result<usize> {
        let len = self.data.transactions.len();
        if let Some(bad) = memos.keys().find(|&&row| row >= len) {
            return Err(Error::new(
                ErrorType::InvalidInput,
                anyhow!("There is no transaction at row {bad}; there are {len} rows"),
            ));
        }
        let mut changed = 0;
        let rows = self.data.transactions.data_mut();
        for (&row, memo) in memos {
            if rows[row].memo != *memo {
                rows[row].memo = memo.clone();
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryRegistry, Rule, RuleStore, Transaction, Transactions};
    use std::str::FromStr;

    fn t1() -> Timestamp {
        Timestamp::from_str("2024-01-01 00:00:00").unwrap()
    }

    fn txn(description: &str, category: &str) -> Transaction {
        Transaction {
            description: description.into(),
            category: category.into(),
            ..Transaction::default()
        }
    }

    fn session() -> Session {
        let mut rules = RuleStore::new();
        rules.insert("STARBUCKKS", Rule::new("Food & Drink", t1()));
        let data = DashboardData::new(
            Transactions::from_data(vec![
                txn("STARBUCKKS #1234 SEATTLE WA", ""),
                txn("SHELL OIL 57444", ""),
                txn("AMAZON MKTPLACE", "Shopping"),
            ]),
            CategoryRegistry::new(vec!["Food & Drink", "Gas", "Shopping"]),
            rules,
        );
        Session::new("pat@example.com", data)
    }

    #[test]
    fn test_categorize() {
        let s = session();
        assert_eq!(s.categorize("STARBUCKKS #1234 SEATTLE WA"), Some("Food & Drink"));
        assert_eq!(s.categorize("SHELL"), None);
        assert_eq!(s.user(), "pat@example.com");
    }

    #[test]
    fn test_apply_rule_edits_recategorizes() {
        let mut s = session();
        let now = Timestamp::from_str("2024-05-05 05:05:05").unwrap();
        let outcome = s
            .apply_rule_edits_at(
                &[
                    RuleEdit::set("SHELL OIL", "Gas"),
                    RuleEdit::set("STARBUCKKS", "Food & Drink"),
                ],
                now,
            )
            .unwrap();
        assert_eq!(outcome.edits.added, vec!["SHELL OIL".to_string()]);
        // the starbucks row was never categorized, so it changes too
        assert_eq!(outcome.recategorized, 2);
        let categories: Vec<&str> = s
            .data()
            .transactions()
            .data()
            .iter()
            .map(|t| t.category())
            .collect();
        assert_eq!(categories, vec!["Food & Drink", "Gas", "Shopping"]);
        assert_eq!(
            s.data().rules().get("STARBUCKKS").unwrap().last_modified(),
            t1()
        );
        assert!(s.find_uncovered().iter().any(|u| u.description == "AMAZON MKTPLACE"));
    }

    #[test]
    fn test_rejected_edit_leaves_session_unchanged() {
        let mut s = session();
        let before = s.data().clone();
        let err = s
            .apply_rule_edits(&[RuleEdit::set("SHELL OIL", "Fuel")])
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidCategoryReference);
        assert_eq!(s.data(), &before);
    }

    #[test]
    fn test_delete_and_rename_categories() {
        let mut s = session();
        let added = s.add_categories(&["Travel", "Gas"]);
        assert_eq!(added, vec!["Travel".to_string()]);

        let report = s.delete_categories(&["Shopping"]).unwrap();
        assert_eq!(report.transactions, vec![2]);
        assert!(!s.data().categories().contains("Shopping"));

        let report = s.rename_category("Food & Drink", "Dining").unwrap();
        assert_eq!(report.rules, vec!["STARBUCKKS".to_string()]);
        assert_eq!(s.categorize("STARBUCKKS 1"), Some("Dining"));
        assert!(s.dangling_references().is_empty());
    }

    #[test]
    fn test_delete_category_falls_back_to_shorter_rule() {
        let mut rules = RuleStore::new();
        rules.insert("UBER", Rule::new("Travel", t1()));
        rules.insert("UBER EATS", Rule::new("Food & Drink", t1()));
        let data = DashboardData::new(
            Transactions::from_data(vec![txn("UBER EATS 1", "Food & Drink")]),
            CategoryRegistry::new(vec!["Food & Drink", "Travel"]),
            rules,
        );
        let mut s = Session::new("pat@example.com", data);

        let report = s.delete_categories(&["Food & Drink"]).unwrap();
        assert_eq!(report.transactions, vec![0]);
        assert_eq!(report.recategorized, 1);
        assert_eq!(s.data().transactions().data()[0].category(), "Travel");
        assert_eq!(s.categorize("UBER EATS 1"), Some("Travel"));
        // the data is already a fixed point of the rules
        assert_eq!(s.recategorize(), 0);
    }

    #[test]
    fn test_set_memos() {
        let mut s = session();
        let mut memos = BTreeMap::new();
        memos.insert(0, "coffee with Sam".to_string());
        memos.insert(2, "".to_string());
        assert_eq!(s.set_memos(&memos).unwrap(), 1);
        assert_eq!(s.data().transactions().data()[0].memo(), "coffee with Sam");

        memos.insert(3, "nope".to_string());
        let err = s.set_memos(&memos).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
    }

    #[test]
    fn test_recategorize() {
        let mut s = session();
        assert_eq!(s.recategorize(), 1);
        assert_eq!(s.recategorize(), 0);
    }
}
