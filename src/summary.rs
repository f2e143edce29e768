//! Spending aggregates over a set of transactions.

use crate::model::{Amount, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub count: usize,
    /// Sum of positive amounts.
    pub expenses: Amount,
    /// Sum of negative amounts.
    pub income: Amount,
    /// Largest total first. The empty category collects uncategorized transactions.
    pub by_category: Vec<CategoryTotal>,
    /// Largest total first.
    pub by_card: Vec<CardTotal>,
    /// Ordered by month, then category.
    pub by_month: Vec<MonthCategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CardTotal {
    pub card: String,
    pub total: Amount,
    pub count: usize,
    /// Rounded to two decimal places.
    pub mean: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthCategoryTotal {
    pub month: String,
    pub category: String,
    pub total: Amount,
}

/// Summarizes `transactions`. Amounts in different currencies are added as they are; filter by
/// currency first for a meaningful total.
pub fn summarize<'a, I>(transactions: I) -> Summary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut summary = Summary::default();
    let mut categories: BTreeMap<&str, (Amount, usize)> = BTreeMap::new();
    let mut cards: BTreeMap<&str, (Amount, usize)> = BTreeMap::new();
    let mut months: BTreeMap<(&str, &str), Amount> = BTreeMap::new();

    for txn in transactions {
        let amount = txn.amount().unwrap_or_default();
        summary.count += 1;
        if amount.is_expense() {
            summary.expenses = summary.expenses + amount;
        } else if amount.is_income() {
            summary.income = summary.income + amount;
        }

        let entry = categories.entry(txn.category()).or_default();
        entry.0 = entry.0 + amount;
        entry.1 += 1;

        let entry = cards.entry(txn.card()).or_default();
        entry.0 = entry.0 + amount;
        entry.1 += 1;

        let entry = months.entry((txn.month(), txn.category())).or_default();
        *entry = *entry + amount;
    }

    summary.by_category = categories
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    summary.by_category.sort_by(|a, b| b.total.cmp(&a.total));

    summary.by_card = cards
        .into_iter()
        .map(|(card, (total, count))| CardTotal {
            card: card.to_string(),
            total,
            count,
            mean: Amount::new((total.value() / Decimal::from(count)).round_dp(2)),
        })
        .collect();
    summary.by_card.sort_by(|a, b| b.total.cmp(&a.total));

    summary.by_month = months
        .into_iter()
        .map(|((month, category), total)| MonthCategoryTotal {
            month: month.to_string(),
            category: category.to_string(),
            total,
        })
        .collect();

    summary
}
