//! Narrowing the transaction table down for listing and summaries.

use crate::model::{Amount, Transaction, Transactions};
use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Whether a transaction is money going out or coming in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Amount greater than zero.
    Expense,
    /// Amount less than zero.
    Income,
}

serde_plain::derive_display_from_serialize!(Flow);
serde_plain::derive_fromstr_from_deserialize!(Flow);

/// Criteria for selecting transactions. Every criterion that is set must hold. List criteria hold
/// when the field equals any of the listed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "snake_case")]
pub struct TransactionFilter {
    /// Only descriptions containing this text, ignoring case.
    #[arg(long)]
    pub search: Option<String>,

    /// Only transactions on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only transactions on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Only these month labels. May be repeated.
    #[arg(long = "month")]
    #[serde(default)]
    pub months: Vec<String>,

    /// Only these cards. May be repeated.
    #[arg(long = "card")]
    #[serde(default)]
    pub cards: Vec<String>,

    /// Only these categories. Use "" for uncategorized. May be repeated.
    #[arg(long = "category")]
    #[serde(default)]
    pub categories: Vec<String>,

    /// Only amounts greater than or equal to this.
    #[arg(long, allow_hyphen_values = true)]
    pub min_amount: Option<Decimal>,

    /// Only amounts less than or equal to this.
    #[arg(long, allow_hyphen_values = true)]
    pub max_amount: Option<Decimal>,

    /// Only expenses or only income.
    #[arg(long)]
    pub flow: Option<Flow>,

    /// Only this currency.
    #[arg(long)]
    pub currency: Option<String>,
}

impl TransactionFilter {
    /// True if `txn` meets every criterion. A transaction whose date cannot be read never meets a
    /// date criterion.
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(search) = &self.search {
            if !txn
                .description()
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            let date = match parse_date(txn.date()) {
                Some(d) => d,
                None => return false,
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        if !self.months.is_empty() && !self.months.iter().any(|m| m == txn.month()) {
            return false;
        }
        if !self.cards.is_empty() && !self.cards.iter().any(|c| c == txn.card()) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| c == txn.category()) {
            return false;
        }
        let amount = txn.amount().unwrap_or_default();
        if self.min_amount.is_some_and(|min| amount < Amount::new(min))
            || self.max_amount.is_some_and(|max| amount > Amount::new(max))
        {
            return false;
        }
        match self.flow {
            Some(Flow::Expense) if !amount.is_expense() => return false,
            Some(Flow::Income) if !amount.is_income() => return false,
            _ => {}
        }
        if let Some(currency) = &self.currency {
            if !txn.currency().eq_ignore_ascii_case(currency) {
                return false;
            }
        }
        true
    }

    /// Returns the matching transactions with their row positions.
    pub fn apply<'a>(&self, transactions: &'a Transactions) -> Vec<(usize, &'a Transaction)> {
        transactions
            .data()
            .iter()
            .enumerate()
            .filter(|(_, txn)| self.matches(txn))
            .collect()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split_whitespace().next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
}
