//! Transaction listing, memo and re-categorization commands.

use crate::commands::{commit, open, plural, Out};
use crate::filter::TransactionFilter;
use crate::identity::IdentityProvider;
use crate::model::Transaction;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// A transaction together with its row number, which is how `finboard transactions memo`
/// addresses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionRow {
    pub row: usize,
    #[serde(flatten)]
    pub transaction: Transaction,
}

/// Lists the transactions in the working copy that pass `filter`.
pub async fn list_transactions(
    config: Config,
    identity: &dyn IdentityProvider,
    filter: &TransactionFilter,
) -> Result<Out<Vec<TransactionRow>>> {
    let session = open(&config, identity).await?;
    let transactions = session.data().transactions();
    let rows: Vec<TransactionRow> = filter
        .apply(transactions)
        .into_iter()
        .map(|(row, txn)| TransactionRow {
            row,
            transaction: txn.clone(),
        })
        .collect();

    let mut message = format!(
        "{} of {} {}",
        rows.len(),
        transactions.len(),
        plural(transactions.len(), "transaction", "transactions")
    );
    for r in &rows {
        let t = &r.transaction;
        let _ = write!(
            message,
            "\n  {:>5}  {}  {:<32}  {:>12} {}  {}  [{}]",
            r.row,
            t.date(),
            t.description(),
            t.amount().map(|a| a.to_currency_string()).unwrap_or_default(),
            t.currency(),
            t.card(),
            if t.category().is_empty() {
                "-"
            } else {
                t.category()
            },
        );
        if !t.memo().is_empty() {
            let _ = write!(message, "  \"{}\"", t.memo());
        }
    }
    Ok(Out::new(message, rows))
}

/// Sets the memo of the transaction at `row`. An empty `text` clears it.
pub async fn set_memo(
    config: Config,
    identity: &dyn IdentityProvider,
    row: usize,
    text: &str,
) -> Result<Out<usize>> {
    let mut session = open(&config, identity).await?;
    let mut memos = BTreeMap::new();
    memos.insert(row, text.to_string());
    let changed = session.set_memos(&memos)?;
    if changed == 0 {
        return Ok(Out::new(format!("The memo of row {row} is unchanged"), changed));
    }
    commit(&config, session).await?;
    Ok(Out::new(format!("Updated the memo of row {row}"), changed))
}

/// Re-applies the rules to every transaction in the working copy. Transactions that no rule
/// categorizes keep their category.
pub async fn recategorize(config: Config, identity: &dyn IdentityProvider) -> Result<Out<usize>> {
    let mut session = open(&config, identity).await?;
    let changed = session.recategorize();
    if changed > 0 {
        commit(&config, session).await?;
    }
    Ok(Out::new(
        format!(
            "Re-categorized {changed} {}",
            plural(changed, "transaction", "transactions")
        ),
        changed,
    ))
}
