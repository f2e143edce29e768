use crate::commands::{open, Out};
use crate::filter::TransactionFilter;
use crate::identity::IdentityProvider;
use crate::summary::{summarize, Summary};
use crate::{Config, Result};
use std::fmt::Write;

/// Totals the transactions in the working copy that pass `filter`, by category, card and month.
pub async fn summary(
    config: Config,
    identity: &dyn IdentityProvider,
    filter: &TransactionFilter,
) -> Result<Out<Summary>> {
    let session = open(&config, identity).await?;
    let rows = filter.apply(session.data().transactions());
    let summary = summarize(rows.into_iter().map(|(_, txn)| txn));

    let mut message = format!(
        "{} transactions: {} spent, {} received",
        summary.count,
        summary.expenses.to_currency_string(),
        summary.income.to_currency_string()
    );
    message.push_str("\nBy category:");
    for c in &summary.by_category {
        let name = if c.category.is_empty() {
            "(uncategorized)"
        } else {
            c.category.as_str()
        };
        let _ = write!(
            message,
            "\n  {:<24} {:>12}  ({})",
            name,
            c.total.to_currency_string(),
            c.count
        );
    }
    message.push_str("\nBy card:");
    for c in &summary.by_card {
        let _ = write!(
            message,
            "\n  {:<24} {:>12}  ({}, mean {})",
            c.card,
            c.total.to_currency_string(),
            c.count,
            c.mean.to_currency_string()
        );
    }
    Ok(Out::new(message, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_summary_by_month() {
        let env = TestEnv::synced().await;
        let filter = TransactionFilter {
            months: vec!["2025-11".into()],
            currency: Some("USD".into()),
            ..Default::default()
        };
        let out = summary(env.config(), &env.identity(), &filter).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.expenses, Amount::from_str("81.79").unwrap());
        assert_eq!(s.by_category[0].category, "Gas");
    }
}
