//! Category list commands. Deleting or renaming a category carries the change into every rule and
//! transaction that uses it.

use crate::commands::{commit, open, plural, Out};
use crate::engine::CascadeReport;
use crate::identity::IdentityProvider;
use crate::{Config, Result};

/// Lists the categories in their stored order.
pub async fn list_categories(
    config: Config,
    identity: &dyn IdentityProvider,
) -> Result<Out<Vec<String>>> {
    let session = open(&config, identity).await?;
    let names = session.data().categories().names().to_vec();
    let mut message = format!(
        "{} {}",
        names.len(),
        plural(names.len(), "category", "categories")
    );
    for name in &names {
        message.push_str("\n  ");
        message.push_str(name);
    }
    Ok(Out::new(message, names))
}

/// Appends categories to the list. Names that are blank or already present are skipped.
pub async fn add_categories<S: AsRef<str>>(
    config: Config,
    identity: &dyn IdentityProvider,
    names: &[S],
) -> Result<Out<Vec<String>>> {
    let mut session = open(&config, identity).await?;
    let added = session.add_categories(names);
    if added.is_empty() {
        return Ok(Out::new("No new categories to add", added));
    }
    commit(&config, session).await?;
    Ok(Out::new(
        format!(
            "Added {} {}: {}",
            added.len(),
            plural(added.len(), "category", "categories"),
            added.join(", ")
        ),
        added,
    ))
}

/// Deletes categories. Rules that used them are kept without a category and transactions that
/// used them become uncategorized, unless another rule still matches them. Nothing changes if any
/// name is unknown.
pub async fn delete_categories<S: AsRef<str>>(
    config: Config,
    identity: &dyn IdentityProvider,
    names: &[S],
) -> Result<Out<CascadeReport>> {
    let mut session = open(&config, identity).await?;
    let report = session.delete_categories(names)?;
    commit(&config, session).await?;
    Ok(Out::new(
        format!(
            "Deleted {} {}; cleared {} {} and {} {}; {} re-categorized",
            names.len(),
            plural(names.len(), "category", "categories"),
            report.rules.len(),
            plural(report.rules.len(), "rule", "rules"),
            report.transactions.len(),
            plural(report.transactions.len(), "transaction", "transactions"),
            report.recategorized,
        ),
        report,
    ))
}

/// Renames a category in the list, in every rule and in every transaction.
pub async fn rename_category(
    config: Config,
    identity: &dyn IdentityProvider,
    old: &str,
    new: &str,
) -> Result<Out<CascadeReport>> {
    let mut session = open(&config, identity).await?;
    let report = session.rename_category(old, new)?;
    commit(&config, session).await?;
    Ok(Out::new(
        format!(
            "Renamed '{old}' to '{new}' in {} {} and {} {}",
            report.rules.len(),
            plural(report.rules.len(), "rule", "rules"),
            report.transactions.len(),
            plural(report.transactions.len(), "transaction", "transactions"),
        ),
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::test::TestEnv;
    use crate::working;

    #[tokio::test]
    async fn test_add_and_list() {
        let env = TestEnv::synced().await;
        let out = add_categories(env.config(), &env.identity(), &["Pets", "Gas", " "])
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap(), &vec!["Pets".to_string()]);

        let out = list_categories(env.config(), &env.identity()).await.unwrap();
        let names = out.structure().unwrap();
        assert_eq!(names.len(), 15);
        assert_eq!(names.last().map(String::as_str), Some("Pets"));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let env = TestEnv::synced().await;
        let out = delete_categories(env.config(), &env.identity(), &["Shopping"])
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.rules, vec!["AMAZON MKTPLACE".to_string()]);
        // two AMAZON rows and ZARA
        assert_eq!(report.transactions, vec![5, 6, 15]);
        // no other rule matches those rows
        assert_eq!(report.recategorized, 0);

        let copy = working::load(&env.config()).await.unwrap();
        assert!(!copy.data.categories().contains("Shopping"));
        assert_eq!(copy.data.rules().get("AMAZON MKTPLACE").unwrap().category(), "");
        assert!(copy
            .data
            .transactions()
            .data()
            .iter()
            .all(|t| t.category() != "Shopping"));
    }

    #[tokio::test]
    async fn test_delete_unknown_changes_nothing() {
        let env = TestEnv::synced().await;
        let before = working::load(&env.config()).await.unwrap();
        let err = delete_categories(env.config(), &env.identity(), &["Shopping", "Yachts"])
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidCategoryReference);
        assert_eq!(working::load(&env.config()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_rename_cascades() {
        let env = TestEnv::synced().await;
        let out = rename_category(env.config(), &env.identity(), "Gas", "Fuel")
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.rules, vec!["SHELL OIL".to_string()]);
        assert_eq!(report.transactions, vec![2, 14]);

        let copy = working::load(&env.config()).await.unwrap();
        let names = copy.data.categories().names();
        assert_eq!(names[8], "Fuel");
        assert_eq!(copy.data.rules().get("SHELL OIL").unwrap().category(), "Fuel");

        let err = rename_category(env.config(), &env.identity(), "Fuel", "Travel")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidInput);
    }
}
