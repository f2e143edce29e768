use crate::commands::{open, plural, Out};
use crate::engine::Uncovered;
use crate::identity::IdentityProvider;
use crate::{Config, Result};
use std::fmt::Write;

/// Lists the descriptions in the working copy that no rule covers, in order of first occurrence.
/// Each is listed once with the category of its first transaction and how often it occurs.
pub async fn uncovered(
    config: Config,
    identity: &dyn IdentityProvider,
) -> Result<Out<Vec<Uncovered>>> {
    let session = open(&config, identity).await?;
    let found = session.find_uncovered();
    if found.is_empty() {
        return Ok(Out::new("Every transaction is covered by a rule", found));
    }

    let mut message = format!(
        "{} {} not covered by any rule:",
        found.len(),
        plural(found.len(), "description is", "descriptions are")
    );
    for u in &found {
        let category = if u.current_category.is_empty() {
            "-"
        } else {
            u.current_category.as_str()
        };
        let _ = write!(
            message,
            "\n  {:>4}x  {}  [{}]",
            u.occurrence_count, u.description, category
        );
    }
    Ok(Out::new(message, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_uncovered_seed_data() {
        let env = TestEnv::synced().await;
        let out = uncovered(env.config(), &env.identity()).await.unwrap();
        let found: Vec<(&str, &str, usize)> = out
            .structure()
            .unwrap()
            .iter()
            .map(|u| {
                (
                    u.description.as_str(),
                    u.current_category.as_str(),
                    u.occurrence_count,
                )
            })
            .collect();
        assert_eq!(
            found,
            vec![
                ("IN-N-OUT BURGER 112", "Food & Drink", 1),
                ("TRADER JOE'S #429", "Groceries", 1),
                ("BLUE BOTTLE COFFEE", "", 2),
                ("ZARA LONDON", "Shopping", 1),
            ]
        );
        assert!(out.message().contains("BLUE BOTTLE COFFEE"));
    }
}
