use crate::commands::{open, Out};
use crate::engine::Matcher;
use crate::identity::IdentityProvider;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};

/// The answer to `finboard categorize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Categorized {
    pub description: String,
    /// The key of the rule that decided the category.
    pub rule: Option<String>,
    pub category: Option<String>,
    /// True if any rule applies, including rules without a category.
    pub covered: bool,
}

/// Looks up the category that the rules in the working copy assign to `description`.
pub async fn categorize(
    config: Config,
    identity: &dyn IdentityProvider,
    description: &str,
) -> Result<Out<Categorized>> {
    let session = open(&config, identity).await?;
    let matcher = Matcher::new(session.data().rules());
    let found = matcher.categorize(description);
    let categorized = Categorized {
        description: description.to_string(),
        rule: found.map(|m| m.key.to_string()),
        category: found.map(|m| m.category.to_string()),
        covered: matcher.covers(description),
    };
    let message = match found {
        Some(m) => format!("{} (rule '{}')", m.category, m.key),
        None if categorized.covered => {
            format!("'{description}' is covered by a rule that assigns no category")
        }
        None => format!("No rule applies to '{description}'"),
    };
    Ok(Out::new(message, categorized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_categorize() {
        let env = TestEnv::synced().await;
        let out = categorize(env.config(), &env.identity(), "UBER EATS 8CHN")
            .await
            .unwrap();
        let found = out.structure().unwrap();
        assert_eq!(found.rule.as_deref(), Some("UBER EATS"));
        assert_eq!(found.category.as_deref(), Some("Food & Drink"));

        let out = categorize(env.config(), &env.identity(), "Payment Thank You - Web")
            .await
            .unwrap();
        let found = out.structure().unwrap();
        assert_eq!(found.rule, None);
        assert_eq!(found.category, None);
        assert!(found.covered);

        let out = categorize(env.config(), &env.identity(), "BLUE BOTTLE")
            .await
            .unwrap();
        assert!(!out.structure().unwrap().covered);
    }
}
