//! Rule listing and editing commands.

use crate::args::RulesListArgs;
use crate::commands::{commit, open, plural, Out};
use crate::engine::RuleEdit;
use crate::error::{ErrorType, IntoResult};
use crate::identity::IdentityProvider;
use crate::model::Timestamp;
use crate::session::RuleEditOutcome;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// The category that rule listings count separately as a catch-all.
const MISCELLANEOUS: &str = "Miscellaneous";

/// One rule as shown by `finboard rules list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleRow {
    pub description: String,
    pub category: String,
    pub last_modified: Timestamp,
}

/// The output of `finboard rules list`. The counts describe the whole rule set, not just the rows
/// that passed the filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleListing {
    pub total: usize,
    /// Rules without a category.
    pub empty: usize,
    pub miscellaneous: usize,
    /// Most recently modified first.
    pub rules: Vec<RuleRow>,
}

/// Lists the rules in the working copy, most recently modified first. Rules modified at the same
/// second are listed by description.
pub async fn list_rules(
    config: Config,
    identity: &dyn IdentityProvider,
    args: &RulesListArgs,
) -> Result<Out<RuleListing>> {
    let session = open(&config, identity).await?;
    let rules = session.data().rules();
    let search = args.search.as_ref().map(|s| s.to_lowercase());

    let mut listing = RuleListing {
        total: rules.len(),
        ..RuleListing::default()
    };
    for (key, rule) in rules.iter() {
        match rule.category() {
            "" => listing.empty += 1,
            MISCELLANEOUS => listing.miscellaneous += 1,
            _ => {}
        }
        if let Some(search) = &search {
            if !key.to_lowercase().contains(search) {
                continue;
            }
        }
        if !args.categories.is_empty() && !args.categories.iter().any(|c| c == rule.category()) {
            continue;
        }
        listing.rules.push(RuleRow {
            description: key.clone(),
            category: rule.category().to_string(),
            last_modified: rule.last_modified(),
        });
    }
    listing.rules.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.description.cmp(&b.description))
    });

    let mut message = format!(
        "{} {} ({} without a category, {} {MISCELLANEOUS}), showing {}",
        listing.total,
        plural(listing.total, "rule", "rules"),
        listing.empty,
        listing.miscellaneous,
        listing.rules.len()
    );
    for row in &listing.rules {
        let _ = write!(
            message,
            "\n  {}  {} => {}",
            row.last_modified,
            row.description,
            if row.category.is_empty() {
                "-"
            } else {
                row.category.as_str()
            }
        );
    }
    Ok(Out::new(message, listing))
}

/// Creates the rule `description` or changes its category, then re-applies the rules to every
/// transaction in the working copy.
pub async fn set_rule(
    config: Config,
    identity: &dyn IdentityProvider,
    description: &str,
    category: &str,
) -> Result<Out<RuleEditOutcome>> {
    edit(config, identity, &[RuleEdit::set(description, category)]).await
}

/// Deletes rules by their exact description, then re-applies the remaining rules.
pub async fn delete_rules<S: AsRef<str>>(
    config: Config,
    identity: &dyn IdentityProvider,
    descriptions: &[S],
) -> Result<Out<RuleEditOutcome>> {
    let edits: Vec<RuleEdit> = descriptions
        .iter()
        .map(|d| RuleEdit::delete(d.as_ref()))
        .collect();
    edit(config, identity, &edits).await
}

/// Applies a batch of edits read from a JSON file holding a list of `RuleEdit` objects. The batch
/// is applied in full or not at all.
pub async fn apply_rule_file(
    config: Config,
    identity: &dyn IdentityProvider,
    file: &Path,
) -> Result<Out<RuleEditOutcome>> {
    let edits: Vec<RuleEdit> = utils::deserialize(file)
        .await
        .with_context(|| format!("Unable to read rule edits from {}", file.display()))
        .pub_result(ErrorType::InvalidInput)?;
    edit(config, identity, &edits).await
}

async fn edit(
    config: Config,
    identity: &dyn IdentityProvider,
    edits: &[RuleEdit],
) -> Result<Out<RuleEditOutcome>> {
    let mut session = open(&config, identity).await?;
    let outcome = session.apply_rule_edits(edits)?;
    if !outcome.edits.is_noop() || outcome.recategorized > 0 {
        commit(&config, session).await?;
    }
    let e = &outcome.edits;
    let message = format!(
        "Rules: {} added, {} updated, {} deleted, {} unchanged; {} {} re-categorized",
        e.added.len(),
        e.updated.len(),
        e.deleted.len(),
        e.unchanged.len(),
        outcome.recategorized,
        plural(outcome.recategorized, "transaction", "transactions"),
    );
    Ok(Out::new(message, outcome))
}
