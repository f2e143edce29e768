use crate::error::{Error, ErrorType};
use crate::model::{CategoryRegistry, Rule, RuleStore, Timestamp};
use crate::Result;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One proposed change to the rule store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleEdit {
    /// The rule key, matched exactly.
    pub description: String,
    /// The category to assign. Ignored when `delete` is set.
    #[serde(default)]
    pub new_category: String,
    #[serde(default)]
    pub delete: bool,
}

impl RuleEdit {
    pub fn set(description: impl Into<String>, new_category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            new_category: new_category.into(),
            delete: false,
        }
    }

    pub fn delete(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            new_category: String::new(),
            delete: true,
        }
    }
}

/// The keys touched by an edit batch, by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EditSummary {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
}

impl EditSummary {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Applies `edits` to a copy of `current` and returns the copy. `current` is never modified, so a
/// caller that swaps the result in publishes the whole batch or nothing.
///
/// When the same description appears more than once, the last edit for it wins. Every category
/// named by a non-delete edit must be empty or in `registry`; otherwise the whole batch is
/// rejected with `InvalidCategoryReference`. A rule's timestamp moves to `now` only when it is
/// created or its category changes.
pub fn apply_edits(
    current: &RuleStore,
    edits: &[RuleEdit],
    registry: &CategoryRegistry,
    now: Timestamp,
) -> Result<(RuleStore, EditSummary)> {
    let mut latest: BTreeMap<&str, &RuleEdit> = BTreeMap::new();
    for edit in edits {
        if edit.description.trim().is_empty() {
            return Err(Error::new(
                ErrorType::InvalidInput,
                anyhow!("A rule description may not be empty"),
            ));
        }
        latest.insert(edit.description.as_str(), edit);
    }

    let unknown: Vec<&str> = latest
        .values()
        .filter(|e| !e.delete && !registry.accepts(&e.new_category))
        .map(|e| e.new_category.as_str())
        .collect();
    if !unknown.is_empty() {
        return Err(Error::new(
            ErrorType::InvalidCategoryReference,
            anyhow!("Unknown categories {unknown:?}; add them to the category list first"),
        ));
    }

    let mut next = current.clone();
    let mut summary = EditSummary::default();
    for (key, edit) in latest {
        let key = key.to_string();
        if edit.delete {
            if next.remove(&key).is_some() {
                summary.deleted.push(key);
            }
            continue;
        }
        match next.get(&key) {
            None => {
                next.insert(key.clone(), Rule::new(edit.new_category.clone(), now));
                summary.added.push(key);
            }
            Some(existing) if existing.category() == edit.new_category => {
                summary.unchanged.push(key);
            }
            Some(_) => {
                next.insert(key.clone(), Rule::new(edit.new_category.clone(), now));
                summary.updated.push(key);
            }
        }
    }

    debug!(
        "Rule edits: {} added, {} updated, {} deleted, {} unchanged",
        summary.added.len(),
        summary.updated.len(),
        summary.deleted.len(),
        summary.unchanged.len()
    );
    Ok((next, summary))
}
