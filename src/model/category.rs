use crate::error::Res;
use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The categories a new dashboard starts with when the store has no category list yet.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Bills & Utilities",
    "Food & Drink",
    "Shopping",
    "Travel",
    "Groceries",
    "Home",
    "Professional Services",
    "Health & Wellness",
    "Gas",
    "Automotive",
    "Entertainment",
    "Fees & Adjustments",
    "Education",
    "Miscellaneous",
];

/// The ordered set of valid category labels.
///
/// Names are unique and never empty or whitespace-only. Order is insertion order and is what gets
/// written back to the store.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryRegistry {
    names: Vec<String>,
}

impl CategoryRegistry {
    /// Builds a registry from `names`, dropping blanks and repeats.
    pub fn new<S, I>(names: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut registry = Self::default();
        for name in names {
            let name = name.into();
            if registry.insert(&name).is_none() {
                warn!("Ignoring invalid or repeated category name '{name}'");
            }
        }
        registry
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }

    /// Parses the stored JSON form, which is a plain list of strings.
    pub(crate) fn parse_json(bytes: &[u8]) -> Res<Self> {
        let names: Vec<String> =
            serde_json::from_slice(bytes).context("The category list is not a JSON list of strings")?;
        Ok(Self::new(names))
    }

    pub(crate) fn to_json(&self) -> Res<Vec<u8>> {
        serde_json::to_vec_pretty(&self.names).context("Unable to serialize the category list")
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// True if `category` may be stored on a rule or transaction: it is either empty or present
    /// in the registry.
    pub fn accepts(&self, category: &str) -> bool {
        category.is_empty() || self.contains(category)
    }

    /// Adds `name` at the end. Returns the stored name, or `None` if it was blank or already
    /// present.
    pub(crate) fn insert(&mut self, name: &str) -> Option<&str> {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return None;
        }
        self.names.push(name.to_string());
        self.names.last().map(|s| s.as_str())
    }

    /// Removes every name in `names`. Names that are not present are ignored.
    pub(crate) fn remove_all(&mut self, names: &[String]) {
        self.names.retain(|n| !names.contains(n));
    }

    /// Replaces `old` with `new` in place, keeping its position.
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.names.iter_mut().find(|n| n.as_str() == old) {
            Some(slot) => {
                *slot = new.to_string();
                true
            }
            None => false,
        }
    }
}

impl<'de> Deserialize<'de> for CategoryRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(CategoryRegistry::new(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_drops_blanks_and_repeats() {
        let registry = CategoryRegistry::new(vec!["Gas", "  ", "", "Travel", "Gas", " Home "]);
        assert_eq!(registry.names(), &["Gas", "Travel", "Home"]);
    }

    #[test]
    fn test_accepts() {
        let registry = CategoryRegistry::new(vec!["Gas"]);
        assert!(registry.accepts("Gas"));
        assert!(registry.accepts(""));
        assert!(!registry.accepts("gas"));
        assert!(!registry.accepts("Shopping"));
    }

    #[test]
    fn test_defaults() {
        let registry = CategoryRegistry::with_defaults();
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.names()[0], "Bills & Utilities");
        assert!(registry.contains("Miscellaneous"));
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let json = br#"["Travel", "Gas", "Food & Drink"]"#;
        let registry = CategoryRegistry::parse_json(json).unwrap();
        let written = registry.to_json().unwrap();
        let reread = CategoryRegistry::parse_json(&written).unwrap();
        assert_eq!(reread.names(), &["Travel", "Gas", "Food & Drink"]);
    }

    #[test]
    fn test_json_not_a_list() {
        assert!(CategoryRegistry::parse_json(br#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut registry = CategoryRegistry::new(vec!["A", "B", "C"]);
        assert!(registry.rename("B", "Bee"));
        assert_eq!(registry.names(), &["A", "Bee", "C"]);
        assert!(!registry.rename("Z", "Zed"));
    }

    #[test]
    fn test_remove_all() {
        let mut registry = CategoryRegistry::new(vec!["A", "B", "C"]);
        registry.remove_all(&["A".to_string(), "Q".to_string()]);
        assert_eq!(registry.names(), &["B", "C"]);
    }
}
