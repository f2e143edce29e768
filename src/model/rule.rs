use crate::error::{ErrorType, IntoResult, Res};
use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The modification time of a rule, with one second resolution and no time zone. It is written
/// as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    /// The current local time.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn value(&self) -> NaiveDateTime {
        self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let value = NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .with_context(|| format!("Unable to parse '{s}' as a timestamp"))?;
        Ok(Self::new(value))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The value side of a rule. The key, i.e. the description text, lives in `RuleStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Rule {
    pub(crate) category: String,
    pub(crate) last_modified: Timestamp,
}

impl Rule {
    pub fn new(category: impl Into<String>, last_modified: Timestamp) -> Self {
        Self {
            category: category.into(),
            last_modified,
        }
    }

    /// The assigned category. Empty means the rule covers its descriptions without categorizing
    /// them.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }
}

/// The set of rules, keyed by the literal description text they match. Keys are case-sensitive
/// and unique.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleStore {
    rules: BTreeMap<String, Rule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rule)> {
        self.rules.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Rule)> {
        self.rules.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.rules.insert(key.into(), rule)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Rule> {
        self.rules.remove(key)
    }

    /// Decodes the stored JSON object. Each value may be a bare category string, which is the
    /// legacy form and gets `now` as its timestamp, or a `{category, last_modified}` object.
    /// Entries that decode as neither are skipped and listed in the returned report.
    pub(crate) fn parse_json(bytes: &[u8], now: Timestamp) -> Res<(Self, RuleLoadReport)> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)
            .context("The rules data is not a JSON object keyed by description")?;

        let mut store = RuleStore::new();
        let mut report = RuleLoadReport::default();
        for (key, value) in raw {
            match decode_entry(&key, value, now) {
                Ok((rule, was_legacy)) => {
                    if was_legacy {
                        report.legacy.push(key.clone());
                    }
                    store.insert(key, rule);
                }
                Err(e) => {
                    warn!("Skipping rule '{key}': {e}");
                    report.skipped.push(SkippedRule {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.legacy.is_empty() {
            debug!(
                "Normalized {} legacy rule entries to the current form",
                report.legacy.len()
            );
        }
        Ok((store, report))
    }

    pub(crate) fn to_json(&self) -> Res<Vec<u8>> {
        serde_json::to_vec_pretty(&self.rules).context("Unable to serialize the rules")
    }
}

/// What happened while decoding a stored rule set.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleLoadReport {
    /// Keys that were stored in the legacy form.
    pub legacy: Vec<String>,
    /// Entries that could not be decoded and were left out.
    pub skipped: Vec<SkippedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SkippedRule {
    pub key: String,
    pub reason: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRule {
    Legacy(String),
    Current {
        category: Option<String>,
        last_modified: String,
    },
}

fn decode_entry(
    key: &str,
    value: serde_json::Value,
    now: Timestamp,
) -> crate::Result<(Rule, bool)> {
    decode_entry_inner(key, value, now).pub_result(ErrorType::MalformedRuleEntry)
}

fn decode_entry_inner(key: &str, value: serde_json::Value, now: Timestamp) -> Res<(Rule, bool)> {
    if key.is_empty() {
        bail!("A rule key may not be empty");
    }
    let stored: StoredRule = serde_json::from_value(value)
        .context("Expected a category string or a {category, last_modified} object")?;
    match stored {
        StoredRule::Legacy(category) => Ok((Rule::new(category, now), true)),
        StoredRule::Current {
            category,
            last_modified,
        } => Ok((
            Rule::new(category.unwrap_or_default(), last_modified.parse()?),
            false,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn ts(s: &str) -> Timestamp {
        Timestamp::from_str(s).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        let t = Timestamp::new(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_nano_opt(7, 5, 1, 999)
                .unwrap(),
        );
        assert_eq!(t.to_string(), "2024-03-09 07:05:01");
        assert_eq!(ts("2024-03-09 07:05:01"), t);
        assert!(Timestamp::from_str("2024-03-09T07:05:01").is_err());
    }

    #[test]
    fn test_parse_mixed_forms() {
        let json = br#"{
            "STARBUCKKS": {"category": "Food & Drink", "last_modified": "2024-01-02 03:04:05"},
            "SHELL OIL": "Gas",
            "ODD ONE": 42,
            "BAD TIME": {"category": "Travel", "last_modified": "yesterday"},
            "NULL CAT": {"category": null, "last_modified": "2024-01-02 03:04:05"}
        }"#;
        let now = ts("2025-06-01 12:00:00");
        let (store, report) = RuleStore::parse_json(json, now).unwrap();

        assert_eq!(store.len(), 3);
        let starbucks = store.get("STARBUCKKS").unwrap();
        assert_eq!(starbucks.category(), "Food & Drink");
        assert_eq!(starbucks.last_modified(), ts("2024-01-02 03:04:05"));
        let shell = store.get("SHELL OIL").unwrap();
        assert_eq!(shell.category(), "Gas");
        assert_eq!(shell.last_modified(), now);
        assert_eq!(store.get("NULL CAT").unwrap().category(), "");

        assert_eq!(report.legacy, vec!["SHELL OIL".to_string()]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["BAD TIME", "ODD ONE"]);
    }

    #[test]
    fn test_parse_not_an_object() {
        assert!(RuleStore::parse_json(b"[1, 2]", Timestamp::now()).is_err());
    }

    #[test]
    fn test_save_load_is_equivalent() {
        let mut store = RuleStore::new();
        store.insert("UBER", Rule::new("Travel", ts("2024-05-05 10:00:00")));
        store.insert("NETFLIX.COM", Rule::new("", ts("2023-12-31 23:59:59")));
        let bytes = store.to_json().unwrap();
        let (reloaded, report) = RuleStore::parse_json(&bytes, Timestamp::now()).unwrap();
        assert_eq!(reloaded, store);
        assert!(report.legacy.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_written_form() {
        let mut store = RuleStore::new();
        store.insert("UBER", Rule::new("Travel", ts("2024-05-05 10:00:00")));
        let text = String::from_utf8(store.to_json().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["UBER"]["category"], "Travel");
        assert_eq!(value["UBER"]["last_modified"], "2024-05-05 10:00:00");
    }
}
