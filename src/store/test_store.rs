//! Implements the `Store` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a real blob store.

use crate::error::Res;
use crate::store::{Store, CATEGORIES, RULES, TRANSACTIONS};
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

/// The blobs of one test store, by key.
pub(crate) type TestStoreState = HashMap<String, Vec<u8>>;

/// All test stores in the process, by namespace. A namespace is first seeded on first use.
static STATES: LazyLock<Mutex<HashMap<String, TestStoreState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// An implementation of the `Store` trait that does not leave the process. Every `TestStore` with
/// the same namespace sees the same blobs, so state survives from one command to the next.
pub(crate) struct TestStore {
    namespace: String,
}

impl TestStore {
    pub(crate) fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Returns a copy of the blobs in this namespace.
    pub(crate) fn get_state(&self) -> Res<TestStoreState> {
        let mut states = lock()?;
        Ok(states
            .entry(self.namespace.clone())
            .or_insert_with(default_state)
            .clone())
    }

    /// Replaces the blobs in this namespace.
    #[cfg(test)]
    pub(crate) fn set_state(&self, state: TestStoreState) -> Res<()> {
        lock()?.insert(self.namespace.clone(), state);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for TestStore {
    async fn get(&mut self, key: &str) -> Res<Option<Vec<u8>>> {
        Ok(self.get_state()?.get(key).cloned())
    }

    async fn put(&mut self, key: &str, bytes: Vec<u8>) -> Res<()> {
        lock()?
            .entry(self.namespace.clone())
            .or_insert_with(default_state)
            .insert(key.to_string(), bytes);
        Ok(())
    }
}

fn lock() -> Res<MutexGuard<'static, HashMap<String, TestStoreState>>> {
    STATES
        .lock()
        .map_err(|_| anyhow!("The test store lock is poisoned"))
}

/// Provides the seed data from this module.
pub(crate) fn default_state() -> TestStoreState {
    let mut map = HashMap::new();
    map.insert(TRANSACTIONS.to_string(), TRANSACTION_DATA.as_bytes().to_vec());
    map.insert(CATEGORIES.to_string(), CATEGORY_DATA.as_bytes().to_vec());
    map.insert(RULES.to_string(), RULE_DATA.as_bytes().to_vec());
    map
}

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"Date,Description,Amount,Currency,Category,Card,Month,Type,Memo
2025-10-01,CITY WATER DISTRICT,45.88,USD,Bills & Utilities,Checking,2025-10,Sale,
2025-10-02,IN-N-OUT BURGER 112,9.75,USD,Food & Drink,Sapphire,2025-10,Sale,
2025-10-03,SHELL OIL 57444,61.45,USD,Gas,Freedom,2025-10,Sale,
2025-10-04,STARBUCKKS #1923 SEATTLE WA,5.95,USD,Food & Drink,Sapphire,2025-10,Sale,
2025-10-05,COSTCO WHSE #0113,118.56,USD,Groceries,Freedom,2025-10,Sale,
2025-10-06,AMAZON MKTPLACE PMTS,34.99,USD,Shopping,Sapphire,2025-10,Sale,
2025-10-07,AMAZON MKTPLACE PMTS,-34.99,USD,Shopping,Sapphire,2025-10,Return,refund for the lamp
2025-10-08,UBER TRIP HELP.UBER.COM,23.10,USD,Travel,Sapphire,2025-10,Sale,
2025-10-09,UBER EATS HELP.UBER.COM,31.40,USD,Food & Drink,Sapphire,2025-10,Sale,
2025-10-10,TRADER JOE'S #429,63.21,USD,Groceries,Freedom,2025-10,Sale,
2025-10-11,COMCAST INTERNET,89.99,USD,Bills & Utilities,Checking,2025-10,Sale,
2025-10-12,PAYMENT THANK YOU,-500.00,USD,,Sapphire,2025-10,Payment,
2025-10-14,BLUE BOTTLE COFFEE,8.50,USD,,Sapphire,2025-10,Sale,
2025-11-01,STARBUCKKS #2847 SEATTLE WA,6.75,USD,Food & Drink,Sapphire,2025-11,Sale,
2025-11-02,SHELL OIL 57444,52.30,USD,Gas,Freedom,2025-11,Sale,
2025-11-03,ZARA LONDON,54.00,GBP,Shopping,Sapphire,2025-11,Sale,
2025-11-04,NETFLIX.COM,15.49,USD,Entertainment,Freedom,2025-11,Sale,
2025-11-05,BLUE BOTTLE COFFEE,7.25,USD,,Sapphire,2025-11,Sale,
"##;

/// Seed category data.
const CATEGORY_DATA: &str = r##"[
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
    "Miscellaneous"
]"##;

/// Seed rule data. `COSTCO` is stored in the legacy form.
const RULE_DATA: &str = r##"{
    "STARBUCKKS": {"category": "Food & Drink", "last_modified": "2025-09-01 08:00:00"},
    "SHELL OIL": {"category": "Gas", "last_modified": "2025-09-01 08:00:00"},
    "COSTCO": "Groceries",
    "AMAZON MKTPLACE": {"category": "Shopping", "last_modified": "2025-09-02 12:30:00"},
    "UBER": {"category": "Travel", "last_modified": "2025-09-03 19:15:00"},
    "UBER EATS": {"category": "Food & Drink", "last_modified": "2025-09-03 19:16:00"},
    "COMCAST": {"category": "Bills & Utilities", "last_modified": "2025-09-04 07:00:00"},
    "WATER DISTRICT": {"category": "Bills & Utilities", "last_modified": "2025-09-04 07:01:00"},
    "PAYMENT THANK YOU": {"category": "", "last_modified": "2025-09-05 10:00:00"},
    "NETFLIX": {"category": "Entertainment", "last_modified": "2025-09-06 21:00:00"}
}"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_namespaces_are_shared_and_isolated() {
        let ns = format!("test://{}", uuid::Uuid::new_v4());
        let mut a = TestStore::new(&ns);
        let mut b = TestStore::new(&ns);
        let mut other = TestStore::new(format!("test://{}", uuid::Uuid::new_v4()));

        assert!(a.get(RULES).await.unwrap().is_some());
        a.put(RULES, b"{}".to_vec()).await.unwrap();
        assert_eq!(b.get(RULES).await.unwrap().unwrap(), b"{}".to_vec());
        assert_ne!(other.get(RULES).await.unwrap().unwrap(), b"{}".to_vec());
        assert!(a.get("missing.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_state_replaces_namespace() {
        let ns = format!("test://{}", uuid::Uuid::new_v4());
        let mut store = TestStore::new(&ns);
        let mut state = TestStoreState::new();
        state.insert(RULES.to_string(), b"{}".to_vec());
        store.set_state(state).unwrap();
        assert!(store.get(TRANSACTIONS).await.unwrap().is_none());
        assert_eq!(store.get_state().unwrap().len(), 1);
    }
}
