//! Reads and writes the three dashboard artifacts through a `Store`.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{
    CategoryRegistry, DashboardData, RuleLoadReport, RuleStore, Timestamp, Transactions,
};
use crate::store::{Store, CATEGORIES, RULES, TRANSACTIONS};
use crate::Result;
use anyhow::{anyhow, Context};
use tracing::{debug, info};

/// The artifact codec on top of a blob `Store`.
///
/// Any failure to reach the store is `StorageUnavailable`. A blob that was fetched but cannot be
/// parsed is `MalformedData`. Nothing here retries.
pub(crate) struct Remote {
    store: Box<dyn Store + Send>,
}

impl Remote {
    pub(crate) fn new(store: Box<dyn Store + Send>) -> Self {
        Self { store }
    }

    pub(crate) async fn load_transactions(&mut self) -> Result<Transactions> {
        let bytes = self.get(TRANSACTIONS).await?.ok_or_else(|| {
            Error::new(
                ErrorType::StorageUnavailable,
                anyhow!("The transactions blob '{TRANSACTIONS}' does not exist in the store"),
            )
        })?;
        Transactions::parse_csv(&bytes)
            .with_context(|| format!("Unable to parse '{TRANSACTIONS}'"))
            .pub_result(ErrorType::MalformedData)
    }

    pub(crate) async fn save_transactions(&mut self, transactions: &Transactions) -> Result<()> {
        let bytes = transactions
            .to_csv()
            .pub_result(ErrorType::Internal)?;
        self.put(TRANSACTIONS, bytes).await
    }

    /// Loads the category list. A store without one gets the default categories.
    pub(crate) async fn load_categories(&mut self) -> Result<CategoryRegistry> {
        match self.get(CATEGORIES).await? {
            Some(bytes) => CategoryRegistry::parse_json(&bytes)
                .with_context(|| format!("Unable to parse '{CATEGORIES}'"))
                .pub_result(ErrorType::MalformedData),
            None => {
                info!("No category list in the store, starting from the defaults");
                Ok(CategoryRegistry::with_defaults())
            }
        }
    }

    pub(crate) async fn save_categories(&mut self, categories: &CategoryRegistry) -> Result<()> {
        let bytes = categories.to_json().pub_result(ErrorType::Internal)?;
        self.put(CATEGORIES, bytes).await
    }

    /// Loads the rules. A store without a rule set gets an empty one. Entries that cannot be
    /// decoded are skipped and listed in the report.
    pub(crate) async fn load_rules(&mut self) -> Result<(RuleStore, RuleLoadReport)> {
        match self.get(RULES).await? {
            Some(bytes) => RuleStore::parse_json(&bytes, Timestamp::now())
                .with_context(|| format!("Unable to parse '{RULES}'"))
                .pub_result(ErrorType::MalformedData),
            None => {
                info!("No rules in the store, starting with none");
                Ok((RuleStore::new(), RuleLoadReport::default()))
            }
        }
    }

    pub(crate) async fn save_rules(&mut self, rules: &RuleStore) -> Result<()> {
        let bytes = rules.to_json().pub_result(ErrorType::Internal)?;
        self.put(RULES, bytes).await
    }

    /// Loads all three artifacts. Nothing is returned unless all of them load.
    pub(crate) async fn load_all(&mut self) -> Result<(DashboardData, RuleLoadReport)> {
        let transactions = self.load_transactions().await?;
        let categories = self.load_categories().await?;
        let (rules, report) = self.load_rules().await?;
        debug!(
            "Loaded {} transactions, {} categories and {} rules",
            transactions.len(),
            categories.len(),
            rules.len()
        );
        Ok((DashboardData::new(transactions, categories, rules), report))
    }

    /// Writes all three artifacts: transactions, then categories, then rules. Each artifact is
    /// copied into `written` once it has reached the store, so after a failure `written` holds
    /// what the store now contains.
    pub(crate) async fn save_all(
        &mut self,
        data: &DashboardData,
        written: &mut DashboardData,
    ) -> Result<()> {
        self.save_transactions(data.transactions()).await?;
        written.transactions = data.transactions.clone();
        self.save_categories(data.categories()).await?;
        written.categories = data.categories.clone();
        self.save_rules(data.rules()).await?;
        written.rules = data.rules.clone();
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store
            .get(key)
            .await
            .with_context(|| format!("Unable to fetch '{key}' from the store"))
            .pub_result(ErrorType::StorageUnavailable)
    }

    async fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.store
            .put(key, bytes)
            .await
            .with_context(|| format!("Unable to write '{key}' to the store"))
            .pub_result(ErrorType::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Res;
    use crate::store::{DirStore, TestStore};
    use tempfile::TempDir;

    struct DownStore;

    #[async_trait::async_trait]
    impl Store for DownStore {
        async fn get(&mut self, _key: &str) -> Res<Option<Vec<u8>>> {
            Err(anyhow!("connection refused"))
        }

        async fn put(&mut self, _key: &str, _bytes: Vec<u8>) -> Res<()> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_empty_store_defaults() {
        let dir = TempDir::new().unwrap();
        let mut remote = Remote::new(Box::new(DirStore::new(dir.path())));
        assert_eq!(remote.load_categories().await.unwrap().len(), 14);
        assert!(remote.load_rules().await.unwrap().0.is_empty());
        let err = remote.load_transactions().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StorageUnavailable);
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let mut remote = Remote::new(Box::new(DownStore));
        let err = remote.load_all().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StorageUnavailable);
        assert!(err.to_string().contains("connection refused"));
        let err = remote.save_rules(&RuleStore::new()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StorageUnavailable);
    }

    #[tokio::test]
    async fn test_malformed_blob() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::new(dir.path());
        store.put(RULES, b"not json".to_vec()).await.unwrap();
        let mut remote = Remote::new(Box::new(store));
        let err = remote.load_rules().await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedData);
    }

    #[tokio::test]
    async fn test_save_then_load_all() {
        let ns = format!("test://{}", uuid::Uuid::new_v4());
        let mut remote = Remote::new(Box::new(TestStore::new(&ns)));
        let (data, report) = remote.load_all().await.unwrap();
        assert_eq!(report.legacy, vec!["COSTCO".to_string()]);
        assert!(report.skipped.is_empty());

        let mut written = DashboardData::default();
        remote.save_all(&data, &mut written).await.unwrap();
        assert_eq!(written, data);
        let (reloaded, report) = remote.load_all().await.unwrap();
        assert_eq!(reloaded, data);
        assert!(report.legacy.is_empty());
    }
}
