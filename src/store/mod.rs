//! The boundary to the shared blob store that holds the three dashboard artifacts.
//!
//! A `Store` only knows how to fetch and replace whole blobs by key. `Remote` layers the artifact
//! formats on top of it and maps failures to the public error kinds.

mod dir;
mod http;
mod remote;
mod test_store;

use crate::error::{ErrorType, IntoResult, Res};
use crate::Config;
use anyhow::bail;
use tracing::debug;

pub(crate) use dir::DirStore;
pub(crate) use http::HttpStore;
pub(crate) use remote::Remote;
pub(crate) use test_store::TestStore;
#[cfg(test)]
pub(crate) use test_store::TestStoreState;

/// The key of the transactions table.
pub const TRANSACTIONS: &str = "all_transactions.csv";
/// The key of the category list.
pub const CATEGORIES: &str = "categories.json";
/// The key of the rule set.
pub const RULES: &str = "category_rules.json";

/// When `FINBOARD_IN_TEST_MODE` is set and non-empty, the in-memory `TestStore` is used in place
/// of the configured store.
pub const TEST_MODE_ENV: &str = "FINBOARD_IN_TEST_MODE";

/// Fetches and replaces whole blobs. There are no partial reads or writes.
#[async_trait::async_trait]
pub(crate) trait Store {
    /// Returns the blob stored at `key`, or `None` if there is no such blob.
    async fn get(&mut self, key: &str) -> Res<Option<Vec<u8>>>;

    /// Replaces the blob stored at `key`.
    async fn put(&mut self, key: &str, bytes: Vec<u8>) -> Res<()>;
}

/// Selects the kind of store to talk to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Mode {
    /// Use the store named by `store_url` in the config.
    #[default]
    Configured,
    /// Use the in-memory test store.
    Testing,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Testing,
            _ => Mode::Configured,
        }
    }
}

/// Creates the store for `config`.
pub(crate) async fn store(config: &Config, mode: Mode) -> Res<Box<dyn Store + Send>> {
    let url = config.store_url();
    if mode == Mode::Testing {
        debug!("Using the in-memory test store for {url}");
        return Ok(Box::new(TestStore::new(url.as_str())));
    }
    match url.scheme() {
        "file" => Ok(Box::new(DirStore::from_url(url)?)),
        "http" | "https" => Ok(Box::new(
            HttpStore::new(url.clone(), &config.store_token_path()).await?,
        )),
        other => bail!("Unsupported store URL scheme '{other}'"),
    }
}

/// Creates a `Remote` for `config`.
pub(crate) async fn remote(config: &Config, mode: Mode) -> crate::Result<Remote> {
    let store = store(config, mode)
        .await
        .pub_result(ErrorType::StorageUnavailable)?;
    Ok(Remote::new(store))
}
