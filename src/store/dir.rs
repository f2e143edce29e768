//! A `Store` backed by a directory, one file per key.

use crate::error::Res;
use crate::store::Store;
use crate::utils;
use anyhow::{anyhow, bail};
use std::path::PathBuf;
use tracing::trace;
use url::Url;

pub(crate) struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn from_url(url: &Url) -> Res<Self> {
        let root = url
            .to_file_path()
            .map_err(|_| anyhow!("The store URL '{url}' is not a usable local path"))?;
        Ok(Self::new(root))
    }

    fn path(&self, key: &str) -> Res<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.') {
            bail!("Invalid blob key '{key}'");
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl Store for DirStore {
    async fn get(&mut self, key: &str) -> Res<Option<Vec<u8>>> {
        let path = self.path(key)?;
        trace!("get {}", path.display());
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(utils::read_bytes(&path).await?))
    }

    async fn put(&mut self, key: &str, bytes: Vec<u8>) -> Res<()> {
        let path = self.path(key)?;
        trace!("put {} ({} bytes)", path.display(), bytes.len());
        utils::make_dir(&self.root).await?;
        utils::write_replace(&path, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_put() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::new(dir.path().join("blobs"));
        assert!(store.get("categories.json").await.unwrap().is_none());
        store
            .put("categories.json", b"[\"Gas\"]".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get("categories.json").await.unwrap().unwrap(),
            b"[\"Gas\"]".to_vec()
        );
    }

    #[tokio::test]
    async fn test_bad_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::new(dir.path());
        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.put("", vec![]).await.is_err());
    }

    #[test]
    fn test_from_url() {
        let url = Url::parse("file:///var/tmp/blobs").unwrap();
        let store = DirStore::from_url(&url).unwrap();
        assert_eq!(store.root, PathBuf::from("/var/tmp/blobs"));
    }
}
