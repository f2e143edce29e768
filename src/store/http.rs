//! A `Store` that reads and writes blobs over HTTP: `GET {base}{key}` and `PUT {base}{key}`.
//!
//! This fits an S3-style bucket endpoint or any plain blob server. A 404 means the blob does not
//! exist yet.

use crate::error::Res;
use crate::store::Store;
use crate::utils;
use anyhow::{bail, Context};
use reqwest::StatusCode;
use std::path::Path;
use tracing::{debug, trace};
use url::Url;

pub(crate) struct HttpStore {
    base: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    /// Creates the store. If a token file exists at `token_path`, its trimmed content is sent as
    /// a bearer token with every request.
    pub(crate) async fn new(base: Url, token_path: &Path) -> Res<Self> {
        let token = if token_path.is_file() {
            debug!("Using the store token at {}", token_path.display());
            let token = utils::read(token_path).await?.trim().to_string();
            Some(token).filter(|t| !t.is_empty())
        } else {
            None
        };
        Ok(Self::with_token(base, token))
    }

    pub(crate) fn with_token(mut base: Url, token: Option<String>) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, key: &str) -> Res<Url> {
        self.base
            .join(key)
            .with_context(|| format!("Unable to build a URL for blob '{key}'"))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl Store for HttpStore {
    async fn get(&mut self, key: &str) -> Res<Option<Vec<u8>>> {
        let url = self.url(key)?;
        trace!("GET {url}");
        let response = self
            .request(self.client.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("Failed to send request for {url}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("GET {url} failed with status {status}: {body}");
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read the response body from {url}"))?;
        Ok(Some(bytes.to_vec()))
    }

    async fn put(&mut self, key: &str, bytes: Vec<u8>) -> Res<()> {
        let url = self.url(key)?;
        trace!("PUT {url} ({} bytes)", bytes.len());
        let response = self
            .request(self.client.put(url.clone()))
            .header(reqwest::header::CONTENT_TYPE, content_type(key))
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Failed to send request for {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("PUT {url} failed with status {status}: {body}");
        }
        Ok(())
    }
}

fn content_type(key: &str) -> &'static str {
    if key.ends_with(".csv") {
        "text/csv"
    } else if key.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_base_path() {
        let store = HttpStore::with_token(Url::parse("https://blobs.example.com/me").unwrap(), None);
        assert_eq!(
            store.url("categories.json").unwrap().as_str(),
            "https://blobs.example.com/me/categories.json"
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("all_transactions.csv"), "text/csv");
        assert_eq!(content_type("category_rules.json"), "application/json");
    }

    #[tokio::test]
    async fn test_missing_token_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = HttpStore::new(
            Url::parse("http://localhost:9/").unwrap(),
            &dir.path().join("store_token"),
        )
        .await
        .unwrap();
        assert!(store.token.is_none());
    }
}
