//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::commands::sync_down;
use crate::identity::StaticIdentity;
use crate::store::{TestStore, TestStoreState};
use crate::{Config, Mode};
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

pub(crate) const TEST_USER: &str = "pat@example.com";

/// Test environment that sets up a finboard home directory with a Config whose store is a fresh
/// `TestStore` namespace. Holds TempDir to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config. Nothing has been downloaded yet.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("finboard");

        // The namespace of the in-memory store is the store URL, so every env gets its own data
        let rand = Uuid::new_v4().to_string().replace('-', "");
        let store_url = format!("file:///finboard-test/{rand}");
        let config = Config::create(&root, &store_url, &[TEST_USER, "sam@example.com"])
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Creates a test environment and runs `sync down` so that a working copy exists.
    pub(crate) async fn synced() -> Self {
        let env = Self::new().await;
        sync_down(env.config(), Mode::Testing, &env.identity())
            .await
            .unwrap();
        env
    }

    /// Returns a clone of the Config.
    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    pub(crate) fn root(&self) -> &Path {
        self.config.root()
    }

    /// The identity of an allowed user.
    pub(crate) fn identity(&self) -> StaticIdentity {
        StaticIdentity(Some(TEST_USER.to_string()))
    }

    /// Gets the current state of the TestStore associated with this environment.
    pub(crate) fn get_state(&self) -> TestStoreState {
        self.store().get_state().unwrap()
    }

    /// Sets the state of the TestStore associated with this environment.
    pub(crate) fn set_state(&self, state: TestStoreState) {
        self.store().set_state(state).unwrap()
    }

    fn store(&self) -> TestStore {
        TestStore::new(self.config.store_url().as_str())
    }
}
