//! Configuration file handling for finboard.
//!
//! The configuration file is stored at `$FINBOARD_HOME/config.json` and contains the location of
//! the blob store, the list of people allowed to use the data, and backup settings.

use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "finboard";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const STORE_TOKEN: &str = "store_token";
const CONFIG_JSON: &str = "config.json";
const WORKING_JSON: &str = "working.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINBOARD_HOME` and from there it loads `$FINBOARD_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    working_path: PathBuf,
    config_file: ConfigFile,
    store_url: Url,
}

impl Config {
    /// Creates the home directory and its subdirectories, then writes an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory, e.g. `$HOME/finboard`
    /// - `store_url` - Where the shared blobs live, either `file:///some/dir` or an
    ///   `http(s)://` base URL.
    /// - `allowed_emails` - The identities that may read and change the data.
    ///
    /// # Errors
    /// - Returns an error if the URL is unusable or any file operation fails.
    pub async fn create<S: AsRef<str>>(
        dir: impl Into<PathBuf>,
        store_url: &str,
        allowed_emails: &[S],
    ) -> Result<Self> {
        Self::create_inner(dir.into(), store_url, allowed_emails)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner<S: AsRef<str>>(
        maybe_relative: PathBuf,
        store_url: &str,
        allowed_emails: &[S],
    ) -> Res<Self> {
        let url = parse_store_url(store_url)?;
        let allowed_emails: Vec<String> = allowed_emails
            .iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if allowed_emails.is_empty() {
            bail!("At least one allowed email address is required");
        }

        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finboard home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir).await?;
        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            store_url: url.to_string(),
            allowed_emails,
            backup_copies: BACKUP_COPIES,
            store_token_path: None,
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            working_path: root.join(WORKING_JSON),
            root,
            backups: backups_dir,
            secrets: secrets_dir,
            config_path,
            config_file,
            store_url: url,
        })
    }

    /// This will
    /// - validate that `finboard_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and secrets directories exist
    /// - return the loaded configuration object
    pub async fn load(finboard_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(finboard_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The finboard home directory is missing, run 'finboard init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let store_url = parse_store_url(&config_file.store_url)?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            config_path,
            working_path: root.join(WORKING_JSON),
            config_file,
            store_url,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The local working copy, written by `sync down` and by every editing command.
    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    pub fn store_url(&self) -> &Url {
        &self.store_url
    }

    pub fn allowed_emails(&self) -> &[String] {
        &self.config_file.allowed_emails
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Returns the stored `store_token_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn store_token_path(&self) -> PathBuf {
        let p = self.config_file.store_token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finboard",
///   "config_version": 1,
///   "store_url": "https://blobs.example.com/finance/",
///   "allowed_emails": ["pat@example.com"],
///   "backup_copies": 5,
///   "store_token_path": ".secrets/store_token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the blob store
    store_url: String,

    /// Email addresses that may use the data
    #[serde(default)]
    allowed_emails: Vec<String>,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Path to a file holding a bearer token for an HTTP store (optional, relative to the home
    /// directory or absolute). Defaults to $FINBOARD_HOME/.secrets/store_token if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    store_token_path: Option<PathBuf>,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        utils::serialize(path.as_ref(), self)
            .await
            .context("Unable to write config file")
    }

    fn store_token_path(&self) -> PathBuf {
        self.store_token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(STORE_TOKEN))
    }
}

/// Parses and checks the store location. Only `file`, `http` and `https` are supported.
fn parse_store_url(s: &str) -> Res<Url> {
    let url = Url::parse(s.trim()).with_context(|| format!("Invalid store URL '{s}'"))?;
    match url.scheme() {
        "file" | "http" | "https" => Ok(url),
        other => bail!("Unsupported store URL scheme '{other}', expected file, http or https"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finboard_home");
        let store = format!("file://{}", dir.path().join("store").display());

        let config = Config::create(&home_dir, &store, &["pat@example.com", "  "])
            .await
            .unwrap();
        assert!(config.backups().is_dir());
        assert!(config.secrets().is_dir());
        assert_eq!(config.allowed_emails(), &["pat@example.com".to_string()]);
        assert_eq!(config.backup_copies(), 5);
        assert_eq!(config.store_url().scheme(), "file");

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.config_file, config.config_file);
        assert_eq!(
            loaded.store_token_path(),
            loaded.root().join(".secrets").join("store_token")
        );
        assert_eq!(loaded.working_path(), loaded.root().join("working.json"));
    }

    #[tokio::test]
    async fn test_config_create_requires_an_email() {
        let dir = TempDir::new().unwrap();
        let err = Config::create(dir.path(), "https://example.com/", &Vec::<String>::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "finboard",
            "config_version": 1,
            "store_url": "https://example.com/blobs/"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.backup_copies, 5);
        assert!(config.allowed_emails.is_empty());
        assert_eq!(
            config.store_token_path(),
            PathBuf::from(SECRETS).join(STORE_TOKEN)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "ledgerly",
            "config_version": 1,
            "store_url": "https://example.com/"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_serialization_omits_none_fields() {
        let config = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            store_url: "https://example.com/".to_string(),
            allowed_emails: vec![],
            backup_copies: 5,
            store_token_path: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("store_token_path"));
    }

    #[test]
    fn test_parse_store_url() {
        assert!(parse_store_url("file:///tmp/blobs").is_ok());
        assert!(parse_store_url("https://example.com/b/").is_ok());
        assert!(parse_store_url("s3://bucket").is_err());
        assert!(parse_store_url("not a url").is_err());
    }
}
