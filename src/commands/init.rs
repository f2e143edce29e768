use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json`.
///
/// # Arguments
/// - `finboard_home` - The directory that will be the root of data directory, e.g. `$HOME/finboard`
/// - `store_url` - Where the transactions, categories and rules are stored, e.g.
///   `file:///srv/finboard` or `https://blobs.example.com/finboard/`
/// - `allowed_emails` - The identities that may use the data.
///
/// # Errors
/// - Returns an error if the URL is unusable, the allow list is empty, or any file operation
///   fails.
pub async fn init<S: AsRef<str>>(
    finboard_home: &Path,
    store_url: &str,
    allowed_emails: &[S],
) -> Result<Out<()>> {
    let config = Config::create(finboard_home, store_url, allowed_emails).await?;
    Ok(format!(
        "Successfully created the finboard directory and config at {}",
        config.root().display()
    )
    .into())
}
