//! The local working copy of the dashboard data, kept between commands in `working.json`.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::DashboardData;
use crate::{utils, Config, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What is stored in `working.json`: the data plus the identity that last wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct WorkingCopy {
    pub(crate) user: String,
    pub(crate) data: DashboardData,
}

/// Loads the working copy. Fails with `InvalidInput` if there is none yet.
pub(crate) async fn load(config: &Config) -> Result<WorkingCopy> {
    let path = config.working_path();
    if !path.is_file() {
        return Err(Error::new(
            ErrorType::InvalidInput,
            anyhow!("There is no local data yet, run 'finboard sync down' first"),
        ));
    }
    utils::deserialize(path)
        .await
        .context("The local working copy is unreadable, run 'finboard sync down' to replace it")
        .pub_result(ErrorType::MalformedData)
}

/// Replaces the working copy in one step.
pub(crate) async fn save(config: &Config, copy: &WorkingCopy) -> Result<()> {
    let path = config.working_path();
    let json = serde_json::to_string_pretty(copy)
        .context("Unable to serialize the working copy")
        .pub_result(ErrorType::Internal)?;
    utils::write_replace(path, json)
        .await
        .pub_result(ErrorType::Internal)?;
    debug!("Saved the working copy to {}", path.display());
    Ok(())
}
