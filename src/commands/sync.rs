use crate::backup::{SYNC_DOWN, SYNC_UP_PRE};
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult};
use crate::identity::{authorize, IdentityProvider};
use crate::model::{DashboardData, SkippedRule};
use crate::store::Remote;
use crate::working::{self, WorkingCopy};
use crate::{store, Config, Mode, Result, Session};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What a sync moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncReport {
    pub transactions: usize,
    pub categories: usize,
    pub rules: usize,
    /// Rules that were stored in the legacy form and have been given a timestamp.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_rules: Vec<String>,
    /// Rules that could not be read and were left out.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rules: Vec<SkippedRule>,
}

impl SyncReport {
    fn counts(data: &DashboardData) -> Self {
        Self {
            transactions: data.transactions().len(),
            categories: data.categories().len(),
            rules: data.rules().len(),
            ..Self::default()
        }
    }
}

/// Downloads transactions, categories and rules from the store, saves a `sync-down` backup and
/// replaces the local working copy.
///
/// # Errors
/// - `Unauthorized` if the caller is not on the allow list.
/// - `StorageUnavailable` if the store cannot be read.
/// - `MalformedData` if an artifact cannot be parsed at all.
pub async fn sync_down(
    config: Config,
    mode: Mode,
    identity: &dyn IdentityProvider,
) -> Result<Out<SyncReport>> {
    let user = authorize(&config, identity)?;
    let mut remote = store::remote(&config, mode).await?;
    let (data, load_report) = remote.load_all().await?;

    // Save backup immediately after download
    let backup_path = config
        .backup()
        .save_json(SYNC_DOWN, &data)
        .await
        .pub_result(ErrorType::Internal)?;
    debug!("Saved backup to {}", backup_path.display());

    let mut report = SyncReport::counts(&data);
    report.legacy_rules = load_report.legacy;
    report.skipped_rules = load_report.skipped;

    // Starting a session reports categories that are referenced but not registered
    let session = Session::new(user, data);
    working::save(
        &config,
        &WorkingCopy {
            user: session.user().to_string(),
            data: session.into_data(),
        },
    )
    .await?;

    let mut message = format!(
        "Downloaded {} transactions, {} categories and {} rules",
        report.transactions, report.categories, report.rules
    );
    if !report.skipped_rules.is_empty() {
        message.push_str(&format!(
            ", {} unreadable rules were left out",
            report.skipped_rules.len()
        ));
    }
    Ok(Out::new(message, report))
}

/// Uploads the local working copy to the store.
///
/// Before anything is written, the remote data is downloaded and compared with the most recent
/// `sync-down` backup. If someone else changed it in the meantime the upload is refused with
/// `Conflict`, unless `force` is set. The remote data is saved as a `sync-up-pre` backup, then
/// transactions, categories and rules are written in that order. The uploaded artifacts become
/// the new `sync-down` baseline.
pub async fn sync_up(
    config: Config,
    mode: Mode,
    identity: &dyn IdentityProvider,
    force: bool,
) -> Result<Out<SyncReport>> {
    let user = authorize(&config, identity)?;
    let copy = working::load(&config).await?;
    if copy.data.transactions().is_empty() {
        return Err(Error::new(
            ErrorType::InvalidInput,
            anyhow!("The working copy has no transactions, run 'finboard sync down' to get data"),
        ));
    }

    let mut remote = store::remote(&config, mode).await?;
    push(&config, &mut remote, &copy.data, force).await?;
    info!("{user} uploaded the working copy");

    let report = SyncReport::counts(&copy.data);
    Ok(Out::new(
        format!(
            "Uploaded {} transactions, {} categories and {} rules",
            report.transactions, report.categories, report.rules
        ),
        report,
    ))
}

/// Checks `remote` against the `sync-down` baseline and writes `data` to it. Whatever reached the
/// store becomes the new baseline, even when a later write fails, so that a retry does not see
/// this upload as someone else's change.
async fn push(
    config: &Config,
    remote: &mut Remote,
    data: &DashboardData,
    force: bool,
) -> Result<()> {
    let (current, _) = remote.load_all().await?;

    let backup = config.backup();
    let baseline = backup
        .load_latest(SYNC_DOWN)
        .await
        .pub_result(ErrorType::Internal)?;
    match baseline {
        Some(baseline) if same_content(&baseline, &current) => {}
        _ if force => warn!("The remote data changed since the last download, overwriting it"),
        Some(_) => {
            return Err(Error::new(
                ErrorType::Conflict,
                anyhow!(
                    "The remote data changed since the last 'finboard sync down'. Download it \
                    again, or use --force to overwrite it"
                ),
            ))
        }
        None => {
            return Err(Error::new(
                ErrorType::Conflict,
                anyhow!(
                    "There is no record of the last download to compare with. Run 'finboard \
                    sync down' first, or use --force to overwrite the remote data"
                ),
            ))
        }
    }

    let pre_backup = backup
        .save_json(SYNC_UP_PRE, &current)
        .await
        .pub_result(ErrorType::Internal)?;
    debug!("Saved pre-upload backup to {}", pre_backup.display());

    let mut written = current.clone();
    let result = remote.save_all(data, &mut written).await;
    if result.is_ok() || written != current {
        let baseline_path = backup
            .save_json(SYNC_DOWN, &written)
            .await
            .pub_result(ErrorType::Internal)?;
        debug!("Saved the new baseline to {}", baseline_path.display());
    }
    result
}

/// Compares two downloads. Rule timestamps are ignored because legacy entries get a fresh one on
/// every load.
fn same_content(a: &DashboardData, b: &DashboardData) -> bool {
    a.transactions() == b.transactions()
        && a.categories() == b.categories()
        && a.rules().len() == b.rules().len()
        && a
            .rules()
            .iter()
            .zip(b.rules().iter())
            .all(|((ka, ra), (kb, rb))| ka == kb && ra.category() == rb.category())
}
