//! Command handlers for the finboard CLI.
//!
//! This module contains implementations for all CLI subcommands. Every command except `init`
//! checks the caller against the allow list first. Commands other than `sync` work on the local
//! working copy and never touch the store.

mod categories;
mod categorize;
mod init;
mod rules;
mod summary;
mod sync;
mod transactions;
mod uncovered;

use crate::identity::{authorize, IdentityProvider};
use crate::working::{self, WorkingCopy};
use crate::{Config, Result, Session};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub use categories::{add_categories, delete_categories, list_categories, rename_category};
pub use categorize::{categorize, Categorized};
pub use init::init;
pub use rules::{apply_rule_file, delete_rules, list_rules, set_rule, RuleListing, RuleRow};
pub use summary::summary;
pub use sync::{sync_down, sync_up, SyncReport};
pub use transactions::{list_transactions, recategorize, set_memo, TransactionRow};
pub use uncovered::uncovered;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Authorizes the caller and opens a session over the local working copy.
async fn open(config: &Config, identity: &dyn IdentityProvider) -> Result<Session> {
    let user = authorize(config, identity)?;
    let copy = working::load(config).await?;
    if !copy.user.eq_ignore_ascii_case(&user) {
        warn!(
            "The working copy was last written by {}, continuing as {user}",
            copy.user
        );
    }
    Ok(Session::new(user, copy.data))
}

/// Writes the session's data back to the local working copy.
async fn commit(config: &Config, session: Session) -> Result<()> {
    let copy = WorkingCopy {
        user: session.user().to_string(),
        data: session.into_data(),
    };
    working::save(config, &copy).await
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 {
        singular
    } else {
        plural
    }
}
