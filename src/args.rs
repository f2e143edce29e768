//! These structs provide the CLI interface for the finboard CLI.

use crate::filter::TransactionFilter;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finboard: categorize and annotate your personal finance transactions.
///
/// Transactions, categories and categorization rules live in a shared blob store. This program
/// downloads them into a local working copy, lets you edit rules, categories and memos, and
/// uploads the result again.
///
/// A rule maps a piece of description text to a category. A rule applies to a transaction when,
/// ignoring case, either text contains the other. When several rules apply, the longest rule text
/// wins.
///
/// The signed-in user is read from FINBOARD_USER_EMAIL and must be on the allow list in
/// config.json.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the initial config.json.
    ///
    /// Run this first. It needs the location of the blob store and at least one email address
    /// that is allowed to use the data.
    Init(InitArgs),
    /// Download the data into the local working copy, or upload the working copy.
    Sync(SyncArgs),
    /// Show which category the rules assign to a description.
    Categorize(CategorizeArgs),
    /// List descriptions that no rule covers, with how often each occurs.
    Uncovered,
    /// List and edit categorization rules.
    Rules(RulesArgs),
    /// List and edit the category list.
    Categories(CategoriesArgs),
    /// List transactions, edit memos and re-apply rules.
    Transactions(TransactionsArgs),
    /// Show spending totals by category, card and month.
    Summary(SummaryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finboard data and configuration is held. Defaults to ~/finboard
    #[arg(long, env = "FINBOARD_HOME", default_value_t = default_finboard_home())]
    finboard_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, finboard_home: PathBuf) -> Self {
        Self {
            log_level,
            finboard_home: finboard_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finboard_home(&self) -> &DisplayPath {
        &self.finboard_home
    }
}

/// Args for the `finboard init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where the blobs live: file:///some/dir or an http(s):// base URL.
    #[arg(long)]
    store_url: String,

    /// An email address allowed to use the data. May be repeated.
    #[arg(long = "allow", required = true)]
    allowed_emails: Vec<String>,
}

impl InitArgs {
    pub fn new(store_url: impl Into<String>, allowed_emails: Vec<String>) -> Self {
        Self {
            store_url: store_url.into(),
            allowed_emails,
        }
    }

    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    pub fn allowed_emails(&self) -> &[String] {
        &self.allowed_emails
    }
}

#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum UpDown {
    Up,
    #[default]
    Down,
}

serde_plain::derive_display_from_serialize!(UpDown);
serde_plain::derive_fromstr_from_deserialize!(UpDown);

/// Args for the `finboard sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    /// The direction to sync: "up" or "down"
    direction: UpDown,

    /// Upload even if the remote data changed since the last download.
    #[arg(long)]
    force: bool,
}

impl SyncArgs {
    pub fn new(direction: UpDown, force: bool) -> Self {
        Self { direction, force }
    }

    pub fn direction(&self) -> UpDown {
        self.direction
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// Args for the `finboard categorize` command.
#[derive(Debug, Parser, Clone)]
pub struct CategorizeArgs {
    /// The transaction description to look up.
    description: String,
}

impl CategorizeArgs {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Parser, Clone)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

impl RulesArgs {
    pub fn new(command: RulesCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &RulesCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum RulesCommand {
    /// List rules, most recently modified first.
    List(RulesListArgs),
    /// Create a rule or change its category. Use "" to clear the category.
    Set {
        description: String,
        category: String,
    },
    /// Delete rules by their exact description text.
    Delete {
        #[arg(required = true)]
        descriptions: Vec<String>,
    },
    /// Apply a batch of edits from a JSON file: a list of
    /// {"description": ..., "new_category": ..., "delete": false}
    Apply {
        #[arg(long)]
        file: PathBuf,
    },
}

/// Args for `finboard rules list`.
#[derive(Debug, Default, Parser, Clone, Serialize, Deserialize)]
pub struct RulesListArgs {
    /// Only rules whose description contains this text, ignoring case.
    #[arg(long)]
    pub search: Option<String>,

    /// Only rules with these categories. Use "" for rules without one. May be repeated.
    #[arg(long = "category")]
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    command: CategoriesCommand,
}

impl CategoriesArgs {
    pub fn new(command: CategoriesCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &CategoriesCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesCommand {
    /// List the categories in order.
    List,
    /// Add categories to the end of the list.
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete categories. Rules and transactions that used them become uncategorized.
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Rename a category everywhere it is used.
    Rename { old: String, new: String },
}

#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    command: TransactionsCommand,
}

impl TransactionsArgs {
    pub fn new(command: TransactionsCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &TransactionsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionsCommand {
    /// List transactions with their row numbers.
    List(TransactionFilter),
    /// Set the memo of the transaction at ROW. Use "" to clear it.
    Memo { row: usize, text: String },
    /// Re-apply the rules to every transaction.
    Recategorize,
}

/// Args for the `finboard summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[clap(flatten)]
    filter: TransactionFilter,
}

impl SummaryArgs {
    pub fn new(filter: TransactionFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &TransactionFilter {
        &self.filter
    }
}

fn default_finboard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finboard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finboard-home or FINBOARD_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("finboard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
