use clap::Parser;
use finboard::args::{
    Args, CategoriesCommand, Command, RulesCommand, TransactionsCommand, UpDown,
};
use finboard::identity::EnvIdentity;
use finboard::{commands, Config, Mode, Result};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error ({}): {e}", e.error_type());
            std::process::ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().finboard_home().path();

    // This allows for running the program without a real blob store. When FINBOARD_IN_TEST_MODE
    // is set and non-empty, the in-memory store is used.
    let mode = Mode::from_env();
    let identity = EnvIdentity;

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.store_url(), init_args.allowed_emails())
                .await?
                .print()
        }

        Command::Sync(sync_args) => {
            let config = Config::load(home).await?;
            match sync_args.direction() {
                UpDown::Up => commands::sync_up(config, mode, &identity, sync_args.force())
                    .await?
                    .print(),
                UpDown::Down => commands::sync_down(config, mode, &identity).await?.print(),
            }
        }

        Command::Categorize(categorize_args) => {
            let config = Config::load(home).await?;
            commands::categorize(config, &identity, categorize_args.description())
                .await?
                .print()
        }

        Command::Uncovered => {
            let config = Config::load(home).await?;
            commands::uncovered(config, &identity).await?.print()
        }

        Command::Rules(rules_args) => {
            let config = Config::load(home).await?;
            match rules_args.command() {
                RulesCommand::List(list_args) => commands::list_rules(config, &identity, list_args)
                    .await?
                    .print(),
                RulesCommand::Set {
                    description,
                    category,
                } => commands::set_rule(config, &identity, description, category)
                    .await?
                    .print(),
                RulesCommand::Delete { descriptions } => {
                    commands::delete_rules(config, &identity, descriptions)
                        .await?
                        .print()
                }
                RulesCommand::Apply { file } => commands::apply_rule_file(config, &identity, file)
                    .await?
                    .print(),
            }
        }

        Command::Categories(categories_args) => {
            let config = Config::load(home).await?;
            match categories_args.command() {
                CategoriesCommand::List => commands::list_categories(config, &identity)
                    .await?
                    .print(),
                CategoriesCommand::Add { names } => {
                    commands::add_categories(config, &identity, names)
                        .await?
                        .print()
                }
                CategoriesCommand::Delete { names } => {
                    commands::delete_categories(config, &identity, names)
                        .await?
                        .print()
                }
                CategoriesCommand::Rename { old, new } => {
                    commands::rename_category(config, &identity, old, new)
                        .await?
                        .print()
                }
            }
        }

        Command::Transactions(transactions_args) => {
            let config = Config::load(home).await?;
            match transactions_args.command() {
                TransactionsCommand::List(filter) => {
                    commands::list_transactions(config, &identity, filter)
                        .await?
                        .print()
                }
                TransactionsCommand::Memo { row, text } => {
                    commands::set_memo(config, &identity, *row, text)
                        .await?
                        .print()
                }
                TransactionsCommand::Recategorize => commands::recategorize(config, &identity)
                    .await?
                    .print(),
            }
        }

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::summary(config, &identity, summary_args.filter())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
