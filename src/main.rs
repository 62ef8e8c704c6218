use chitieu::args::{Args, Command};
use chitieu::{api, commands, Config, Ledger, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // Init runs before a config exists, so it is handled before loading one.
    if let Command::Init(init_args) = args.command() {
        commands::init(home, init_args.api_key(), init_args.sheet_url())
            .await?
            .print();
        return Ok(());
    }

    // This allows for testing the program without hitting the Google APIs. When
    // CHITIEU_IN_TEST_MODE is set and non-zero in length, then the mode will be
    // Mode::Test, otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    let config = Config::load(home).await?;
    let store = api::store(&config, mode).await?;
    let ledger = Ledger::new(store, config.cache_ttl());

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(_) => (), // handled above

        Command::Log(log_args) => commands::log(&config, &ledger, &log_args.text())
            .await?
            .print(),

        Command::Del(del_args) => commands::delete(&config, &ledger, &del_args.text())
            .await?
            .print(),

        Command::Today => commands::today(&config, &ledger).await?.print(),

        Command::Week => commands::week(&config, &ledger).await?.print(),

        Command::Month(offset_args) => {
            commands::month(&config, &ledger, offset_args.offset())
                .await?
                .print()
        }

        Command::Category(cat_args) => {
            commands::category(&config, &ledger, cat_args.category(), cat_args.offset())
                .await?
                .print()
        }

        Command::Sort(sort_args) => commands::sort(&config, &ledger, sort_args.month())
            .await?
            .print(),
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
