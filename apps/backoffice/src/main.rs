//! # GrocerDesk Back-Office CLI
//!
//! ```bash
//! grocerdesk product create --name "Whole Milk 1gal" --price 4.29 --stock 30
//! grocerdesk sale checkout --line <PRODUCT_ID>:2 --customer <CUSTOMER_ID>
//! grocerdesk report analytics --days 7
//! RUST_LOG=grocer=trace grocerdesk report sales --from 2026-10-01 --to 2026-10-18
//! ```
//!
//! Results are printed as JSON on stdout. Failures print `{code, message}`
//! on stdout and exit with a non-zero status. Logs go to stderr.

mod cli;
mod commands;
mod config;
mod error;

use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use grocer_db::Database;

use crate::cli::Cli;
use crate::commands::Context;
use crate::config::BackofficeConfig;
use crate::error::{AppError, AppResult, ErrorCode};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let compact = cli.compact;

    match run(cli).await {
        Ok(value) => {
            println!("{}", render(&value, compact));
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            println!("{}", err.to_json());
            ExitCode::from(err.exit_code())
        }
    }
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - ERROR: store failures
/// - WARN: rejected input, rolled back transactions
/// - INFO: committed changes
/// - DEBUG: statements and config resolution
///
/// Override with `RUST_LOG`, e.g. `RUST_LOG=grocer_db=trace,sqlx=info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,grocer=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

async fn run(cli: Cli) -> AppResult<Value> {
    let mut config = BackofficeConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }

    let path = config.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                ErrorCode::PersistenceFailure,
                format!("Cannot create {}: {}", parent.display(), e),
            )
        })?;
    }
    debug!(path = %path.display(), "Opening database");

    let db = Database::new(config.db_config()).await?;
    let ctx = Context::new(db, config);

    let result = commands::execute(&ctx, cli.command).await;
    ctx.db.close().await;
    result
}

fn render(value: &Value, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}
