mod analytics;
mod budget;
mod config;
mod dates;
mod db;
mod error;
mod format;
mod labels;
mod models;
mod money;
mod run;
mod store;

#[cfg(test)]
mod testutil;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_LOG_FILTER};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env()?;
    init_tracing(&config.log_filter);

    let db_path = config.database_path()?;
    let mut db = db::Database::open(&db_path)?;
    run::as_cli(&args, &config, &mut db)
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
