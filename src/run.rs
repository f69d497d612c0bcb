mod cli;
mod report;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::models::{Category, User, Wallet};

pub(crate) use cli::as_cli;

/// Flags that never take a value.
const SWITCHES: &[&str] = &["--json", "--default", "--recurring", "--no-alerts", "--inactive"];

/// The acting user and output mode for one invocation.
pub(crate) struct Session {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) json: bool,
    pub(crate) now: NaiveDateTime,
    pub(crate) recent_limit: usize,
}

impl Session {
    /// Resolve `--user` (or the configured default), creating it on first use.
    pub(crate) fn open(args: &[String], config: &Config, db: &Database) -> Result<Self> {
        let username = flag(args, "--user").unwrap_or(config.user.as_str()).to_string();
        let user_id = ensure_user(db, &username)?;
        Ok(Self {
            user_id,
            username,
            json: has_switch(args, "--json"),
            now: chrono::Local::now().naive_local(),
            recent_limit: config.recent_limit,
        })
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

/// Look up `username`, creating the user and a default "Cash" wallet when
/// missing.
pub(crate) fn ensure_user(db: &Database, username: &str) -> Result<i64> {
    if let Some(id) = db.get_user_by_name(username)?.and_then(|u| u.id) {
        return Ok(id);
    }
    let user_id = db
        .insert_user(&User::new(username.to_string()))
        .with_context(|| format!("Failed to create user '{username}'"))?;
    let mut wallet = Wallet::new(user_id, "Cash".into(), "USD".into());
    wallet.is_default = true;
    db.insert_wallet(&wallet)?;
    info!(user_id, username, "created user with default wallet");
    Ok(user_id)
}

// ── Argument helpers ──────────────────────────────────────────

pub(crate) fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

pub(crate) fn has_switch(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// Arguments that are neither flags nor flag values.
pub(crate) fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if arg.starts_with("--") {
            skip_next = !SWITCHES.contains(&arg.as_str());
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount: {raw}"))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {raw}"))
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid {what} id: {raw}"))
}

pub(crate) fn find_wallet(db: &Database, user_id: i64, name: &str) -> Result<Wallet> {
    let wallets = db.get_wallets(user_id)?;
    Wallet::find_by_name(&wallets, name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Wallet '{name}' not found"))
}

pub(crate) fn find_category(db: &Database, user_id: i64, name: &str) -> Result<Category> {
    let categories = db.get_categories(user_id)?;
    Category::find_by_name(&categories, name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
