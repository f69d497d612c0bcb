use anyhow::{bail, Result};
use tracing::info;

use super::report;
use super::{
    ensure_user, find_category, find_wallet, flag, has_switch, parse_amount, parse_date,
    parse_id, positional, print_json, Session,
};
use crate::config::Config;
use crate::db::Database;
use crate::format::{format_amount, format_money, truncate};
use crate::models::{Category, EntryKind, LedgerEntry, Wallet};

pub(crate) fn as_cli(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let Some(command) = args.get(1) else {
        let session = Session::open(args, config, db)?;
        return report::cli_dashboard(&session, db);
    };
    let rest = &args[2..];
    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendsmart {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "users" => cli_users(db),
        "user" => cli_user(rest, db),
        _ => {
            let session = Session::open(args, config, db)?;
            dispatch(command, rest, &session, db)
        }
    }
}

fn dispatch(command: &str, args: &[String], session: &Session, db: &mut Database) -> Result<()> {
    match command {
        "wallets" => cli_wallets(session, db),
        "wallet" => cli_wallet(args, session, db),
        "categories" => cli_categories(session, db),
        "category" => cli_category(args, session, db),
        "add" => cli_add(args, session, db),
        "edit-entry" => cli_edit_entry(args, session, db),
        "delete-entry" => cli_delete_entry(args, session, db),
        "entries" => cli_entries(args, session, db),
        "budgets" => report::cli_budget_list(session, db),
        "budget" => report::cli_budget(args, session, db),
        "analytics" => report::cli_analytics(args, session, db),
        "trends" => report::cli_trends(args, session, db),
        "dashboard" => report::cli_dashboard(session, db),
        other => {
            print_usage();
            bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("SpendSmart - budgets and spending analytics from your own ledger");
    println!();
    println!("Usage: spendsmart [command] [--user <name>] [--json]");
    println!();
    println!("Commands:");
    println!("  (none)                          Show the dashboard");
    println!("  users                           List users");
    println!("  user add <name>                 Create a user (with a Cash wallet)");
    println!("  wallets                         List wallets and balances");
    println!("  wallet add <name>               Create a wallet");
    println!("    --currency <XXX> --default");
    println!("  categories                      List usable categories");
    println!("  category add <name>             Create a custom category");
    println!("    --color <#hex> --icon <name>");
    println!("  add <kind> <amount>             Record an expense, income or transfer");
    println!("    --wallet <name> --category <name> --date <YYYY-MM-DD>");
    println!("    --merchant <text> --note <text> --currency <XXX> --recurring");
    println!("  edit-entry <id>                 Change an entry (same flags as add,");
    println!("    --kind <kind> --amount <n>    --category none clears it)");
    println!("  delete-entry <id>               Delete an entry and restore the balance");
    println!("  entries                         List entries, newest first");
    println!("    --limit <n> --category <name> --search <text> --month <YYYY-MM>");
    println!("  budgets                         List active budgets with their status");
    println!("  budget add <name> <amount>      Create a budget");
    println!("    --period <weekly|monthly|quarterly|yearly|custom>");
    println!("    --start <date> --end <date> --category <name>");
    println!("    --threshold <0-100> --no-alerts --note <text>");
    println!("  budget update <id>              Change a budget (add flags, --name, --amount,");
    println!("                                  --inactive)");
    println!("  budget delete <id>              Deactivate a budget");
    println!("  budget show <id>                Show one budget");
    println!("  budget summary                  Totals over budgets running today");
    println!("  budget active                   Budgets running today");
    println!("  analytics                       Expense analytics (default: this month)");
    println!("    --from <date> --to <date>");
    println!("  trends                          Monthly, weekly and category trends");
    println!("    --months <1-120>              (default: 6)");
    println!("  dashboard                       Month overview, alerts and recent entries");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
}

// ── Users ─────────────────────────────────────────────────────

fn cli_users(db: &Database) -> Result<()> {
    let users = db.get_users()?;
    if users.is_empty() {
        println!("No users");
        return Ok(());
    }
    println!("{:<4} {:<24} Created", "ID", "Username");
    println!("{}", "─".repeat(55));
    for user in &users {
        println!(
            "{:<4} {:<24} {}",
            user.id.unwrap_or(0),
            truncate(&user.username, 24),
            user.created_at,
        );
    }
    Ok(())
}

fn cli_user(args: &[String], db: &Database) -> Result<()> {
    match positional(args).as_slice() {
        ["add", name] => {
            if db.get_user_by_name(name)?.is_some() {
                bail!("User '{name}' already exists");
            }
            let id = ensure_user(db, name)?;
            println!("Created user '{name}' (id {id})");
            Ok(())
        }
        _ => bail!("Usage: spendsmart user add <name>"),
    }
}

// ── Wallets & categories ──────────────────────────────────────

fn cli_wallets(session: &Session, db: &Database) -> Result<()> {
    let wallets = db.get_wallets(session.user_id)?;
    if session.json {
        let rows: Vec<serde_json::Value> = wallets
            .iter()
            .map(|w| {
                serde_json::json!({
                    "id": w.id,
                    "name": w.name,
                    "currency": w.currency,
                    "balance": w.balance,
                    "isDefault": w.is_default,
                })
            })
            .collect();
        return print_json(&rows);
    }
    if wallets.is_empty() {
        println!("No wallets");
        return Ok(());
    }

    println!("{:<4} {:<20} {:<8} {:>16}", "ID", "Name", "Currency", "Balance");
    println!("{}", "─".repeat(55));
    for wallet in &wallets {
        let marker = if wallet.is_default { " *" } else { "" };
        println!(
            "{:<4} {:<20} {:<8} {:>16}{marker}",
            wallet.id.unwrap_or(0),
            truncate(&wallet.name, 20),
            wallet.currency,
            format_amount(wallet.balance),
        );
    }
    Ok(())
}

fn cli_wallet(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let parts = positional(args);
    let ["add", name] = parts.as_slice() else {
        bail!("Usage: spendsmart wallet add <name> [--currency <XXX>] [--default]");
    };
    if Wallet::find_by_name(&db.get_wallets(session.user_id)?, name).is_some() {
        bail!("Wallet '{name}' already exists");
    }
    let currency = flag(args, "--currency").unwrap_or("USD").to_uppercase();
    if currency.len() != 3 {
        bail!("Currency must be 3 characters (e.g., USD)");
    }
    let mut wallet = Wallet::new(session.user_id, name.to_string(), currency);
    wallet.is_default = has_switch(args, "--default");
    let id = db.insert_wallet(&wallet)?;
    println!("Created wallet {wallet} (id {id})");
    Ok(())
}

fn cli_categories(session: &Session, db: &Database) -> Result<()> {
    let categories = db.get_categories(session.user_id)?;
    if session.json {
        let rows: Vec<serde_json::Value> = categories
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "name": c.name,
                    "color": c.color,
                    "icon": c.icon,
                    "isSystem": c.is_system,
                })
            })
            .collect();
        return print_json(&rows);
    }

    println!("{:<4} {:<24} {:<8} Scope", "ID", "Name", "Color");
    println!("{}", "─".repeat(50));
    for cat in &categories {
        let scope = if cat.is_system { "system" } else { "custom" };
        println!(
            "{:<4} {:<24} {:<8} {scope}",
            cat.id.unwrap_or(0),
            truncate(&cat.name, 24),
            cat.color,
        );
    }
    Ok(())
}

fn cli_category(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let parts = positional(args);
    let ["add", name] = parts.as_slice() else {
        bail!("Usage: spendsmart category add <name> [--color <#hex>] [--icon <name>]");
    };
    if Category::find_by_name(&db.get_categories(session.user_id)?, name).is_some() {
        bail!("Category '{name}' already exists");
    }
    let mut category = Category::new(session.user_id, name.to_string());
    if let Some(color) = flag(args, "--color") {
        category.color = color.to_string();
    }
    if let Some(icon) = flag(args, "--icon") {
        category.icon = icon.to_string();
    }
    let id = db.insert_category(&category)?;
    println!("Created category {category} (id {id})");
    Ok(())
}

// ── Ledger entries ────────────────────────────────────────────

fn parse_kind(raw: &str) -> Result<EntryKind> {
    EntryKind::parse(raw).ok_or_else(|| {
        let valid: Vec<String> = EntryKind::all()
            .iter()
            .map(|k| k.as_str().to_lowercase())
            .collect();
        anyhow::anyhow!("Unknown entry kind '{raw}' (expected {})", valid.join(", "))
    })
}

/// Apply the optional entry flags shared by `add` and `edit-entry`.
fn apply_entry_flags(
    args: &[String],
    entry: &mut LedgerEntry,
    session: &Session,
    db: &Database,
) -> Result<()> {
    if let Some(name) = flag(args, "--wallet") {
        let wallet = find_wallet(db, session.user_id, name)?;
        entry.wallet_id = wallet.id.unwrap_or_default();
        entry.currency = wallet.currency;
    }
    match flag(args, "--category") {
        Some(name) if name.eq_ignore_ascii_case("none") => entry.category_id = None,
        Some(name) => entry.category_id = find_category(db, session.user_id, name)?.id,
        None => {}
    }
    if let Some(raw) = flag(args, "--date") {
        entry.date = parse_date(raw)?;
    }
    if let Some(merchant) = flag(args, "--merchant") {
        entry.merchant = merchant.to_string();
    }
    if let Some(note) = flag(args, "--note") {
        entry.description = note.to_string();
    }
    if let Some(currency) = flag(args, "--currency") {
        entry.currency = currency.to_uppercase();
    }
    if has_switch(args, "--recurring") {
        entry.is_recurring = true;
    }
    Ok(())
}

fn cli_add(args: &[String], session: &Session, db: &mut Database) -> Result<()> {
    let parts = positional(args);
    let [kind, amount] = parts.as_slice() else {
        bail!("Usage: spendsmart add <expense|income|transfer> <amount> [--wallet <name>] ...");
    };
    let kind = parse_kind(kind)?;
    let amount = parse_amount(amount)?;

    // Default wallet sorts first.
    let wallet = db
        .get_wallets(session.user_id)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No wallets found. Create one with `wallet add`"))?;
    let mut entry = LedgerEntry::new(
        session.user_id,
        wallet.id.unwrap_or_default(),
        kind,
        amount,
        session.today(),
    );
    entry.currency = wallet.currency;
    apply_entry_flags(args, &mut entry, session, db)?;

    let id = db.record_entry(&entry)?;
    info!(entry_id = id, "recorded entry from cli");
    println!(
        "Recorded {} of {} on {} (id {id})",
        entry.kind.as_str().to_lowercase(),
        format_money(entry.amount, &entry.currency),
        entry.date,
    );
    Ok(())
}

fn cli_edit_entry(args: &[String], session: &Session, db: &mut Database) -> Result<()> {
    let parts = positional(args);
    let [raw_id] = parts.as_slice() else {
        bail!("Usage: spendsmart edit-entry <id> [--amount <n>] [--kind <kind>] ...");
    };
    let id = parse_id(raw_id, "entry")?;
    let mut entry = db
        .get_entry_by_id(id)?
        .filter(|e| e.owned_by(session.user_id))
        .ok_or_else(|| anyhow::anyhow!("Entry {id} not found"))?;

    if let Some(raw) = flag(args, "--amount") {
        entry.amount = parse_amount(raw)?;
    }
    if let Some(raw) = flag(args, "--kind") {
        entry.kind = parse_kind(raw)?;
    }
    apply_entry_flags(args, &mut entry, session, db)?;

    db.update_entry(session.user_id, id, &entry)?;
    println!("Updated entry {id}");
    Ok(())
}

fn cli_delete_entry(args: &[String], session: &Session, db: &mut Database) -> Result<()> {
    let parts = positional(args);
    let [raw_id] = parts.as_slice() else {
        bail!("Usage: spendsmart delete-entry <id>");
    };
    let id = parse_id(raw_id, "entry")?;
    db.delete_entry(session.user_id, id)?;
    println!("Deleted entry {id}");
    Ok(())
}

fn cli_entries(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let limit = match flag(args, "--limit") {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| anyhow::anyhow!("Invalid limit: {raw}"))?,
        ),
        None => Some(50),
    };
    let categories = db.get_categories(session.user_id)?;
    let category_id = match flag(args, "--category") {
        Some(name) => Some(
            Category::find_by_name(&categories, name)
                .and_then(|c| c.id)
                .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))?,
        ),
        None => None,
    };
    let entries = db.get_entries(
        session.user_id,
        limit,
        category_id,
        flag(args, "--search"),
        flag(args, "--month"),
    )?;

    if session.json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id,
                    "date": e.date,
                    "type": e.kind,
                    "amount": e.amount,
                    "currency": e.currency,
                    "walletId": e.wallet_id,
                    "categoryId": e.category_id,
                    "merchant": e.merchant,
                    "description": e.description,
                    "isRecurring": e.is_recurring,
                })
            })
            .collect();
        return print_json(&rows);
    }
    if entries.is_empty() {
        println!("No entries");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<8} {:>14} {:<18} Merchant / note",
        "ID", "Date", "Kind", "Amount", "Category"
    );
    println!("{}", "─".repeat(80));
    for entry in &entries {
        let category = entry
            .category_id
            .and_then(|id| Category::find_by_id(&categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or("-");
        let text = if entry.merchant.is_empty() {
            &entry.description
        } else {
            &entry.merchant
        };
        println!(
            "{:<5} {:<10} {:<8} {:>14} {:<18} {}",
            entry.id.unwrap_or(0),
            entry.date,
            entry.kind.as_str().to_lowercase(),
            format_amount(entry.amount),
            truncate(category, 18),
            truncate(text, 30),
        );
    }
    Ok(())
}
