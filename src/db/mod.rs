mod columns;
mod schema;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::models::*;
use crate::store::{BudgetStore, Directory, LedgerQuery};

const USER_COLUMNS: &str = "id, username, created_at";
const WALLET_COLUMNS: &str =
    "id, user_id, name, currency, balance, is_default, is_active, description, created_at";
const CATEGORY_COLUMNS: &str = "id, user_id, name, color, icon, is_system, is_active";
const ENTRY_COLUMNS: &str = "id, user_id, wallet_id, category_id, amount, currency, transaction_date,
     merchant, description, kind, is_recurring, created_at, updated_at";
const BUDGET_COLUMNS: &str = "id, user_id, category_id, name, amount, period, start_date, end_date,
     is_active, alert_threshold, alert_enabled, description, created_at, updated_at";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_system_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_system_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> CoreResult<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        // Existing database - check version and apply migrations
        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_system_categories(&mut self) -> CoreResult<()> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE is_system = 1",
            [],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            ("Bills & Utilities", "#F59E0B"),
            ("Education", "#6366F1"),
            ("Entertainment", "#EC4899"),
            ("Food & Dining", "#EF4444"),
            ("Freelance", "#14B8A6"),
            ("Gifts & Donations", "#A855F7"),
            ("Groceries", "#22C55E"),
            ("Healthcare", "#0EA5E9"),
            ("Housing", "#78716C"),
            ("Investments", "#10B981"),
            ("Other", "#6B7280"),
            ("Salary", "#16A34A"),
            ("Shopping", "#F97316"),
            ("Transportation", "#3B82F6"),
            ("Travel", "#8B5CF6"),
        ];

        let tx = self.conn.transaction()?;
        for (name, color) in &defaults {
            let mut category = Category::system(name.to_string());
            category.color = color.to_string();
            tx.execute(
                "INSERT INTO categories (user_id, name, color, icon, is_system, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    category.user_id,
                    category.name,
                    category.color,
                    category.icon,
                    category.is_system,
                    category.is_active,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────

    pub(crate) fn insert_user(&self, user: &User) -> CoreResult<i64> {
        self.conn.execute(
            "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
            params![user.username, user.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_users(&self) -> CoreResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_user_by_name(&self, username: &str) -> CoreResult<Option<User>> {
        optional(self.conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        ))
    }

    // ── Wallets ───────────────────────────────────────────────

    pub(crate) fn insert_wallet(&self, wallet: &Wallet) -> CoreResult<i64> {
        self.conn.execute(
            "INSERT INTO wallets (user_id, name, currency, balance, is_default, is_active, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                wallet.user_id,
                wallet.name,
                wallet.currency,
                wallet.balance.to_string(),
                wallet.is_default,
                wallet.is_active,
                wallet.description,
                wallet.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_wallets(&self, user_id: i64) -> CoreResult<Vec<Wallet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = ?1 AND is_active = 1
             ORDER BY is_default DESC, name"
        ))?;
        let rows = stmt.query_map(params![user_id], wallet_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Categories ────────────────────────────────────────────

    /// System categories plus the user's own, active only.
    pub(crate) fn get_categories(&self, user_id: i64) -> CoreResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE is_active = 1 AND (user_id IS NULL OR user_id = ?1)
             ORDER BY name"
        ))?;
        let rows = stmt.query_map(params![user_id], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> CoreResult<i64> {
        self.conn.execute(
            "INSERT INTO categories (user_id, name, color, icon, is_system, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cat.user_id,
                cat.name,
                cat.color,
                cat.icon,
                cat.is_system,
                cat.is_active
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Ledger entries ────────────────────────────────────────
    //
    // Every write below changes the entry row and the wallet balance inside
    // one SQLite transaction. Dropping the transaction on an early `?`
    // rolls both back.

    pub(crate) fn record_entry(&mut self, entry: &LedgerEntry) -> CoreResult<i64> {
        entry.validate()?;
        let tx = self.conn.transaction()?;
        check_entry_refs(&tx, entry)?;
        tx.execute(
            "INSERT INTO ledger_entries (user_id, wallet_id, category_id, amount, currency, transaction_date,
                                         merchant, description, kind, is_recurring, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                entry.user_id,
                entry.wallet_id,
                entry.category_id,
                entry.amount.to_string(),
                entry.currency,
                entry.date,
                entry.merchant,
                entry.description,
                entry.kind,
                entry.is_recurring,
                entry.created_at,
                entry.updated_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        adjust_wallet_balance(&tx, entry.wallet_id, entry.wallet_delta())?;
        tx.commit()?;
        debug!(entry_id = id, wallet_id = entry.wallet_id, "recorded ledger entry");
        Ok(id)
    }

    /// Replace entry `id` with `updated`, moving its balance effect from the
    /// old wallet to the new one.
    pub(crate) fn update_entry(
        &mut self,
        user_id: i64,
        id: i64,
        updated: &LedgerEntry,
    ) -> CoreResult<()> {
        updated.validate()?;
        let tx = self.conn.transaction()?;
        let existing = query_entry(&tx, id)?
            .filter(|e| e.owned_by(user_id))
            .ok_or_else(|| CoreError::not_found("Entry", id))?;

        let mut updated = updated.clone();
        updated.user_id = user_id;
        check_entry_refs(&tx, &updated)?;

        adjust_wallet_balance(&tx, existing.wallet_id, -existing.wallet_delta())?;
        tx.execute(
            "UPDATE ledger_entries
             SET wallet_id = ?1, category_id = ?2, amount = ?3, currency = ?4, transaction_date = ?5,
                 merchant = ?6, description = ?7, kind = ?8, is_recurring = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                updated.wallet_id,
                updated.category_id,
                updated.amount.to_string(),
                updated.currency,
                updated.date,
                updated.merchant,
                updated.description,
                updated.kind,
                updated.is_recurring,
                chrono::Utc::now().naive_utc(),
                id,
            ],
        )?;
        adjust_wallet_balance(&tx, updated.wallet_id, updated.wallet_delta())?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn delete_entry(&mut self, user_id: i64, id: i64) -> CoreResult<()> {
        let tx = self.conn.transaction()?;
        let existing = query_entry(&tx, id)?
            .filter(|e| e.owned_by(user_id))
            .ok_or_else(|| CoreError::not_found("Entry", id))?;
        adjust_wallet_balance(&tx, existing.wallet_id, -existing.wallet_delta())?;
        tx.execute("DELETE FROM ledger_entries WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn get_entry_by_id(&self, id: i64) -> CoreResult<Option<LedgerEntry>> {
        query_entry(&self.conn, id)
    }

    pub(crate) fn get_entries(
        &self,
        user_id: i64,
        limit: Option<u32>,
        category_id: Option<i64>,
        search: Option<&str>,
        month: Option<&str>,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE user_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(user_id)];

        if let Some(cid) = category_id {
            sql.push_str(&format!(" AND category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }
        if let Some(s) = search {
            sql.push_str(&format!(
                " AND (merchant LIKE ?{0} OR description LIKE ?{0})",
                param_values.len() + 1
            ));
            param_values.push(Box::new(format!("%{s}%")));
        }
        if let Some(m) = month {
            sql.push_str(&format!(" AND transaction_date LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{m}%")));
        }

        sql.push_str(" ORDER BY transaction_date DESC, id DESC");

        if let Some(l) = limit {
            sql.push_str(&format!(" LIMIT {l}"));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), entry_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

// ── Ports ─────────────────────────────────────────────────────

impl LedgerQuery for Database {
    fn entries_for_owner_in_range(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries
             WHERE user_id = ?1 AND transaction_date BETWEEN ?2 AND ?3
             ORDER BY transaction_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id, start, end], entry_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn recent_entries_for_owner(
        &self,
        owner_id: i64,
        limit: usize,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries
             WHERE user_id = ?1
             ORDER BY transaction_date DESC, id DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![owner_id, limit], entry_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl BudgetStore for Database {
    fn active_budgets_for_owner(&self, owner_id: i64) -> CoreResult<Vec<BudgetDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets
             WHERE user_id = ?1 AND is_active = 1
             ORDER BY start_date, id"
        ))?;
        let rows = stmt.query_map(params![owner_id], budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn active_budgets_for_owner_in_window(
        &self,
        owner_id: i64,
        as_of: NaiveDateTime,
    ) -> CoreResult<Vec<BudgetDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets
             WHERE user_id = ?1 AND is_active = 1 AND start_date <= ?2 AND end_date >= ?2
             ORDER BY start_date, id"
        ))?;
        let rows = stmt.query_map(params![owner_id, as_of], budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn budget_by_id(&self, id: i64) -> CoreResult<Option<BudgetDefinition>> {
        optional(self.conn.query_row(
            &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1"),
            params![id],
            budget_from_row,
        ))
    }

    fn insert_budget(&self, budget: &BudgetDefinition) -> CoreResult<i64> {
        self.conn.execute(
            "INSERT INTO budgets (user_id, category_id, name, amount, period, start_date, end_date,
                                  is_active, alert_threshold, alert_enabled, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                budget.user_id,
                budget.category_id,
                budget.name,
                budget.amount.to_string(),
                budget.period,
                budget.start,
                budget.end,
                budget.is_active,
                budget.alert_threshold.to_string(),
                budget.alert_enabled,
                budget.description,
                budget.created_at,
                budget.updated_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_budget(&self, budget: &BudgetDefinition) -> CoreResult<()> {
        let id = budget
            .id
            .ok_or_else(|| CoreError::validation("Budget has no id"))?;
        let changed = self.conn.execute(
            "UPDATE budgets
             SET category_id = ?1, name = ?2, amount = ?3, period = ?4, start_date = ?5, end_date = ?6,
                 is_active = ?7, alert_threshold = ?8, alert_enabled = ?9, description = ?10, updated_at = ?11
             WHERE id = ?12",
            params![
                budget.category_id,
                budget.name,
                budget.amount.to_string(),
                budget.period,
                budget.start,
                budget.end,
                budget.is_active,
                budget.alert_threshold.to_string(),
                budget.alert_enabled,
                budget.description,
                budget.updated_at,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("Budget", id));
        }
        Ok(())
    }

    fn deactivate_budget(&self, id: i64) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE budgets SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![chrono::Utc::now().naive_utc(), id],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("Budget", id));
        }
        Ok(())
    }
}

impl Directory for Database {
    fn user_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        optional(self.conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        ))
    }

    fn category_by_id(&self, id: i64) -> CoreResult<Option<Category>> {
        query_category(&self.conn, id)
    }

    fn wallet_by_id(&self, id: i64) -> CoreResult<Option<Wallet>> {
        query_wallet(&self.conn, id)
    }
}

// ── Shared queries (usable inside a transaction) ──────────────

fn optional<T>(result: rusqlite::Result<T>) -> CoreResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn query_entry(conn: &Connection, id: i64) -> CoreResult<Option<LedgerEntry>> {
    optional(conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1"),
        params![id],
        entry_from_row,
    ))
}

fn query_wallet(conn: &Connection, id: i64) -> CoreResult<Option<Wallet>> {
    optional(conn.query_row(
        &format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = ?1"),
        params![id],
        wallet_from_row,
    ))
}

fn query_category(conn: &Connection, id: i64) -> CoreResult<Option<Category>> {
    optional(conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
        params![id],
        category_from_row,
    ))
}

/// The owner must exist, the wallet must be theirs and active, and the
/// category (if any) must be usable by them.
fn check_entry_refs(conn: &Connection, entry: &LedgerEntry) -> CoreResult<()> {
    let user_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![entry.user_id],
        |row| row.get(0),
    )?;
    if !user_exists {
        return Err(CoreError::not_found("User", entry.user_id));
    }

    query_wallet(conn, entry.wallet_id)?
        .filter(|w| w.is_active && w.owned_by(entry.user_id))
        .ok_or_else(|| CoreError::not_found("Wallet", entry.wallet_id))?;

    if let Some(cid) = entry.category_id {
        let category =
            query_category(conn, cid)?.ok_or_else(|| CoreError::not_found("Category", cid))?;
        if !category.usable_by(entry.user_id) {
            return Err(CoreError::validation(
                "Category does not belong to the current user",
            ));
        }
    }
    Ok(())
}

fn adjust_wallet_balance(conn: &Connection, wallet_id: i64, delta: Decimal) -> CoreResult<()> {
    if delta.is_zero() {
        return Ok(());
    }
    let current: String = conn.query_row(
        "SELECT balance FROM wallets WHERE id = ?1",
        params![wallet_id],
        |row| row.get(0),
    )?;
    let current = Decimal::from_str(&current).map_err(|_| {
        CoreError::validation(format!("Wallet {wallet_id} has an unreadable balance"))
    })?;
    let updated = current + delta;
    conn.execute(
        "UPDATE wallets SET balance = ?1 WHERE id = ?2",
        params![updated.to_string(), wallet_id],
    )?;
    Ok(())
}

// ── Row mapping ───────────────────────────────────────────────

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Ok(Decimal::from_str(&s).unwrap_or_default())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Some(row.get(0)?),
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
        currency: row.get(3)?,
        balance: decimal_column(row, 4)?,
        is_default: row.get(5)?,
        is_active: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        is_system: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        wallet_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: decimal_column(row, 4)?,
        currency: row.get(5)?,
        date: row.get(6)?,
        merchant: row.get(7)?,
        description: row.get(8)?,
        kind: row.get(9)?,
        is_recurring: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<BudgetDefinition> {
    Ok(BudgetDefinition {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        amount: decimal_column(row, 4)?,
        period: row.get(5)?,
        start: row.get(6)?,
        end: row.get(7)?,
        is_active: row.get(8)?,
        alert_threshold: decimal_column(row, 9)?,
        alert_enabled: row.get(10)?,
        description: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}
