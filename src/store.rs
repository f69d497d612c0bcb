//! Ports the budget and analytics engine reads through.
//!
//! The engine never talks to SQLite directly; `db::Database` implements these
//! traits, and anything else that can answer the same questions can stand in.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{CoreError, CoreResult};
use crate::models::{BudgetDefinition, Category, LedgerEntry, User, Wallet};

pub(crate) trait LedgerQuery {
    /// Entries owned by `owner_id` whose transaction date lies in
    /// `[start, end]` (inclusive, date-only).
    fn entries_for_owner_in_range(
        &self,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<LedgerEntry>>;

    /// The `limit` most recent entries, newest transaction date first.
    fn recent_entries_for_owner(&self, owner_id: i64, limit: usize)
        -> CoreResult<Vec<LedgerEntry>>;
}

pub(crate) trait BudgetStore {
    fn active_budgets_for_owner(&self, owner_id: i64) -> CoreResult<Vec<BudgetDefinition>>;

    /// Active budgets whose `[start, end]` window contains `as_of`.
    fn active_budgets_for_owner_in_window(
        &self,
        owner_id: i64,
        as_of: NaiveDateTime,
    ) -> CoreResult<Vec<BudgetDefinition>>;

    fn budget_by_id(&self, id: i64) -> CoreResult<Option<BudgetDefinition>>;

    fn insert_budget(&self, budget: &BudgetDefinition) -> CoreResult<i64>;

    fn update_budget(&self, budget: &BudgetDefinition) -> CoreResult<()>;

    /// Soft delete: the row stays, flagged inactive.
    fn deactivate_budget(&self, id: i64) -> CoreResult<()>;
}

/// Identity lookups. Only existence checks and display labels depend on it.
pub(crate) trait Directory {
    fn user_by_id(&self, id: i64) -> CoreResult<Option<User>>;

    fn category_by_id(&self, id: i64) -> CoreResult<Option<Category>>;

    fn wallet_by_id(&self, id: i64) -> CoreResult<Option<Wallet>>;
}

/// Everything the services need from one backing store.
pub(crate) trait Store: LedgerQuery + BudgetStore + Directory {}

impl<T: LedgerQuery + BudgetStore + Directory> Store for T {}

/// Resolve the acting user or fail the whole call with `NotFound`.
pub(crate) fn require_owner<D: Directory + ?Sized>(dir: &D, owner_id: i64) -> CoreResult<User> {
    dir.user_by_id(owner_id)?
        .ok_or_else(|| CoreError::not_found("User", owner_id))
}
