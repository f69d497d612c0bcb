use rust_decimal::Decimal;

use crate::error::CoreResult;
use crate::models::{BudgetDefinition, LedgerEntry};
use crate::store::LedgerQuery;

/// Re-scan the ledger for the budget's window and sum matching expenses.
///
/// The window is compared by calendar date, so time of day on `start` and
/// `end` is ignored.
pub(crate) fn compute_spent<L: LedgerQuery + ?Sized>(
    ledger: &L,
    budget: &BudgetDefinition,
) -> CoreResult<Decimal> {
    let entries = ledger.entries_for_owner_in_range(
        budget.user_id,
        budget.start_date(),
        budget.end_date(),
    )?;
    Ok(spent_in(&entries, budget.category_id))
}

/// Expense total of `entries`. With a category filter, entries without a
/// category never match.
pub(crate) fn spent_in(entries: &[LedgerEntry], category_id: Option<i64>) -> Decimal {
    entries
        .iter()
        .filter(|e| e.is_expense())
        .filter(|e| category_id.is_none() || e.category_id == category_id)
        .map(|e| e.amount)
        .sum()
}
