use chrono::NaiveDateTime;

use crate::error::CoreResult;
use crate::store::BudgetStore;

/// Inclusive windows overlap when each starts no later than the other ends.
/// Compared by calendar date: windows sharing a boundary day overlap.
pub(crate) fn windows_overlap(
    s1: NaiveDateTime,
    e1: NaiveDateTime,
    s2: NaiveDateTime,
    e2: NaiveDateTime,
) -> bool {
    s1.date() <= e2.date() && e1.date() >= s2.date()
}

/// Whether another active budget of `owner_id` for the same category
/// overlaps `[start, end]`. Overall budgets (`category_id == None`) are never
/// checked. `exclude` skips the budget being updated.
pub(crate) fn has_overlap<B: BudgetStore + ?Sized>(
    store: &B,
    owner_id: i64,
    category_id: Option<i64>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude: Option<i64>,
) -> CoreResult<bool> {
    let Some(category_id) = category_id else {
        return Ok(false);
    };
    let budgets = store.active_budgets_for_owner(owner_id)?;
    Ok(budgets
        .iter()
        .filter(|b| b.is_active && b.category_id == Some(category_id))
        .filter(|b| exclude.map_or(true, |id| b.id != Some(id)))
        .any(|b| windows_overlap(start, end, b.start, b.end)))
}
