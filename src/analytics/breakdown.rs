use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::labels::Labels;
use crate::models::LedgerEntry;
use crate::money::{apportion_percentages, average};
use crate::store::Directory;

pub(crate) const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategorySpendSummary {
    pub(crate) category_id: i64,
    pub(crate) category_name: String,
    pub(crate) category_color: String,
    pub(crate) category_icon: String,
    pub(crate) total_amount: Decimal,
    pub(crate) percentage: Decimal,
    pub(crate) transaction_count: usize,
    pub(crate) average_transaction: Decimal,
}

/// Expense entries grouped by category, largest total first.
///
/// Expenses without a category stay out of the groups but still count
/// toward the total the percentages are taken of.
pub(crate) fn category_breakdown<D: Directory + ?Sized>(
    entries: &[LedgerEntry],
    labels: &mut Labels<'_, D>,
) -> Vec<CategorySpendSummary> {
    let mut total_expenses = Decimal::ZERO;
    let mut groups: HashMap<i64, (Decimal, usize)> = HashMap::new();
    for entry in entries.iter().filter(|e| e.is_expense()) {
        total_expenses += entry.amount;
        if let Some(category_id) = entry.category_id {
            let group = groups.entry(category_id).or_default();
            group.0 += entry.amount;
            group.1 += 1;
        }
    }

    let mut summaries: Vec<CategorySpendSummary> = groups
        .into_iter()
        .map(|(category_id, (total, count))| {
            let label = labels.category(Some(category_id));
            CategorySpendSummary {
                category_id,
                category_name: label.name,
                category_color: label.color,
                category_icon: label.icon,
                total_amount: total,
                percentage: Decimal::ZERO,
                transaction_count: count,
                average_transaction: average(total, count as i64),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.category_name.cmp(&b.category_name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    let totals: Vec<Decimal> = summaries.iter().map(|s| s.total_amount).collect();
    for (summary, pct) in summaries
        .iter_mut()
        .zip(apportion_percentages(&totals, total_expenses))
    {
        summary.percentage = pct;
    }
    summaries
}

pub(crate) fn top_categories(breakdown: &[CategorySpendSummary]) -> Vec<CategorySpendSummary> {
    breakdown.iter().take(TOP_CATEGORIES).cloned().collect()
}
