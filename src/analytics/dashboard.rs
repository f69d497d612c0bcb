use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use super::trend::PeriodComparison;
use crate::budget::{AlertKind, BudgetEvaluation};
use crate::dates::{days_in_month, last_of_month};
use crate::labels::{Labels, NONE};
use crate::models::{EntryKind, LedgerEntry};
use crate::money::{average, percentage_of};
use crate::store::Directory;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DashboardSnapshot {
    pub(crate) month_start: NaiveDate,
    pub(crate) month_end: NaiveDate,
    pub(crate) current_month_expenses: Decimal,
    pub(crate) current_month_income: Decimal,
    pub(crate) current_month_net: Decimal,
    pub(crate) current_month_transactions: usize,
    #[serde(flatten)]
    pub(crate) comparison: PeriodComparison,
    pub(crate) budget_summary: BudgetOverview,
    pub(crate) quick_stats: QuickStats,
    pub(crate) recent_transactions: Vec<RecentTransaction>,
    pub(crate) budget_alerts: Vec<BudgetAlert>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetOverview {
    pub(crate) total_budgeted: Decimal,
    pub(crate) total_spent: Decimal,
    pub(crate) total_remaining: Decimal,
    pub(crate) budget_utilization: Decimal,
    pub(crate) active_budgets: usize,
    pub(crate) over_budgets: usize,
    pub(crate) alerting_budgets: usize,
}

impl BudgetOverview {
    pub(crate) fn of(evaluations: &[BudgetEvaluation]) -> Self {
        let total_budgeted: Decimal = evaluations.iter().map(|e| e.budget.amount).sum();
        let total_spent: Decimal = evaluations.iter().map(|e| e.spent).sum();
        Self {
            total_budgeted,
            total_spent,
            total_remaining: total_budgeted - total_spent,
            budget_utilization: percentage_of(total_spent, total_budgeted),
            active_budgets: evaluations.len(),
            over_budgets: evaluations.iter().filter(|e| e.is_over_budget).count(),
            alerting_budgets: evaluations.iter().filter(|e| e.should_alert).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuickStats {
    pub(crate) average_daily_spending: Decimal,
    pub(crate) largest_expense: Decimal,
    pub(crate) top_category: String,
    pub(crate) top_category_amount: Decimal,
    pub(crate) days_until_next_budget_reset: i64,
    pub(crate) most_used_wallet: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecentTransaction {
    pub(crate) id: Option<i64>,
    pub(crate) description: String,
    pub(crate) merchant: String,
    pub(crate) amount: Decimal,
    #[serde(rename = "type")]
    pub(crate) kind: EntryKind,
    pub(crate) category_name: String,
    pub(crate) category_color: String,
    pub(crate) wallet_name: String,
    pub(crate) date: NaiveDate,
}

impl RecentTransaction {
    pub(crate) fn resolve<D: Directory + ?Sized>(
        entry: &LedgerEntry,
        labels: &mut Labels<'_, D>,
    ) -> Self {
        let category = labels.category(entry.category_id);
        Self {
            id: entry.id,
            description: entry.description.clone(),
            merchant: entry.merchant.clone(),
            amount: entry.amount,
            kind: entry.kind,
            category_name: category.name,
            category_color: category.color,
            wallet_name: labels.wallet_name(entry.wallet_id),
            date: entry.date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetAlert {
    pub(crate) budget_id: Option<i64>,
    pub(crate) budget_name: String,
    pub(crate) category_name: String,
    pub(crate) spent_percentage: Decimal,
    pub(crate) remaining_amount: Decimal,
    pub(crate) alert_type: AlertKind,
    pub(crate) message: String,
    pub(crate) alert_date: NaiveDateTime,
}

impl BudgetAlert {
    /// `None` unless the evaluation crosses its threshold or is over budget.
    pub(crate) fn from_evaluation(
        evaluation: &BudgetEvaluation,
        now: NaiveDateTime,
    ) -> Option<Self> {
        if !evaluation.needs_alert() {
            return None;
        }
        Some(Self {
            budget_id: evaluation.budget.id,
            budget_name: evaluation.budget.name.clone(),
            category_name: evaluation.scope.clone().unwrap_or_default(),
            spent_percentage: evaluation.spent_percentage,
            remaining_amount: evaluation.remaining,
            alert_type: evaluation.alert_kind(),
            message: evaluation.alert_message(),
            alert_date: now,
        })
    }
}

/// Headline numbers for the month containing `today`.
///
/// `month_entries` holds every entry of that month; `current_budgets` the
/// budgets whose window contains now.
pub(crate) fn quick_stats<D: Directory + ?Sized>(
    month_entries: &[LedgerEntry],
    current_budgets: &[BudgetEvaluation],
    today: NaiveDate,
    labels: &mut Labels<'_, D>,
) -> QuickStats {
    let expenses: Vec<&LedgerEntry> = month_entries.iter().filter(|e| e.is_expense()).collect();
    let month_total: Decimal = expenses.iter().map(|e| e.amount).sum();
    let largest_expense = expenses
        .iter()
        .map(|e| e.amount)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut per_category: HashMap<i64, Decimal> = HashMap::new();
    for entry in &expenses {
        if let Some(category_id) = entry.category_id {
            *per_category.entry(category_id).or_default() += entry.amount;
        }
    }
    let mut ranked: Vec<(String, Decimal)> = per_category
        .into_iter()
        .map(|(id, amount)| (labels.category(Some(id)).name, amount))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let (top_category, top_category_amount) = ranked
        .into_iter()
        .next()
        .unwrap_or_else(|| (NONE.to_string(), Decimal::ZERO));

    let days_until_next_budget_reset = current_budgets
        .iter()
        .map(|e| e.days_remaining)
        .min()
        .unwrap_or_else(|| (last_of_month(today) - today).num_days());

    QuickStats {
        average_daily_spending: average(month_total, i64::from(days_in_month(today))),
        largest_expense,
        top_category,
        top_category_amount,
        days_until_next_budget_reset,
        most_used_wallet: most_used_wallet(month_entries, labels),
    }
}

fn most_used_wallet<D: Directory + ?Sized>(
    entries: &[LedgerEntry],
    labels: &mut Labels<'_, D>,
) -> String {
    let mut uses: HashMap<i64, usize> = HashMap::new();
    for entry in entries {
        *uses.entry(entry.wallet_id).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = uses
        .into_iter()
        .map(|(id, count)| (labels.wallet_name(id), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .next()
        .map(|(name, _)| name)
        .unwrap_or_else(|| NONE.to_string())
}
