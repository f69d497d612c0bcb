use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::breakdown::{category_breakdown, top_categories, CategorySpendSummary};
use super::dashboard::{
    quick_stats, BudgetAlert, BudgetOverview, DashboardSnapshot, RecentTransaction,
};
use super::patterns::{spending_patterns, SpendingPatterns};
use super::trend::{
    category_trends, compare, daily_trend, monthly_trend, previous_window, weekly_trend,
    CategoryTrend, DailyPoint, MonthlyPoint, PeriodComparison, Totals, WeeklyPoint,
};
use crate::budget::{evaluate, BudgetEvaluation};
use crate::dates::{first_of_month, last_of_month, shift_days, shift_months, week_start};
use crate::error::{CoreError, CoreResult};
use crate::labels::Labels;
use crate::models::{BudgetDefinition, LedgerEntry};
use crate::store::{require_owner, Store};

pub(crate) const DEFAULT_RECENT_LIMIT: usize = 10;
pub(crate) const TREND_WEEKS: usize = 12;
pub(crate) const MAX_TREND_MONTHS: u32 = 120;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExpenseAnalytics {
    pub(crate) period_start: NaiveDateTime,
    pub(crate) period_end: NaiveDateTime,
    pub(crate) total_expenses: Decimal,
    pub(crate) total_income: Decimal,
    pub(crate) net_amount: Decimal,
    pub(crate) transaction_count: usize,
    #[serde(flatten)]
    pub(crate) comparison: PeriodComparison,
    pub(crate) category_breakdown: Vec<CategorySpendSummary>,
    pub(crate) top_categories: Vec<CategorySpendSummary>,
    pub(crate) daily_trends: Vec<DailyPoint>,
    pub(crate) budget_performance: Vec<BudgetEvaluation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpendingTrends {
    pub(crate) window_start: NaiveDate,
    pub(crate) window_end: NaiveDate,
    pub(crate) monthly_trends: Vec<MonthlyPoint>,
    pub(crate) weekly_trends: Vec<WeeklyPoint>,
    pub(crate) category_trends: Vec<CategoryTrend>,
    pub(crate) spending_patterns: SpendingPatterns,
}

/// Read-only aggregations over one owner's ledger and budgets.
pub(crate) struct AnalyticsService<'a, S: Store + ?Sized> {
    store: &'a S,
    recent_limit: usize,
}

impl<'a, S: Store + ?Sized> AnalyticsService<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self {
            store,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub(crate) fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub(crate) fn expense_analytics(
        &self,
        owner_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> CoreResult<ExpenseAnalytics> {
        info!(owner_id, %start, %end, "expense analytics");
        require_owner(self.store, owner_id)?;
        if end < start {
            warn!(owner_id, "analytics window ends before it starts");
            return Err(CoreError::validation("End date must be after start date"));
        }

        let (start_day, end_day) = (start.date(), end.date());
        let entries = self
            .store
            .entries_for_owner_in_range(owner_id, start_day, end_day)?;
        let totals = Totals::of(&entries);

        let (prev_start, prev_end) = previous_window(start_day, end_day);
        let previous = self
            .store
            .entries_for_owner_in_range(owner_id, prev_start, prev_end)?;
        let previous_expenses = Totals::of(&previous).expenses;

        let mut labels = Labels::new(self.store);
        let breakdown = category_breakdown(&entries, &mut labels);
        let budgets = self
            .store
            .active_budgets_for_owner_in_window(owner_id, now)?;
        let budget_performance = self.evaluate_all(&budgets, now, &mut labels)?;

        Ok(ExpenseAnalytics {
            period_start: start,
            period_end: end,
            total_expenses: totals.expenses,
            total_income: totals.income,
            net_amount: totals.net,
            transaction_count: totals.transaction_count,
            comparison: compare(totals.expenses, previous_expenses),
            top_categories: top_categories(&breakdown),
            category_breakdown: breakdown,
            daily_trends: daily_trend(&entries, start_day, end_day),
            budget_performance,
        })
    }

    /// Trends over the `months` calendar months leading up to `now`.
    pub(crate) fn spending_trends(
        &self,
        owner_id: i64,
        months: u32,
        now: NaiveDateTime,
    ) -> CoreResult<SpendingTrends> {
        info!(owner_id, months, "spending trends");
        require_owner(self.store, owner_id)?;
        if months == 0 || months > MAX_TREND_MONTHS {
            warn!(owner_id, months, "trend window out of range");
            return Err(CoreError::validation("Months must be between 1 and 120"));
        }

        let today = now.date();
        let window_start = shift_months(today, -(months as i32));
        let weeks_start = shift_days(week_start(today), -7 * (TREND_WEEKS as i64 - 1));
        let fetched = self.store.entries_for_owner_in_range(
            owner_id,
            window_start.min(weeks_start),
            today,
        )?;
        let in_window: Vec<LedgerEntry> = fetched
            .iter()
            .filter(|e| e.date >= window_start)
            .cloned()
            .collect();

        let mut labels = Labels::new(self.store);
        Ok(SpendingTrends {
            window_start,
            window_end: today,
            monthly_trends: monthly_trend(&in_window, window_start, today),
            weekly_trends: weekly_trend(&fetched, today, TREND_WEEKS),
            category_trends: category_trends(&in_window, window_start, today, &mut labels),
            spending_patterns: spending_patterns(&in_window, window_start, today),
        })
    }

    pub(crate) fn dashboard(
        &self,
        owner_id: i64,
        now: NaiveDateTime,
    ) -> CoreResult<DashboardSnapshot> {
        info!(owner_id, "dashboard");
        require_owner(self.store, owner_id)?;

        let today = now.date();
        let (month_start, month_end) = (first_of_month(today), last_of_month(today));
        let month_entries = self
            .store
            .entries_for_owner_in_range(owner_id, month_start, month_end)?;
        let totals = Totals::of(&month_entries);

        let prev_month = shift_months(month_start, -1);
        let previous = self.store.entries_for_owner_in_range(
            owner_id,
            prev_month,
            last_of_month(prev_month),
        )?;
        let previous_expenses = Totals::of(&previous).expenses;

        let mut labels = Labels::new(self.store);
        let budgets = self.store.active_budgets_for_owner(owner_id)?;
        let evaluations = self.evaluate_all(&budgets, now, &mut labels)?;
        let current: Vec<BudgetEvaluation> = evaluations
            .iter()
            .filter(|e| e.budget.contains(now))
            .cloned()
            .collect();
        let budget_alerts = evaluations
            .iter()
            .filter_map(|e| BudgetAlert::from_evaluation(e, now))
            .collect();

        let recent_transactions = self
            .store
            .recent_entries_for_owner(owner_id, self.recent_limit)?
            .iter()
            .map(|e| RecentTransaction::resolve(e, &mut labels))
            .collect();

        Ok(DashboardSnapshot {
            month_start,
            month_end,
            current_month_expenses: totals.expenses,
            current_month_income: totals.income,
            current_month_net: totals.net,
            current_month_transactions: totals.transaction_count,
            comparison: compare(totals.expenses, previous_expenses),
            budget_summary: BudgetOverview::of(&current),
            quick_stats: quick_stats(&month_entries, &current, today, &mut labels),
            recent_transactions,
            budget_alerts,
        })
    }

    fn evaluate_all(
        &self,
        budgets: &[BudgetDefinition],
        now: NaiveDateTime,
        labels: &mut Labels<'_, S>,
    ) -> CoreResult<Vec<BudgetEvaluation>> {
        budgets
            .iter()
            .map(|b| {
                let scope = labels.budget_scope(b.category_id);
                Ok(evaluate(self.store, b, now)?.labeled(scope))
            })
            .collect()
    }
}
