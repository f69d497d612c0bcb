use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::{
    days_in_month, each_day, first_of_month, last_of_month, shift_days, shift_months, week_start,
};
use crate::labels::{CategoryLabel, Labels};
use crate::models::{EntryKind, LedgerEntry};
use crate::money::{average, percentage_of};
use crate::store::Directory;

/// Expense, income and net over a set of entries. `transaction_count`
/// counts every entry, transfers included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Totals {
    pub(crate) expenses: Decimal,
    pub(crate) income: Decimal,
    pub(crate) net: Decimal,
    pub(crate) transaction_count: usize,
}

impl Totals {
    pub(crate) fn of<'e>(entries: impl IntoIterator<Item = &'e LedgerEntry>) -> Self {
        let mut totals = Self::default();
        for entry in entries {
            totals.add(entry);
        }
        totals
    }

    fn add(&mut self, entry: &LedgerEntry) {
        match entry.kind {
            EntryKind::Expense => self.expenses += entry.amount,
            EntryKind::Income => self.income += entry.amount,
            EntryKind::Transfer => {}
        }
        self.net = self.income - self.expenses;
        self.transaction_count += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DailyPoint {
    pub(crate) date: NaiveDate,
    #[serde(flatten)]
    pub(crate) totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeeklyPoint {
    pub(crate) year: i32,
    pub(crate) week: u32,
    pub(crate) week_start: NaiveDate,
    pub(crate) week_end: NaiveDate,
    #[serde(flatten)]
    pub(crate) totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthlyPoint {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) month_name: String,
    #[serde(flatten)]
    pub(crate) totals: Totals,
    pub(crate) average_daily: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryMonthAmount {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) amount: Decimal,
    pub(crate) transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryTrend {
    pub(crate) category: CategoryLabel,
    pub(crate) total: Decimal,
    pub(crate) months: Vec<CategoryMonthAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PeriodComparison {
    pub(crate) previous_expenses: Decimal,
    pub(crate) expense_change: Decimal,
    pub(crate) expense_change_percentage: Decimal,
}

pub(crate) fn compare(current_expenses: Decimal, previous_expenses: Decimal) -> PeriodComparison {
    let change = current_expenses - previous_expenses;
    PeriodComparison {
        previous_expenses,
        expense_change: change,
        expense_change_percentage: percentage_of(change, previous_expenses),
    }
}

/// Window the current period is compared against: the same number of whole
/// days, ending on the current start day.
pub(crate) fn previous_window(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let length = (end - start).num_days();
    (shift_days(start, -length), start)
}

/// One point per calendar day in `[start, end]`, zero-filled.
pub(crate) fn daily_trend(
    entries: &[LedgerEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyPoint> {
    let mut by_day: HashMap<NaiveDate, Totals> = HashMap::new();
    for entry in entries {
        by_day.entry(entry.date).or_default().add(entry);
    }
    each_day(start, end)
        .map(|date| DailyPoint {
            date,
            totals: by_day.remove(&date).unwrap_or_default(),
        })
        .collect()
}

/// The `weeks` ISO weeks ending with the week containing `today`, oldest
/// first.
pub(crate) fn weekly_trend(
    entries: &[LedgerEntry],
    today: NaiveDate,
    weeks: usize,
) -> Vec<WeeklyPoint> {
    let last = week_start(today);
    (0..weeks)
        .rev()
        .map(|back| {
            let start = shift_days(last, -7 * back as i64);
            let end = shift_days(start, 6);
            let iso = start.iso_week();
            WeeklyPoint {
                year: iso.year(),
                week: iso.week(),
                week_start: start,
                week_end: end,
                totals: Totals::of(
                    entries
                        .iter()
                        .filter(|e| e.date >= start && e.date <= end),
                ),
            }
        })
        .collect()
}

/// Calendar months from the one containing `start` through the one
/// containing `end`.
pub(crate) fn months_touching(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let last = first_of_month(end);
    let mut month = first_of_month(start);
    let mut months = Vec::new();
    while month <= last {
        months.push(month);
        let next = shift_months(month, 1);
        if next <= month {
            break;
        }
        month = next;
    }
    months
}

/// One point per month touching `[start, end]`, oldest first, zero-filled.
/// Average daily spend divides by the full length of that month.
pub(crate) fn monthly_trend(
    entries: &[LedgerEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<MonthlyPoint> {
    months_touching(start, end)
        .into_iter()
        .map(|month| {
            let month_end = last_of_month(month);
            let totals = Totals::of(
                entries
                    .iter()
                    .filter(|e| e.date >= month && e.date <= month_end),
            );
            MonthlyPoint {
                year: month.year(),
                month: month.month(),
                month_name: month.format("%B").to_string(),
                average_daily: average(totals.expenses, i64::from(days_in_month(month))),
                totals,
            }
        })
        .collect()
}

/// Monthly expense series for every category with expenses in the window,
/// largest total first.
pub(crate) fn category_trends<D: Directory + ?Sized>(
    entries: &[LedgerEntry],
    start: NaiveDate,
    end: NaiveDate,
    labels: &mut Labels<'_, D>,
) -> Vec<CategoryTrend> {
    let months = months_touching(start, end);
    let mut by_category: BTreeMap<i64, BTreeMap<NaiveDate, (Decimal, usize)>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.is_expense()) {
        let Some(category_id) = entry.category_id else {
            continue;
        };
        let slot = by_category
            .entry(category_id)
            .or_default()
            .entry(first_of_month(entry.date))
            .or_default();
        slot.0 += entry.amount;
        slot.1 += 1;
    }

    let mut trends: Vec<CategoryTrend> = by_category
        .into_iter()
        .map(|(category_id, per_month)| {
            let series: Vec<CategoryMonthAmount> = months
                .iter()
                .map(|month| {
                    let (amount, count) = per_month.get(month).copied().unwrap_or_default();
                    CategoryMonthAmount {
                        year: month.year(),
                        month: month.month(),
                        amount,
                        transaction_count: count,
                    }
                })
                .collect();
            CategoryTrend {
                category: labels.category(Some(category_id)),
                total: series.iter().map(|p| p.amount).sum(),
                months: series,
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.name.cmp(&b.category.name))
    });
    trends
}
