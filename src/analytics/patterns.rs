use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

use super::trend::months_touching;
use crate::dates::{each_day, inclusive_day_count};
use crate::models::LedgerEntry;
use crate::money::{average, round2};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DaySpend {
    pub(crate) date: NaiveDate,
    pub(crate) amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeekdaySpend {
    pub(crate) day: String,
    /// Expense per occurrence of this weekday in the window.
    pub(crate) average: Decimal,
    pub(crate) total: Decimal,
    pub(crate) transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpendingPatterns {
    pub(crate) average_daily: Decimal,
    pub(crate) average_weekly: Decimal,
    pub(crate) average_monthly: Decimal,
    pub(crate) highest_spending_day: Option<DaySpend>,
    pub(crate) lowest_spending_day: Option<DaySpend>,
    pub(crate) day_of_week: Vec<WeekdaySpend>,
}

/// Expense habits over `[start, end]`. Entries outside the window and
/// non-expense entries are ignored.
pub(crate) fn spending_patterns(
    entries: &[LedgerEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> SpendingPatterns {
    let expenses: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.is_expense() && e.date >= start && e.date <= end)
        .collect();
    let total: Decimal = expenses.iter().map(|e| e.amount).sum();
    let days = inclusive_day_count(start, end);

    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for entry in &expenses {
        *by_day.entry(entry.date).or_default() += entry.amount;
    }
    // BTreeMap iterates oldest first, so ties resolve to the earliest day.
    let highest = by_day
        .iter()
        .fold(None::<DaySpend>, |best, (date, amount)| match best {
            Some(b) if b.amount >= *amount => Some(b),
            _ => Some(DaySpend {
                date: *date,
                amount: *amount,
            }),
        });
    let lowest = by_day
        .iter()
        .fold(None::<DaySpend>, |best, (date, amount)| match best {
            Some(b) if b.amount <= *amount => Some(b),
            _ => Some(DaySpend {
                date: *date,
                amount: *amount,
            }),
        });

    let average_weekly = if days > 0 {
        round2(total * Decimal::from(7) / Decimal::from(days))
    } else {
        Decimal::ZERO
    };
    let month_count = months_touching(start, end).len() as i64;

    SpendingPatterns {
        average_daily: average(total, days),
        average_weekly,
        average_monthly: average(total, month_count),
        highest_spending_day: highest,
        lowest_spending_day: lowest,
        day_of_week: weekday_breakdown(&expenses, start, end),
    }
}

fn weekday_breakdown(
    expenses: &[&LedgerEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WeekdaySpend> {
    let mut occurrences = [0i64; 7];
    for date in each_day(start, end) {
        occurrences[date.weekday().num_days_from_monday() as usize] += 1;
    }
    let mut totals = [Decimal::ZERO; 7];
    let mut counts = [0usize; 7];
    for entry in expenses {
        let idx = entry.date.weekday().num_days_from_monday() as usize;
        totals[idx] += entry.amount;
        counts[idx] += 1;
    }

    WEEKDAYS
        .iter()
        .enumerate()
        .map(|(idx, weekday)| WeekdaySpend {
            day: weekday_name(*weekday).to_string(),
            average: average(totals[idx], occurrences[idx]),
            total: totals[idx],
            transaction_count: counts[idx],
        })
        .collect()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
