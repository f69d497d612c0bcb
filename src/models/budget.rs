use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::{end_of_day, start_of_day};

/// Alert threshold applied when a budget does not specify one (80%).
pub const DEFAULT_ALERT_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
            Self::Custom => "CUSTOM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            "quarterly" | "quarter" => Some(Self::Quarterly),
            "yearly" | "year" | "annual" => Some(Self::Yearly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn all() -> &'static [BudgetPeriod] {
        &[
            Self::Weekly,
            Self::Monthly,
            Self::Quarterly,
            Self::Yearly,
            Self::Custom,
        ]
    }

    /// Full-day window of one period starting on `start`.
    /// `Custom` has no natural length and yields a single day.
    pub fn window_from(&self, start: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let last_day = match self {
            Self::Weekly => start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX),
            Self::Monthly => add_months_inclusive(start, 1),
            Self::Quarterly => add_months_inclusive(start, 3),
            Self::Yearly => add_months_inclusive(start, 12),
            Self::Custom => start,
        };
        (start_of_day(start), end_of_day(last_day))
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn add_months_inclusive(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// A spending ceiling for one user, optionally scoped to one category.
///
/// Spend is not stored here; it is recomputed from the ledger on every
/// read (see `budget::spend`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDefinition {
    pub id: Option<i64>,
    pub user_id: i64,
    /// `None` means an overall budget covering every category.
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_active: bool,
    pub alert_threshold: Decimal,
    pub alert_enabled: bool,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BudgetDefinition {
    pub fn new(
        user_id: i64,
        name: String,
        amount: Decimal,
        period: BudgetPeriod,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: None,
            user_id,
            category_id: None,
            name,
            amount,
            period,
            start,
            end,
            is_active: true,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            alert_enabled: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[cfg(test)]
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// Whether `as_of` falls inside the inclusive [start, end] window.
    pub fn contains(&self, as_of: NaiveDateTime) -> bool {
        self.start <= as_of && as_of <= self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}
