use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Expense,
    Income,
    Transfer,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "EXPENSE",
            Self::Income => "INCOME",
            Self::Transfer => "TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "exp" => Some(Self::Expense),
            "income" | "inc" => Some(Self::Income),
            "transfer" | "xfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    pub fn all() -> &'static [EntryKind] {
        &[Self::Expense, Self::Income, Self::Transfer]
    }

    /// Signed change this kind of entry applies to its wallet balance.
    /// Transfers are recorded but move no money.
    pub fn balance_delta(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Expense => -amount,
            Self::Income => amount,
            Self::Transfer => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded expense, income or transfer. `amount` is always a
/// non-negative magnitude; `kind` carries the direction.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Option<i64>,
    pub user_id: i64,
    pub wallet_id: i64,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub merchant: String,
    pub description: String,
    pub kind: EntryKind,
    pub is_recurring: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LedgerEntry {
    pub fn new(
        user_id: i64,
        wallet_id: i64,
        kind: EntryKind,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: None,
            user_id,
            wallet_id,
            category_id: None,
            amount,
            currency: "USD".to_string(),
            date,
            merchant: String::new(),
            description: String::new(),
            kind,
            is_recurring: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[cfg(test)]
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryKind::Expense
    }

    pub fn owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    pub fn wallet_delta(&self) -> Decimal {
        self.kind.balance_delta(self.amount)
    }

    /// Field-level checks done before any write touches the store.
    pub fn validate(&self) -> CoreResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::validation("Amount must be greater than 0"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::validation(
                "Currency must be 3 characters (e.g., USD)",
            ));
        }
        if self.merchant.chars().count() > 200 {
            return Err(CoreError::validation(
                "Merchant name must not exceed 200 characters",
            ));
        }
        Ok(())
    }
}
