#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::db::Database;
use crate::models::{Category, EntryKind, LedgerEntry, User, Wallet};

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
    day(y, m, d).and_hms_opt(12, 0, 0).unwrap()
}

/// In-memory database with one user and one wallet.
pub(crate) struct Fixture {
    pub(crate) db: Database,
    pub(crate) user_id: i64,
    pub(crate) wallet_id: i64,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let user_id = db.insert_user(&User::new("alice".into())).unwrap();
        let wallet_id = db
            .insert_wallet(&Wallet::new(user_id, "Cash".into(), "USD".into()))
            .unwrap();
        Self {
            db,
            user_id,
            wallet_id,
        }
    }

    pub(crate) fn other_user(&self, name: &str) -> i64 {
        self.db.insert_user(&User::new(name.into())).unwrap()
    }

    pub(crate) fn wallet(&self, name: &str) -> i64 {
        self.db
            .insert_wallet(&Wallet::new(self.user_id, name.into(), "USD".into()))
            .unwrap()
    }

    pub(crate) fn category(&self, name: &str) -> i64 {
        self.db
            .insert_category(&Category::new(self.user_id, name.into()))
            .unwrap()
    }

    pub(crate) fn record(
        &mut self,
        kind: EntryKind,
        amount: Decimal,
        date: NaiveDate,
        category_id: Option<i64>,
    ) -> i64 {
        let mut entry = LedgerEntry::new(self.user_id, self.wallet_id, kind, amount, date);
        entry.category_id = category_id;
        self.db.record_entry(&entry).unwrap()
    }

    pub(crate) fn expense(
        &mut self,
        amount: Decimal,
        date: NaiveDate,
        category_id: Option<i64>,
    ) -> i64 {
        self.record(EntryKind::Expense, amount, date, category_id)
    }

    pub(crate) fn income(&mut self, amount: Decimal, date: NaiveDate) -> i64 {
        self.record(EntryKind::Income, amount, date, None)
    }
}
