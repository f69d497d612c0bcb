mod budget;
mod category;
mod entry;
mod user;
mod wallet;

pub use budget::{BudgetDefinition, BudgetPeriod, DEFAULT_ALERT_THRESHOLD};
pub use category::Category;
pub use entry::{EntryKind, LedgerEntry};
pub use user::User;
pub use wallet::Wallet;
