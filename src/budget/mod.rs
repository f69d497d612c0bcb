//! Budget evaluation: spend recomputation, overlap checks, status and
//! alerts, and the budget-management workflow built on top of them.

mod overlap;
mod service;
mod spend;
mod status;

pub(crate) use service::{BudgetDraft, BudgetService, BudgetSummary};
pub(crate) use status::{evaluate, AlertKind, BudgetEvaluation};

#[cfg(test)]
mod tests;
