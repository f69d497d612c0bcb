use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::spend::compute_spent;
use crate::dates::whole_days_between;
use crate::error::CoreResult;
use crate::models::BudgetDefinition;
use crate::money::percentage_of;
use crate::store::LedgerQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum AlertKind {
    #[serde(rename = "OVERBUDGET")]
    OverBudget,
    #[serde(rename = "THRESHOLD")]
    Threshold,
}

/// A budget definition together with its freshly computed status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetEvaluation {
    #[serde(flatten)]
    pub(crate) budget: BudgetDefinition,
    /// Category name or "Overall", filled in by callers that resolve labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) scope: Option<String>,
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
    pub(crate) spent_percentage: Decimal,
    pub(crate) is_over_budget: bool,
    pub(crate) should_alert: bool,
    pub(crate) days_remaining: i64,
    pub(crate) is_expired: bool,
}

impl BudgetEvaluation {
    pub(crate) fn labeled(mut self, scope: String) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Alert listing predicate: threshold crossed or already over.
    pub(crate) fn needs_alert(&self) -> bool {
        self.should_alert || self.is_over_budget
    }

    pub(crate) fn alert_kind(&self) -> AlertKind {
        if self.is_over_budget {
            AlertKind::OverBudget
        } else {
            AlertKind::Threshold
        }
    }

    pub(crate) fn alert_message(&self) -> String {
        match self.alert_kind() {
            AlertKind::OverBudget => format!(
                "You have exceeded your budget by {:.2}",
                self.spent - self.budget.amount
            ),
            AlertKind::Threshold => format!(
                "You have spent {:.2}% of your budget",
                self.spent_percentage
            ),
        }
    }
}

/// Derive status for `budget` as of `now` from the ledger.
pub(crate) fn evaluate<L: LedgerQuery + ?Sized>(
    ledger: &L,
    budget: &BudgetDefinition,
    now: NaiveDateTime,
) -> CoreResult<BudgetEvaluation> {
    let spent = compute_spent(ledger, budget)?;
    let evaluation = evaluate_with_spent(budget, spent, now);
    debug!(
        budget_id = ?budget.id,
        spent = %evaluation.spent,
        pct = %evaluation.spent_percentage,
        "recomputed budget"
    );
    Ok(evaluation)
}

pub(super) fn evaluate_with_spent(
    budget: &BudgetDefinition,
    spent: Decimal,
    now: NaiveDateTime,
) -> BudgetEvaluation {
    let spent_percentage = percentage_of(spent, budget.amount);
    BudgetEvaluation {
        budget: budget.clone(),
        scope: None,
        spent,
        remaining: budget.amount - spent,
        spent_percentage,
        is_over_budget: spent > budget.amount,
        should_alert: budget.alert_enabled && spent_percentage >= budget.alert_threshold,
        days_remaining: whole_days_between(now, budget.end).max(0),
        is_expired: budget.end < now,
    }
}
