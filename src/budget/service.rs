use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::overlap::has_overlap;
use super::status::{evaluate, BudgetEvaluation};
use crate::error::{CoreError, CoreResult};
use crate::labels::Labels;
use crate::models::{BudgetDefinition, BudgetPeriod, DEFAULT_ALERT_THRESHOLD};
use crate::money::percentage_of;
use crate::store::{require_owner, Store};

const MAX_NAME_LEN: usize = 100;

/// Caller-supplied fields for creating or replacing a budget.
#[derive(Debug, Clone)]
pub(crate) struct BudgetDraft {
    pub(crate) name: String,
    pub(crate) category_id: Option<i64>,
    pub(crate) amount: Decimal,
    pub(crate) period: BudgetPeriod,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
    pub(crate) alert_threshold: Option<Decimal>,
    pub(crate) alert_enabled: Option<bool>,
    pub(crate) description: Option<String>,
    /// Only honored on update.
    pub(crate) is_active: Option<bool>,
}

impl BudgetDraft {
    pub(crate) fn new(
        name: String,
        amount: Decimal,
        period: BudgetPeriod,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            name,
            category_id: None,
            amount,
            period,
            start,
            end,
            alert_threshold: None,
            alert_enabled: None,
            description: None,
            is_active: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    fn apply_to(&self, budget: &mut BudgetDefinition) {
        budget.name = self.name.trim().to_string();
        budget.category_id = self.category_id;
        budget.amount = self.amount;
        budget.period = self.period;
        budget.start = self.start;
        budget.end = self.end;
        budget.alert_threshold = self.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);
        budget.alert_enabled = self.alert_enabled.unwrap_or(true);
        budget.description = self.description.clone();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetSummary {
    pub(crate) total_budgeted: Decimal,
    pub(crate) total_spent: Decimal,
    pub(crate) total_remaining: Decimal,
    pub(crate) overall_spent_percentage: Decimal,
    pub(crate) active_budgets: usize,
    pub(crate) over_budget_count: usize,
    pub(crate) alerting_count: usize,
    pub(crate) budgets: Vec<BudgetEvaluation>,
    pub(crate) over_budgets: Vec<BudgetEvaluation>,
    pub(crate) alerting_budgets: Vec<BudgetEvaluation>,
}

/// Budget-management workflow over any [`Store`].
pub(crate) struct BudgetService<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> BudgetService<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub(crate) fn create(
        &self,
        owner_id: i64,
        draft: &BudgetDraft,
        now: NaiveDateTime,
    ) -> CoreResult<BudgetEvaluation> {
        info!(owner_id, "creating budget");
        self.require_owner(owner_id)?;
        self.validate(owner_id, draft, None)?;

        let mut budget = BudgetDefinition::new(
            owner_id,
            String::new(),
            draft.amount,
            draft.period,
            draft.start,
            draft.end,
        );
        draft.apply_to(&mut budget);
        budget.created_at = now;
        budget.updated_at = now;
        let id = self.store.insert_budget(&budget)?;
        budget.id = Some(id);
        info!(owner_id, budget_id = id, "created budget");
        self.evaluate_labeled(&budget, now)
    }

    pub(crate) fn update(
        &self,
        owner_id: i64,
        id: i64,
        draft: &BudgetDraft,
        now: NaiveDateTime,
    ) -> CoreResult<BudgetEvaluation> {
        info!(owner_id, budget_id = id, "updating budget");
        self.require_owner(owner_id)?;
        let mut budget = self.owned_budget(owner_id, id)?;
        self.validate(owner_id, draft, Some(id))?;

        draft.apply_to(&mut budget);
        if let Some(active) = draft.is_active {
            budget.is_active = active;
        }
        budget.updated_at = now;
        self.store.update_budget(&budget)?;
        self.evaluate_labeled(&budget, now)
    }

    /// Soft delete.
    pub(crate) fn delete(&self, owner_id: i64, id: i64) -> CoreResult<()> {
        info!(owner_id, budget_id = id, "deleting budget");
        self.require_owner(owner_id)?;
        self.owned_budget(owner_id, id)?;
        self.store.deactivate_budget(id)
    }

    pub(crate) fn get(
        &self,
        owner_id: i64,
        id: i64,
        now: NaiveDateTime,
    ) -> CoreResult<BudgetEvaluation> {
        info!(owner_id, budget_id = id, "getting budget");
        self.require_owner(owner_id)?;
        let budget = self.owned_budget(owner_id, id)?;
        self.evaluate_labeled(&budget, now)
    }

    /// Every active budget, whatever its window.
    pub(crate) fn list(
        &self,
        owner_id: i64,
        now: NaiveDateTime,
    ) -> CoreResult<Vec<BudgetEvaluation>> {
        info!(owner_id, "listing budgets");
        self.require_owner(owner_id)?;
        let budgets = self.store.active_budgets_for_owner(owner_id)?;
        self.evaluate_all(&budgets, now)
    }

    /// Active budgets whose window contains `now`.
    pub(crate) fn active(
        &self,
        owner_id: i64,
        now: NaiveDateTime,
    ) -> CoreResult<Vec<BudgetEvaluation>> {
        info!(owner_id, "listing current budgets");
        self.require_owner(owner_id)?;
        let budgets = self.store.active_budgets_for_owner_in_window(owner_id, now)?;
        self.evaluate_all(&budgets, now)
    }

    pub(crate) fn summary(&self, owner_id: i64, now: NaiveDateTime) -> CoreResult<BudgetSummary> {
        info!(owner_id, "summarizing budgets");
        self.require_owner(owner_id)?;
        let budgets = self.store.active_budgets_for_owner_in_window(owner_id, now)?;
        let evaluations = self.evaluate_all(&budgets, now)?;

        let total_budgeted: Decimal = evaluations.iter().map(|e| e.budget.amount).sum();
        let total_spent: Decimal = evaluations.iter().map(|e| e.spent).sum();
        let over_budgets: Vec<_> = evaluations
            .iter()
            .filter(|e| e.is_over_budget)
            .cloned()
            .collect();
        let alerting_budgets: Vec<_> = evaluations
            .iter()
            .filter(|e| e.should_alert)
            .cloned()
            .collect();

        Ok(BudgetSummary {
            total_budgeted,
            total_spent,
            total_remaining: total_budgeted - total_spent,
            overall_spent_percentage: percentage_of(total_spent, total_budgeted),
            active_budgets: evaluations.len(),
            over_budget_count: over_budgets.len(),
            alerting_count: alerting_budgets.len(),
            budgets: evaluations,
            over_budgets,
            alerting_budgets,
        })
    }

    fn require_owner(&self, owner_id: i64) -> CoreResult<()> {
        require_owner(self.store, owner_id).map(|_| ())
    }

    fn owned_budget(&self, owner_id: i64, id: i64) -> CoreResult<BudgetDefinition> {
        let budget = self
            .store
            .budget_by_id(id)?
            .ok_or_else(|| CoreError::not_found("Budget", id))?;
        if !budget.owned_by(owner_id) {
            warn!(owner_id, budget_id = id, "budget belongs to another user");
            return Err(CoreError::validation(
                "Budget does not belong to the current user",
            ));
        }
        Ok(budget)
    }

    fn validate(
        &self,
        owner_id: i64,
        draft: &BudgetDraft,
        exclude: Option<i64>,
    ) -> CoreResult<()> {
        let result = self.check_draft(owner_id, draft, exclude);
        if let Err(e) = &result {
            warn!(owner_id, error = %e, "rejected budget");
        }
        result
    }

    fn check_draft(
        &self,
        owner_id: i64,
        draft: &BudgetDraft,
        exclude: Option<i64>,
    ) -> CoreResult<()> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Budget name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::validation(
                "Budget name must not exceed 100 characters",
            ));
        }
        if draft.amount <= Decimal::ZERO {
            return Err(CoreError::validation("Amount must be greater than 0"));
        }
        if draft.end < draft.start {
            return Err(CoreError::validation("End date must be after start date"));
        }
        if let Some(category_id) = draft.category_id {
            let category = self
                .store
                .category_by_id(category_id)?
                .ok_or_else(|| CoreError::not_found("Category", category_id))?;
            if !category.usable_by(owner_id) {
                return Err(CoreError::validation(
                    "Category does not belong to the current user",
                ));
            }
        }
        if has_overlap(
            self.store,
            owner_id,
            draft.category_id,
            draft.start,
            draft.end,
            exclude,
        )? {
            return Err(CoreError::validation(
                "A budget already exists for this category in the specified period",
            ));
        }
        if let Some(threshold) = draft.alert_threshold {
            if threshold < Decimal::ZERO || threshold > Decimal::ONE_HUNDRED {
                return Err(CoreError::validation(
                    "Alert threshold must be between 0 and 100",
                ));
            }
        }
        Ok(())
    }

    fn evaluate_labeled(
        &self,
        budget: &BudgetDefinition,
        now: NaiveDateTime,
    ) -> CoreResult<BudgetEvaluation> {
        let scope = Labels::new(self.store).budget_scope(budget.category_id);
        Ok(evaluate(self.store, budget, now)?.labeled(scope))
    }

    fn evaluate_all(
        &self,
        budgets: &[BudgetDefinition],
        now: NaiveDateTime,
    ) -> CoreResult<Vec<BudgetEvaluation>> {
        let mut labels = Labels::new(self.store);
        budgets
            .iter()
            .map(|b| {
                let scope = labels.budget_scope(b.category_id);
                Ok(evaluate(self.store, b, now)?.labeled(scope))
            })
            .collect()
    }
}
