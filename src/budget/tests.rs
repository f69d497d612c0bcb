#![allow(clippy::unwrap_used)]

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::overlap::{has_overlap, windows_overlap};
use super::spend::compute_spent;
use super::status::evaluate_with_spent;
use super::*;
use crate::dates::{end_of_day, start_of_day};
use crate::models::{BudgetDefinition, BudgetPeriod, EntryKind};
use crate::store::BudgetStore;
use crate::testutil::{day, noon, Fixture};

fn window(
    (y1, m1, d1): (i32, u32, u32),
    (y2, m2, d2): (i32, u32, u32),
) -> (NaiveDateTime, NaiveDateTime) {
    (start_of_day(day(y1, m1, d1)), end_of_day(day(y2, m2, d2)))
}

fn january_draft(amount: Decimal) -> BudgetDraft {
    let (start, end) = window((2024, 1, 1), (2024, 1, 31));
    BudgetDraft::new("January".into(), amount, BudgetPeriod::Monthly, start, end)
}

fn stored_budget(f: &Fixture, category_id: Option<i64>, amount: Decimal) -> BudgetDefinition {
    let (start, end) = window((2024, 1, 1), (2024, 1, 31));
    let mut budget = BudgetDefinition::new(
        f.user_id,
        "January".into(),
        amount,
        BudgetPeriod::Monthly,
        start,
        end,
    );
    budget.category_id = category_id;
    let id = f.db.insert_budget(&budget).unwrap();
    budget.id = Some(id);
    budget
}

// ── Spend ─────────────────────────────────────────────────────

#[test]
fn test_spent_empty_ledger_is_zero() {
    let f = Fixture::new();
    let budget = stored_budget(&f, None, dec!(100));
    assert_eq!(compute_spent(&f.db, &budget).unwrap(), Decimal::ZERO);
}

#[test]
fn test_spent_counts_expenses_in_window_only() {
    let mut f = Fixture::new();
    let budget = stored_budget(&f, None, dec!(100));
    f.expense(dec!(10), day(2024, 1, 1), None);
    f.expense(dec!(20), day(2024, 1, 31), None);
    f.expense(dec!(40), day(2024, 2, 1), None);
    f.expense(dec!(80), day(2023, 12, 31), None);
    f.income(dec!(500), day(2024, 1, 10));
    f.record(EntryKind::Transfer, dec!(60), day(2024, 1, 11), None);

    assert_eq!(compute_spent(&f.db, &budget).unwrap(), dec!(30));
}

#[test]
fn test_spent_ignores_time_of_day_on_bounds() {
    let mut f = Fixture::new();
    let mut budget = stored_budget(&f, None, dec!(100));
    budget.start = noon(2024, 1, 1);
    budget.end = day(2024, 1, 31).and_hms_opt(0, 0, 1).unwrap();
    f.expense(dec!(15), day(2024, 1, 1), None);
    f.expense(dec!(25), day(2024, 1, 31), None);
    assert_eq!(compute_spent(&f.db, &budget).unwrap(), dec!(40));
}

#[test]
fn test_category_budget_skips_other_and_uncategorized() {
    let mut f = Fixture::new();
    let food = f.category("Food");
    let fun = f.category("Fun");
    let budget = stored_budget(&f, Some(food), dec!(100));
    f.expense(dec!(12.34), day(2024, 1, 5), Some(food));
    f.expense(dec!(50), day(2024, 1, 6), Some(fun));
    f.expense(dec!(70), day(2024, 1, 7), None);

    assert_eq!(compute_spent(&f.db, &budget).unwrap(), dec!(12.34));
}

#[test]
fn test_spent_ignores_other_owners() {
    let mut f = Fixture::new();
    let budget = stored_budget(&f, None, dec!(100));
    let bob = f.other_user("bob");
    let bob_wallet = f
        .db
        .insert_wallet(&crate::models::Wallet::new(bob, "Bob".into(), "USD".into()))
        .unwrap();
    let entry = crate::models::LedgerEntry::new(
        bob,
        bob_wallet,
        EntryKind::Expense,
        dec!(99),
        day(2024, 1, 9),
    );
    f.db.record_entry(&entry).unwrap();
    assert_eq!(compute_spent(&f.db, &budget).unwrap(), Decimal::ZERO);
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn test_threshold_then_over_budget_scenario() {
    let mut f = Fixture::new();
    let budget = stored_budget(&f, None, dec!(100.00));
    let now = noon(2024, 1, 20);
    f.expense(dec!(50.00), day(2024, 1, 3), None);
    f.expense(dec!(35.00), day(2024, 1, 4), None);

    let eval = evaluate(&f.db, &budget, now).unwrap();
    assert_eq!(eval.spent, dec!(85.00));
    assert_eq!(eval.spent_percentage, dec!(85.00));
    assert!(!eval.is_over_budget);
    assert!(eval.should_alert);
    assert_eq!(eval.alert_kind(), AlertKind::Threshold);
    assert_eq!(eval.alert_message(), "You have spent 85.00% of your budget");

    f.expense(dec!(20.00), day(2024, 1, 5), None);
    let eval = evaluate(&f.db, &budget, now).unwrap();
    assert_eq!(eval.spent, dec!(105.00));
    assert_eq!(eval.remaining, dec!(-5.00));
    assert!(eval.is_over_budget);
    assert!(eval.needs_alert());
    assert_eq!(eval.alert_kind(), AlertKind::OverBudget);
    assert_eq!(eval.alert_message(), "You have exceeded your budget by 5.00");
}

#[test]
fn test_remaining_plus_spent_is_amount() {
    let mut budget = BudgetDefinition::new(
        1,
        "b".into(),
        dec!(123.45),
        BudgetPeriod::Custom,
        noon(2024, 1, 1),
        noon(2024, 1, 2),
    );
    for spent in [dec!(0), dec!(0.01), dec!(99.99), dec!(123.45), dec!(500.5)] {
        let eval = evaluate_with_spent(&budget, spent, noon(2024, 1, 1));
        assert_eq!(eval.remaining + eval.spent, budget.amount);
    }
    budget.amount = Decimal::ZERO;
    let eval = evaluate_with_spent(&budget, dec!(10), noon(2024, 1, 1));
    assert_eq!(eval.spent_percentage, Decimal::ZERO);
}

#[test]
fn test_spent_percentage_monotonic() {
    let mut f = Fixture::new();
    let budget = stored_budget(&f, None, dec!(70));
    let now = noon(2024, 1, 31);
    let mut last = Decimal::ZERO;
    for (i, amount) in [dec!(1.11), dec!(0.01), dec!(33.3), dec!(50), dec!(7)]
        .into_iter()
        .enumerate()
    {
        f.expense(amount, day(2024, 1, i as u32 + 1), None);
        let pct = evaluate(&f.db, &budget, now).unwrap().spent_percentage;
        assert!(pct >= last);
        last = pct;
    }
}

#[test]
fn test_should_alert_respects_flag_and_threshold() {
    let mut budget = BudgetDefinition::new(
        1,
        "b".into(),
        dec!(100),
        BudgetPeriod::Monthly,
        noon(2024, 1, 1),
        noon(2024, 1, 31),
    );
    let now = noon(2024, 1, 15);
    assert!(!evaluate_with_spent(&budget, dec!(79.99), now).should_alert);
    assert!(evaluate_with_spent(&budget, dec!(80), now).should_alert);

    budget.alert_enabled = false;
    let eval = evaluate_with_spent(&budget, dec!(150), now);
    assert!(!eval.should_alert);
    assert!(eval.is_over_budget);
    assert!(eval.needs_alert());
}

#[test]
fn test_days_remaining_and_expiry() {
    let (start, end) = window((2024, 1, 1), (2024, 1, 31));
    let budget = BudgetDefinition::new(
        1,
        "b".into(),
        dec!(100),
        BudgetPeriod::Monthly,
        start,
        end,
    );

    let mid = evaluate_with_spent(&budget, Decimal::ZERO, noon(2024, 1, 20));
    assert_eq!(mid.days_remaining, 11);
    assert!(!mid.is_expired);

    let after = evaluate_with_spent(&budget, Decimal::ZERO, noon(2024, 3, 1));
    assert_eq!(after.days_remaining, 0);
    assert!(after.is_expired);
}

// ── Overlap ───────────────────────────────────────────────────

#[test]
fn test_windows_overlap_symmetric() {
    let cases = [
        (window((2024, 1, 1), (2024, 1, 31)), window((2024, 1, 15), (2024, 2, 15))),
        (window((2024, 1, 1), (2024, 1, 31)), window((2024, 2, 1), (2024, 2, 29))),
        (window((2024, 1, 1), (2024, 12, 31)), window((2024, 6, 1), (2024, 6, 1))),
    ];
    for ((s1, e1), (s2, e2)) in cases {
        assert_eq!(
            windows_overlap(s1, e1, s2, e2),
            windows_overlap(s2, e2, s1, e1)
        );
    }
}

#[test]
fn test_disjoint_windows_never_overlap() {
    let (s1, e1) = window((2024, 1, 1), (2024, 1, 31));
    let (s2, e2) = window((2024, 2, 1), (2024, 2, 29));
    assert!(!windows_overlap(s1, e1, s2, e2));
}

#[test]
fn test_shared_boundary_day_overlaps() {
    let (s1, e1) = window((2024, 1, 1), (2024, 1, 31));
    let s2 = day(2024, 1, 31).and_hms_opt(23, 59, 59).unwrap();
    let e2 = end_of_day(day(2024, 2, 29));
    assert!(windows_overlap(s1, e1, s2, e2));

    let late_start = noon(2024, 1, 31);
    let early_end = day(2024, 1, 31).and_hms_opt(0, 0, 0).unwrap();
    assert!(windows_overlap(s1, early_end, late_start, e2));
}

#[test]
fn test_has_overlap_rules() {
    let f = Fixture::new();
    let food = f.category("Food");
    let fun = f.category("Fun");
    let existing = stored_budget(&f, Some(food), dec!(100));
    let (s, e) = window((2024, 1, 15), (2024, 2, 15));

    assert!(has_overlap(&f.db, f.user_id, Some(food), s, e, None).unwrap());
    assert!(!has_overlap(&f.db, f.user_id, Some(fun), s, e, None).unwrap());
    assert!(!has_overlap(&f.db, f.user_id, None, s, e, None).unwrap());
    assert!(!has_overlap(&f.db, f.user_id, Some(food), s, e, existing.id).unwrap());

    f.db.deactivate_budget(existing.id.unwrap()).unwrap();
    assert!(!has_overlap(&f.db, f.user_id, Some(food), s, e, None).unwrap());
}

// ── Service ───────────────────────────────────────────────────

#[test]
fn test_create_returns_evaluation() {
    let mut f = Fixture::new();
    let food = f.category("Food");
    f.expense(dec!(40), day(2024, 1, 10), Some(food));

    let svc = BudgetService::new(&f.db);
    let eval = svc
        .create(
            f.user_id,
            &january_draft(dec!(200)).with_category(food),
            noon(2024, 1, 15),
        )
        .unwrap();

    assert!(eval.budget.id.is_some());
    assert_eq!(eval.budget.alert_threshold, dec!(80));
    assert!(eval.budget.alert_enabled);
    assert_eq!(eval.spent, dec!(40));
    assert_eq!(eval.spent_percentage, dec!(20.00));
    assert_eq!(eval.scope.as_deref(), Some("Food"));
}

#[test]
fn test_overlapping_category_budget_rejected() {
    let f = Fixture::new();
    let food = f.category("Food");
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    svc.create(f.user_id, &january_draft(dec!(100)).with_category(food), now)
        .unwrap();

    let (start, end) = window((2024, 1, 15), (2024, 2, 15));
    let second = BudgetDraft::new("Overlap".into(), dec!(50), BudgetPeriod::Custom, start, end)
        .with_category(food);
    let err = svc.create(f.user_id, &second, now).unwrap_err();
    assert_eq!(
        err.to_string(),
        "A budget already exists for this category in the specified period"
    );
    assert_eq!(f.db.active_budgets_for_owner(f.user_id).unwrap().len(), 1);
}

#[test]
fn test_overall_budgets_may_overlap() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    svc.create(f.user_id, &january_draft(dec!(100)), now).unwrap();
    svc.create(f.user_id, &january_draft(dec!(300)), now).unwrap();
    assert_eq!(svc.list(f.user_id, now).unwrap().len(), 2);
}

#[test]
fn test_validation_order_and_messages() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    let reason = |draft: &BudgetDraft| svc.create(f.user_id, draft, now).unwrap_err().to_string();

    let mut draft = january_draft(dec!(100));
    draft.name = "   ".into();
    draft.amount = Decimal::ZERO;
    assert_eq!(reason(&draft), "Budget name is required");

    draft.name = "x".repeat(101);
    assert_eq!(reason(&draft), "Budget name must not exceed 100 characters");

    draft.name = "ok".into();
    assert_eq!(reason(&draft), "Amount must be greater than 0");

    draft.amount = dec!(10);
    std::mem::swap(&mut draft.start, &mut draft.end);
    assert_eq!(reason(&draft), "End date must be after start date");

    std::mem::swap(&mut draft.start, &mut draft.end);
    draft.alert_threshold = Some(dec!(100.01));
    assert_eq!(reason(&draft), "Alert threshold must be between 0 and 100");

    draft.alert_threshold = Some(dec!(-1));
    assert_eq!(reason(&draft), "Alert threshold must be between 0 and 100");

    draft.alert_threshold = Some(dec!(100));
    assert!(svc.create(f.user_id, &draft, now).is_ok());
}

#[test]
fn test_single_day_window_accepted() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let (start, end) = BudgetPeriod::Custom.window_from(day(2024, 1, 15));
    let draft = BudgetDraft::new("Day".into(), dec!(5), BudgetPeriod::Custom, start, end);
    assert!(svc.create(f.user_id, &draft, noon(2024, 1, 15)).is_ok());
}

#[test]
fn test_category_checks() {
    let f = Fixture::new();
    let bob = f.other_user("bob");
    let bobs = f
        .db
        .insert_category(&crate::models::Category::new(bob, "Bob".into()))
        .unwrap();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);

    let err = svc
        .create(f.user_id, &january_draft(dec!(10)).with_category(99999), now)
        .unwrap_err();
    assert!(err.is_not_found());

    let err = svc
        .create(f.user_id, &january_draft(dec!(10)).with_category(bobs), now)
        .unwrap_err();
    assert_eq!(err.to_string(), "Category does not belong to the current user");

    let groceries = f
        .db
        .get_categories(f.user_id)
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Groceries")
        .and_then(|c| c.id)
        .unwrap();
    assert!(svc
        .create(f.user_id, &january_draft(dec!(10)).with_category(groceries), now)
        .is_ok());
}

#[test]
fn test_unknown_owner_not_found() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    assert!(svc.list(424242, now).unwrap_err().is_not_found());
    assert!(svc.summary(424242, now).unwrap_err().is_not_found());
    assert!(svc
        .create(424242, &january_draft(dec!(1)), now)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_update_excludes_self_from_overlap() {
    let f = Fixture::new();
    let food = f.category("Food");
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    let created = svc
        .create(f.user_id, &january_draft(dec!(100)).with_category(food), now)
        .unwrap();
    let id = created.budget.id.unwrap();

    let mut draft = january_draft(dec!(250)).with_category(food);
    draft.alert_threshold = Some(dec!(90));
    draft.description = Some("raised".into());
    let updated = svc.update(f.user_id, id, &draft, now).unwrap();

    assert_eq!(updated.budget.amount, dec!(250));
    assert_eq!(updated.budget.alert_threshold, dec!(90));
    let stored = f.db.budget_by_id(id).unwrap().unwrap();
    assert_eq!(stored.description.as_deref(), Some("raised"));
    assert!(stored.is_active);
}

#[test]
fn test_timestamps_follow_clock() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let created_at = noon(2024, 1, 15);
    let id = svc
        .create(f.user_id, &january_draft(dec!(100)), created_at)
        .unwrap()
        .budget
        .id
        .unwrap();
    let stored = f.db.budget_by_id(id).unwrap().unwrap();
    assert_eq!(stored.created_at, created_at);
    assert_eq!(stored.updated_at, created_at);

    let later = noon(2024, 1, 18);
    let updated = svc.update(f.user_id, id, &january_draft(dec!(150)), later).unwrap();
    assert_eq!(updated.budget.updated_at, later);
    let stored = f.db.budget_by_id(id).unwrap().unwrap();
    assert_eq!(stored.created_at, created_at);
    assert_eq!(stored.updated_at, later);
}

#[test]
fn test_update_can_deactivate() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    let id = svc
        .create(f.user_id, &january_draft(dec!(100)), now)
        .unwrap()
        .budget
        .id
        .unwrap();

    let mut draft = january_draft(dec!(100));
    draft.is_active = Some(false);
    svc.update(f.user_id, id, &draft, now).unwrap();
    assert!(svc.list(f.user_id, now).unwrap().is_empty());
}

#[test]
fn test_ownership_enforced() {
    let f = Fixture::new();
    let bob = f.other_user("bob");
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    let id = svc
        .create(f.user_id, &january_draft(dec!(100)), now)
        .unwrap()
        .budget
        .id
        .unwrap();

    let msg = "Budget does not belong to the current user";
    assert_eq!(svc.get(bob, id, now).unwrap_err().to_string(), msg);
    assert_eq!(svc.delete(bob, id).unwrap_err().to_string(), msg);
    assert_eq!(
        svc.update(bob, id, &january_draft(dec!(1)), now)
            .unwrap_err()
            .to_string(),
        msg
    );
    assert!(svc.get(f.user_id, 99999, now).unwrap_err().is_not_found());
}

#[test]
fn test_delete_is_soft() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    let id = svc
        .create(f.user_id, &january_draft(dec!(100)), now)
        .unwrap()
        .budget
        .id
        .unwrap();

    svc.delete(f.user_id, id).unwrap();
    assert!(svc.list(f.user_id, now).unwrap().is_empty());
    let row = f.db.budget_by_id(id).unwrap().unwrap();
    assert!(!row.is_active);
    assert!(!svc.get(f.user_id, id, now).unwrap().budget.is_active);
}

#[test]
fn test_active_filters_by_window() {
    let f = Fixture::new();
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 15);
    svc.create(f.user_id, &january_draft(dec!(100)), now).unwrap();
    let (start, end) = window((2024, 3, 1), (2024, 3, 31));
    let march = BudgetDraft::new("March".into(), dec!(100), BudgetPeriod::Monthly, start, end);
    svc.create(f.user_id, &march, now).unwrap();

    assert_eq!(svc.list(f.user_id, now).unwrap().len(), 2);
    let active = svc.active(f.user_id, now).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].budget.name, "January");
    assert_eq!(active[0].scope.as_deref(), Some("Overall"));
}

#[test]
fn test_summary_totals() {
    let mut f = Fixture::new();
    let food = f.category("Food");
    let fun = f.category("Fun");
    f.expense(dec!(120), day(2024, 1, 2), Some(food));
    f.expense(dec!(85), day(2024, 1, 3), Some(fun));
    let svc = BudgetService::new(&f.db);
    let now = noon(2024, 1, 20);
    svc.create(f.user_id, &january_draft(dec!(100)).with_category(food), now)
        .unwrap();
    svc.create(f.user_id, &january_draft(dec!(100)).with_category(fun), now)
        .unwrap();

    let summary = svc.summary(f.user_id, now).unwrap();
    assert_eq!(summary.total_budgeted, dec!(200));
    assert_eq!(summary.total_spent, dec!(205));
    assert_eq!(summary.total_remaining, dec!(-5));
    assert_eq!(summary.overall_spent_percentage, dec!(102.50));
    assert_eq!(summary.active_budgets, 2);
    assert_eq!(summary.over_budget_count, 1);
    assert_eq!(summary.alerting_count, 2);
    assert_eq!(summary.over_budgets[0].scope.as_deref(), Some("Food"));
}

#[test]
fn test_summary_empty() {
    let f = Fixture::new();
    let summary = BudgetService::new(&f.db)
        .summary(f.user_id, noon(2024, 1, 20))
        .unwrap();
    assert_eq!(summary.total_budgeted, Decimal::ZERO);
    assert_eq!(summary.overall_spent_percentage, Decimal::ZERO);
    assert!(summary.budgets.is_empty());
}

#[test]
fn test_evaluation_serializes_camel_case() {
    let f = Fixture::new();
    let eval = BudgetService::new(&f.db)
        .create(f.user_id, &january_draft(dec!(100)), noon(2024, 1, 20))
        .unwrap();
    let json = serde_json::to_value(&eval).unwrap();
    assert_eq!(json["spentPercentage"], "0");
    assert_eq!(json["isOverBudget"], false);
    assert_eq!(json["alertThreshold"], "80");
    assert_eq!(json["period"], "MONTHLY");
    assert_eq!(json["scope"], "Overall");
}
