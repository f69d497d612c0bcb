use anyhow::{bail, Result};

use super::{
    find_category, flag, has_switch, parse_amount, parse_date, parse_id, positional, print_json,
    Session,
};
use crate::analytics::{AnalyticsService, DashboardSnapshot, ExpenseAnalytics, SpendingTrends};
use crate::budget::{BudgetDraft, BudgetEvaluation, BudgetService, BudgetSummary};
use crate::dates::{end_of_day, first_of_month, start_of_day};
use crate::db::Database;
use crate::format::{format_amount, progress_bar, truncate};
use crate::models::BudgetPeriod;

const DEFAULT_TREND_MONTHS: u32 = 6;

// ── Budgets ───────────────────────────────────────────────────

pub(crate) fn cli_budget_list(session: &Session, db: &Database) -> Result<()> {
    let budgets = BudgetService::new(db).list(session.user_id, session.now)?;
    print_budgets(session, &budgets)
}

pub(crate) fn cli_budget(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let parts = positional(args);
    let service = BudgetService::new(db);
    match parts.as_slice() {
        ["add", name, amount] => {
            let draft = new_draft(args, name, amount, session, db)?;
            let created = service.create(session.user_id, &draft, session.now)?;
            print_budget(session, &created)
        }
        ["update", id] => {
            let id = parse_id(id, "budget")?;
            let current = service.get(session.user_id, id, session.now)?.budget;
            let mut draft = BudgetDraft::new(
                flag(args, "--name").unwrap_or(current.name.as_str()).to_string(),
                current.amount,
                current.period,
                current.start,
                current.end,
            );
            draft.category_id = current.category_id;
            draft.alert_threshold = Some(current.alert_threshold);
            draft.alert_enabled = Some(current.alert_enabled);
            draft.description = current.description.clone();
            if let Some(raw) = flag(args, "--amount") {
                draft.amount = parse_amount(raw)?;
            }
            apply_budget_flags(args, &mut draft, session, db)?;
            if has_switch(args, "--inactive") {
                draft.is_active = Some(false);
            }
            let updated = service.update(session.user_id, id, &draft, session.now)?;
            print_budget(session, &updated)
        }
        ["delete", id] => {
            let id = parse_id(id, "budget")?;
            service.delete(session.user_id, id)?;
            println!("Deactivated budget {id}");
            Ok(())
        }
        ["show", id] => {
            let id = parse_id(id, "budget")?;
            print_budget(session, &service.get(session.user_id, id, session.now)?)
        }
        ["summary"] => {
            let summary = service.summary(session.user_id, session.now)?;
            print_summary(session, &summary)
        }
        ["active"] => {
            let budgets = service.active(session.user_id, session.now)?;
            print_budgets(session, &budgets)
        }
        _ => bail!(
            "Usage: spendsmart budget <add <name> <amount>|update <id>|delete <id>|show <id>|summary|active>"
        ),
    }
}

fn parse_period(raw: &str) -> Result<BudgetPeriod> {
    BudgetPeriod::parse(raw).ok_or_else(|| {
        let valid: Vec<String> = BudgetPeriod::all()
            .iter()
            .map(|p| p.as_str().to_lowercase())
            .collect();
        anyhow::anyhow!("Unknown period '{raw}' (expected {})", valid.join(", "))
    })
}

/// A new budget from `budget add` arguments. Without `--end` the window is
/// one period long, starting on `--start` (default today).
fn new_draft(
    args: &[String],
    name: &str,
    amount: &str,
    session: &Session,
    db: &Database,
) -> Result<BudgetDraft> {
    let period = match flag(args, "--period") {
        Some(raw) => parse_period(raw)?,
        None => BudgetPeriod::default(),
    };
    let start = match flag(args, "--start") {
        Some(raw) => parse_date(raw)?,
        None => session.today(),
    };
    let (start, end) = period.window_from(start);
    let mut draft = BudgetDraft::new(name.to_string(), parse_amount(amount)?, period, start, end);
    apply_budget_flags(args, &mut draft, session, db)?;
    Ok(draft)
}

fn apply_budget_flags(
    args: &[String],
    draft: &mut BudgetDraft,
    session: &Session,
    db: &Database,
) -> Result<()> {
    if let Some(raw) = flag(args, "--period") {
        draft.period = parse_period(raw)?;
    }
    if let Some(raw) = flag(args, "--start") {
        draft.start = start_of_day(parse_date(raw)?);
    }
    if let Some(raw) = flag(args, "--end") {
        draft.end = end_of_day(parse_date(raw)?);
    }
    match flag(args, "--category") {
        Some(name) if name.eq_ignore_ascii_case("none") => draft.category_id = None,
        Some(name) => draft.category_id = find_category(db, session.user_id, name)?.id,
        None => {}
    }
    if let Some(raw) = flag(args, "--threshold") {
        draft.alert_threshold = Some(parse_amount(raw)?);
    }
    if has_switch(args, "--no-alerts") {
        draft.alert_enabled = Some(false);
    }
    if let Some(note) = flag(args, "--note") {
        draft.description = Some(note.to_string());
    }
    Ok(())
}

fn print_budgets(session: &Session, budgets: &[BudgetEvaluation]) -> Result<()> {
    if session.json {
        return print_json(&budgets);
    }
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }

    println!(
        "{:<4} {:<20} {:<16} {:>12} {:>12} {:<14} {:>8}",
        "ID", "Name", "Scope", "Amount", "Spent", "", "Left"
    );
    println!("{}", "─".repeat(95));
    for eval in budgets {
        let marker = if eval.is_over_budget {
            " OVER"
        } else if eval.should_alert {
            " !"
        } else {
            ""
        };
        println!(
            "{:<4} {:<20} {:<16} {:>12} {:>12} {:<14} {:>5}d{marker}",
            eval.budget.id.unwrap_or(0),
            truncate(&eval.budget.name, 20),
            truncate(eval.scope.as_deref().unwrap_or_default(), 16),
            format_amount(eval.budget.amount),
            format_amount(eval.spent),
            progress_bar(eval.spent_percentage, 12),
            eval.days_remaining,
        );
    }
    Ok(())
}

fn print_budget(session: &Session, eval: &BudgetEvaluation) -> Result<()> {
    if session.json {
        return print_json(eval);
    }
    let budget = &eval.budget;
    println!("{} (id {})", budget.name, budget.id.unwrap_or(0));
    println!("{}", "─".repeat(40));
    println!("  Scope:      {}", eval.scope.as_deref().unwrap_or_default());
    println!("  Period:     {}", budget.period);
    println!("  Window:     {} .. {}", budget.start_date(), budget.end_date());
    println!("  Amount:     {}", format_amount(budget.amount));
    println!("  Spent:      {}", format_amount(eval.spent));
    println!("  Remaining:  {}", format_amount(eval.remaining));
    println!(
        "  Used:       {} {:.2}%",
        progress_bar(eval.spent_percentage, 20),
        eval.spent_percentage
    );
    if eval.is_expired {
        println!("  Expired");
    } else {
        println!("  Days left:  {}", eval.days_remaining);
    }
    if eval.needs_alert() {
        println!("  Alert:      {}", eval.alert_message());
    }
    Ok(())
}

fn print_summary(session: &Session, summary: &BudgetSummary) -> Result<()> {
    if session.json {
        return print_json(summary);
    }
    println!("Budgets running today ({})", session.today());
    println!("{}", "─".repeat(40));
    println!("  Budgets:    {}", summary.active_budgets);
    println!("  Budgeted:   {}", format_amount(summary.total_budgeted));
    println!("  Spent:      {}", format_amount(summary.total_spent));
    println!("  Remaining:  {}", format_amount(summary.total_remaining));
    println!("  Used:       {:.2}%", summary.overall_spent_percentage);
    println!("  Over:       {}", summary.over_budget_count);
    println!("  Alerting:   {}", summary.alerting_count);
    for eval in summary.over_budgets.iter().chain(&summary.alerting_budgets) {
        println!("  - {}: {}", eval.budget.name, eval.alert_message());
    }
    Ok(())
}

// ── Analytics ─────────────────────────────────────────────────

pub(crate) fn cli_analytics(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let from = match flag(args, "--from") {
        Some(raw) => parse_date(raw)?,
        None => first_of_month(session.today()),
    };
    let to = match flag(args, "--to") {
        Some(raw) => parse_date(raw)?,
        None => session.today(),
    };
    let report = AnalyticsService::new(db).expense_analytics(
        session.user_id,
        start_of_day(from),
        end_of_day(to),
        session.now,
    )?;
    if session.json {
        return print_json(&report);
    }
    print_analytics(&report);
    Ok(())
}

fn print_analytics(report: &ExpenseAnalytics) {
    println!(
        "Analytics {} .. {}",
        report.period_start.date(),
        report.period_end.date()
    );
    println!("{}", "─".repeat(40));
    println!("  Expenses:   {}", format_amount(report.total_expenses));
    println!("  Income:     {}", format_amount(report.total_income));
    println!("  Net:        {}", format_amount(report.net_amount));
    println!("  Entries:    {}", report.transaction_count);
    println!(
        "  vs prior:   {} ({:.2}%)",
        format_amount(report.comparison.expense_change),
        report.comparison.expense_change_percentage
    );

    if !report.category_breakdown.is_empty() {
        println!();
        println!("Spending by Category:");
        for cat in &report.category_breakdown {
            println!(
                "  {:<24} {:>12} {:>7.2}%  ({} entries)",
                truncate(&cat.category_name, 24),
                format_amount(cat.total_amount),
                cat.percentage,
                cat.transaction_count,
            );
        }
    }
    if !report.budget_performance.is_empty() {
        println!();
        println!("Budgets:");
        for eval in &report.budget_performance {
            println!(
                "  {:<24} {} {:.2}%",
                truncate(&eval.budget.name, 24),
                progress_bar(eval.spent_percentage, 12),
                eval.spent_percentage,
            );
        }
    }
}

pub(crate) fn cli_trends(args: &[String], session: &Session, db: &Database) -> Result<()> {
    let months = match flag(args, "--months") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid months: {raw}"))?,
        None => DEFAULT_TREND_MONTHS,
    };
    let trends = AnalyticsService::new(db).spending_trends(session.user_id, months, session.now)?;
    if session.json {
        return print_json(&trends);
    }
    print_trends(&trends);
    Ok(())
}

fn print_trends(trends: &SpendingTrends) {
    println!("Trends {} .. {}", trends.window_start, trends.window_end);
    println!("{}", "─".repeat(40));
    println!("Monthly:");
    for point in &trends.monthly_trends {
        println!(
            "  {:<9} {} {:>12} spent {:>12} earned",
            point.month_name,
            point.year,
            format_amount(point.totals.expenses),
            format_amount(point.totals.income),
        );
    }
    println!();
    println!("Weekly:");
    for point in &trends.weekly_trends {
        println!(
            "  {}-W{:02} {:>12}",
            point.year,
            point.week,
            format_amount(point.totals.expenses)
        );
    }
    if !trends.category_trends.is_empty() {
        println!();
        println!("Categories:");
        for trend in &trends.category_trends {
            println!(
                "  {:<24} {:>12}",
                truncate(&trend.category.name, 24),
                format_amount(trend.total)
            );
        }
    }

    let patterns = &trends.spending_patterns;
    println!();
    println!("Patterns:");
    println!("  Avg daily:   {}", format_amount(patterns.average_daily));
    println!("  Avg weekly:  {}", format_amount(patterns.average_weekly));
    println!("  Avg monthly: {}", format_amount(patterns.average_monthly));
    if let Some(high) = &patterns.highest_spending_day {
        println!("  Highest day: {} ({})", high.date, format_amount(high.amount));
    }
    if let Some(low) = &patterns.lowest_spending_day {
        println!("  Lowest day:  {} ({})", low.date, format_amount(low.amount));
    }
    for day in &patterns.day_of_week {
        println!("  {:<10} {:>12} avg", day.day, format_amount(day.average));
    }
}

// ── Dashboard ─────────────────────────────────────────────────

pub(crate) fn cli_dashboard(session: &Session, db: &Database) -> Result<()> {
    let snapshot = AnalyticsService::new(db)
        .with_recent_limit(session.recent_limit)
        .dashboard(session.user_id, session.now)?;
    if session.json {
        return print_json(&snapshot);
    }
    print_dashboard(session, &snapshot);
    Ok(())
}

fn print_dashboard(session: &Session, snap: &DashboardSnapshot) {
    println!("SpendSmart: {} ({})", session.username, snap.month_start.format("%Y-%m"));
    println!("{}", "─".repeat(40));
    println!("  Expenses:   {}", format_amount(snap.current_month_expenses));
    println!("  Income:     {}", format_amount(snap.current_month_income));
    println!("  Net:        {}", format_amount(snap.current_month_net));
    println!("  Entries:    {}", snap.current_month_transactions);
    println!(
        "  vs last:    {} ({:.2}%)",
        format_amount(snap.comparison.expense_change),
        snap.comparison.expense_change_percentage
    );

    let stats = &snap.quick_stats;
    println!();
    println!("Quick stats:");
    println!("  Avg daily:     {}", format_amount(stats.average_daily_spending));
    println!("  Largest:       {}", format_amount(stats.largest_expense));
    println!(
        "  Top category:  {} ({})",
        stats.top_category,
        format_amount(stats.top_category_amount)
    );
    println!("  Next reset in: {} days", stats.days_until_next_budget_reset);
    println!("  Top wallet:    {}", stats.most_used_wallet);

    let overview = &snap.budget_summary;
    println!();
    println!(
        "Budgets: {} running, {} of {} used {}",
        overview.active_budgets,
        format_amount(overview.total_spent),
        format_amount(overview.total_budgeted),
        progress_bar(overview.budget_utilization, 12),
    );
    for alert in &snap.budget_alerts {
        println!("  ! {}: {}", alert.budget_name, alert.message);
    }

    if !snap.recent_transactions.is_empty() {
        println!();
        println!("Recent:");
        for txn in &snap.recent_transactions {
            let text = if txn.merchant.is_empty() {
                &txn.description
            } else {
                &txn.merchant
            };
            println!(
                "  {} {:<8} {:>12} {:<16} {:<12} {}",
                txn.date,
                txn.kind.as_str().to_lowercase(),
                format_amount(txn.amount),
                truncate(&txn.category_name, 16),
                truncate(&txn.wallet_name, 12),
                truncate(text, 24),
            );
        }
    }
}
