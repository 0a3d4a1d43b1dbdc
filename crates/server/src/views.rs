//! Conversions from engine values to API views.

use std::collections::HashMap;

use api_types::{
    BudgetStatus, Currency,
    alert::{AlertEventView, AlertKind, Severity},
    budget::{BudgetSnapshotView, BudgetView, CategoryView, MonthSummaryView},
};
use engine::{Budget, BudgetSnapshot, Category, CategoryId, MonthSummary};

fn currency(value: engine::Currency) -> Currency {
    match value {
        engine::Currency::Vnd => Currency::Vnd,
    }
}

pub fn status(value: engine::BudgetStatus) -> BudgetStatus {
    match value {
        engine::BudgetStatus::Ok => BudgetStatus::Ok,
        engine::BudgetStatus::Warning => BudgetStatus::Warning,
        engine::BudgetStatus::Exceeded => BudgetStatus::Exceeded,
    }
}

pub fn engine_status(value: BudgetStatus) -> engine::BudgetStatus {
    match value {
        BudgetStatus::Ok => engine::BudgetStatus::Ok,
        BudgetStatus::Warning => engine::BudgetStatus::Warning,
        BudgetStatus::Exceeded => engine::BudgetStatus::Exceeded,
    }
}

pub fn budget(budget: &Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        month: budget.period.to_string(),
        currency: currency(budget.limit.currency()),
        limit_minor: budget.limit.minor(),
        spent_minor: budget.spent.minor(),
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

fn category(category: &Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name.clone(),
        icon: category.icon.clone(),
        color_tag: category.color_tag.clone(),
    }
}

pub fn snapshot(
    snapshot: &BudgetSnapshot,
    categories: &HashMap<CategoryId, Category>,
) -> BudgetSnapshotView {
    let budget = &snapshot.budget;
    BudgetSnapshotView {
        id: budget.id,
        category_id: budget.category_id,
        category: categories.get(&budget.category_id).map(category),
        month: budget.period.to_string(),
        currency: currency(budget.limit.currency()),
        limit_minor: budget.limit.minor(),
        spent_minor: budget.spent.minor(),
        remaining_minor: snapshot.remaining.minor(),
        percentage_used: snapshot.percentage_used,
        display_percentage: snapshot.display_percentage(),
        status: status(snapshot.status),
        limit_display: budget.limit.to_string(),
        spent_display: budget.spent.to_string(),
        remaining_display: snapshot.remaining.to_string(),
    }
}

pub fn summary(summary: &MonthSummary) -> MonthSummaryView {
    MonthSummaryView {
        month: summary.period.to_string(),
        currency: currency(summary.total_limit.currency()),
        budget_count: summary.budget_count,
        total_limit_minor: summary.total_limit.minor(),
        total_spent_minor: summary.total_spent.minor(),
        total_remaining_minor: summary.total_remaining.minor(),
        percentage_used: summary.percentage_used,
        ok: summary.ok,
        warning: summary.warning,
        exceeded: summary.exceeded,
    }
}

pub fn alert(event: &engine::AlertEvent) -> AlertEventView {
    AlertEventView {
        id: event.id,
        budget_id: event.budget_id,
        category_id: event.category_id,
        month: event.period.to_string(),
        from_status: status(event.from_status),
        to_status: status(event.to_status),
        kind: match event.kind {
            engine::AlertKind::Warning => AlertKind::Warning,
            engine::AlertKind::Exceeded => AlertKind::Exceeded,
            engine::AlertKind::Recovered => AlertKind::Recovered,
        },
        severity: match event.severity {
            engine::Severity::Low => Severity::Low,
            engine::Severity::Medium => Severity::Medium,
            engine::Severity::High => Severity::High,
        },
        percentage_used: event.percentage_used,
        title: event.title.clone(),
        message: event.message.clone(),
        timestamp: event.timestamp,
    }
}
