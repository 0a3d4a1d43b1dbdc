//! Threshold alerts.
//!
//! Alerts fire on status **transitions** only. Evaluating the same status
//! twice yields nothing, which keeps repeated page loads and polls from
//! spamming notifications. The evaluator is stateless: the previously observed
//! status is passed in by the caller (see
//! [`AlertStateStore`](crate::stores::AlertStateStore)).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BudgetId, BudgetSnapshot, BudgetStatus, CategoryId, MonthPeriod, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Usage crossed the warning threshold.
    Warning,
    /// Usage reached or passed the limit.
    Exceeded,
    /// Usage dropped back below a previously crossed threshold.
    Recovered,
}

impl AlertKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::Warning => Severity::Medium,
            Self::Exceeded => Severity::High,
            Self::Recovered => Severity::Low,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub budget_id: BudgetId,
    pub category_id: CategoryId,
    pub period: MonthPeriod,
    pub from_status: BudgetStatus,
    pub to_status: BudgetStatus,
    pub kind: AlertKind,
    pub severity: Severity,
    pub percentage_used: f64,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Classifies a status change. `None` means "no alert".
pub fn transition_kind(from: BudgetStatus, to: BudgetStatus) -> Option<AlertKind> {
    use BudgetStatus::{Exceeded, Ok, Warning};

    match (from, to) {
        (a, b) if a == b => None,
        (Ok, Warning) => Some(AlertKind::Warning),
        (Ok | Warning, Exceeded) => Some(AlertKind::Exceeded),
        (Exceeded, Warning) | (_, Ok) => Some(AlertKind::Recovered),
        _ => None,
    }
}

/// Compares a fresh snapshot with the previously observed status.
///
/// `previous = None` is a first observation and never alerts.
pub fn evaluate(
    previous: Option<BudgetStatus>,
    snapshot: &BudgetSnapshot,
    at: DateTime<Utc>,
) -> Option<AlertEvent> {
    let from = previous?;
    let to = snapshot.status;
    let kind = transition_kind(from, to)?;
    let budget = &snapshot.budget;
    let pct = snapshot.percentage_used;

    let (title, message) = match kind {
        AlertKind::Exceeded => (
            "Budget exceeded".to_string(),
            format!(
                "Budget for {} has reached {pct:.0}% of its limit ({} of {}).",
                budget.period, budget.spent, budget.limit
            ),
        ),
        AlertKind::Warning => (
            "Budget warning".to_string(),
            format!(
                "You have used {pct:.0}% of your budget for {} ({} of {}).",
                budget.period, budget.spent, budget.limit
            ),
        ),
        AlertKind::Recovered => (
            "Budget back on track".to_string(),
            format!(
                "Spending for {} is back to {pct:.0}% of the limit.",
                budget.period
            ),
        ),
    };

    Some(AlertEvent {
        id: Uuid::new_v4(),
        user_id: budget.user_id,
        budget_id: budget.id,
        category_id: budget.category_id,
        period: budget.period,
        from_status: from,
        to_status: to,
        kind,
        severity: kind.severity(),
        percentage_used: pct,
        title,
        message,
        timestamp: at,
    })
}

/// Evaluates a month of snapshots against caller-supplied previous statuses,
/// keyed by category. Categories missing from `previous` are first
/// observations. Output follows snapshot order.
pub fn evaluate_batch(
    previous: &HashMap<CategoryId, BudgetStatus>,
    snapshots: &[BudgetSnapshot],
    at: DateTime<Utc>,
) -> Vec<AlertEvent> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            let prev = previous.get(&snapshot.budget.category_id).copied();
            evaluate(prev, snapshot, at)
        })
        .collect()
}
