use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
}

/// Budget status as shown to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Exceeded,
}

/// `?month=yyyy-MM` query string.
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthQuery {
    pub month: String,
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub category_id: i64,
        /// `yyyy-MM`
        pub month: String,
        /// Limit in minor units (VND has none, so this is whole dong).
        pub limit_minor: i64,
    }

    /// Budget edit form. Only `limit_minor` may change; `category_id` and
    /// `month` are optional and must match the stored budget when present.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub limit_minor: i64,
        pub category_id: Option<i64>,
        pub month: Option<String>,
    }

    /// A stored budget, without derived fields.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: i64,
        pub category_id: i64,
        pub month: String,
        pub currency: Currency,
        pub limit_minor: i64,
        /// Last recomputed total. Informational only.
        pub spent_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i64,
        pub name: String,
        pub icon: Option<String>,
        pub color_tag: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BudgetSnapshotView {
        pub id: i64,
        pub category_id: i64,
        /// Missing when the category no longer exists.
        pub category: Option<CategoryView>,
        pub month: String,
        pub currency: Currency,
        pub limit_minor: i64,
        pub spent_minor: i64,
        /// Negative when over budget.
        pub remaining_minor: i64,
        /// Unclamped; 150.0 means 50% over.
        pub percentage_used: f64,
        /// Clamped to `0..=100` for progress bars.
        pub display_percentage: f64,
        pub status: BudgetStatus,
        /// Preformatted amounts, e.g. `1.250.000₫`.
        pub limit_display: String,
        pub spent_display: String,
        pub remaining_display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SnapshotResponse {
        pub budgets: Vec<BudgetSnapshotView>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MonthSummaryView {
        pub month: String,
        pub currency: Currency,
        pub budget_count: usize,
        pub total_limit_minor: i64,
        pub total_spent_minor: i64,
        pub total_remaining_minor: i64,
        pub percentage_used: f64,
        pub ok: usize,
        pub warning: usize,
        pub exceeded: usize,
    }
}

pub mod alert {
    use std::collections::HashMap;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AlertKind {
        Warning,
        Exceeded,
        Recovered,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Severity {
        Low,
        Medium,
        High,
    }

    /// Statuses the client saw last time, keyed by category id.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlertEvaluate {
        pub month: String,
        #[serde(default)]
        pub previous: HashMap<i64, BudgetStatus>,
    }

    /// Compare the month against the server's own record of last statuses.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlertRefresh {
        pub month: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct AlertEventView {
        pub id: Uuid,
        pub budget_id: i64,
        pub category_id: i64,
        pub month: String,
        pub from_status: BudgetStatus,
        pub to_status: BudgetStatus,
        pub kind: AlertKind,
        pub severity: Severity,
        pub percentage_used: f64,
        pub title: String,
        pub message: String,
        pub timestamp: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlertListResponse {
        pub alerts: Vec<AlertEventView>,
    }
}
