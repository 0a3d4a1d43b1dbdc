//! Budget records.
//!
//! A `Budget` caps spending for one `(user, category, month)`. Only the limit
//! is user-owned; `spent` is a cache of the ledger total at the last
//! recomputation and is never trusted for status decisions.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{BudgetId, CategoryId, EngineError, Money, MonthPeriod, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub period: MonthPeriod,
    pub limit: Money,
    /// Cached ledger total; see [`BudgetAggregator`](crate::BudgetAggregator).
    pub spent: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// The uniqueness key of the budget.
    #[must_use]
    pub fn key(&self) -> BudgetKey {
        BudgetKey {
            user_id: self.user_id,
            category_id: self.category_id,
            period: self.period,
        }
    }
}

/// `(user, category, month)`: at most one budget exists per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetKey {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub period: MonthPeriod,
}

/// A budget about to be inserted (no id or timestamps yet).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBudget {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub period: MonthPeriod,
    pub limit: Money,
    pub spent: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub month: String,
    pub limit_minor: i64,
    pub spent_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewBudget> for ActiveModel {
    fn from(budget: &NewBudget) -> Self {
        let now = Utc::now();
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(budget.user_id),
            category_id: ActiveValue::Set(budget.category_id),
            month: ActiveValue::Set(budget.period.to_string()),
            limit_minor: ActiveValue::Set(budget.limit.minor()),
            spent_minor: ActiveValue::Set(budget.spent.minor()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            period: model.month.parse()?,
            limit: Money::new(model.limit_minor),
            spent: Money::new(model.spent_minor),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
