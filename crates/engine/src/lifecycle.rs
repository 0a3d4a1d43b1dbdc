//! Budget Lifecycle Manager: the only write path for budgets.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    Budget, BudgetAggregator, BudgetId, BudgetKey, CategoryId, EngineError, Money, MonthPeriod,
    NewBudget, ResultEngine, UserId, stores::BudgetStore, util::bounded,
};

/// Requested change to an existing budget.
///
/// Only the limit may change. `category_id` and `period` are accepted so a
/// client echoing the whole record back is not rejected, but they must match
/// the stored values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub limit: Money,
    pub category_id: Option<CategoryId>,
    pub period: Option<MonthPeriod>,
}

impl BudgetUpdate {
    pub fn limit(limit: Money) -> Self {
        Self {
            limit,
            category_id: None,
            period: None,
        }
    }
}

pub struct BudgetManager {
    store: Arc<dyn BudgetStore>,
    aggregator: Arc<BudgetAggregator>,
    timeout: Duration,
}

fn validate_limit(limit: Money) -> ResultEngine<()> {
    if !limit.is_positive() {
        return Err(EngineError::InvalidLimit(format!(
            "limit must be > 0, got {limit}"
        )));
    }
    Ok(())
}

impl BudgetManager {
    pub fn new(
        store: Arc<dyn BudgetStore>,
        aggregator: Arc<BudgetAggregator>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            aggregator,
            timeout,
        }
    }

    /// Creates a budget with `spent` already reflecting existing expenses.
    ///
    /// The duplicate pre-check only gives a clean error in the common case;
    /// racing creates are settled by the store's uniqueness guarantee, which
    /// also surfaces as `DuplicateBudget`.
    pub async fn create(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
        limit: Money,
    ) -> ResultEngine<Budget> {
        validate_limit(limit)?;

        let key = BudgetKey {
            user_id,
            category_id,
            period,
        };
        let existing = bounded(self.timeout, "budget store", self.store.get_budget(key)).await?;
        if existing.is_some() {
            return Err(EngineError::DuplicateBudget(format!(
                "category {category_id} already has a budget for {period}"
            )));
        }

        let spent = self
            .aggregator
            .compute_spent(user_id, category_id, period)
            .await?;
        let budget = bounded(
            self.timeout,
            "budget store",
            self.store.insert_budget(NewBudget {
                user_id,
                category_id,
                period,
                limit,
                spent,
            }),
        )
        .await?;

        tracing::info!(
            "created budget {} for user {user_id}, category {category_id}, {period}: limit {limit}, spent {spent}",
            budget.id
        );
        Ok(budget)
    }

    /// Changes the limit and recomputes `spent`.
    pub async fn update(
        &self,
        user_id: UserId,
        budget_id: BudgetId,
        update: BudgetUpdate,
    ) -> ResultEngine<Budget> {
        validate_limit(update.limit)?;

        let existing = self.get(user_id, budget_id).await?;
        if let Some(category_id) = update.category_id
            && category_id != existing.category_id
        {
            return Err(EngineError::ImmutableField("category_id".to_string()));
        }
        if let Some(period) = update.period
            && period != existing.period
        {
            return Err(EngineError::ImmutableField("month".to_string()));
        }

        let spent = self
            .aggregator
            .compute_spent(existing.user_id, existing.category_id, existing.period)
            .await?;
        let budget = bounded(
            self.timeout,
            "budget store",
            self.store.update_budget(budget_id, update.limit, spent),
        )
        .await?;

        tracing::info!(
            "updated budget {budget_id}: limit {} -> {}, spent {spent}",
            existing.limit,
            budget.limit
        );
        Ok(budget)
    }

    /// Deletes a budget and returns what was removed. Expenses are untouched.
    pub async fn delete(&self, user_id: UserId, budget_id: BudgetId) -> ResultEngine<Budget> {
        let existing = self.get(user_id, budget_id).await?;
        bounded(
            self.timeout,
            "budget store",
            self.store.delete_budget(budget_id),
        )
        .await?;
        tracing::info!("deleted budget {budget_id} of user {user_id}");
        Ok(existing)
    }

    /// Stored budgets for the month, without derived fields.
    pub async fn list_for_month(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<Budget>> {
        bounded(
            self.timeout,
            "budget store",
            self.store.list_budgets(user_id, period),
        )
        .await
    }

    /// A stored budget owned by `user_id`. Budgets of other users are
    /// reported as missing.
    pub async fn get(&self, user_id: UserId, budget_id: BudgetId) -> ResultEngine<Budget> {
        bounded(
            self.timeout,
            "budget store",
            self.store.find_budget(budget_id),
        )
        .await?
        .filter(|budget| budget.user_id == user_id)
        .ok_or_else(|| EngineError::NotFound(format!("budget {budget_id}")))
    }
}
