//! # Collaborator contracts
//!
//! The budget core owns no storage. Expenses, budgets, categories, the last
//! observed alert status and alert delivery all live behind these traits so
//! the aggregator, lifecycle manager and alert evaluator can run against any
//! backend (the sea-orm adapters in [`crate::db`], or test doubles).
//!
//! Implementations are responsible for their own concurrency control. In
//! particular [`BudgetStore::insert_budget`] must enforce uniqueness of
//! `(user, category, month)` atomically and report a violation as
//! [`EngineError::DuplicateBudget`](crate::EngineError::DuplicateBudget).

use async_trait::async_trait;

use crate::{
    AlertEvent, Budget, BudgetId, BudgetKey, BudgetStatus, Category, CategoryId, ExpenseAmount,
    Money, MonthPeriod, NewBudget, ResultEngine, UserId,
};

/// Read-only access to the user's expenses.
#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    /// Expenses of `user_id` in `category_id` dated inside `period`.
    async fn list_expenses(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<ExpenseAmount>>;
}

/// Persisted budgets.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// The budget for a `(user, category, month)` key, if any.
    async fn get_budget(&self, key: BudgetKey) -> ResultEngine<Option<Budget>>;

    async fn find_budget(&self, budget_id: BudgetId) -> ResultEngine<Option<Budget>>;

    /// Budgets of a user for one month, in insertion order.
    async fn list_budgets(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<Vec<Budget>>;

    /// Every budget of a user, in insertion order.
    async fn list_all_budgets(&self, user_id: UserId) -> ResultEngine<Vec<Budget>>;

    /// Inserts a budget; fails with `DuplicateBudget` if the key is taken.
    async fn insert_budget(&self, budget: NewBudget) -> ResultEngine<Budget>;

    /// Replaces the limit and the cached spent amount.
    async fn update_budget(
        &self,
        budget_id: BudgetId,
        limit: Money,
        spent: Money,
    ) -> ResultEngine<Budget>;

    /// Writes back a recomputed spent amount.
    async fn refresh_spent(&self, budget_id: BudgetId, spent: Money) -> ResultEngine<()>;

    /// Fails with `NotFound` if the budget does not exist.
    async fn delete_budget(&self, budget_id: BudgetId) -> ResultEngine<()>;
}

/// Category display metadata.
#[async_trait]
pub trait CategoryRegistry: Send + Sync {
    async fn category(&self, category_id: CategoryId) -> ResultEngine<Option<Category>>;
}

/// Last status observed per budget key, used to fire alerts on transitions
/// only.
#[async_trait]
pub trait AlertStateStore: Send + Sync {
    /// Records `status` for `key` and returns the status it replaced.
    ///
    /// Must be atomic: of two concurrent swaps to the same status, only one
    /// may see the older value, otherwise both callers alert.
    async fn swap(&self, key: BudgetKey, status: BudgetStatus) -> Option<BudgetStatus>;

    async fn forget(&self, key: BudgetKey);
}

/// Receives alert events. Delivery is fire-and-forget: the core never waits
/// for acknowledgement and never retries.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: AlertEvent);
}
