//! Budget Aggregator: the single authority on how much of a budget is spent.

use std::{sync::Arc, time::Duration};

use crate::{
    Budget, BudgetSnapshot, CategoryId, Money, MonthPeriod, MonthSummary, ResultEngine, Thresholds,
    UserId,
    stores::{BudgetStore, ExpenseLedger},
    util::bounded,
};

/// Recomputes spent totals from the expense ledger and derives snapshots.
///
/// Every read goes back to the ledger; the `spent` stored on a budget is
/// never used for status decisions. If a collaborator fails the whole call
/// fails, so a zero-spent snapshot never masquerades as valid data.
pub struct BudgetAggregator {
    ledger: Arc<dyn ExpenseLedger>,
    store: Arc<dyn BudgetStore>,
    thresholds: Thresholds,
    timeout: Duration,
}

impl BudgetAggregator {
    pub fn new(
        ledger: Arc<dyn ExpenseLedger>,
        store: Arc<dyn BudgetStore>,
        thresholds: Thresholds,
        timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            store,
            thresholds,
            timeout,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Sum of the user's expenses in `category_id` dated inside `period`.
    /// Zero when nothing matches. Pure read.
    pub async fn compute_spent(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> ResultEngine<Money> {
        let expenses = bounded(
            self.timeout,
            "expense ledger",
            self.ledger.list_expenses(user_id, category_id, period),
        )
        .await?;

        // The ledger contract already filters by month; re-check so a sloppy
        // backend cannot leak neighbouring months into the total.
        let total = Money::checked_sum(
            expenses
                .into_iter()
                .filter(|expense| period.contains(expense.date))
                .map(|expense| expense.amount),
        )?;

        // Spent is never negative, whatever corrections the ledger holds.
        if total < Money::ZERO {
            tracing::warn!(
                "negative spent {total} for user {user_id}, category {category_id} in {period}; using 0"
            );
            return Ok(Money::ZERO);
        }
        Ok(total)
    }

    /// Snapshot of one budget with a freshly computed spent amount.
    pub async fn snapshot(&self, budget: Budget) -> ResultEngine<BudgetSnapshot> {
        let spent = self
            .compute_spent(budget.user_id, budget.category_id, budget.period)
            .await?;
        tracing::debug!(
            "budget {} recomputed: spent {} of {}",
            budget.id,
            spent,
            budget.limit
        );
        BudgetSnapshot::compute(budget, spent, self.thresholds)
    }

    /// Snapshots of every budget the user has for `period`, in insertion order.
    pub async fn snapshot_all(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<BudgetSnapshot>> {
        let budgets = bounded(
            self.timeout,
            "budget store",
            self.store.list_budgets(user_id, period),
        )
        .await?;
        self.snapshot_many(budgets).await
    }

    /// Snapshots of every budget the user has, across all months.
    pub async fn snapshot_every_month(&self, user_id: UserId) -> ResultEngine<Vec<BudgetSnapshot>> {
        let budgets = bounded(
            self.timeout,
            "budget store",
            self.store.list_all_budgets(user_id),
        )
        .await?;
        self.snapshot_many(budgets).await
    }

    pub async fn summary(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<MonthSummary> {
        let snapshots = self.snapshot_all(user_id, period).await?;
        MonthSummary::from_snapshots(period, &snapshots)
    }

    /// Writes a fresh spent total back to the store when the cached value
    /// drifted. Failures are logged and swallowed: the snapshot the caller
    /// holds is already correct.
    pub async fn sync_cache(&self, cached: Money, snapshot: &BudgetSnapshot) {
        let budget = &snapshot.budget;
        if cached == budget.spent {
            return;
        }
        let result = bounded(
            self.timeout,
            "budget store",
            self.store.refresh_spent(budget.id, budget.spent),
        )
        .await;
        if let Err(err) = result {
            tracing::warn!("failed to refresh cached spent of budget {}: {err}", budget.id);
        }
    }

    async fn snapshot_many(&self, budgets: Vec<Budget>) -> ResultEngine<Vec<BudgetSnapshot>> {
        // Compute everything before touching the cache so a failure halfway
        // through leaves no partial write-back.
        let mut snapshots = Vec::with_capacity(budgets.len());
        let mut cached = Vec::with_capacity(budgets.len());
        for budget in budgets {
            cached.push(budget.spent);
            snapshots.push(self.snapshot(budget).await?);
        }
        for (cached, snapshot) in cached.into_iter().zip(&snapshots) {
            self.sync_cache(cached, snapshot).await;
        }
        Ok(snapshots)
    }
}
