use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use sea_orm::DatabaseConnection;

pub use aggregator::BudgetAggregator;
pub use alert_state::MemoryAlertState;
pub use alerts::{AlertEvent, AlertKind, Severity};
pub use budgets::{Budget, BudgetKey, NewBudget};
pub use categories::Category;
pub use currency::Currency;
pub use db::{SqlBudgetStore, SqlCategoryRegistry, SqlExpenseLedger};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseAmount, PaymentMethod};
pub use lifecycle::{BudgetManager, BudgetUpdate};
pub use money::Money;
pub use period::MonthPeriod;
pub use sinks::{ChannelSink, TracingSink};
pub use snapshot::{BudgetSnapshot, BudgetStatus, DEFAULT_WARNING_RATIO, MonthSummary, Thresholds};
pub use stores::{AlertStateStore, BudgetStore, CategoryRegistry, ExpenseLedger, NotificationSink};

mod aggregator;
mod alert_state;
pub mod alerts;
pub mod budgets;
pub mod categories;
mod currency;
mod db;
mod error;
pub mod expenses;
mod lifecycle;
mod money;
mod period;
mod sinks;
mod snapshot;
mod stores;
mod util;

pub type UserId = i64;
pub type CategoryId = i64;
pub type BudgetId = i64;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Default bound on every expense ledger and budget store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Budget tracking core.
///
/// Ties the aggregator, the lifecycle manager and the alert evaluator to
/// their collaborators. Every status the engine reports is derived from a
/// fresh ledger read.
pub struct Engine {
    aggregator: Arc<BudgetAggregator>,
    manager: BudgetManager,
    categories: Arc<dyn CategoryRegistry>,
    alert_state: Arc<dyn AlertStateStore>,
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.aggregator.thresholds()
    }

    pub async fn compute_spent(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> ResultEngine<Money> {
        self.aggregator
            .compute_spent(user_id, category_id, period)
            .await
    }

    /// One snapshot per budget the user has for `period`, in creation order.
    pub async fn snapshot(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<BudgetSnapshot>> {
        self.aggregator.snapshot_all(user_id, period).await
    }

    /// Snapshots of every budget of the user, across months.
    pub async fn list_all(&self, user_id: UserId) -> ResultEngine<Vec<BudgetSnapshot>> {
        self.aggregator.snapshot_every_month(user_id).await
    }

    /// Snapshot of a single budget owned by `user_id`.
    pub async fn budget(&self, user_id: UserId, budget_id: BudgetId) -> ResultEngine<BudgetSnapshot> {
        let budget = self.manager.get(user_id, budget_id).await?;
        let cached = budget.spent;
        let snapshot = self.aggregator.snapshot(budget).await?;
        self.aggregator.sync_cache(cached, &snapshot).await;
        Ok(snapshot)
    }

    pub async fn summary(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<MonthSummary> {
        self.aggregator.summary(user_id, period).await
    }

    /// Stored budgets for the month, without derived fields.
    pub async fn list_budgets(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<Budget>> {
        self.manager.list_for_month(user_id, period).await
    }

    /// Creates a budget and records its status as the first observation.
    pub async fn create_budget(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
        limit: Money,
    ) -> ResultEngine<Budget> {
        let budget = self
            .manager
            .create(user_id, category_id, period, limit)
            .await?;
        self.observe_stored(&budget).await?;
        Ok(budget)
    }

    /// Changes a budget's limit. A status change caused by the new limit is
    /// reported to the notification sink.
    pub async fn update_budget(
        &self,
        user_id: UserId,
        budget_id: BudgetId,
        update: BudgetUpdate,
    ) -> ResultEngine<Budget> {
        let budget = self.manager.update(user_id, budget_id, update).await?;
        self.observe_stored(&budget).await?;
        Ok(budget)
    }

    pub async fn delete_budget(&self, user_id: UserId, budget_id: BudgetId) -> ResultEngine<()> {
        let budget = self.manager.delete(user_id, budget_id).await?;
        self.alert_state.forget(budget.key()).await;
        Ok(())
    }

    /// Evaluates the month against statuses the caller observed earlier,
    /// keyed by category. Does not touch the engine's own alert state.
    pub async fn evaluate_alerts(
        &self,
        user_id: UserId,
        period: MonthPeriod,
        previous: &HashMap<CategoryId, BudgetStatus>,
    ) -> ResultEngine<Vec<AlertEvent>> {
        let snapshots = self.aggregator.snapshot_all(user_id, period).await?;
        let events = alerts::evaluate_batch(previous, &snapshots, Utc::now());
        for event in &events {
            self.sink.deliver(event.clone());
        }
        Ok(events)
    }

    /// Recomputes the month and compares it with the last statuses this
    /// engine observed. Budgets seen for the first time are recorded
    /// silently.
    pub async fn refresh_alerts(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<AlertEvent>> {
        let snapshots = self.aggregator.snapshot_all(user_id, period).await?;
        let mut events = Vec::new();
        for snapshot in &snapshots {
            if let Some(event) = self.observe(snapshot).await {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Display metadata for the categories of `snapshots`. Categories that
    /// are missing, or whose lookup fails, are left out.
    pub async fn categories_for(&self, snapshots: &[BudgetSnapshot]) -> HashMap<CategoryId, Category> {
        let mut found = HashMap::new();
        for snapshot in snapshots {
            let category_id = snapshot.budget.category_id;
            if found.contains_key(&category_id) {
                continue;
            }
            let lookup = util::bounded(
                self.timeout,
                "category registry",
                self.categories.category(category_id),
            )
            .await;
            match lookup {
                Ok(Some(category)) => {
                    found.insert(category_id, category);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("category {category_id} lookup failed: {err}"),
            }
        }
        found
    }

    async fn observe_stored(&self, budget: &Budget) -> ResultEngine<()> {
        // `spent` was recomputed by the lifecycle manager just now.
        let snapshot = BudgetSnapshot::compute(budget.clone(), budget.spent, self.thresholds())?;
        self.observe(&snapshot).await;
        Ok(())
    }

    async fn observe(&self, snapshot: &BudgetSnapshot) -> Option<AlertEvent> {
        let key = snapshot.budget.key();
        // Read and record in one step, so concurrent observers of the same
        // transition cannot both see the old status.
        let previous = self.alert_state.swap(key, snapshot.status).await;

        let event = alerts::evaluate(previous, snapshot, Utc::now())?;
        self.sink.deliver(event.clone());
        Some(event)
    }
}

/// Builder for [`Engine`].
///
/// With only a database, every collaborator is the sea-orm adapter over that
/// connection, alert state is kept in memory and alerts are logged. Each
/// collaborator can be replaced individually.
pub struct EngineBuilder {
    database: DatabaseConnection,
    ledger: Option<Arc<dyn ExpenseLedger>>,
    store: Option<Arc<dyn BudgetStore>>,
    categories: Option<Arc<dyn CategoryRegistry>>,
    alert_state: Option<Arc<dyn AlertStateStore>>,
    sink: Option<Arc<dyn NotificationSink>>,
    thresholds: Thresholds,
    timeout: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            ledger: None,
            store: None,
            categories: None,
            alert_state: None,
            sink: None,
            thresholds: Thresholds::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EngineBuilder {
    /// Pass the database backing the default adapters
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn expense_ledger(mut self, ledger: Arc<dyn ExpenseLedger>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn budget_store(mut self, store: Arc<dyn BudgetStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    pub fn category_registry(mut self, categories: Arc<dyn CategoryRegistry>) -> EngineBuilder {
        self.categories = Some(categories);
        self
    }

    pub fn alert_state(mut self, alert_state: Arc<dyn AlertStateStore>) -> EngineBuilder {
        self.alert_state = Some(alert_state);
        self
    }

    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> EngineBuilder {
        self.sink = Some(sink);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> EngineBuilder {
        self.thresholds = thresholds;
        self
    }

    /// Bound on each ledger and store call
    pub fn timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.timeout = timeout;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        let database = self.database;
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(SqlExpenseLedger::new(database.clone())));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(SqlBudgetStore::new(database.clone())));
        let categories = self
            .categories
            .unwrap_or_else(|| Arc::new(SqlCategoryRegistry::new(database)));

        let aggregator = Arc::new(BudgetAggregator::new(
            ledger,
            store.clone(),
            self.thresholds,
            self.timeout,
        ));
        let manager = BudgetManager::new(store, aggregator.clone(), self.timeout);

        tracing::debug!(
            "engine ready: warning at {:.0}%, timeout {}ms",
            self.thresholds.warning_ratio() * 100.0,
            self.timeout.as_millis()
        );

        Engine {
            aggregator,
            manager,
            categories,
            alert_state: self
                .alert_state
                .unwrap_or_else(|| Arc::new(MemoryAlertState::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            timeout: self.timeout,
        }
    }
}
