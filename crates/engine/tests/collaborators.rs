use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database};

use engine::{
    AlertStateStore, Budget, BudgetId, BudgetKey, BudgetStatus, BudgetStore, CategoryId,
    ChannelSink, Engine, EngineError, ExpenseAmount, ExpenseLedger, MemoryAlertState, Money,
    MonthPeriod, NewBudget, ResultEngine, SqlBudgetStore, UserId,
};
use migration::MigratorTrait;

fn june() -> MonthPeriod {
    "2025-06".parse().unwrap()
}

fn budget(id: BudgetId, category_id: CategoryId, limit: i64) -> Budget {
    Budget {
        id,
        user_id: 1,
        category_id,
        period: june(),
        limit: Money::new(limit),
        spent: Money::ZERO,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Ledger returning a fixed list, whatever the query.
struct FixedLedger(Vec<ExpenseAmount>);

#[async_trait]
impl ExpenseLedger for FixedLedger {
    async fn list_expenses(
        &self,
        _user_id: UserId,
        _category_id: CategoryId,
        _period: MonthPeriod,
    ) -> ResultEngine<Vec<ExpenseAmount>> {
        Ok(self.0.clone())
    }
}

struct DownLedger;

#[async_trait]
impl ExpenseLedger for DownLedger {
    async fn list_expenses(
        &self,
        _user_id: UserId,
        _category_id: CategoryId,
        _period: MonthPeriod,
    ) -> ResultEngine<Vec<ExpenseAmount>> {
        Err(EngineError::DataUnavailable("ledger offline".to_string()))
    }
}

struct SlowLedger;

#[async_trait]
impl ExpenseLedger for SlowLedger {
    async fn list_expenses(
        &self,
        _user_id: UserId,
        _category_id: CategoryId,
        _period: MonthPeriod,
    ) -> ResultEngine<Vec<ExpenseAmount>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

/// Read-only store holding a fixed set of budgets. Writes fail.
struct FixedStore(Vec<Budget>);

#[async_trait]
impl BudgetStore for FixedStore {
    async fn get_budget(&self, key: BudgetKey) -> ResultEngine<Option<Budget>> {
        Ok(self.0.iter().find(|b| b.key() == key).cloned())
    }

    async fn find_budget(&self, budget_id: BudgetId) -> ResultEngine<Option<Budget>> {
        Ok(self.0.iter().find(|b| b.id == budget_id).cloned())
    }

    async fn list_budgets(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<Vec<Budget>> {
        Ok(self
            .0
            .iter()
            .filter(|b| b.user_id == user_id && b.period == period)
            .cloned()
            .collect())
    }

    async fn list_all_budgets(&self, user_id: UserId) -> ResultEngine<Vec<Budget>> {
        Ok(self.0.iter().filter(|b| b.user_id == user_id).cloned().collect())
    }

    async fn insert_budget(&self, _budget: NewBudget) -> ResultEngine<Budget> {
        Err(EngineError::DataUnavailable("read only".to_string()))
    }

    async fn update_budget(
        &self,
        _budget_id: BudgetId,
        _limit: Money,
        _spent: Money,
    ) -> ResultEngine<Budget> {
        Err(EngineError::DataUnavailable("read only".to_string()))
    }

    async fn refresh_spent(&self, _budget_id: BudgetId, _spent: Money) -> ResultEngine<()> {
        Err(EngineError::DataUnavailable("read only".to_string()))
    }

    async fn delete_budget(&self, _budget_id: BudgetId) -> ResultEngine<()> {
        Err(EngineError::DataUnavailable("read only".to_string()))
    }
}

/// Store whose pre-check never sees existing rows, as if another request
/// inserted the same key between check and insert.
struct RacingStore(SqlBudgetStore);

#[async_trait]
impl BudgetStore for RacingStore {
    async fn get_budget(&self, _key: BudgetKey) -> ResultEngine<Option<Budget>> {
        Ok(None)
    }

    async fn find_budget(&self, budget_id: BudgetId) -> ResultEngine<Option<Budget>> {
        self.0.find_budget(budget_id).await
    }

    async fn list_budgets(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<Vec<Budget>> {
        self.0.list_budgets(user_id, period).await
    }

    async fn list_all_budgets(&self, user_id: UserId) -> ResultEngine<Vec<Budget>> {
        self.0.list_all_budgets(user_id).await
    }

    async fn insert_budget(&self, budget: NewBudget) -> ResultEngine<Budget> {
        self.0.insert_budget(budget).await
    }

    async fn update_budget(
        &self,
        budget_id: BudgetId,
        limit: Money,
        spent: Money,
    ) -> ResultEngine<Budget> {
        self.0.update_budget(budget_id, limit, spent).await
    }

    async fn refresh_spent(&self, budget_id: BudgetId, spent: Money) -> ResultEngine<()> {
        self.0.refresh_spent(budget_id, spent).await
    }

    async fn delete_budget(&self, budget_id: BudgetId) -> ResultEngine<()> {
        self.0.delete_budget(budget_id).await
    }
}

/// Alert state answering after a delay, like a remote cache.
struct SlowAlertState(MemoryAlertState);

#[async_trait]
impl AlertStateStore for SlowAlertState {
    async fn swap(&self, key: BudgetKey, status: BudgetStatus) -> Option<BudgetStatus> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.0.swap(key, status).await
    }

    async fn forget(&self, key: BudgetKey) {
        self.0.forget(key).await;
    }
}

#[tokio::test]
async fn unreachable_ledger_fails_the_whole_snapshot() {
    let engine = Engine::builder()
        .expense_ledger(Arc::new(DownLedger))
        .budget_store(Arc::new(FixedStore(vec![budget(1, 10, 100), budget(2, 11, 100)])))
        .build();

    let err = engine.snapshot(1, june()).await.unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)));

    let err = engine.summary(1, june()).await.unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)));

    let err = engine.refresh_alerts(1, june()).await.unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_ledger_times_out() {
    let engine = Engine::builder()
        .expense_ledger(Arc::new(SlowLedger))
        .budget_store(Arc::new(FixedStore(vec![budget(1, 10, 100)])))
        .timeout(Duration::from_millis(500))
        .build();

    let err = engine.snapshot(1, june()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::DataUnavailable("expense ledger timed out after 500ms".to_string())
    );
}

#[tokio::test]
async fn disconnected_database_is_data_unavailable() {
    let engine = Engine::builder().build();
    let err = engine.snapshot(1, june()).await.unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)));
}

#[tokio::test]
async fn failed_cache_write_back_does_not_fail_the_read() {
    let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    let engine = Engine::builder()
        .expense_ledger(Arc::new(FixedLedger(vec![ExpenseAmount {
            amount: Money::new(80),
            date: day,
        }])))
        .budget_store(Arc::new(FixedStore(vec![budget(1, 10, 100)])))
        .build();

    let snapshots = engine.snapshot(1, june()).await.unwrap();
    assert_eq!(snapshots[0].budget.spent, Money::new(80));
    assert_eq!(snapshots[0].status, BudgetStatus::Warning);
}

#[tokio::test]
async fn expenses_outside_the_month_are_ignored() {
    let engine = Engine::builder()
        .expense_ledger(Arc::new(FixedLedger(vec![
            ExpenseAmount {
                amount: Money::new(40),
                date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            },
            ExpenseAmount {
                amount: Money::new(1_000),
                date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            },
        ])))
        .budget_store(Arc::new(FixedStore(vec![budget(1, 10, 100)])))
        .build();

    let spent = engine.compute_spent(1, 10, june()).await.unwrap();
    assert_eq!(spent, Money::new(40));
}

#[tokio::test]
async fn store_uniqueness_backs_up_the_pre_check() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .budget_store(Arc::new(RacingStore(SqlBudgetStore::new(db))))
        .build();

    engine
        .create_budget(1, 10, june(), Money::new(100))
        .await
        .unwrap();
    let err = engine
        .create_budget(1, 10, june(), Money::new(200))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateBudget(_)));

    let budgets = engine.list_budgets(1, june()).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].limit, Money::new(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_refreshes_alert_once_per_transition() {
    let state = MemoryAlertState::new();
    let stored = budget(1, 10, 1_000_000);
    state.swap(stored.key(), BudgetStatus::Ok).await;

    let (sink, mut alerts) = ChannelSink::new();
    let engine = Engine::builder()
        .expense_ledger(Arc::new(FixedLedger(vec![ExpenseAmount {
            amount: Money::new(900_000),
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        }])))
        .budget_store(Arc::new(FixedStore(vec![stored])))
        .alert_state(Arc::new(SlowAlertState(state)))
        .notification_sink(Arc::new(sink))
        .build();

    let (first, second) = tokio::join!(
        engine.refresh_alerts(1, june()),
        engine.refresh_alerts(1, june())
    );
    let returned = first.unwrap().len() + second.unwrap().len();
    assert_eq!(returned, 1);

    drop(engine);
    let mut delivered = Vec::new();
    while let Some(event) = alerts.recv().await {
        delivered.push(event);
    }
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].from_status, BudgetStatus::Ok);
    assert_eq!(delivered[0].to_status, BudgetStatus::Warning);
}

#[tokio::test]
async fn negative_ledger_totals_count_as_nothing_spent() {
    let engine = Engine::builder()
        .expense_ledger(Arc::new(FixedLedger(vec![
            ExpenseAmount {
                amount: Money::new(50_000),
                date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            },
            ExpenseAmount {
                amount: Money::new(-80_000),
                date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            },
        ])))
        .budget_store(Arc::new(FixedStore(vec![budget(1, 10, 100_000)])))
        .build();

    assert_eq!(engine.compute_spent(1, 10, june()).await.unwrap(), Money::ZERO);
    let snapshots = engine.snapshot(1, june()).await.unwrap();
    assert_eq!(snapshots[0].budget.spent, Money::ZERO);
    assert_eq!(snapshots[0].remaining, Money::new(100_000));
    assert_eq!(snapshots[0].status, BudgetStatus::Ok);
}

#[tokio::test]
async fn update_of_a_budget_deleted_underneath_is_not_found() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let store = SqlBudgetStore::new(db.clone());
    let stored = store
        .insert_budget(NewBudget {
            user_id: 1,
            category_id: 10,
            period: june(),
            limit: Money::new(100),
            spent: Money::ZERO,
        })
        .await
        .unwrap();

    // Drops every write to the row, as if a concurrent delete won the race.
    db.execute_unprepared(
        "CREATE TRIGGER vanish BEFORE UPDATE ON budgets BEGIN SELECT RAISE(IGNORE); END",
    )
    .await
    .unwrap();

    let err = store
        .update_budget(stored.id, Money::new(200), Money::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(format!("budget {}", stored.id)));
}
