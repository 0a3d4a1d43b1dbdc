use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::sync::mpsc::UnboundedReceiver;

use engine::{
    AlertEvent, AlertKind, BudgetStatus, BudgetUpdate, ChannelSink, Engine, EngineError, Money,
    MonthPeriod, Severity, Thresholds, expenses,
};
use migration::MigratorTrait;

const ALICE: i64 = 1;
const BOB: i64 = 2;
const FOOD: i64 = 10;
const TRANSPORT: i64 = 11;

async fn engine_with_db() -> (Engine, DatabaseConnection, UnboundedReceiver<AlertEvent>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO categories (id, user_id, name, icon, color) VALUES (?, ?, ?, ?, ?)",
        vec![
            FOOD.into(),
            ALICE.into(),
            "Food".into(),
            "🍜".into(),
            "orange".into(),
        ],
    ))
    .await
    .unwrap();

    let (sink, alerts) = ChannelSink::new();
    let engine = Engine::builder()
        .database(db.clone())
        .notification_sink(Arc::new(sink))
        .build();
    (engine, db, alerts)
}

fn june() -> MonthPeriod {
    "2025-06".parse().unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn add_expense(db: &DatabaseConnection, user_id: i64, category_id: i64, amount: i64, date: NaiveDate) {
    expenses::ActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(user_id),
        category_id: ActiveValue::Set(Some(category_id)),
        store_name: ActiveValue::Set(None),
        amount_minor: ActiveValue::Set(amount),
        payment_method: ActiveValue::Set("CASH".to_string()),
        note: ActiveValue::Set(None),
        expense_date: ActiveValue::Set(date),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn expense_count(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM expenses",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

fn drain(alerts: &mut UnboundedReceiver<AlertEvent>) -> Vec<AlertEvent> {
    let mut events = Vec::new();
    while let Ok(event) = alerts.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn three_expenses_put_the_budget_in_warning() {
    let (engine, db, _alerts) = engine_with_db().await;
    for d in [3, 12, 20] {
        add_expense(&db, ALICE, FOOD, 300_000, day(2025, 6, d)).await;
    }

    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let snapshots = engine.snapshot(ALICE, june()).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    let snap = &snapshots[0];
    assert_eq!(snap.budget.spent, Money::new(900_000));
    assert_eq!(snap.percentage_used, 90.0);
    assert_eq!(snap.status, BudgetStatus::Warning);
    assert_eq!(snap.remaining, Money::new(100_000));
}

#[tokio::test]
async fn crossing_the_limit_alerts_exactly_once() {
    let (engine, db, mut alerts) = engine_with_db().await;
    for d in [3, 12, 20] {
        add_expense(&db, ALICE, FOOD, 300_000, day(2025, 6, d)).await;
    }
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
    // Creation is a first observation.
    assert!(drain(&mut alerts).is_empty());

    add_expense(&db, ALICE, FOOD, 200_000, day(2025, 6, 25)).await;

    let events = engine.refresh_alerts(ALICE, june()).await.unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.from_status, BudgetStatus::Warning);
    assert_eq!(event.to_status, BudgetStatus::Exceeded);
    assert_eq!(event.kind, AlertKind::Exceeded);
    assert_eq!(event.severity, Severity::High);

    let snap = &engine.snapshot(ALICE, june()).await.unwrap()[0];
    assert_eq!(snap.budget.spent, Money::new(1_100_000));
    assert_eq!(snap.status, BudgetStatus::Exceeded);
    assert_eq!(snap.remaining, Money::new(-100_000));

    // Polling again with nothing changed stays silent.
    assert!(engine.refresh_alerts(ALICE, june()).await.unwrap().is_empty());

    let delivered = drain(&mut alerts);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].id, event.id);
}

#[tokio::test]
async fn duplicate_create_is_rejected_and_keeps_the_original() {
    let (engine, _db, _alerts) = engine_with_db().await;
    let original = engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let err = engine
        .create_budget(ALICE, FOOD, june(), Money::new(5_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateBudget(_)));

    let budgets = engine.list_budgets(ALICE, june()).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].id, original.id);
    assert_eq!(budgets[0].limit, Money::new(1_000_000));
}

#[tokio::test]
async fn same_category_is_free_in_another_month_or_for_another_user() {
    let (engine, _db, _alerts) = engine_with_db().await;
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
    engine
        .create_budget(ALICE, FOOD, "2025-07".parse().unwrap(), Money::new(1_000_000))
        .await
        .unwrap();
    engine
        .create_budget(BOB, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    assert_eq!(engine.list_all(ALICE).await.unwrap().len(), 2);
    assert_eq!(engine.list_all(BOB).await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_positive_limits_persist_nothing() {
    let (engine, _db, _alerts) = engine_with_db().await;
    for limit in [0, -1] {
        let err = engine
            .create_budget(ALICE, FOOD, june(), Money::new(limit))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidLimit(_)));
    }
    assert!(engine.list_budgets(ALICE, june()).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_reflects_existing_expenses_of_that_month_only() {
    let (engine, db, _alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 120_000, day(2025, 6, 1)).await;
    add_expense(&db, ALICE, FOOD, 80_000, day(2025, 6, 30)).await;
    add_expense(&db, ALICE, FOOD, 999_000, day(2025, 5, 31)).await;
    add_expense(&db, ALICE, FOOD, 999_000, day(2025, 7, 1)).await;
    add_expense(&db, ALICE, TRANSPORT, 999_000, day(2025, 6, 15)).await;
    add_expense(&db, BOB, FOOD, 999_000, day(2025, 6, 15)).await;

    let budget = engine
        .create_budget(ALICE, FOOD, june(), Money::new(500_000))
        .await
        .unwrap();
    assert_eq!(budget.spent, Money::new(200_000));
}

#[tokio::test]
async fn snapshot_is_idempotent_and_ordered_by_creation() {
    let (engine, db, _alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 50_000, day(2025, 6, 2)).await;
    engine
        .create_budget(ALICE, TRANSPORT, june(), Money::new(300_000))
        .await
        .unwrap();
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(100_000))
        .await
        .unwrap();

    let first = engine.snapshot(ALICE, june()).await.unwrap();
    let second = engine.snapshot(ALICE, june()).await.unwrap();
    assert_eq!(first, second);
    let categories: Vec<_> = first.iter().map(|s| s.budget.category_id).collect();
    assert_eq!(categories, vec![TRANSPORT, FOOD]);
}

#[tokio::test]
async fn reads_recompute_instead_of_trusting_the_cache() {
    let (engine, db, _alerts) = engine_with_db().await;
    let budget = engine
        .create_budget(ALICE, FOOD, june(), Money::new(100_000))
        .await
        .unwrap();
    assert_eq!(budget.spent, Money::ZERO);

    add_expense(&db, ALICE, FOOD, 100_000, day(2025, 6, 9)).await;

    let snap = engine.budget(ALICE, budget.id).await.unwrap();
    assert_eq!(snap.budget.spent, Money::new(100_000));
    assert_eq!(snap.status, BudgetStatus::Exceeded);

    // The fresh total was written back to the stored cache.
    let stored = engine.list_budgets(ALICE, june()).await.unwrap();
    assert_eq!(stored[0].spent, Money::new(100_000));
}

#[tokio::test]
async fn update_changes_the_limit_and_alerts_on_transition() {
    let (engine, db, mut alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 500_000, day(2025, 6, 4)).await;
    let budget = engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let updated = engine
        .update_budget(ALICE, budget.id, BudgetUpdate::limit(Money::new(550_000)))
        .await
        .unwrap();
    assert_eq!(updated.limit, Money::new(550_000));
    assert_eq!(updated.spent, Money::new(500_000));

    let delivered = drain(&mut alerts);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, AlertKind::Warning);
    assert_eq!(delivered[0].severity, Severity::Medium);

    // Raising the limit again recovers.
    engine
        .update_budget(ALICE, budget.id, BudgetUpdate::limit(Money::new(2_000_000)))
        .await
        .unwrap();
    let delivered = drain(&mut alerts);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, AlertKind::Recovered);
    assert_eq!(delivered[0].severity, Severity::Low);
}

#[tokio::test]
async fn update_rejects_bad_input() {
    let (engine, _db, _alerts) = engine_with_db().await;
    let budget = engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let err = engine
        .update_budget(ALICE, budget.id, BudgetUpdate::limit(Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLimit(_)));

    let err = engine
        .update_budget(
            ALICE,
            budget.id,
            BudgetUpdate {
                limit: Money::new(10),
                category_id: Some(TRANSPORT),
                period: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ImmutableField("category_id".to_string()));

    let err = engine
        .update_budget(
            ALICE,
            budget.id,
            BudgetUpdate {
                limit: Money::new(10),
                category_id: Some(FOOD),
                period: Some("2025-07".parse().unwrap()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ImmutableField("month".to_string()));

    // Echoing the stored values back is fine.
    let updated = engine
        .update_budget(
            ALICE,
            budget.id,
            BudgetUpdate {
                limit: Money::new(10),
                category_id: Some(FOOD),
                period: Some(june()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.limit, Money::new(10));

    let err = engine
        .update_budget(ALICE, 999, BudgetUpdate::limit(Money::new(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = engine
        .update_budget(BOB, budget.id, BudgetUpdate::limit(Money::new(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn delete_keeps_expenses_and_reports_missing_ids() {
    let (engine, db, _alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 10_000, day(2025, 6, 4)).await;
    add_expense(&db, ALICE, FOOD, 20_000, day(2025, 6, 5)).await;
    let budget = engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let err = engine.delete_budget(BOB, budget.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    engine.delete_budget(ALICE, budget.id).await.unwrap();
    assert!(engine.list_budgets(ALICE, june()).await.unwrap().is_empty());
    assert_eq!(expense_count(&db).await, 2);

    let err = engine.delete_budget(ALICE, budget.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // The slot is free again.
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
}

#[tokio::test]
async fn evaluate_alerts_uses_caller_statuses() {
    let (engine, db, mut alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 850_000, day(2025, 6, 4)).await;
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
    engine
        .create_budget(ALICE, TRANSPORT, june(), Money::new(1_000_000))
        .await
        .unwrap();
    drain(&mut alerts);

    let previous = HashMap::from([(FOOD, BudgetStatus::Ok), (TRANSPORT, BudgetStatus::Ok)]);
    let events = engine
        .evaluate_alerts(ALICE, june(), &previous)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category_id, FOOD);
    assert_eq!(events[0].kind, AlertKind::Warning);
    assert_eq!(drain(&mut alerts).len(), 1);

    let unchanged = HashMap::from([(FOOD, BudgetStatus::Warning)]);
    let events = engine
        .evaluate_alerts(ALICE, june(), &unchanged)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn summary_totals_the_month() {
    let (engine, db, _alerts) = engine_with_db().await;
    add_expense(&db, ALICE, FOOD, 1_200_000, day(2025, 6, 4)).await;
    add_expense(&db, ALICE, TRANSPORT, 100_000, day(2025, 6, 4)).await;
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
    engine
        .create_budget(ALICE, TRANSPORT, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let summary = engine.summary(ALICE, june()).await.unwrap();
    assert_eq!(summary.budget_count, 2);
    assert_eq!(summary.total_limit, Money::new(2_000_000));
    assert_eq!(summary.total_spent, Money::new(1_300_000));
    assert_eq!(summary.total_remaining, Money::new(700_000));
    assert_eq!(summary.percentage_used, 65.0);
    assert_eq!((summary.ok, summary.warning, summary.exceeded), (1, 0, 1));
}

#[tokio::test]
async fn categories_enrich_known_ids_only() {
    let (engine, _db, _alerts) = engine_with_db().await;
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();
    engine
        .create_budget(ALICE, TRANSPORT, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let snapshots = engine.snapshot(ALICE, june()).await.unwrap();
    let categories = engine.categories_for(&snapshots).await;
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[&FOOD].name, "Food");
    assert_eq!(categories[&FOOD].icon.as_deref(), Some("🍜"));
}

#[tokio::test]
async fn configurable_warning_threshold() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .thresholds(Thresholds::from_ratio(0.5).unwrap())
        .build();
    add_expense(&db, ALICE, FOOD, 500_000, day(2025, 6, 4)).await;
    engine
        .create_budget(ALICE, FOOD, june(), Money::new(1_000_000))
        .await
        .unwrap();

    let snap = &engine.snapshot(ALICE, june()).await.unwrap()[0];
    assert_eq!(snap.status, BudgetStatus::Warning);
}
