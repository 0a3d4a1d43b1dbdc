use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    Budget, BudgetId, BudgetKey, EngineError, Money, MonthPeriod, NewBudget, ResultEngine, UserId,
    budgets,
    stores::BudgetStore,
    util::{is_unique_violation, storage_error},
};

/// Budget store over the `budgets` table.
///
/// Uniqueness of `(user_id, category_id, month)` is enforced by a unique index,
/// so two racing inserts for the same key cannot both succeed.
#[derive(Clone, Debug)]
pub struct SqlBudgetStore {
    db: DatabaseConnection,
}

impl SqlBudgetStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn require(&self, budget_id: BudgetId) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| EngineError::NotFound(format!("budget {budget_id}")))
    }
}

fn into_budgets(models: Vec<budgets::Model>) -> ResultEngine<Vec<Budget>> {
    models.into_iter().map(Budget::try_from).collect()
}

#[async_trait]
impl BudgetStore for SqlBudgetStore {
    async fn get_budget(&self, key: BudgetKey) -> ResultEngine<Option<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(key.user_id))
            .filter(budgets::Column::CategoryId.eq(key.category_id))
            .filter(budgets::Column::Month.eq(key.period.to_string()))
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(Budget::try_from)
            .transpose()
    }

    async fn find_budget(&self, budget_id: BudgetId) -> ResultEngine<Option<Budget>> {
        budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(Budget::try_from)
            .transpose()
    }

    async fn list_budgets(&self, user_id: UserId, period: MonthPeriod) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::Month.eq(period.to_string()))
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        into_budgets(models)
    }

    async fn list_all_budgets(&self, user_id: UserId) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        into_budgets(models)
    }

    async fn insert_budget(&self, budget: NewBudget) -> ResultEngine<Budget> {
        let model = budgets::ActiveModel::from(&budget)
            .insert(&self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    EngineError::DuplicateBudget(format!(
                        "category {} already has a budget for {}",
                        budget.category_id, budget.period
                    ))
                } else {
                    storage_error(err)
                }
            })?;
        Budget::try_from(model)
    }

    async fn update_budget(
        &self,
        budget_id: BudgetId,
        limit: Money,
        spent: Money,
    ) -> ResultEngine<Budget> {
        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::LimitMinor, Expr::value(limit.minor()))
            .col_expr(budgets::Column::SpentMinor, Expr::value(spent.minor()))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        // Deleted since the caller read it.
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("budget {budget_id}")));
        }
        Budget::try_from(self.require(budget_id).await?)
    }

    async fn refresh_spent(&self, budget_id: BudgetId, spent: Money) -> ResultEngine<()> {
        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::SpentMinor, Expr::value(spent.minor()))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("budget {budget_id}")));
        }
        Ok(())
    }

    async fn delete_budget(&self, budget_id: BudgetId) -> ResultEngine<()> {
        let result = budgets::Entity::delete_by_id(budget_id)
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(format!("budget {budget_id}")));
        }
        Ok(())
    }
}
