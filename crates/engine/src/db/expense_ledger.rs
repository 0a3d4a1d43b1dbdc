use async_trait::async_trait;
use sea_orm::{DatabaseConnection, QueryFilter, QueryOrder, prelude::*};

use crate::{
    CategoryId, Expense, ExpenseAmount, MonthPeriod, ResultEngine, UserId, expenses,
    stores::ExpenseLedger, util::storage_error,
};

/// Expense ledger over the `expenses` table. Read-only.
#[derive(Clone, Debug)]
pub struct SqlExpenseLedger {
    db: DatabaseConnection,
}

impl SqlExpenseLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseLedger for SqlExpenseLedger {
    async fn list_expenses(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> ResultEngine<Vec<ExpenseAmount>> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::CategoryId.eq(category_id))
            .filter(expenses::Column::ExpenseDate.between(period.first_day(), period.last_day()))
            .order_by_asc(expenses::Column::ExpenseDate)
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(models
            .into_iter()
            .map(|model| ExpenseAmount::from(&Expense::from(model)))
            .collect())
    }
}
