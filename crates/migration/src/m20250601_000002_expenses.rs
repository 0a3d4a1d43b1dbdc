use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    UserId,
    CategoryId,
    StoreName,
    AmountMinor,
    PaymentMethod,
    Note,
    ExpenseDate,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).big_integer())
                    .col(ColumnDef::new(Expenses::StoreName).string())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Expenses::PaymentMethod)
                            .string()
                            .not_null()
                            .default("OTHER"),
                    )
                    .col(ColumnDef::new(Expenses::Note).string())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .to_owned(),
            )
            .await?;

        // Spent totals are always queried by user, category and date range.
        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-user_id-category_id-expense_date")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::CategoryId)
                    .col(Expenses::ExpenseDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await
    }
}
