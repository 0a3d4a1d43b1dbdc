//! sea-orm backed implementations of the collaborator contracts.
//!
//! All three adapters share one [`DatabaseConnection`](sea_orm::DatabaseConnection); the schema comes from
//! the `migration` crate.

mod budget_store;
mod category_registry;
mod expense_ledger;

pub use budget_store::SqlBudgetStore;
pub use category_registry::SqlCategoryRegistry;
pub use expense_ledger::SqlExpenseLedger;
