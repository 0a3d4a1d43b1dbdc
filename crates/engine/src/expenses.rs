//! Expense records, as kept by the expense ledger.
//!
//! The budget core never writes expenses; it only sums their amounts per
//! `(user, category, month)`.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, EngineError, Money, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    BankTransfer,
    EWallet,
    #[default]
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::CreditCard => "CREDIT_CARD",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::EWallet => "E_WALLET",
            Self::Other => "OTHER",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CASH" => Ok(Self::Cash),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "E_WALLET" => Ok(Self::EWallet),
            "OTHER" => Ok(Self::Other),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub store_name: Option<String>,
    pub note: Option<String>,
}

/// The part of an expense the aggregator needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpenseAmount {
    pub amount: Money,
    pub date: NaiveDate,
}

impl From<&Expense> for ExpenseAmount {
    fn from(expense: &Expense) -> Self {
        Self {
            amount: expense.amount,
            date: expense.date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub store_name: Option<String>,
    pub amount_minor: i64,
    pub payment_method: String,
    pub note: Option<String>,
    pub expense_date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        let payment_method = PaymentMethod::try_from(model.payment_method.as_str())
            .unwrap_or_else(|err| {
                tracing::debug!("expense {}: {err}, using OTHER", model.id);
                PaymentMethod::Other
            });
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            amount: Money::new(model.amount_minor),
            date: model.expense_date,
            payment_method,
            store_name: model.store_name,
            note: model.note,
        }
    }
}
