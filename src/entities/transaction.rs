//! Transaction entity - A concrete dated money movement.
//!
//! Transactions are either entered manually (`source = "manual"`, no `template_id`) or
//! materialized from a recurring template (`source = "recurring"`). Generated rows carry
//! the `template_id` and the `projection_month` (`YYYY-MM`) they cover; a unique index on
//! that pair keeps at most one projection per template and month.
use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning workspace
    pub workspace_id: i64,
    /// Human-readable name, copied from the template for projections
    pub name: String,
    /// Positive amount; direction is given by `transaction_type`
    pub amount: f64,
    /// Account the money moves through
    pub account_id: i64,
    /// Optional category
    pub category_id: Option<i64>,
    /// `"income"` or `"expense"`
    pub transaction_type: String,
    /// Calendar date the transaction happens on
    pub transaction_date: NaiveDate,
    /// `"manual"` or `"recurring"`
    pub source: String,
    /// Originating template for generated transactions
    pub template_id: Option<i64>,
    /// `YYYY-MM` of the month a generated transaction covers
    pub projection_month: Option<String>,
    /// Settled transactions are realized and never removed by cleanup
    pub is_settled: bool,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// Generated transactions belong to one template
    #[sea_orm(
        belongs_to = "super::recurring_transaction::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_transaction::Column::Id"
    )]
    RecurringTransaction,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
