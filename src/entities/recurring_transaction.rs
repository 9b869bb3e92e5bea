//! Recurring transaction entity - The template a projection is materialized from.
//!
//! A template describes a recurring obligation (subscription, bill, salary): its amount,
//! account, direction, cadence and the day of the month it falls due. Templates are
//! soft-deleted only, since generated transactions keep a reference to them.
//! `transaction_type` and `frequency` hold the lowercase forms of
//! [`crate::models::TransactionType`] and [`crate::models::Frequency`].

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning workspace
    pub workspace_id: i64,
    /// Name copied onto every generated transaction
    pub name: String,
    /// Positive amount copied onto every generated transaction
    pub amount: f64,
    /// Account the money moves through
    pub account_id: i64,
    /// `"income"` or `"expense"`
    pub transaction_type: String,
    /// Optional category copied onto generated transactions
    pub category_id: Option<i64>,
    /// Always `"monthly"`
    pub frequency: String,
    /// Day of month the transaction is due (1-31), clamped to the month length
    pub due_day: i32,
    /// First eligible month, always the first day of that month
    pub start_date: NaiveDate,
    /// Inclusive boundary after which nothing is generated
    pub end_date: Option<NaiveDate>,
    /// Inactive templates never produce projections
    pub is_active: bool,
    /// Soft delete flag - if true, template is hidden but data is preserved
    pub is_deleted: bool,
    /// When the template was created
    pub created_at: DateTimeUtc,
    /// When the template was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `RecurringTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each template belongs to one workspace
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspace::Column::Id"
    )]
    Workspace,
    /// Each template charges one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// One template has many generated transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::workspace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
