//! Workspace entity - A tenant boundary.
//!
//! Every account, category, template and transaction belongs to exactly one workspace.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workspace database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workspaces")]
pub struct Model {
    /// Unique identifier for the workspace
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the workspace
    pub name: String,
    /// Soft delete flag - deleted workspaces are skipped by the scheduler
    pub is_deleted: bool,
    /// When the workspace was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Workspace and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One workspace has many accounts
    #[sea_orm(has_many = "super::account::Entity")]
    Accounts,
    /// One workspace has many recurring templates
    #[sea_orm(has_many = "super::recurring_transaction::Entity")]
    RecurringTransactions,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
