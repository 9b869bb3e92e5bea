//! Workspace Directory and reference lookups.
//!
//! The scheduler enumerates tenants through [`list_all_workspace_ids`]; the template
//! service and generator use the existence checks to validate references. The create
//! helpers are the minimal seeding surface; full account and category management lives
//! outside this crate.

use crate::{
    entities::{Account, Category, Workspace, account, category, workspace},
    errors::Result,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Ids of every non-deleted workspace, ascending.
pub async fn list_all_workspace_ids<C>(db: &C) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Workspace::find()
        .select_only()
        .column(workspace::Column::Id)
        .filter(workspace::Column::IsDeleted.eq(false))
        .order_by_asc(workspace::Column::Id)
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Whether a live workspace with this id exists.
pub async fn workspace_exists<C>(db: &C, workspace_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Workspace::find_by_id(workspace_id)
        .filter(workspace::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Whether a live account with this id exists in the workspace.
pub async fn account_exists<C>(db: &C, workspace_id: i64, account_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Account::find_by_id(account_id)
        .filter(account::Column::WorkspaceId.eq(workspace_id))
        .filter(account::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Whether a live category with this id exists in the workspace.
pub async fn category_exists<C>(db: &C, workspace_id: i64, category_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Category::find_by_id(category_id)
        .filter(category::Column::WorkspaceId.eq(workspace_id))
        .filter(category::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Inserts a workspace.
pub async fn create_workspace<C>(db: &C, name: &str) -> Result<workspace::Model>
where
    C: ConnectionTrait,
{
    workspace::ActiveModel {
        name: Set(name.trim().to_string()),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an account into a workspace.
pub async fn create_account<C>(db: &C, workspace_id: i64, name: &str) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    account::ActiveModel {
        workspace_id: Set(workspace_id),
        name: Set(name.trim().to_string()),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a category into a workspace.
pub async fn create_category<C>(db: &C, workspace_id: i64, name: &str) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    category::ActiveModel {
        workspace_id: Set(workspace_id),
        name: Set(name.trim().to_string()),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Soft-deletes an account. Returns `false` if no live account matched.
pub async fn soft_delete_account<C>(db: &C, workspace_id: i64, account_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Account::update_many()
        .col_expr(account::Column::IsDeleted, Expr::value(true))
        .filter(account::Column::Id.eq(account_id))
        .filter(account::Column::WorkspaceId.eq(workspace_id))
        .filter(account::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
