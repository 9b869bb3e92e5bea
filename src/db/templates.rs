//! Template Store - persistence for recurring transaction templates.
//!
//! Every lookup is scoped by workspace id, and soft-deleted templates are invisible to
//! all reads.

use crate::{
    entities::{RecurringTransaction, recurring_transaction},
    errors::Result,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, prelude::*};
use tracing::instrument;

/// Active, non-deleted templates of a workspace, oldest first.
#[instrument(skip(db))]
pub async fn list_active_by_workspace<C>(
    db: &C,
    workspace_id: i64,
) -> Result<Vec<recurring_transaction::Model>>
where
    C: ConnectionTrait,
{
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::WorkspaceId.eq(workspace_id))
        .filter(recurring_transaction::Column::IsActive.eq(true))
        .filter(recurring_transaction::Column::IsDeleted.eq(false))
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All non-deleted templates of a workspace, active or not, oldest first.
pub async fn list_by_workspace<C>(
    db: &C,
    workspace_id: i64,
) -> Result<Vec<recurring_transaction::Model>>
where
    C: ConnectionTrait,
{
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::WorkspaceId.eq(workspace_id))
        .filter(recurring_transaction::Column::IsDeleted.eq(false))
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a non-deleted template in a workspace. Returns `None` when the id is unknown,
/// belongs to another workspace, or has been soft-deleted.
pub async fn get_by_id<C>(
    db: &C,
    workspace_id: i64,
    template_id: i64,
) -> Result<Option<recurring_transaction::Model>>
where
    C: ConnectionTrait,
{
    RecurringTransaction::find_by_id(template_id)
        .filter(recurring_transaction::Column::WorkspaceId.eq(workspace_id))
        .filter(recurring_transaction::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a new template.
pub async fn create<C>(
    db: &C,
    template: recurring_transaction::ActiveModel,
) -> Result<recurring_transaction::Model>
where
    C: ConnectionTrait,
{
    template.insert(db).await.map_err(Into::into)
}

/// Writes the fields that are `Set` on `template` and returns the stored row.
pub async fn update_partial<C>(
    db: &C,
    template: recurring_transaction::ActiveModel,
) -> Result<recurring_transaction::Model>
where
    C: ConnectionTrait,
{
    template.update(db).await.map_err(Into::into)
}

/// Marks a template deleted. Returns `false` if no live template matched.
#[instrument(skip(db))]
pub async fn soft_delete<C>(db: &C, workspace_id: i64, template_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = RecurringTransaction::update_many()
        .col_expr(recurring_transaction::Column::IsDeleted, Expr::value(true))
        .col_expr(recurring_transaction::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(recurring_transaction::Column::Id.eq(template_id))
        .filter(recurring_transaction::Column::WorkspaceId.eq(workspace_id))
        .filter(recurring_transaction::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}
