//! Transaction Store - persistence for generated projections.
//!
//! Generated rows are identified by `source = "recurring"` together with their
//! `template_id`; that pairing is what duplicate detection, cleanup and regeneration
//! target. Settled rows are never deleted here.

use crate::{
    core::calendar::YearMonth,
    entities::{Transaction, transaction},
    errors::Result,
    models::{TransactionSource, TransactionType},
};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// A projection ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProjection {
    pub workspace_id: i64,
    pub template_id: i64,
    pub name: String,
    pub amount: f64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub transaction_type: TransactionType,
    pub month: YearMonth,
    pub transaction_date: NaiveDate,
}

/// Inserts a generated transaction unless one already exists for the same template and
/// month. Returns the number of rows written: 1 when inserted, 0 on conflict.
///
/// The check is enforced by the unique index on `(template_id, projection_month)`, so
/// concurrent generators for the same workspace cannot double-create a projection.
#[instrument(skip(db, projection), fields(template_id = projection.template_id, month = %projection.month))]
pub async fn create_generated<C>(db: &C, projection: NewProjection) -> Result<u64>
where
    C: ConnectionTrait,
{
    let row = transaction::ActiveModel {
        workspace_id: Set(projection.workspace_id),
        name: Set(projection.name),
        amount: Set(projection.amount),
        account_id: Set(projection.account_id),
        category_id: Set(projection.category_id),
        transaction_type: Set(projection.transaction_type.as_str().to_string()),
        transaction_date: Set(projection.transaction_date),
        source: Set(TransactionSource::Recurring.as_str().to_string()),
        template_id: Set(Some(projection.template_id)),
        projection_month: Set(Some(projection.month.to_string())),
        is_settled: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let inserted = Transaction::insert(row)
        .on_conflict(
            OnConflict::columns([
                transaction::Column::TemplateId,
                transaction::Column::ProjectionMonth,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!(inserted, "Wrote generated transaction");
    Ok(inserted)
}

/// Whether a generated transaction already covers `month` for the template.
pub async fn exists_for_template_and_month<C>(
    db: &C,
    template_id: i64,
    month: YearMonth,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Transaction::find()
        .filter(transaction::Column::TemplateId.eq(template_id))
        .filter(transaction::Column::ProjectionMonth.eq(month.to_string()))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Deletes unsettled generated transactions of the template dated strictly after `date`.
/// Returns the number of rows removed.
#[instrument(skip(db))]
pub async fn delete_generated_after<C>(db: &C, template_id: i64, date: NaiveDate) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Transaction::delete_many()
        .filter(transaction::Column::TemplateId.eq(template_id))
        .filter(transaction::Column::Source.eq(TransactionSource::Recurring.as_str()))
        .filter(transaction::Column::IsSettled.eq(false))
        .filter(transaction::Column::TransactionDate.gt(date))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes unsettled generated transactions of the template dated on or after `from`.
/// Returns the number of rows removed.
#[instrument(skip(db))]
pub async fn delete_future_for_template<C>(
    db: &C,
    template_id: i64,
    from: NaiveDate,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Transaction::delete_many()
        .filter(transaction::Column::TemplateId.eq(template_id))
        .filter(transaction::Column::Source.eq(TransactionSource::Recurring.as_str()))
        .filter(transaction::Column::IsSettled.eq(false))
        .filter(transaction::Column::TransactionDate.gte(from))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Transactions generated from a template, ordered by date.
pub async fn list_for_template<C>(db: &C, template_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::TemplateId.eq(template_id))
        .order_by_asc(transaction::Column::TransactionDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All generated transactions of a workspace, ordered by date then id.
pub async fn list_generated_for_workspace<C>(
    db: &C,
    workspace_id: i64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::WorkspaceId.eq(workspace_id))
        .filter(transaction::Column::Source.eq(TransactionSource::Recurring.as_str()))
        .order_by_asc(transaction::Column::TransactionDate)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
