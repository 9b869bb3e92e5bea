//! Recurring template business logic - validation and CRUD for templates.
//!
//! This module owns the template-level invariants: a trimmed non-empty name no longer
//! than [`MAX_NAME_LENGTH`], a strictly positive amount, a known transaction type, a
//! monthly frequency, a due day in 1..=31, a start date normalized to the first of its
//! month, and references to an account (and optional category) of the same workspace.
//!
//! Template mutations only persist. Projections are produced later by the generator,
//! either from the scheduler or from an explicit regeneration call.

use crate::{
    core::calendar::YearMonth,
    db,
    entities::recurring_transaction,
    errors::{Error, Result},
    models::{Frequency, TransactionType},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, IntoActiveModel, Set};
use tracing::{info, instrument};

/// Maximum template name length, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Due day used when a new template does not specify one.
pub const DEFAULT_DUE_DAY: i32 = 1;

/// Editable fields of a template, used for both creation and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateArgs {
    pub name: String,
    pub amount: f64,
    pub account_id: i64,
    /// `"income"` or `"expense"`
    pub transaction_type: String,
    pub category_id: Option<i64>,
    /// Must be `"monthly"`
    pub frequency: String,
    /// Defaults to the 1st on create; kept unchanged on update when `None`
    pub due_day: Option<i32>,
    /// Defaults to the current month on create; kept unchanged on update when `None`
    pub start_date: Option<NaiveDate>,
    /// Inclusive end of the projection window, `None` for open-ended templates
    pub end_date: Option<NaiveDate>,
    /// Defaults to active on create; kept unchanged on update when `None`
    pub is_active: Option<bool>,
}

/// Template fields after validation and normalization.
#[derive(Debug, Clone, PartialEq)]
struct ValidTemplate {
    name: String,
    amount: f64,
    transaction_type: TransactionType,
    frequency: Frequency,
    due_day: Option<i32>,
    start_date: Option<NaiveDate>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyName);
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(Error::NameTooLong {
            length,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

fn validate_due_day(due_day: i32) -> Result<i32> {
    if (1..=31).contains(&due_day) {
        Ok(due_day)
    } else {
        Err(Error::InvalidDueDay { day: due_day })
    }
}

fn normalize_start_date(date: NaiveDate) -> Result<NaiveDate> {
    YearMonth::from_date(date).first_day()
}

/// Checks every field that does not need the database.
fn validate_args(args: &TemplateArgs) -> Result<ValidTemplate> {
    let name = validate_name(&args.name)?;

    if !args.amount.is_finite() || args.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: args.amount,
        });
    }

    let transaction_type = args.transaction_type.parse::<TransactionType>()?;
    let frequency = args.frequency.parse::<Frequency>()?;
    let due_day = args.due_day.map(validate_due_day).transpose()?;
    let start_date = args.start_date.map(normalize_start_date).transpose()?;

    Ok(ValidTemplate {
        name,
        amount: args.amount,
        transaction_type,
        frequency,
        due_day,
        start_date,
    })
}

fn check_date_range(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(Error::InvalidDateRange { start, end }),
        _ => Ok(()),
    }
}

/// Verifies that the account and optional category exist in the workspace.
async fn check_references(
    db: &DatabaseConnection,
    workspace_id: i64,
    account_id: i64,
    category_id: Option<i64>,
) -> Result<()> {
    if !db::workspaces::account_exists(db, workspace_id, account_id).await? {
        return Err(Error::AccountNotFound { id: account_id });
    }

    if let Some(category_id) = category_id {
        if !db::workspaces::category_exists(db, workspace_id, category_id).await? {
            return Err(Error::CategoryNotFound { id: category_id });
        }
    }
    Ok(())
}

/// Creates a new template after validating every field.
///
/// A missing due day becomes the 1st and a missing start date becomes the first day of
/// the current month. No projections are generated.
///
/// # Errors
/// Returns a validation error for invalid fields, or [`Error::AccountNotFound`] /
/// [`Error::CategoryNotFound`] when a reference is not in `workspace_id`.
#[instrument(skip(db, args), fields(name = %args.name))]
pub async fn create_template(
    db: &DatabaseConnection,
    workspace_id: i64,
    args: TemplateArgs,
) -> Result<recurring_transaction::Model> {
    let valid = validate_args(&args)?;
    let start_date = match valid.start_date {
        Some(date) => date,
        None => normalize_start_date(Utc::now().date_naive())?,
    };
    check_date_range(start_date, args.end_date)?;
    check_references(db, workspace_id, args.account_id, args.category_id).await?;

    let now = Utc::now();
    let template = recurring_transaction::ActiveModel {
        workspace_id: Set(workspace_id),
        name: Set(valid.name),
        amount: Set(valid.amount),
        account_id: Set(args.account_id),
        transaction_type: Set(valid.transaction_type.as_str().to_string()),
        category_id: Set(args.category_id),
        frequency: Set(valid.frequency.as_str().to_string()),
        due_day: Set(valid.due_day.unwrap_or(DEFAULT_DUE_DAY)),
        start_date: Set(start_date),
        end_date: Set(args.end_date),
        is_active: Set(args.is_active.unwrap_or(true)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = db::templates::create(db, template).await?;
    info!(template_id = created.id, "Created recurring template");
    Ok(created)
}

/// Lists the workspace's templates, optionally only the active ones.
pub async fn list_templates(
    db: &DatabaseConnection,
    workspace_id: i64,
    active_only: bool,
) -> Result<Vec<recurring_transaction::Model>> {
    if active_only {
        db::templates::list_active_by_workspace(db, workspace_id).await
    } else {
        db::templates::list_by_workspace(db, workspace_id).await
    }
}

/// Fetches one template.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if the template does not exist in the workspace or
/// has been deleted.
pub async fn get_template_by_id(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
) -> Result<recurring_transaction::Model> {
    db::templates::get_by_id(db, workspace_id, template_id)
        .await?
        .ok_or(Error::TemplateNotFound { id: template_id })
}

/// Overwrites the editable fields of a template.
///
/// `due_day`, `start_date` and `is_active` keep their stored values when `None`;
/// every other field, including `end_date` and `category_id`, is replaced. Setting
/// `is_active` reactivates or deactivates the template. Existing projections are left
/// alone; callers that change the amount or due day follow up with
/// [`crate::core::projection::regenerate_projections_for_template`], and callers that
/// tighten the end date with
/// [`crate::core::projection::cleanup_projections_beyond_end_date`].
#[instrument(skip(db, args))]
pub async fn update_template(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
    args: TemplateArgs,
) -> Result<recurring_transaction::Model> {
    let valid = validate_args(&args)?;
    let existing = get_template_by_id(db, workspace_id, template_id).await?;

    let start_date = valid.start_date.unwrap_or(existing.start_date);
    check_date_range(start_date, args.end_date)?;
    check_references(db, workspace_id, args.account_id, args.category_id).await?;

    let due_day = valid.due_day.unwrap_or(existing.due_day);
    let is_active = args.is_active.unwrap_or(existing.is_active);

    let mut template = existing.into_active_model();
    template.name = Set(valid.name);
    template.amount = Set(valid.amount);
    template.account_id = Set(args.account_id);
    template.transaction_type = Set(valid.transaction_type.as_str().to_string());
    template.category_id = Set(args.category_id);
    template.frequency = Set(valid.frequency.as_str().to_string());
    template.due_day = Set(due_day);
    template.start_date = Set(start_date);
    template.end_date = Set(args.end_date);
    template.is_active = Set(is_active);
    template.updated_at = Set(Utc::now());

    let updated = db::templates::update_partial(db, template).await?;
    info!(template_id, "Updated recurring template");
    Ok(updated)
}

/// Soft-deletes a template. Generated transactions keep their reference to it.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if no live template matched.
#[instrument(skip(db))]
pub async fn delete_template(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
) -> Result<()> {
    if db::templates::soft_delete(db, workspace_id, template_id).await? {
        info!(template_id, "Deleted recurring template");
        Ok(())
    } else {
        Err(Error::TemplateNotFound { id: template_id })
    }
}
