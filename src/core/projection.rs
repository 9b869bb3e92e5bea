//! Projection generation - turns recurring templates into dated transactions.
//!
//! For every (template, month) pair the generator decides on a [`ProjectionOutcome`]:
//! the template may be inactive, the month may fall outside the template's start/end
//! window, a projection may already exist, or a new transaction is written on the due
//! date clamped into the month. Outcomes are folded into a [`ProjectionRunResult`].
//!
//! Failures while materializing a single pair (for example the template's account was
//! deleted underneath it) are collected in the result and never abort the batch, so one
//! broken template cannot hold back the rest of a workspace. Only failures to list the
//! workspace's templates are returned as errors.
//!
//! All generation is idempotent: re-running over months that are already covered leaves
//! the stored transactions unchanged. The unique `(template_id, projection_month)` index
//! behind [`db::transactions::create_generated`] enforces this even when several callers
//! generate for the same workspace at once.

use crate::{
    config::settings::{DEFAULT_MONTHS_AHEAD, MAX_MONTHS_AHEAD},
    core::calendar::{YearMonth, calculate_actual_due_date},
    db::{self, NewProjection},
    entities::recurring_transaction,
    errors::{Error, Result},
    models::TransactionType,
};
use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// What happened to one (template, month) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// A new transaction was written
    Generated,
    /// A projection already covers this month
    AlreadyExists,
    /// The template is deactivated
    SkippedInactive,
    /// The month precedes the template's start month
    SkippedBeforeStart,
    /// The month or its due date lies after the template's end date
    SkippedAfterEnd,
    /// Materializing failed; the reason is kept for the run result
    Failed(String),
}

impl ProjectionOutcome {
    /// Whether later months of the same template can be skipped without looking.
    const fn ends_template(&self) -> bool {
        matches!(
            self,
            Self::SkippedInactive | Self::SkippedAfterEnd | Self::Failed(_)
        )
    }
}

/// A per-template failure collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionError {
    /// Template that failed
    pub template_id: i64,
    /// Its name at the time of the run
    pub template_name: String,
    /// Month that could not be materialized
    pub month: YearMonth,
    /// Why it failed
    pub message: String,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "template {} ({}) {}: {}",
            self.template_id, self.template_name, self.month, self.message
        )
    }
}

/// Summary of one generation invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionRunResult {
    /// Transactions written
    pub generated: usize,
    /// Pairs skipped: inactive, outside the template window, or already covered
    pub skipped: usize,
    /// Failures that did not abort the run
    pub errors: Vec<ProjectionError>,
}

impl ProjectionRunResult {
    /// Folds one outcome into the totals.
    pub fn record(
        &mut self,
        template: &recurring_transaction::Model,
        month: YearMonth,
        outcome: ProjectionOutcome,
    ) {
        match outcome {
            ProjectionOutcome::Generated => self.generated += 1,
            ProjectionOutcome::AlreadyExists
            | ProjectionOutcome::SkippedInactive
            | ProjectionOutcome::SkippedBeforeStart
            | ProjectionOutcome::SkippedAfterEnd => self.skipped += 1,
            ProjectionOutcome::Failed(message) => self.errors.push(ProjectionError {
                template_id: template.id,
                template_name: template.name.clone(),
                month,
                message,
            }),
        }
    }

    /// Adds the totals of another run to this one.
    pub fn merge(&mut self, other: Self) {
        self.generated += other.generated;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for ProjectionRunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generated {}, skipped {}, errors {}",
            self.generated,
            self.skipped,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

/// Number of months to generate for a requested horizon; non-positive values use the
/// default of twelve months and anything above [`MAX_MONTHS_AHEAD`] is capped.
#[must_use]
pub fn effective_months_ahead(months_ahead: i32) -> u32 {
    u32::try_from(months_ahead)
        .ok()
        .filter(|months| *months > 0)
        .unwrap_or(DEFAULT_MONTHS_AHEAD.unsigned_abs())
        .min(MAX_MONTHS_AHEAD.unsigned_abs())
}

enum Eligibility {
    Due(NaiveDate),
    Skip(ProjectionOutcome),
}

/// Decides whether `template` should have a projection in `month`, without touching the
/// database.
fn eligibility(template: &recurring_transaction::Model, month: YearMonth) -> Result<Eligibility> {
    if !template.is_active {
        return Ok(Eligibility::Skip(ProjectionOutcome::SkippedInactive));
    }

    if month < YearMonth::from_date(template.start_date) {
        return Ok(Eligibility::Skip(ProjectionOutcome::SkippedBeforeStart));
    }

    if let Some(end_date) = template.end_date {
        if month.first_day()? > end_date {
            return Ok(Eligibility::Skip(ProjectionOutcome::SkippedAfterEnd));
        }
    }

    let due_date = calculate_actual_due_date(template.due_day, month.year(), month.month())?;
    if template.end_date.is_some_and(|end_date| due_date > end_date) {
        return Ok(Eligibility::Skip(ProjectionOutcome::SkippedAfterEnd));
    }

    Ok(Eligibility::Due(due_date))
}

async fn try_project_month(
    db: &DatabaseConnection,
    template: &recurring_transaction::Model,
    month: YearMonth,
) -> Result<ProjectionOutcome> {
    let due_date = match eligibility(template, month)? {
        Eligibility::Due(date) => date,
        Eligibility::Skip(outcome) => return Ok(outcome),
    };

    if db::transactions::exists_for_template_and_month(db, template.id, month).await? {
        return Ok(ProjectionOutcome::AlreadyExists);
    }

    if !db::workspaces::account_exists(db, template.workspace_id, template.account_id).await? {
        return Err(Error::AccountNotFound {
            id: template.account_id,
        });
    }

    let projection = NewProjection {
        workspace_id: template.workspace_id,
        template_id: template.id,
        name: template.name.clone(),
        amount: template.amount,
        account_id: template.account_id,
        category_id: template.category_id,
        transaction_type: template.transaction_type.parse::<TransactionType>()?,
        month,
        transaction_date: due_date,
    };

    // Zero rows means another generator covered the month since the existence check
    if db::transactions::create_generated(db, projection).await? > 0 {
        Ok(ProjectionOutcome::Generated)
    } else {
        Ok(ProjectionOutcome::AlreadyExists)
    }
}

/// Materializes one (template, month) pair, turning any error into a failed outcome.
async fn project_month(
    db: &DatabaseConnection,
    template: &recurring_transaction::Model,
    month: YearMonth,
) -> ProjectionOutcome {
    match try_project_month(db, template, month).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(
                template_id = template.id,
                %month,
                "Failed to generate projection: {e}"
            );
            ProjectionOutcome::Failed(e.to_string())
        }
    }
}

/// Walks `months` consecutive months starting at `from` for one template.
async fn project_template(
    db: &DatabaseConnection,
    template: &recurring_transaction::Model,
    from: YearMonth,
    months: u32,
    result: &mut ProjectionRunResult,
) {
    for offset in 0..months {
        let month = from.add_months(offset);
        let outcome = project_month(db, template, month).await;
        debug!(template_id = template.id, %month, ?outcome, "Projection outcome");

        let stop = outcome.ends_template();
        result.record(template, month, outcome);
        if stop {
            break;
        }
    }
}

/// Generates projections for every active template in the workspace, covering the
/// current month and the following months up to `months_ahead` in total.
///
/// # Arguments
/// * `db` - Database connection
/// * `workspace_id` - Workspace whose templates are projected
/// * `months_ahead` - Horizon in months; zero or negative uses the default of 12
///
/// # Returns
/// Counts of generated and skipped pairs plus any per-template failures
pub async fn generate_projections(
    db: &DatabaseConnection,
    workspace_id: i64,
    months_ahead: i32,
) -> Result<ProjectionRunResult> {
    generate_projections_as_of(db, workspace_id, months_ahead, Utc::now().date_naive()).await
}

/// [`generate_projections`] with an explicit current date.
#[instrument(skip(db))]
pub async fn generate_projections_as_of(
    db: &DatabaseConnection,
    workspace_id: i64,
    months_ahead: i32,
    today: NaiveDate,
) -> Result<ProjectionRunResult> {
    let months = effective_months_ahead(months_ahead);
    let from = YearMonth::from_date(today);
    let templates = db::templates::list_active_by_workspace(db, workspace_id).await?;

    let mut result = ProjectionRunResult::default();
    for template in &templates {
        project_template(db, template, from, months, &mut result).await;
    }

    info!(
        templates = templates.len(),
        generated = result.generated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "Generated projections from {from} for {months} months"
    );
    Ok(result)
}

/// Generates projections for exactly one month, for catch-up or manual re-triggers.
///
/// # Errors
/// Returns [`Error::InvalidMonth`] if `month` is not in 1..=12.
#[instrument(skip(db))]
pub async fn generate_projections_for_month(
    db: &DatabaseConnection,
    workspace_id: i64,
    year: i32,
    month: u32,
) -> Result<ProjectionRunResult> {
    let target = YearMonth::new(year, month)?;
    let templates = db::templates::list_active_by_workspace(db, workspace_id).await?;

    let mut result = ProjectionRunResult::default();
    for template in &templates {
        let outcome = project_month(db, template, target).await;
        result.record(template, target, outcome);
    }

    info!(
        generated = result.generated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "Generated projections for {target}"
    );
    Ok(result)
}

/// Replaces a template's future projections after its amount or due day changed.
///
/// Unsettled projections dated today or later are deleted and the horizon is generated
/// again from the current month. Past and settled transactions are kept. Inactive
/// templates are left untouched and produce an empty result.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if the template is not in the workspace.
pub async fn regenerate_projections_for_template(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
    months_ahead: i32,
) -> Result<ProjectionRunResult> {
    regenerate_projections_for_template_as_of(
        db,
        workspace_id,
        template_id,
        months_ahead,
        Utc::now().date_naive(),
    )
    .await
}

/// [`regenerate_projections_for_template`] with an explicit current date.
#[instrument(skip(db))]
pub async fn regenerate_projections_for_template_as_of(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
    months_ahead: i32,
    today: NaiveDate,
) -> Result<ProjectionRunResult> {
    let template = db::templates::get_by_id(db, workspace_id, template_id)
        .await?
        .ok_or(Error::TemplateNotFound { id: template_id })?;

    if !template.is_active {
        debug!(template_id, "Template inactive, nothing to regenerate");
        return Ok(ProjectionRunResult::default());
    }

    let removed = db::transactions::delete_future_for_template(db, template.id, today).await?;

    let mut result = ProjectionRunResult::default();
    project_template(
        db,
        &template,
        YearMonth::from_date(today),
        effective_months_ahead(months_ahead),
        &mut result,
    )
    .await;

    info!(
        template_id,
        removed,
        generated = result.generated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "Regenerated projections"
    );
    Ok(result)
}

/// Removes unsettled projections of a template dated after `end_date`, used when the
/// template's end date is moved earlier. Returns the number of transactions removed.
///
/// # Errors
/// Returns [`Error::TemplateNotFound`] if the template is not in the workspace.
#[instrument(skip(db))]
pub async fn cleanup_projections_beyond_end_date(
    db: &DatabaseConnection,
    workspace_id: i64,
    template_id: i64,
    end_date: NaiveDate,
) -> Result<u64> {
    let template = db::templates::get_by_id(db, workspace_id, template_id)
        .await?
        .ok_or(Error::TemplateNotFound { id: template_id })?;

    let removed = db::transactions::delete_generated_after(db, template.id, end_date).await?;
    info!(template_id, removed, "Removed projections after {end_date}");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::template::{TemplateArgs, update_template};
    use crate::test_utils::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Mid-January of a non-leap year.
    fn today() -> NaiveDate {
        date(2025, 1, 15)
    }

    #[test]
    fn test_effective_months_ahead() {
        assert_eq!(effective_months_ahead(0), 12);
        assert_eq!(effective_months_ahead(-1), 12);
        assert_eq!(effective_months_ahead(i32::MIN), 12);
        assert_eq!(effective_months_ahead(1), 1);
        assert_eq!(effective_months_ahead(24), 24);
        assert_eq!(effective_months_ahead(600), 600);
        assert_eq!(effective_months_ahead(601), 600);
        assert_eq!(effective_months_ahead(i32::MAX), 600);
    }

    #[tokio::test]
    async fn test_due_day_31_lands_on_last_day_of_february() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template = create_test_template(
            &db,
            workspace.id,
            account.id,
            "Rent",
            31,
            date(2025, 1, 1),
            None,
        )
        .await?;

        let result = generate_projections_for_month(&db, workspace.id, 2025, 2).await?;
        assert_eq!(result.generated, 1);

        let rows = db::transactions::list_for_template(&db, template.id).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_date, date(2025, 2, 28));
        assert_eq!(rows[0].projection_month.as_deref(), Some("2025-02"));
        assert_eq!(rows[0].source, "recurring");
        assert_eq!(rows[0].name, "Rent");
        assert_eq!(rows[0].amount, 15.99);
        assert_eq!(rows[0].account_id, account.id);
        assert!(!rows[0].is_settled);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_projections_covers_horizon() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template = create_test_template(
            &db,
            workspace.id,
            account.id,
            "Phone",
            15,
            date(2024, 6, 1),
            None,
        )
        .await?;

        let result = generate_projections_as_of(&db, workspace.id, 6, today()).await?;
        assert_eq!(result.generated, 6);
        assert_eq!(result.skipped, 0);
        assert!(!result.has_errors());

        let dates: Vec<NaiveDate> = db::transactions::list_for_template(&db, template.id)
            .await?
            .into_iter()
            .map(|t| t.transaction_date)
            .collect();
        let expected: Vec<NaiveDate> = (1..=6).map(|m| date(2025, m, 15)).collect();
        assert_eq!(dates, expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_projections_is_idempotent() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        create_test_template(&db, workspace.id, account.id, "Rent", 1, date(2025, 1, 1), None)
            .await?;
        create_test_template(&db, workspace.id, account.id, "Gym", 28, date(2025, 1, 1), None)
            .await?;

        let first = generate_projections_as_of(&db, workspace.id, 12, today()).await?;
        assert_eq!(first.generated, 24);
        let before = db::transactions::list_generated_for_workspace(&db, workspace.id).await?;

        let second = generate_projections_as_of(&db, workspace.id, 12, today()).await?;
        assert_eq!(second.generated, 0);
        assert_eq!(second.skipped, 24);
        let after = db::transactions::list_generated_for_workspace(&db, workspace.id).await?;

        assert_eq!(before, after);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_positive_horizon_uses_default() -> Result<()> {
        for months_ahead in [0, -1, 12] {
            let (db, workspace, account) = setup_with_account().await?;
            create_test_template(&db, workspace.id, account.id, "Rent", 1, date(2024, 1, 1), None)
                .await?;

            let result = generate_projections_as_of(&db, workspace.id, months_ahead, today()).await?;
            assert_eq!(result.generated, 12, "months_ahead = {months_ahead}");

            let rows = db::transactions::list_generated_for_workspace(&db, workspace.id).await?;
            assert_eq!(rows.first().unwrap().transaction_date, date(2025, 1, 1));
            assert_eq!(rows.last().unwrap().transaction_date, date(2025, 12, 1));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_projections_uses_current_month() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template = crate::core::template::create_template(
            &db,
            workspace.id,
            template_args("Streaming", account.id),
        )
        .await?;

        let result = generate_projections(&db, workspace.id, 3).await?;
        assert_eq!(result.generated, 3);

        let now = Utc::now().date_naive();
        let rows = db::transactions::list_for_template(&db, template.id).await?;
        assert_eq!(rows[0].transaction_date.year(), now.year());
        assert_eq!(rows[0].transaction_date.month(), now.month());
        Ok(())
    }

    #[tokio::test]
    async fn test_start_date_in_future_skips_earlier_months() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let start = date(2025, 3, 1);
        let template =
            create_test_template(&db, workspace.id, account.id, "Lease", 10, start, None).await?;

        let result = generate_projections_as_of(&db, workspace.id, 6, today()).await?;
        assert_eq!(result.generated, 4);
        assert_eq!(result.skipped, 2);

        let rows = db::transactions::list_for_template(&db, template.id).await?;
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|t| t.transaction_date >= start));
        Ok(())
    }

    #[tokio::test]
    async fn test_end_date_bounds_projections() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let end = date(2025, 3, 15);
        let early = create_test_template(
            &db,
            workspace.id,
            account.id,
            "Early",
            1,
            date(2025, 1, 1),
            Some(end),
        )
        .await?;
        let late = create_test_template(
            &db,
            workspace.id,
            account.id,
            "Late",
            20,
            date(2025, 1, 1),
            Some(end),
        )
        .await?;

        let result = generate_projections_as_of(&db, workspace.id, 12, today()).await?;

        let early_rows = db::transactions::list_for_template(&db, early.id).await?;
        let late_rows = db::transactions::list_for_template(&db, late.id).await?;
        // Current month plus two; the late template's March due date is past the end
        assert_eq!(early_rows.len(), 3);
        assert_eq!(late_rows.len(), 2);
        assert_eq!(result.generated, 5);
        // One skip per template where the walk stopped
        assert_eq!(result.skipped, 2);

        for row in early_rows.iter().chain(&late_rows) {
            assert!(row.transaction_date <= end);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_templates_never_produce_projections() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template = crate::core::template::create_template(
            &db,
            workspace.id,
            TemplateArgs {
                start_date: Some(date(2025, 1, 1)),
                is_active: Some(false),
                ..template_args("Paused", account.id)
            },
        )
        .await?;

        let result = generate_projections_as_of(&db, workspace.id, 12, today()).await?;
        assert_eq!(result, ProjectionRunResult::default());

        let result = generate_projections_for_month(&db, workspace.id, 2025, 2).await?;
        assert_eq!(result.generated, 0);

        let result =
            regenerate_projections_for_template_as_of(&db, workspace.id, template.id, 12, today())
                .await?;
        assert_eq!(result, ProjectionRunResult::default());

        assert!(db::transactions::list_for_template(&db, template.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_template_does_not_abort_batch() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let doomed_account = create_test_account(&db, workspace.id, "Closing").await?;
        let doomed = create_test_template(
            &db,
            workspace.id,
            doomed_account.id,
            "Old Card Fee",
            5,
            date(2025, 1, 1),
            None,
        )
        .await?;
        let healthy =
            create_test_template(&db, workspace.id, account.id, "Rent", 1, date(2025, 1, 1), None)
                .await?;

        crate::db::workspaces::soft_delete_account(&db, workspace.id, doomed_account.id).await?;

        let result = generate_projections_as_of(&db, workspace.id, 12, today()).await?;
        assert_eq!(result.generated, 12);
        assert_eq!(result.errors.len(), 1);

        let error = &result.errors[0];
        assert_eq!(error.template_id, doomed.id);
        assert_eq!(error.template_name, "Old Card Fee");
        assert_eq!(error.month, YearMonth::new(2025, 1).unwrap());
        assert!(error.message.contains("not found"));

        assert_eq!(db::transactions::list_for_template(&db, healthy.id).await?.len(), 12);
        assert!(db::transactions::list_for_template(&db, doomed.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_generation_is_workspace_scoped() -> Result<()> {
        let (db, home, home_account) = setup_with_account().await?;
        let office = create_test_workspace(&db, "Office").await?;
        let office_account = create_test_account(&db, office.id, "Business").await?;
        create_test_template(&db, home.id, home_account.id, "Rent", 1, date(2025, 1, 1), None)
            .await?;
        create_test_template(
            &db,
            office.id,
            office_account.id,
            "Software",
            1,
            date(2025, 1, 1),
            None,
        )
        .await?;

        generate_projections_as_of(&db, home.id, 3, today()).await?;

        assert_eq!(db::transactions::list_generated_for_workspace(&db, home.id).await?.len(), 3);
        assert!(db::transactions::list_generated_for_workspace(&db, office.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_generation_does_not_duplicate() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        create_test_template(&db, workspace.id, account.id, "Rent", 1, date(2025, 1, 1), None)
            .await?;

        let (a, b) = tokio::join!(
            generate_projections_as_of(&db, workspace.id, 12, today()),
            generate_projections_as_of(&db, workspace.id, 12, today()),
        );
        let (a, b) = (a?, b?);

        assert_eq!(a.generated + b.generated, 12);
        assert_eq!(a.skipped + b.skipped, 12);
        let rows = db::transactions::list_generated_for_workspace(&db, workspace.id).await?;
        assert_eq!(rows.len(), 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_for_month_rejects_invalid_month() -> Result<()> {
        let (db, workspace, _) = setup_with_account().await?;
        let result = generate_projections_for_month(&db, workspace.id, 2025, 13).await;
        assert!(matches!(result, Err(Error::InvalidMonth { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_for_month_respects_window() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        create_test_template(
            &db,
            workspace.id,
            account.id,
            "Course",
            10,
            date(2025, 3, 1),
            Some(date(2025, 5, 31)),
        )
        .await?;

        let before = generate_projections_for_month(&db, workspace.id, 2025, 2).await?;
        let inside = generate_projections_for_month(&db, workspace.id, 2025, 4).await?;
        let again = generate_projections_for_month(&db, workspace.id, 2025, 4).await?;
        let after = generate_projections_for_month(&db, workspace.id, 2025, 6).await?;

        assert_eq!((before.generated, before.skipped), (0, 1));
        assert_eq!((inside.generated, inside.skipped), (1, 0));
        assert_eq!((again.generated, again.skipped), (0, 1));
        assert_eq!((after.generated, after.skipped), (0, 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_regenerate_replaces_future_projections_only() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template =
            create_test_template(&db, workspace.id, account.id, "Rent", 5, date(2025, 1, 1), None)
                .await?;
        generate_projections_as_of(&db, workspace.id, 6, today()).await?;

        // Settle March; settled rows survive regeneration
        let march = db::transactions::list_for_template(&db, template.id)
            .await?
            .into_iter()
            .find(|t| t.transaction_date == date(2025, 3, 5))
            .unwrap();
        settle_transaction(&db, march).await?;

        update_template(
            &db,
            workspace.id,
            template.id,
            TemplateArgs {
                amount: 1200.0,
                due_day: Some(20),
                ..template_args("Rent", account.id)
            },
        )
        .await?;

        let result =
            regenerate_projections_for_template_as_of(&db, workspace.id, template.id, 6, today())
                .await?;
        // January 5th is already past and March is settled
        assert_eq!(result.generated, 4);
        assert_eq!(result.skipped, 2);

        let rows = db::transactions::list_for_template(&db, template.id).await?;
        assert_eq!(rows.len(), 6);
        let summary: Vec<(NaiveDate, f64)> =
            rows.iter().map(|t| (t.transaction_date, t.amount)).collect();
        assert_eq!(
            summary,
            vec![
                (date(2025, 1, 5), 15.99),
                (date(2025, 2, 20), 1200.0),
                (date(2025, 3, 5), 15.99),
                (date(2025, 4, 20), 1200.0),
                (date(2025, 5, 20), 1200.0),
                (date(2025, 6, 20), 1200.0),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_regenerate_unknown_template() -> Result<()> {
        let (db, workspace, _) = setup_with_account().await?;
        let result = regenerate_projections_for_template(&db, workspace.id, 42, 12).await;
        assert!(matches!(result, Err(Error::TemplateNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_removes_unsettled_projections_after_end_date() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template =
            create_test_template(&db, workspace.id, account.id, "Gym", 10, date(2025, 1, 1), None)
                .await?;
        let other =
            create_test_template(&db, workspace.id, account.id, "Rent", 1, date(2025, 1, 1), None)
                .await?;
        generate_projections_as_of(&db, workspace.id, 12, today()).await?;

        let june = db::transactions::list_for_template(&db, template.id)
            .await?
            .into_iter()
            .find(|t| t.transaction_date == date(2025, 6, 10))
            .unwrap();
        settle_transaction(&db, june).await?;

        let removed =
            cleanup_projections_beyond_end_date(&db, workspace.id, template.id, date(2025, 4, 30))
                .await?;
        // May through December minus the settled June row
        assert_eq!(removed, 7);

        let remaining: Vec<NaiveDate> = db::transactions::list_for_template(&db, template.id)
            .await?
            .into_iter()
            .map(|t| t.transaction_date)
            .collect();
        assert_eq!(
            remaining,
            vec![
                date(2025, 1, 10),
                date(2025, 2, 10),
                date(2025, 3, 10),
                date(2025, 4, 10),
                date(2025, 6, 10),
            ]
        );
        assert_eq!(db::transactions::list_for_template(&db, other.id).await?.len(), 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_is_workspace_scoped() -> Result<()> {
        let (db, workspace, account) = setup_with_account().await?;
        let template =
            create_test_template(&db, workspace.id, account.id, "Gym", 10, date(2025, 1, 1), None)
                .await?;
        let other = create_test_workspace(&db, "Other").await?;

        let result =
            cleanup_projections_beyond_end_date(&db, other.id, template.id, date(2025, 4, 30))
                .await;
        assert!(matches!(result, Err(Error::TemplateNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_run_result_display_and_merge() {
        let mut result = ProjectionRunResult {
            generated: 3,
            skipped: 1,
            errors: vec![],
        };
        result.merge(ProjectionRunResult {
            generated: 2,
            skipped: 0,
            errors: vec![ProjectionError {
                template_id: 7,
                template_name: "Insurance".to_string(),
                month: YearMonth::new(2025, 4).unwrap(),
                message: "Account 3 not found".to_string(),
            }],
        });

        assert_eq!(result.generated, 5);
        assert_eq!(result.skipped, 1);
        assert!(result.has_errors());
        assert_eq!(
            result.to_string(),
            "generated 5, skipped 1, errors 1\n  template 7 (Insurance) 2025-04: Account 3 not found"
        );
    }
}
