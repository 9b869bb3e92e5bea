//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::template::{self, TemplateArgs},
    db, entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber that writes through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a workspace with the given name.
pub async fn create_test_workspace(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::workspace::Model> {
    db::workspaces::create_workspace(db, name).await
}

/// Creates an account in `workspace_id`.
pub async fn create_test_account(
    db: &DatabaseConnection,
    workspace_id: i64,
    name: &str,
) -> Result<entities::account::Model> {
    db::workspaces::create_account(db, workspace_id, name).await
}

/// Template arguments with sensible defaults.
///
/// # Defaults
/// * `amount`: 15.99
/// * `transaction_type`: "expense"
/// * `frequency`: "monthly"
/// * `due_day`: 1
/// * no category, start date, end date or active flag
pub fn template_args(name: &str, account_id: i64) -> TemplateArgs {
    TemplateArgs {
        name: name.to_string(),
        amount: 15.99,
        account_id,
        transaction_type: "expense".to_string(),
        category_id: None,
        frequency: "monthly".to_string(),
        due_day: Some(1),
        start_date: None,
        end_date: None,
        is_active: None,
    }
}

/// Creates an active monthly template through the template service.
pub async fn create_test_template(
    db: &DatabaseConnection,
    workspace_id: i64,
    account_id: i64,
    name: &str,
    due_day: i32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<entities::recurring_transaction::Model> {
    template::create_template(
        db,
        workspace_id,
        TemplateArgs {
            due_day: Some(due_day),
            start_date: Some(start_date),
            end_date,
            ..template_args(name, account_id)
        },
    )
    .await
}

/// Marks a transaction as settled, as the settlement bookkeeping would.
pub async fn settle_transaction(
    db: &DatabaseConnection,
    transaction: entities::transaction::Model,
) -> Result<entities::transaction::Model> {
    let mut active = transaction.into_active_model();
    active.is_settled = Set(true);
    active.update(db).await.map_err(Into::into)
}

/// Sets up a database with one workspace and one account.
/// Returns (db, workspace, account) for common test scenarios.
pub async fn setup_with_account() -> Result<(
    DatabaseConnection,
    entities::workspace::Model,
    entities::account::Model,
)> {
    let db = setup_test_db().await?;
    let workspace = create_test_workspace(&db, "Household").await?;
    let account = create_test_account(&db, workspace.id, "Checking").await?;
    Ok((db, workspace, account))
}
