//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The composite unique index that makes
//! projection inserts idempotent is created alongside the tables.

use crate::entities::{Account, Category, RecurringTransaction, Transaction, Workspace, transaction};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://recurbook.sqlite?mode=rwc";

/// Name of the unique index over `(template_id, projection_month)`.
pub const PROJECTION_UNIQUE_INDEX: &str = "idx_transactions_template_projection_month";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Tables are created in dependency order: workspaces, accounts, categories, recurring
/// transactions, then transactions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Workspace),
        schema.create_table_from_entity(Account),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(RecurringTransaction),
        schema.create_table_from_entity(Transaction),
    ];
    for mut table in tables {
        let statement = table.if_not_exists().to_owned();
        db.execute(builder.build(&statement)).await?;
    }

    let projection_index = Index::create()
        .name(PROJECTION_UNIQUE_INDEX)
        .table(Transaction)
        .col(transaction::Column::TemplateId)
        .col(transaction::Column::ProjectionMonth)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&projection_index)).await?;

    info!("Database tables ensured");
    Ok(())
}
