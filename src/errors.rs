//! Unified error types for the projection engine.
//!
//! Validation and not-found errors are returned synchronously to the caller and are
//! never retried. Database errors are wrapped so every public operation returns the
//! same `Result` type.

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Template name was empty after trimming
    #[error("Template name cannot be empty")]
    EmptyName,

    /// Template name exceeded the maximum length
    #[error("Template name is {length} characters long, the maximum is {max}")]
    NameTooLong { length: usize, max: usize },

    /// Amount was zero, negative or not a finite number
    #[error("Invalid amount: {amount}. Amount must be a positive number")]
    InvalidAmount { amount: f64 },

    /// Transaction type was not `income` or `expense`
    #[error("Invalid transaction type '{value}'. Expected 'income' or 'expense'")]
    InvalidTransactionType { value: String },

    /// Frequency other than `monthly`
    #[error("Invalid frequency '{value}'. Only 'monthly' is supported")]
    InvalidFrequency { value: String },

    /// Due day outside of 1..=31
    #[error("Invalid due day {day}. Due day must be between 1 and 31")]
    InvalidDueDay { day: i32 },

    /// Year/month pair that does not name a calendar month
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    /// End date before the start date
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Recurring transaction {id} not found")]
    TemplateNotFound { id: i64 },

    #[error("Account {id} not found")]
    AccountNotFound { id: i64 },

    #[error("Category {id} not found")]
    CategoryNotFound { id: i64 },

    #[error("Workspace {id} not found")]
    WorkspaceNotFound { id: i64 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true for errors caused by invalid caller input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyName
                | Self::NameTooLong { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidTransactionType { .. }
                | Self::InvalidFrequency { .. }
                | Self::InvalidDueDay { .. }
                | Self::InvalidMonth { .. }
                | Self::InvalidDateRange { .. }
        )
    }

    /// Returns true when a referenced record does not exist in the workspace.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. }
                | Self::AccountNotFound { .. }
                | Self::CategoryNotFound { .. }
                | Self::WorkspaceNotFound { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
