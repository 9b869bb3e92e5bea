//! Core business logic - framework-agnostic template and projection operations.

/// Calendar month arithmetic and due-date clamping
pub mod calendar;
/// Projection generator
pub mod projection;
/// Recurring template service
pub mod template;

pub use calendar::{YearMonth, calculate_actual_due_date};
pub use projection::{
    ProjectionError, ProjectionOutcome, ProjectionRunResult, cleanup_projections_beyond_end_date,
    generate_projections, generate_projections_for_month, regenerate_projections_for_template,
};
pub use template::{
    TemplateArgs, create_template, delete_template, get_template_by_id, list_templates,
    update_template,
};
