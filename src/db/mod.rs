//! Store layer - the persistence interfaces the engine consumes.
//!
//! Each submodule is a narrow set of async functions over any `SeaORM`
//! [`ConnectionTrait`](sea_orm::ConnectionTrait), scoped by workspace id.

/// Template Store
pub mod templates;
/// Transaction Store
pub mod transactions;
/// Workspace Directory and account/category lookups
pub mod workspaces;

pub use transactions::NewProjection;
pub use workspaces::list_all_workspace_ids;
