use crate::error::AppResult;
use crate::models::{AttributeCatalog, DeclaredKey, EvaluationContext, UserRecord};
use async_trait::async_trait;

pub mod in_memory;

pub use in_memory::InMemoryStore;

/// Source of the user records a query runs over
///
/// Enumeration order is irrelevant to callers: the query engine applies its
/// own stable sort after filtering.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Every user record, in any order
    async fn list_all(&self) -> AppResult<Vec<UserRecord>>;

    /// Snapshot of the declared dynamic attributes and tags with their
    /// permission flags. Taken once per request.
    async fn catalog(&self) -> AppResult<AttributeCatalog>;
}

/// Per-attribute / per-tag authorization for a caller
pub trait PermissionOracle: Send + Sync {
    fn can_view(&self, ctx: &EvaluationContext, key: DeclaredKey<'_>) -> bool;

    /// Not consulted by queries; part of the same contract the editing
    /// code relies on.
    fn can_edit(&self, ctx: &EvaluationContext, key: DeclaredKey<'_>) -> bool;
}

/// Flag-based policy: access is allowed when the declaration does not
/// require a superuser, or when the caller is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuperuserPolicy;

impl PermissionOracle for SuperuserPolicy {
    fn can_view(&self, ctx: &EvaluationContext, key: DeclaredKey<'_>) -> bool {
        !key.view_requires_superuser() || ctx.is_superuser
    }

    fn can_edit(&self, ctx: &EvaluationContext, key: DeclaredKey<'_>) -> bool {
        !key.edit_requires_superuser() || ctx.is_superuser
    }
}
