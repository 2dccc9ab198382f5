//! Role store boundary.

use thiserror::Error;

use verdin_core::{Role, UserId};

/// Errors from the role store.
#[derive(Debug, Error)]
pub enum RoleStoreError {
    /// The lookup failed (network, store outage).
    #[error("role lookup failed: {0}")]
    Lookup(String),

    /// No role row exists for the identity.
    #[error("no role recorded for identity")]
    NotFound,
}

/// Read-only mapping from identity to role.
///
/// Role rows are mutated by an external administrative process; the console
/// core only ever reads them. Implementations are expected to collapse
/// non-staff account types to [`Role::None`] (the wire parsing in
/// `verdin-core` does this for string-typed stores).
pub trait RoleStore {
    /// Look up the role recorded for an identity.
    ///
    /// # Errors
    ///
    /// Returns [`RoleStoreError`] if the row cannot be fetched. The resolver
    /// treats any error the same as a non-privileged role: eviction.
    async fn role_of(&self, identity: &UserId) -> Result<Role, RoleStoreError>;
}
