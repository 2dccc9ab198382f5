//! Session types for console authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdin_core::{Role, UserId};

/// A fully resolved console session.
///
/// Only ever constructed for privileged roles; a credential that resolves to
/// anything else is evicted by the resolver and never becomes a `Session`.
/// Sessions are process-local and recomputed on every navigation, so the
/// struct carries no persistence concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Identity of the signed-in staff member.
    pub identity: UserId,
    /// Privileged role the role store reported for this identity.
    pub role: Role,
    /// When this resolution cycle completed.
    pub resolved_at: DateTime<Utc>,
}

impl Session {
    /// Whether this session may enter super-admin-only routes.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// Change notification from the identity provider's own state feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A credential became available; the gate should re-resolve.
    SignedIn,
    /// The credential was invalidated; any held session is stale.
    SignedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_check() {
        let session = Session {
            identity: UserId::new("admin-1"),
            role: Role::Admin,
            resolved_at: Utc::now(),
        };
        assert!(!session.is_super_admin());

        let session = Session {
            role: Role::SuperAdmin,
            ..session
        };
        assert!(session.is_super_admin());
    }
}
