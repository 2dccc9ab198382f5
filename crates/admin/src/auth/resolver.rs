//! Session resolution against the identity provider and role store.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::backend::{IdentityProvider, RoleStore};
use crate::config::AdminConfig;
use crate::models::Session;

/// Turns the raw credential plus a role lookup into a typed [`Session`].
///
/// The one invariant this type exists to hold: a credential that resolves to
/// a non-privileged or unknown role never produces a usable session. It is
/// evicted, not downgraded. Callers only ever observe `Some(session)` or
/// `None`; the distinction between "no credential", "provider error", and
/// "role rejected" lives in the logs.
pub struct SessionResolver<I, R> {
    identity: I,
    roles: R,
    timeout: Duration,
}

impl<I, R> SessionResolver<I, R>
where
    I: IdentityProvider,
    R: RoleStore,
{
    /// Create a resolver over the given collaborators.
    pub fn new(identity: I, roles: R, config: &AdminConfig) -> Self {
        Self {
            identity,
            roles,
            timeout: config.resolve_timeout,
        }
    }

    /// Run one resolution cycle.
    ///
    /// Returns `None` when no credential is held, when the provider or the
    /// role store fails, or when the role is not privileged. The two latter
    /// cases additionally invalidate the credential, exactly once per cycle;
    /// a later cycle sees no credential and is side-effect free.
    #[instrument(skip_all)]
    pub async fn resolve(&self) -> Option<Session> {
        let identity = match tokio::time::timeout(self.timeout, self.identity.current_identity())
            .await
        {
            Ok(Ok(Some(identity))) => identity,
            Ok(Ok(None)) => {
                debug!("no credential held");
                return None;
            }
            Ok(Err(error)) => {
                warn!(%error, "credential fetch failed; treating as signed out");
                return None;
            }
            Err(_) => {
                warn!("credential fetch timed out; treating as signed out");
                return None;
            }
        };

        let role = match tokio::time::timeout(self.timeout, self.roles.role_of(&identity)).await {
            Ok(Ok(role)) => role,
            Ok(Err(error)) => {
                warn!(%identity, %error, reason = "role_lookup_failed", "evicting credential");
                self.sign_out().await;
                return None;
            }
            Err(_) => {
                warn!(%identity, reason = "role_lookup_failed", "role lookup timed out; evicting credential");
                self.sign_out().await;
                return None;
            }
        };

        if !role.is_privileged() {
            warn!(%identity, reason = "role_not_privileged", "evicting credential");
            self.sign_out().await;
            return None;
        }

        debug!(%identity, %role, "session resolved");
        Some(Session {
            identity,
            role,
            resolved_at: Utc::now(),
        })
    }

    /// Invalidate the current credential.
    ///
    /// Failures are logged and swallowed: a provider that cannot be reached
    /// for invalidation still must not yield a session, and the next
    /// resolution cycle fails closed regardless.
    pub async fn sign_out(&self) {
        if let Err(error) = self.identity.invalidate_credential().await {
            warn!(%error, "credential invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{IdentityError, RoleStoreError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use verdin_core::{Role, UserId};

    #[derive(Clone, Default)]
    struct StubIdentity {
        current: Arc<Mutex<Option<UserId>>>,
        fail_fetch: bool,
        invalidations: Arc<AtomicUsize>,
    }

    impl IdentityProvider for StubIdentity {
        async fn current_identity(&self) -> Result<Option<UserId>, IdentityError> {
            if self.fail_fetch {
                return Err(IdentityError::Fetch("provider unreachable".into()));
            }
            Ok(self.current.lock().expect("identity lock").clone())
        }

        async fn invalidate_credential(&self) -> Result<(), IdentityError> {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            *self.current.lock().expect("identity lock") = None;
            Ok(())
        }
    }

    #[derive(Clone)]
    struct StubRoles {
        role: Result<Role, ()>,
    }

    impl RoleStore for StubRoles {
        async fn role_of(&self, _identity: &UserId) -> Result<Role, RoleStoreError> {
            self.role
                .map_err(|()| RoleStoreError::Lookup("store unreachable".into()))
        }
    }

    fn signed_in(role: Result<Role, ()>) -> (StubIdentity, SessionResolver<StubIdentity, StubRoles>) {
        let identity = StubIdentity {
            current: Arc::new(Mutex::new(Some(UserId::new("admin-1")))),
            ..StubIdentity::default()
        };
        let resolver = SessionResolver::new(
            identity.clone(),
            StubRoles { role },
            &AdminConfig::default(),
        );
        (identity, resolver)
    }

    #[tokio::test]
    async fn test_privileged_roles_resolve() {
        for role in [Role::Admin, Role::SuperAdmin] {
            let (identity, resolver) = signed_in(Ok(role));
            let session = resolver.resolve().await.expect("session");
            assert_eq!(session.identity, UserId::new("admin-1"));
            assert_eq!(session.role, role);
            assert_eq!(identity.invalidations.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_non_privileged_role_evicts_exactly_once() {
        let (identity, resolver) = signed_in(Ok(Role::None));

        assert!(resolver.resolve().await.is_none());
        assert_eq!(identity.invalidations.load(Ordering::SeqCst), 1);

        // The credential is gone now; repeat resolutions stay absent with
        // no further side effects.
        assert!(resolver.resolve().await.is_none());
        assert_eq!(identity.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_role_lookup_error_evicts() {
        let (identity, resolver) = signed_in(Err(()));
        assert!(resolver.resolve().await.is_none());
        assert_eq!(identity.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credential_fetch_error_is_absent_without_eviction() {
        let identity = StubIdentity {
            fail_fetch: true,
            ..StubIdentity::default()
        };
        let resolver = SessionResolver::new(
            identity.clone(),
            StubRoles {
                role: Ok(Role::Admin),
            },
            &AdminConfig::default(),
        );

        assert!(resolver.resolve().await.is_none());
        assert_eq!(identity.invalidations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_credential_is_absent() {
        let identity = StubIdentity::default();
        let resolver = SessionResolver::new(
            identity.clone(),
            StubRoles {
                role: Ok(Role::Admin),
            },
            &AdminConfig::default(),
        );
        assert!(resolver.resolve().await.is_none());
        assert_eq!(identity.invalidations.load(Ordering::SeqCst), 0);
    }
}
