//! Route access gate.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, instrument};

use verdin_core::{AccessDecision, RouteClass};

use crate::auth::SessionResolver;
use crate::backend::{IdentityProvider, RoleStore};
use crate::config::AdminConfig;
use crate::models::{AuthEvent, RoutePolicy, Session};

/// Observable gate state, re-entered on every navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// A resolution for the current route is still in flight. Protected
    /// content must not render in this state.
    #[default]
    Unknown,
    /// The current route may render.
    Allowed,
    /// The visitor is being sent to the login screen.
    BlockedLogin,
    /// The visitor is being sent to the dashboard.
    BlockedHome,
}

/// Outcome of evaluating one navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The evaluation completed while its route was still current.
    Decided {
        decision: AccessDecision,
        /// Where to send the visitor, for the two redirect decisions.
        redirect_to: Option<String>,
    },
    /// Another navigation started before resolution finished; this outcome
    /// carries no decision and must not trigger a redirect.
    Superseded,
}

/// The access decision as a pure function of route class and session.
#[must_use]
pub fn decide(class: RouteClass, session: Option<&Session>) -> AccessDecision {
    match class {
        // A signed-in staff member never sees public-only screens.
        RouteClass::Public => {
            if session.is_some() {
                AccessDecision::RedirectToHome
            } else {
                AccessDecision::Allow
            }
        }
        RouteClass::Privileged => {
            if session.is_some() {
                AccessDecision::Allow
            } else {
                AccessDecision::RedirectToLogin
            }
        }
        RouteClass::SuperOnly => match session {
            None => AccessDecision::RedirectToLogin,
            Some(session) if session.is_super_admin() => AccessDecision::Allow,
            Some(_) => AccessDecision::RedirectToHome,
        },
    }
}

/// Navigation-triggered state machine deciding render vs redirect.
///
/// Each call to [`AccessGate::evaluate`] is a fresh transition: it stamps a
/// navigation sequence number, resolves the session, and publishes a decision
/// only if no newer navigation has started in the meantime (last route wins).
/// A stale resolution is discarded on arrival, so a redirect can never fire
/// for a route the visitor has already left.
pub struct AccessGate<I, R> {
    resolver: SessionResolver<I, R>,
    policy: RoutePolicy,
    login_route: String,
    home_route: String,
    nav_seq: AtomicU64,
    state: watch::Sender<GateState>,
    session: watch::Sender<Option<Session>>,
}

impl<I, R> AccessGate<I, R>
where
    I: IdentityProvider,
    R: RoleStore,
{
    /// Create a gate over the given collaborators and route policy.
    pub fn new(identity: I, roles: R, policy: RoutePolicy, config: &AdminConfig) -> Self {
        Self {
            resolver: SessionResolver::new(identity, roles, config),
            policy,
            login_route: config.login_route.clone(),
            home_route: config.home_route.clone(),
            nav_seq: AtomicU64::new(0),
            state: watch::Sender::new(GateState::Unknown),
            session: watch::Sender::new(None),
        }
    }

    /// Evaluate a navigation event.
    ///
    /// Suspends on session resolution; while suspended the observable state
    /// is [`GateState::Unknown`]. If another evaluation begins before this
    /// one completes, the stale one returns [`GateOutcome::Superseded`] and
    /// publishes nothing.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, route: &str) -> GateOutcome {
        let token = self.nav_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(GateState::Unknown);

        let class = self.policy.classify(route);
        let session = self.resolver.resolve().await;

        if self.nav_seq.load(Ordering::SeqCst) != token {
            debug!(route, "navigation superseded before resolution completed");
            return GateOutcome::Superseded;
        }

        let decision = decide(class, session.as_ref());
        self.session.send_replace(session);
        self.state.send_replace(match decision {
            AccessDecision::Allow => GateState::Allowed,
            AccessDecision::RedirectToLogin => GateState::BlockedLogin,
            AccessDecision::RedirectToHome => GateState::BlockedHome,
        });

        let redirect_to = match decision {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToLogin => Some(self.login_route.clone()),
            AccessDecision::RedirectToHome => Some(self.home_route.clone()),
        };
        debug!(route, ?decision, "navigation decided");
        GateOutcome::Decided {
            decision,
            redirect_to,
        }
    }

    /// Apply a change notification from the identity provider's state feed.
    ///
    /// `SignedIn` re-runs resolution (with the same eviction invariant);
    /// `SignedOut` drops the held session. Neither interferes with an
    /// in-flight navigation's supersession accounting.
    pub async fn apply_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn => {
                let session = self.resolver.resolve().await;
                self.session.send_replace(session);
            }
            AuthEvent::SignedOut => {
                self.session.send_replace(None);
                self.state.send_replace(GateState::Unknown);
            }
        }
    }

    /// Sign out: invalidate the credential and drop the session.
    pub async fn sign_out(&self) {
        self.resolver.sign_out().await;
        self.session.send_replace(None);
        self.state.send_replace(GateState::Unknown);
    }

    /// The current observable gate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Subscribe to gate state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// The most recently resolved session, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Whether the held session is super admin.
    ///
    /// Feature-hiding convenience for the UI; the enforced boundary is
    /// [`AccessGate::evaluate`].
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(Session::is_super_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verdin_core::{Role, UserId};

    fn session(role: Role) -> Session {
        Session {
            identity: UserId::new("admin-1"),
            role,
            resolved_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_route_redirects_signed_in_visitors_home() {
        let s = session(Role::Admin);
        assert_eq!(
            decide(RouteClass::Public, Some(&s)),
            AccessDecision::RedirectToHome
        );
        assert_eq!(decide(RouteClass::Public, None), AccessDecision::Allow);
    }

    #[test]
    fn test_privileged_route_requires_session() {
        let s = session(Role::Admin);
        assert_eq!(decide(RouteClass::Privileged, Some(&s)), AccessDecision::Allow);
        assert_eq!(
            decide(RouteClass::Privileged, None),
            AccessDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_super_only_route_demands_super_admin() {
        assert_eq!(
            decide(RouteClass::SuperOnly, None),
            AccessDecision::RedirectToLogin
        );
        assert_eq!(
            decide(RouteClass::SuperOnly, Some(&session(Role::Admin))),
            AccessDecision::RedirectToHome
        );
        assert_eq!(
            decide(RouteClass::SuperOnly, Some(&session(Role::SuperAdmin))),
            AccessDecision::Allow
        );
    }
}
