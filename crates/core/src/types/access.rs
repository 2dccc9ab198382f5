//! Access classification for console routes.

use serde::{Deserialize, Serialize};

/// Minimum role class a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Reachable only while signed out (the login screen).
    Public,
    /// Requires any privileged session. Unknown routes default here.
    #[default]
    Privileged,
    /// Requires a super admin session.
    SuperOnly,
}

/// Outcome of evaluating a route against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessDecision {
    /// Render the requested route.
    Allow,
    /// Send the visitor to the login screen.
    RedirectToLogin,
    /// Send the visitor to the dashboard.
    RedirectToHome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_routes_default_to_privileged() {
        assert_eq!(RouteClass::default(), RouteClass::Privileged);
    }

    #[test]
    fn test_route_class_serde() {
        assert_eq!(
            serde_json::to_string(&RouteClass::SuperOnly).expect("serialize"),
            "\"super_only\""
        );
    }
}
