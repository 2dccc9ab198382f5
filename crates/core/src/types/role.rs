//! Staff roles with different permission levels.

use serde::{Deserialize, Serialize};

/// Role attached to an identity, as recorded by the role store.
///
/// Only `Admin` and `SuperAdmin` are permitted to hold a console session.
/// Every other account type in the marketplace (customers, sellers, unknown
/// values from newer schema revisions) collapses to `None` at the boundary,
/// so the gate never has to reason about non-staff role values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to all console features including staff management.
    SuperAdmin,
    /// Full access to the day-to-day console features.
    Admin,
    /// Not a staff account. Never holds a session.
    #[default]
    #[serde(other)]
    None,
}

impl Role {
    /// Whether this role is allowed to hold a console session.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "SUPER_ADMIN"),
            Self::Admin => write!(f, "ADMIN"),
            Self::None => write!(f, "NONE"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    /// Parses a role store value. Unrecognized values are `Role::None`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SUPER_ADMIN" => Self::SuperAdmin,
            "ADMIN" => Self::Admin,
            _ => Self::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_roles() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::SuperAdmin.is_privileged());
        assert!(!Role::None.is_privileged());
    }

    #[test]
    fn test_parse_known_values() {
        assert_eq!("ADMIN".parse::<Role>().expect("infallible"), Role::Admin);
        assert_eq!(
            "SUPER_ADMIN".parse::<Role>().expect("infallible"),
            Role::SuperAdmin
        );
    }

    #[test]
    fn test_unknown_values_collapse_to_none() {
        for value in ["CUSTOMER", "SELLER", "", "admin", "MODERATOR"] {
            assert_eq!(value.parse::<Role>().expect("infallible"), Role::None);
        }
    }

    #[test]
    fn test_serde_wire_values() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).expect("serialize"),
            "\"SUPER_ADMIN\""
        );

        let role: Role = serde_json::from_str("\"ADMIN\"").expect("deserialize");
        assert_eq!(role, Role::Admin);

        // Unknown wire values deserialize to None rather than failing
        let role: Role = serde_json::from_str("\"SELLER\"").expect("deserialize");
        assert_eq!(role, Role::None);
    }

    #[test]
    fn test_display_round_trips() {
        for role in [Role::SuperAdmin, Role::Admin, Role::None] {
            let parsed: Role = role.to_string().parse().expect("infallible");
            assert_eq!(parsed, role);
        }
    }
}
