//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Identity and message IDs are opaque strings assigned by external
/// collaborators (the identity provider and the message store), so the
/// wrapper holds a `String` rather than a numeric key.
///
/// Creates a newtype wrapper with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>`, and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use verdin_core::define_id;
/// define_id!(UserId);
/// define_id!(MessageId);
///
/// let user_id = UserId::new("c0ffee");
/// let message_id = MessageId::new("c0ffee");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = message_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(MessageId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_as_str() {
        let id = UserId::new("admin-1");
        assert_eq!(id.as_str(), "admin-1");
        assert_eq!(id.to_string(), "admin-1");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = MessageId::new("m-42");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"m-42\"");

        let back: MessageId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_conversions() {
        let id: UserId = "seller-1".into();
        let s: String = id.clone().into();
        assert_eq!(s, "seller-1");
        assert_eq!(UserId::from(String::from("seller-1")), id);
    }

    #[test]
    fn test_id_ordering() {
        assert!(MessageId::new("a") < MessageId::new("b"));
    }
}
