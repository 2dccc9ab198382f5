//! Identity provider boundary.

use thiserror::Error;

use verdin_core::UserId;

/// Errors from the identity provider.
///
/// The resolver recovers every one of these into "no session" — they exist
/// so call sites can log what actually happened.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The credential could not be fetched (network, provider outage).
    #[error("credential fetch failed: {0}")]
    Fetch(String),

    /// The credential could not be invalidated.
    #[error("credential invalidation failed: {0}")]
    Invalidate(String),
}

/// The external identity provider holding the opaque session credential.
///
/// Credential issuance (the login flow itself) lives entirely on the other
/// side of this trait.
pub trait IdentityProvider {
    /// The identity attached to the current credential, if one is held.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Fetch`] if the provider cannot be reached.
    async fn current_identity(&self) -> Result<Option<UserId>, IdentityError>;

    /// Invalidate the current credential (sign out).
    ///
    /// Must be idempotent: invalidating an absent credential is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Invalidate`] if the provider cannot be
    /// reached.
    async fn invalidate_credential(&self) -> Result<(), IdentityError>;
}
