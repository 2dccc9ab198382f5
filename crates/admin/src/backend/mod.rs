//! Collaborator traits the engine is generic over.
//!
//! The console core never talks to the hosted backend directly: credential
//! state, role rows, the message log, and the push transport all sit behind
//! these traits. Production wires them to the hosted services; tests wire
//! them to the in-memory fakes in the integration-tests crate.

pub mod identity;
pub mod messages;
pub mod push;
pub mod roles;

pub use identity::{IdentityError, IdentityProvider};
pub use messages::{MessageStore, MessageStoreError};
pub use push::{PushError, PushSubscription, PushTransport, SubscriptionId};
pub use roles::{RoleStore, RoleStoreError};
