//! Core types for Verdin.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod access;
pub mod conversation;
pub mod id;
pub mod role;

pub use access::{AccessDecision, RouteClass};
pub use conversation::ConversationKey;
pub use id::*;
pub use role::Role;
