//! Verdin Core - Shared types library.
//!
//! This crate provides common types used across all Verdin components:
//! - `admin` - Access gate and conversation channel engine
//! - `integration-tests` - Cross-component scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, roles, conversation keys,
//!   and access decisions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
