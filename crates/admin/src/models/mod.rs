//! Domain models for the admin console core.

pub mod chat;
pub mod route;
pub mod session;

pub use chat::{Message, PushEvent, Transcript};
pub use route::RoutePolicy;
pub use session::{AuthEvent, Session};
