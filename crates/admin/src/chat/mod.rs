//! Conversation channel: backfill, live merge, send.

mod channel;
mod error;

pub use channel::ConversationChannel;
pub use error::{BackfillError, SendError};
