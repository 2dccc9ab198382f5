//! Message store boundary.

use thiserror::Error;

use verdin_core::{ConversationKey, UserId};

use crate::models::Message;

/// Errors from the message store.
#[derive(Debug, Error)]
pub enum MessageStoreError {
    /// The query or write failed (network, store outage).
    #[error("message store error: {0}")]
    Store(String),

    /// A row came back in a shape the store contract forbids.
    #[error("invalid message row: {0}")]
    InvalidRow(String),
}

/// Durable append-only log of conversation messages.
///
/// Messages are never deleted or edited through this boundary. A successful
/// insert is expected to echo back through the push transport; the channel
/// relies on that echo rather than mutating its transcript on write.
pub trait MessageStore {
    /// All messages for one conversation, ordered ascending by creation
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the query fails.
    async fn list_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Vec<Message>, MessageStoreError>;

    /// Append a message and return it with its server-assigned ID and
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError`] if the write fails. Nothing is
    /// committed on failure.
    async fn insert_message(
        &self,
        sender: &UserId,
        recipient: &UserId,
        body: &str,
    ) -> Result<Message, MessageStoreError>;
}
