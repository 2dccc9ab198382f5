//! Chat domain models for staff/seller conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdin_core::{ConversationKey, MessageId, UserId};

/// A message in a two-party conversation.
///
/// Immutable once created, except for the `read` flag which the backend may
/// flip out of band. Which side of the screen a message renders on is always
/// derived from [`Message::is_from`], never from a stored role label: either
/// participant can occupy the sender column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned unique ID.
    pub id: MessageId,
    /// Identity that wrote the message.
    pub sender_id: UserId,
    /// Identity the message was addressed to.
    pub recipient_id: UserId,
    /// Message text.
    pub body: String,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient has seen the message.
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// The conversation this message belongs to.
    #[must_use]
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.sender_id.clone(), self.recipient_id.clone())
    }

    /// Whether the given viewer wrote this message ("mine" vs "theirs").
    #[must_use]
    pub fn is_from(&self, viewer: &UserId) -> bool {
        &self.sender_id == viewer
    }
}

/// A message event as delivered by the push transport.
///
/// The subscription is broad (the whole message resource), so events are
/// validated here at the boundary and then membership-filtered by the
/// channel. `read` is optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl PushEvent {
    /// Whether this event belongs to the conversation identified by `key`,
    /// in either orientation.
    #[must_use]
    pub fn belongs_to(&self, key: &ConversationKey) -> bool {
        key.matches_pair(&self.sender_id, &self.recipient_id)
    }
}

impl From<PushEvent> for Message {
    fn from(event: PushEvent) -> Self {
        Self {
            id: event.id,
            sender_id: event.sender_id,
            recipient_id: event.recipient_id,
            body: event.body,
            created_at: event.created_at,
            read: event.read,
        }
    }
}

/// Ordered, deduplicated view of one conversation.
pub type Transcript = Vec<Message>;
