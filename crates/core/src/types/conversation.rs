//! Conversation identity for two-party chats.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Unordered pair of participants identifying one conversation.
///
/// Two keys built from the same participants in either order are equal and
/// hash identically: the pair is normalized on construction so the "first"
/// participant is always the lexicographically smaller ID.
///
/// ```
/// use verdin_core::{ConversationKey, UserId};
///
/// let a = UserId::new("admin-1");
/// let b = UserId::new("seller-1");
/// assert_eq!(
///     ConversationKey::new(a.clone(), b.clone()),
///     ConversationKey::new(b, a),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    first: UserId,
    second: UserId,
}

impl ConversationKey {
    /// Build the key for a conversation between two participants.
    #[must_use]
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Whether the given identity participates in this conversation.
    #[must_use]
    pub fn contains(&self, id: &UserId) -> bool {
        &self.first == id || &self.second == id
    }

    /// Whether a `{sender, recipient}` pair belongs to this conversation,
    /// in either orientation.
    #[must_use]
    pub fn matches_pair(&self, sender: &UserId, recipient: &UserId) -> bool {
        Self::new(sender.clone(), recipient.clone()) == *self
    }

    /// The other participant, given one side of the conversation.
    ///
    /// Returns `None` if `id` is not a participant.
    #[must_use]
    pub fn peer_of(&self, id: &UserId) -> Option<&UserId> {
        if &self.first == id {
            Some(&self.second)
        } else if &self.second == id {
            Some(&self.first)
        } else {
            None
        }
    }
}
