//! Push transport boundary.

use thiserror::Error;

use tokio::sync::mpsc;

/// Errors from the push transport.
#[derive(Debug, Error)]
pub enum PushError {
    /// The subscription could not be established.
    #[error("subscribe failed: {0}")]
    Subscribe(String),
}

/// Opaque handle identifying one subscription on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a transport-assigned subscription number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The underlying subscription number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// An established subscription: its transport handle plus the event feed.
///
/// Events arrive as raw JSON payloads; the channel validates and filters
/// them. When the transport drops its sender the feed ends and
/// [`PushSubscription::next_raw`] returns `None`.
#[derive(Debug)]
pub struct PushSubscription {
    id: SubscriptionId,
    events: mpsc::Receiver<serde_json::Value>,
}

impl PushSubscription {
    /// Build a subscription from its handle and receiving end.
    #[must_use]
    pub fn new(id: SubscriptionId, events: mpsc::Receiver<serde_json::Value>) -> Self {
        Self { id, events }
    }

    /// The transport handle for this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next raw event. `None` means the feed has ended.
    pub async fn next_raw(&mut self) -> Option<serde_json::Value> {
        self.events.recv().await
    }
}

/// The push transport carrying change events from the hosted backend.
///
/// The underlying connection may be shared across many subscribers; a
/// subscription scoped to a resource still sees every event for that
/// resource, and consumers must filter client-side.
pub trait PushTransport {
    /// Open a subscription over the given resource scope (e.g. `"messages"`).
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Subscribe`] if the transport refuses the
    /// subscription.
    fn subscribe(&self, scope: &str) -> Result<PushSubscription, PushError>;

    /// Release a subscription previously returned by
    /// [`PushTransport::subscribe`]. Unknown handles are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
