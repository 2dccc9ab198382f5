//! Live two-party conversation transcript engine.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use verdin_core::{ConversationKey, MessageId, UserId};

use crate::backend::{MessageStore, PushError, PushSubscription, PushTransport, SubscriptionId};
use crate::chat::{BackfillError, SendError};
use crate::config::AdminConfig;
use crate::models::{Message, PushEvent, Transcript};

/// Resource scope the message feed is subscribed under. The transport does
/// not filter per conversation; the membership check here is the boundary.
const MESSAGE_SCOPE: &str = "messages";

/// One open conversation between the signed-in staff member and a peer.
///
/// The transcript is fed from two sides: a one-shot historical backfill and
/// a continuous push feed. Both run through the same merge path, so overlap
/// during subscription establishment, redelivery, and out-of-order arrival
/// all collapse to the same invariant: unique IDs, sorted by
/// `(created_at, id)`.
///
/// The channel is driven cooperatively. [`ConversationChannel::next_event`]
/// applies at most one push event; [`ConversationChannel::run`] loops until
/// the feed ends. No internal tasks are spawned.
pub struct ConversationChannel<S, T>
where
    T: PushTransport,
{
    store: S,
    transport: T,
    self_id: UserId,
    peer_id: UserId,
    key: ConversationKey,
    transcript: Transcript,
    seen: HashSet<MessageId>,
    subscription: Option<PushSubscription>,
    sub_id: SubscriptionId,
    transcript_tx: watch::Sender<Transcript>,
    closed: bool,
    backfill_timeout: Duration,
    send_timeout: Duration,
}

impl<S, T> ConversationChannel<S, T>
where
    S: MessageStore,
    T: PushTransport,
{
    /// Open a channel for the conversation between `self_id` and `peer_id`.
    ///
    /// Subscribes to the push feed immediately, before any backfill, so no
    /// message can fall between the two; the caller is expected to invoke
    /// [`ConversationChannel::backfill`] next.
    ///
    /// # Errors
    ///
    /// Returns [`PushError`] if the transport refuses the subscription.
    pub fn open(
        store: S,
        transport: T,
        self_id: UserId,
        peer_id: UserId,
        config: &AdminConfig,
    ) -> Result<Self, PushError> {
        let subscription = transport.subscribe(MESSAGE_SCOPE)?;
        let sub_id = subscription.id();
        let key = ConversationKey::new(self_id.clone(), peer_id.clone());
        debug!(%self_id, %peer_id, sub = sub_id.as_u64(), "conversation channel opened");

        Ok(Self {
            store,
            transport,
            self_id,
            peer_id,
            key,
            transcript: Transcript::new(),
            seen: HashSet::new(),
            subscription: Some(subscription),
            sub_id,
            transcript_tx: watch::Sender::new(Transcript::new()),
            closed: false,
            backfill_timeout: config.backfill_timeout,
            send_timeout: config.send_timeout,
        })
    }

    /// Load the conversation history and merge it into the transcript.
    ///
    /// An empty history is a valid initial transcript. Safe to call again
    /// after a failure, or even after live events have already arrived; the
    /// merge is idempotent per message ID.
    ///
    /// # Errors
    ///
    /// Returns [`BackfillError`] if the store query fails or times out. The
    /// channel stays open and live-fed either way.
    #[instrument(skip(self), fields(peer = %self.peer_id))]
    pub async fn backfill(&mut self) -> Result<usize, BackfillError> {
        let rows = match tokio::time::timeout(
            self.backfill_timeout,
            self.store.list_conversation(&self.key),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(error)) => {
                warn!(%error, "backfill query failed");
                return Err(error.into());
            }
            Err(_) => {
                warn!("backfill timed out");
                return Err(BackfillError::Timeout);
            }
        };

        let total = rows.len();
        let validated: Vec<Message> = rows
            .into_iter()
            .filter(|row| {
                // The store was queried by key, but rows are still validated
                // here rather than trusted.
                row.conversation_key() == self.key
            })
            .collect();
        let merged = self.merge(validated);
        debug!(total, merged, "backfill merged");
        Ok(merged)
    }

    /// Write a message to the store.
    ///
    /// The transcript is not touched: the authoritative copy of the new
    /// message arrives back through the push feed with its server-assigned
    /// ID and timestamp. On failure nothing is committed and the caller's
    /// input remains valid for retry.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::EmptyBody`] for a whitespace-only body without
    /// touching the store, [`SendError::Store`] if the write fails, and
    /// [`SendError::Timeout`] if it does not complete within the bound.
    #[instrument(skip(self, body), fields(peer = %self.peer_id))]
    pub async fn send(&self, body: &str) -> Result<Message, SendError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(SendError::EmptyBody);
        }

        match tokio::time::timeout(
            self.send_timeout,
            self.store
                .insert_message(&self.self_id, &self.peer_id, trimmed),
        )
        .await
        {
            Ok(Ok(message)) => {
                debug!(id = %message.id, "message written");
                Ok(message)
            }
            Ok(Err(error)) => {
                warn!(%error, "message write failed");
                Err(error.into())
            }
            Err(_) => {
                warn!("message write timed out");
                Err(SendError::Timeout)
            }
        }
    }

    /// Wait for and apply the next push event.
    ///
    /// Returns `Some(true)` if the event changed the transcript,
    /// `Some(false)` if it was dropped (malformed, foreign pair, or
    /// duplicate), and `None` once the channel is closed or the feed has
    /// ended.
    pub async fn next_event(&mut self) -> Option<bool> {
        if self.closed {
            return None;
        }
        let raw = self.subscription.as_mut()?.next_raw().await?;
        Some(self.apply_raw(raw))
    }

    /// Drive the channel until the feed ends or the channel is closed.
    pub async fn run(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Apply one raw payload from the push feed.
    ///
    /// Exposed for callers that multiplex a shared subscription themselves;
    /// [`ConversationChannel::next_event`] calls this internally.
    pub fn apply_raw(&mut self, raw: serde_json::Value) -> bool {
        let event: PushEvent = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(error) => {
                debug!(%error, "dropping malformed push event");
                return false;
            }
        };

        if !event.belongs_to(&self.key) {
            debug!(id = %event.id, "dropping event for another conversation");
            return false;
        }

        self.merge(std::iter::once(event.into())) > 0
    }

    /// Merge messages into the transcript, skipping IDs already seen.
    ///
    /// Re-sorts and republishes only when something was actually inserted.
    fn merge(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        let mut inserted = 0;
        for message in messages {
            if self.seen.insert(message.id.clone()) {
                self.transcript.push(message);
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.transcript.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            self.transcript_tx.send_replace(self.transcript.clone());
        }
        inserted
    }
}

impl<S, T> ConversationChannel<S, T>
where
    T: PushTransport,
{
    /// Close the channel, releasing the push subscription.
    ///
    /// Idempotent: only the first call unsubscribes. Events still in flight
    /// when the channel closes are never applied.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.subscription = None;
        self.transport.unsubscribe(self.sub_id);
        debug!(peer = %self.peer_id, "conversation channel closed");
    }

    /// The current transcript.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Subscribe to transcript updates, delivered after every successful
    /// merge.
    #[must_use]
    pub fn transcript_watch(&self) -> watch::Receiver<Transcript> {
        self.transcript_tx.subscribe()
    }

    /// The conversation this channel is scoped to.
    #[must_use]
    pub const fn conversation_key(&self) -> &ConversationKey {
        &self.key
    }

    /// Whether the channel has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S, T> Drop for ConversationChannel<S, T>
where
    T: PushTransport,
{
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MessageStoreError;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tokio::sync::mpsc;

    struct NoStore;

    impl MessageStore for NoStore {
        async fn list_conversation(
            &self,
            _key: &ConversationKey,
        ) -> Result<Vec<Message>, MessageStoreError> {
            Ok(Vec::new())
        }

        async fn insert_message(
            &self,
            _sender: &UserId,
            _recipient: &UserId,
            _body: &str,
        ) -> Result<Message, MessageStoreError> {
            Err(MessageStoreError::Store("not wired".into()))
        }
    }

    struct StaticTransport;

    impl PushTransport for StaticTransport {
        fn subscribe(&self, _scope: &str) -> Result<PushSubscription, PushError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(PushSubscription::new(SubscriptionId::new(1), rx))
        }

        fn unsubscribe(&self, _id: SubscriptionId) {}
    }

    fn channel() -> ConversationChannel<NoStore, StaticTransport> {
        ConversationChannel::open(
            NoStore,
            StaticTransport,
            UserId::new("admin-1"),
            UserId::new("seller-1"),
            &AdminConfig::default(),
        )
        .expect("open")
    }

    fn event(id: &str, sender: &str, recipient: &str, at_secs: i64) -> serde_json::Value {
        json!({
            "id": id,
            "sender_id": sender,
            "recipient_id": recipient,
            "body": "hi",
            "created_at": Utc
                .timestamp_opt(at_secs, 0)
                .single()
                .expect("valid timestamp")
                .to_rfc3339(),
        })
    }

    #[test]
    fn test_duplicate_ids_merge_once() {
        let mut channel = channel();
        assert!(channel.apply_raw(event("m-1", "seller-1", "admin-1", 100)));
        assert!(!channel.apply_raw(event("m-1", "seller-1", "admin-1", 100)));
        assert_eq!(channel.transcript().len(), 1);
    }

    #[test]
    fn test_out_of_order_arrival_is_resorted() {
        let mut channel = channel();
        channel.apply_raw(event("m-2", "seller-1", "admin-1", 200));
        channel.apply_raw(event("m-1", "admin-1", "seller-1", 100));

        let ids: Vec<_> = channel
            .transcript()
            .iter()
            .map(|m| m.id.as_str().to_owned())
            .collect();
        assert_eq!(ids, ["m-1", "m-2"]);
    }

    #[test]
    fn test_equal_timestamps_tie_break_on_id() {
        let mut channel = channel();
        channel.apply_raw(event("m-b", "seller-1", "admin-1", 100));
        channel.apply_raw(event("m-a", "seller-1", "admin-1", 100));

        let ids: Vec<_> = channel
            .transcript()
            .iter()
            .map(|m| m.id.as_str().to_owned())
            .collect();
        assert_eq!(ids, ["m-a", "m-b"]);
    }

    #[test]
    fn test_foreign_pair_events_never_leak() {
        let mut channel = channel();
        assert!(!channel.apply_raw(event("m-1", "x", "y", 100)));
        // Partial overlap is still a foreign conversation
        assert!(!channel.apply_raw(event("m-2", "admin-1", "seller-2", 100)));
        assert!(channel.transcript().is_empty());
    }

    #[test]
    fn test_malformed_events_are_dropped() {
        let mut channel = channel();
        assert!(!channel.apply_raw(json!({"id": "m-1", "body": "hi"})));
        assert!(!channel.apply_raw(json!("not an object")));
        assert!(channel.transcript().is_empty());
    }

    #[test]
    fn test_transcript_watch_sees_merges() {
        let mut channel = channel();
        let watch = channel.transcript_watch();
        assert!(watch.borrow().is_empty());

        channel.apply_raw(event("m-1", "seller-1", "admin-1", 100));
        assert_eq!(watch.borrow().len(), 1);
    }
}
