//! Shared test support for Verdin integration tests.
//!
//! In-memory fakes for every collaborator the engine is generic over. Each
//! fake is a cheaply clonable handle around shared state, so a test can keep
//! one handle for assertions while the engine owns another.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use verdin_admin::backend::{
    IdentityError, IdentityProvider, MessageStore, MessageStoreError, PushError, PushSubscription,
    PushTransport, RoleStore, RoleStoreError, SubscriptionId,
};
use verdin_admin::models::Message;
use verdin_core::{ConversationKey, MessageId, Role, UserId};

/// Queue depth for fake push subscriptions; deep enough that no test can
/// fill it.
const FAKE_FEED_CAPACITY: usize = 64;

/// Install a tracing subscriber for a test run, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call in the process
/// installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("fake state lock")
}

/// A timestamp at a fixed offset from an arbitrary epoch, for deterministic
/// ordering in tests.
#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_750_000_000 + secs, 0)
        .single()
        .expect("valid timestamp")
}

/// Build a message row with explicit ID and timestamp.
#[must_use]
pub fn message(id: &str, sender: &str, recipient: &str, body: &str, secs: i64) -> Message {
    Message {
        id: MessageId::new(id),
        sender_id: UserId::new(sender),
        recipient_id: UserId::new(recipient),
        body: body.to_string(),
        created_at: at(secs),
        read: false,
    }
}

/// The push-feed JSON payload for a message.
#[must_use]
pub fn message_event(message: &Message) -> serde_json::Value {
    serde_json::json!({
        "id": message.id,
        "sender_id": message.sender_id,
        "recipient_id": message.recipient_id,
        "body": message.body,
        "created_at": message.created_at,
        "read": message.read,
    })
}

#[derive(Default)]
struct IdentityState {
    current: Option<UserId>,
    fail_fetch: bool,
    fetch_delay: Option<Duration>,
}

/// Fake identity provider with a settable credential and failure modes.
#[derive(Clone, Default)]
pub struct FakeIdentityProvider {
    state: Arc<Mutex<IdentityState>>,
    invalidations: Arc<AtomicUsize>,
}

impl FakeIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a credential for the given identity.
    pub fn sign_in(&self, identity: &UserId) {
        lock(&self.state).current = Some(identity.clone());
    }

    /// Make credential fetches fail until told otherwise.
    pub fn fail_fetches(&self, fail: bool) {
        lock(&self.state).fail_fetch = fail;
    }

    /// Delay credential fetches, to widen the in-flight window for
    /// supersession tests.
    pub fn delay_fetches(&self, delay: Duration) {
        lock(&self.state).fetch_delay = Some(delay);
    }

    /// Whether a credential is currently held.
    #[must_use]
    pub fn holds_credential(&self) -> bool {
        lock(&self.state).current.is_some()
    }

    /// How many times the credential has been invalidated.
    #[must_use]
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for FakeIdentityProvider {
    async fn current_identity(&self) -> Result<Option<UserId>, IdentityError> {
        let (delay, result) = {
            let state = lock(&self.state);
            let result = if state.fail_fetch {
                Err(IdentityError::Fetch("provider unreachable".into()))
            } else {
                Ok(state.current.clone())
            };
            (state.fetch_delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn invalidate_credential(&self) -> Result<(), IdentityError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        lock(&self.state).current = None;
        Ok(())
    }
}

#[derive(Default)]
struct RoleState {
    roles: HashMap<UserId, Role>,
    fail_lookup: bool,
}

/// Fake role store backed by a map; identities without a row error like a
/// missing-row query would.
#[derive(Clone, Default)]
pub struct FakeRoleStore {
    state: Arc<Mutex<RoleState>>,
}

impl FakeRoleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, identity: &UserId, role: Role) {
        lock(&self.state).roles.insert(identity.clone(), role);
    }

    /// Make lookups fail until told otherwise.
    pub fn fail_lookups(&self, fail: bool) {
        lock(&self.state).fail_lookup = fail;
    }
}

impl RoleStore for FakeRoleStore {
    async fn role_of(&self, identity: &UserId) -> Result<Role, RoleStoreError> {
        let state = lock(&self.state);
        if state.fail_lookup {
            return Err(RoleStoreError::Lookup("store unreachable".into()));
        }
        state
            .roles
            .get(identity)
            .copied()
            .ok_or(RoleStoreError::NotFound)
    }
}

struct TransportState {
    subscribers: HashMap<u64, mpsc::Sender<serde_json::Value>>,
    next_id: u64,
    unsubscribed: Vec<u64>,
    refuse: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 1,
            unsubscribed: Vec::new(),
            refuse: false,
        }
    }
}

/// Fake push transport that fans every published event out to every live
/// subscription, like a shared connection with no server-side filtering.
#[derive(Clone, Default)]
pub struct FakePushTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakePushTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse new subscriptions until told otherwise.
    pub fn refuse_subscriptions(&self, refuse: bool) {
        lock(&self.state).refuse = refuse;
    }

    /// Deliver a raw payload to every live subscription.
    pub fn publish(&self, payload: &serde_json::Value) {
        let state = lock(&self.state);
        for sender in state.subscribers.values() {
            // A full or closed queue models a consumer that went away
            let _ = sender.try_send(payload.clone());
        }
    }

    /// Deliver a message event to every live subscription.
    pub fn publish_message(&self, message: &Message) {
        self.publish(&message_event(message));
    }

    /// Drop all subscriber queues, ending their feeds.
    pub fn disconnect_all(&self) {
        lock(&self.state).subscribers.clear();
    }

    /// Number of currently live subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    /// Handles released via `unsubscribe`, in order.
    #[must_use]
    pub fn unsubscribed(&self) -> Vec<u64> {
        lock(&self.state).unsubscribed.clone()
    }
}

impl PushTransport for FakePushTransport {
    fn subscribe(&self, _scope: &str) -> Result<PushSubscription, PushError> {
        let mut state = lock(&self.state);
        if state.refuse {
            return Err(PushError::Subscribe("transport refused".into()));
        }
        let id = state.next_id;
        state.next_id += 1;
        let (tx, rx) = mpsc::channel(FAKE_FEED_CAPACITY);
        state.subscribers.insert(id, tx);
        Ok(PushSubscription::new(SubscriptionId::new(id), rx))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = lock(&self.state);
        state.subscribers.remove(&id.as_u64());
        state.unsubscribed.push(id.as_u64());
    }
}

#[derive(Default)]
struct MessageStoreState {
    rows: Vec<Message>,
    fail_list: bool,
    fail_insert: bool,
}

/// Fake append-only message log.
///
/// When wired to a [`FakePushTransport`], every successful insert echoes as
/// a push event, like the hosted backend's change feed.
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    state: Arc<Mutex<MessageStoreState>>,
    echo: Option<FakePushTransport>,
}

impl InMemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo successful inserts through the given transport.
    #[must_use]
    pub fn with_echo(transport: FakePushTransport) -> Self {
        Self {
            state: Arc::new(Mutex::new(MessageStoreState::default())),
            echo: Some(transport),
        }
    }

    /// Seed a pre-existing row.
    pub fn seed(&self, message: Message) {
        lock(&self.state).rows.push(message);
    }

    /// Make list queries fail until told otherwise.
    pub fn fail_lists(&self, fail: bool) {
        lock(&self.state).fail_list = fail;
    }

    /// Make inserts fail until told otherwise.
    pub fn fail_inserts(&self, fail: bool) {
        lock(&self.state).fail_insert = fail;
    }

    /// Number of rows in the log.
    #[must_use]
    pub fn row_count(&self) -> usize {
        lock(&self.state).rows.len()
    }
}

impl MessageStore for InMemoryMessageStore {
    async fn list_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Vec<Message>, MessageStoreError> {
        let state = lock(&self.state);
        if state.fail_list {
            return Err(MessageStoreError::Store("store unreachable".into()));
        }
        let mut rows: Vec<Message> = state
            .rows
            .iter()
            .filter(|row| row.conversation_key() == *key)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn insert_message(
        &self,
        sender: &UserId,
        recipient: &UserId,
        body: &str,
    ) -> Result<Message, MessageStoreError> {
        let row = {
            let mut state = lock(&self.state);
            if state.fail_insert {
                return Err(MessageStoreError::Store("write refused".into()));
            }
            let row = Message {
                id: MessageId::new(Uuid::new_v4().to_string()),
                sender_id: sender.clone(),
                recipient_id: recipient.clone(),
                body: body.to_string(),
                created_at: Utc::now(),
                read: false,
            };
            state.rows.push(row.clone());
            row
        };
        if let Some(echo) = &self.echo {
            echo.publish_message(&row);
        }
        Ok(row)
    }
}
