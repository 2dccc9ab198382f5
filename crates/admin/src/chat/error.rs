//! Errors surfaced by the conversation channel.

use thiserror::Error;

use crate::backend::MessageStoreError;

/// The historical fetch failed.
///
/// Recoverable: the channel stays open, keeps receiving live events, and
/// `backfill` may be invoked again.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// The message store query failed.
    #[error("backfill failed: {0}")]
    Store(#[from] MessageStoreError),

    /// The query did not complete within the configured bound.
    #[error("backfill timed out")]
    Timeout,
}

/// A message write failed before anything was committed.
///
/// The caller keeps the input text and may retry as-is.
#[derive(Debug, Error)]
pub enum SendError {
    /// The body was empty (or whitespace-only) after trimming.
    #[error("message body is empty")]
    EmptyBody,

    /// The message store write failed.
    #[error("send failed: {0}")]
    Store(#[from] MessageStoreError),

    /// The write did not complete within the configured bound.
    #[error("send timed out")]
    Timeout,
}
