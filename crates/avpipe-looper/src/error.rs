//! Looper layer errors.
//!
//! # Error Code Convention
//!
//! All looper errors use the `LOOPER_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`LooperError::AlreadyStarted`] | `LOOPER_ALREADY_STARTED` | No |
//! | [`LooperError::Spawn`] | `LOOPER_SPAWN` | Yes |
//! | [`LooperError::InvalidHandler`] | `LOOPER_INVALID_HANDLER` | No |
//! | [`LooperError::WouldDeadlock`] | `LOOPER_WOULD_DEADLOCK` | No |
//! | [`LooperError::ReplyTimeout`] | `LOOPER_REPLY_TIMEOUT` | Yes |
//!
//! Note what is *not* here: `stop()` on an already stopped Looper is a
//! no-op, not an error, and posting to an unregistered handler id is a
//! silent drop by design (see the crate docs).

use avpipe_types::ErrorCode;
use thiserror::Error;

/// Looper lifecycle and call-protocol errors.
///
/// # Example
///
/// ```
/// use avpipe_looper::LooperError;
/// use avpipe_types::ErrorCode;
///
/// let err = LooperError::AlreadyStarted;
/// assert_eq!(err.code(), "LOOPER_ALREADY_STARTED");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum LooperError {
    /// `start` was called on a Looper whose worker is already live
    /// (or that has been stopped - Loopers are not restartable).
    #[error("looper already started")]
    AlreadyStarted,

    /// The worker thread could not be spawned.
    ///
    /// Recoverable: thread creation can fail under resource pressure
    /// and succeed later.
    #[error("worker thread spawn failed: {0}")]
    Spawn(String),

    /// `register_handler` was given a handler reference that no longer
    /// upgrades - the handler was dropped before registration.
    #[error("handler reference is no longer alive")]
    InvalidHandler,

    /// `await_response` was called from the Looper's own dispatch
    /// thread while the token was still unfulfilled.
    ///
    /// Only this Looper's dispatch loop can run the handler that would
    /// fulfill the token, so the wait could never finish. This is a
    /// programming error in the caller.
    #[error("awaiting a reply from the looper's own dispatch thread")]
    WouldDeadlock,

    /// `await_response_timeout` elapsed before the token was fulfilled.
    #[error("timed out waiting for reply")]
    ReplyTimeout,
}

impl ErrorCode for LooperError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyStarted => "LOOPER_ALREADY_STARTED",
            Self::Spawn(_) => "LOOPER_SPAWN",
            Self::InvalidHandler => "LOOPER_INVALID_HANDLER",
            Self::WouldDeadlock => "LOOPER_WOULD_DEADLOCK",
            Self::ReplyTimeout => "LOOPER_REPLY_TIMEOUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Spawn(_) | Self::ReplyTimeout => true,
            Self::AlreadyStarted | Self::InvalidHandler | Self::WouldDeadlock => false,
        }
    }
}
