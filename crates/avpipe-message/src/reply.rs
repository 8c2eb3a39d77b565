//! One-shot reply tokens for synchronous calls over the message queue.
//!
//! A [`ReplyToken`] pairs one blocked caller with one eventual reply.
//! It transitions exactly once from unfulfilled to fulfilled; the first
//! stored reply wins and later fulfillment attempts are no-ops.
//!
//! Each token owns its own mutex and condvar, so fulfilling a reply
//! never wakes waiters parked on an unrelated token or on a Looper's
//! queue condition.
//!
//! Tokens are normally created through `Looper::create_reply_token` and
//! consumed through `Looper::await_response` / `Looper::post_reply`,
//! which add the deadlock guard on top of the raw mechanics here.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::Message;

#[derive(Default)]
struct ReplyState {
    fulfilled: bool,
    response: Option<Message>,
}

/// A one-shot correlation handle for a synchronous call.
///
/// Jointly referenced (via [`Arc`]) by the blocked caller and the
/// eventual replier; it is released when the last reference goes away.
///
/// # Example
///
/// ```
/// use avpipe_message::{Message, ReplyToken};
/// use avpipe_types::HandlerId;
/// use std::sync::Arc;
///
/// let token = Arc::new(ReplyToken::new());
/// let reply = Message::new(HandlerId::new(1), 0).with_int32("status", 0);
///
/// assert!(token.fulfill(reply));
/// let out = token.wait();
/// assert_eq!(out.int32("status"), Some(0));
/// ```
#[derive(Default)]
pub struct ReplyToken {
    state: Mutex<ReplyState>,
    fulfilled_cv: Condvar,
}

impl ReplyToken {
    /// Creates an unfulfilled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once a reply has been stored.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.state.lock().fulfilled
    }

    /// Stores the reply and wakes the waiter.
    ///
    /// Returns `true` if this call fulfilled the token, `false` if the
    /// token was already fulfilled (the stored reply is untouched and
    /// no waiter is woken).
    pub fn fulfill(&self, reply: Message) -> bool {
        let mut state = self.state.lock();
        if state.fulfilled {
            return false;
        }
        state.fulfilled = true;
        state.response = Some(reply);
        drop(state);

        self.fulfilled_cv.notify_one();
        true
    }

    /// Blocks until the token is fulfilled and returns the reply.
    ///
    /// Unbounded; prefer [`wait_timeout`](Self::wait_timeout) unless the
    /// replier is known to be alive.
    #[must_use]
    pub fn wait(&self) -> Message {
        let mut state = self.state.lock();
        loop {
            if let Some(response) = state.response.clone() {
                return response;
            }
            self.fulfilled_cv.wait(&mut state);
        }
    }

    /// Bounded wait; returns `None` if the timeout elapses first.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Message> {
        let deadline = std::time::Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(response) = state.response.clone() {
                return Some(response);
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return None;
            }
            self.fulfilled_cv.wait_for(&mut state, deadline - now);
        }
    }

    /// Convenience constructor returning an `Arc`'d token.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl std::fmt::Debug for ReplyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyToken")
            .field("fulfilled", &self.is_fulfilled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avpipe_types::HandlerId;

    fn reply(status: i32) -> Message {
        Message::new(HandlerId::new(1), 0).with_int32("status", status)
    }

    #[test]
    fn starts_unfulfilled() {
        let token = ReplyToken::new();
        assert!(!token.is_fulfilled());
    }

    #[test]
    fn fulfill_then_wait() {
        let token = ReplyToken::new();
        assert!(token.fulfill(reply(7)));
        assert!(token.is_fulfilled());
        assert_eq!(token.wait().int32("status"), Some(7));
    }

    #[test]
    fn first_write_wins() {
        let token = ReplyToken::new();
        assert!(token.fulfill(reply(1)));
        assert!(!token.fulfill(reply(2)));
        assert_eq!(token.wait().int32("status"), Some(1));
    }

    #[test]
    fn cross_thread_wakeup() {
        let token = ReplyToken::shared();
        let replier = Arc::clone(&token);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            replier.fulfill(reply(42));
        });

        assert_eq!(token.wait().int32("status"), Some(42));
        handle.join().expect("replier thread");
    }

    #[test]
    fn wait_timeout_expires() {
        let token = ReplyToken::new();
        assert!(token.wait_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn wait_timeout_sees_fulfillment() {
        let token = ReplyToken::shared();
        let replier = Arc::clone(&token);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            replier.fulfill(reply(3));
        });

        let out = token.wait_timeout(Duration::from_secs(5));
        assert_eq!(out.and_then(|m| m.int32("status")), Some(3));
        handle.join().expect("replier thread");
    }
}
