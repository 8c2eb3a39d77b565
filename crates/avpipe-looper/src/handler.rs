//! Handler trait for dispatch targets.
//!
//! A handler is a capability: "can receive one dispatched message".
//! The Looper depends on nothing else about a handler's internals.

use avpipe_message::Message;

/// A registered recipient of dispatched messages.
///
/// # Registration and Lifetime
///
/// Handlers are registered with exactly one Looper at a time, by
/// [`Weak`](std::sync::Weak) reference - the Looper never owns its
/// handlers. The owner must call `unregister_handler` before dropping
/// the handler; messages queued for a dropped-but-unregistered handler
/// are caught by the failed weak upgrade and dropped, but relying on
/// that instead of unregistering is a contract violation.
///
/// # Threading
///
/// `on_message` runs on the Looper's worker thread, one message at a
/// time. Handlers take `&self` and use interior mutability for state;
/// they may freely call `post`, `register_handler`, or fulfill reply
/// tokens from inside `on_message` (the Looper releases its queue lock
/// around the call). Awaiting a reply that only this same dispatch
/// thread can produce is refused by the Looper.
///
/// # Example
///
/// ```
/// use avpipe_looper::Handler;
/// use avpipe_message::Message;
/// use parking_lot::Mutex;
///
/// struct Counter {
///     seen: Mutex<u64>,
/// }
///
/// impl Handler for Counter {
///     fn on_message(&self, _message: Message) {
///         *self.seen.lock() += 1;
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Receives one dispatched message.
    ///
    /// The message is owned by the call; it is dropped when this
    /// returns unless the handler retains or re-posts it.
    fn on_message(&self, message: Message);
}
