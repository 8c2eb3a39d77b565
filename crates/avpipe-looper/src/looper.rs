//! The Looper: one worker thread, one time-ordered queue.

use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use avpipe_message::{Message, ReplyToken};
use avpipe_types::HandlerId;

use crate::event::Event;
use crate::{Handler, LooperError};

/// Process-wide epoch for the monotonic Looper clock.
static EPOCH: OnceLock<Instant> = OnceLock::new();

fn monotonic_now_us() -> i64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    i64::try_from(epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
}

/// Mutable queue state, guarded by one lock together with the
/// lifecycle flags so that `post`, `stop`, and the dispatch loop agree
/// on a single view of "stopped".
struct QueueState {
    events: BinaryHeap<Event>,
    next_seq: u64,
    started: bool,
    stopped: bool,
}

struct Inner {
    name: String,
    queue: Mutex<QueueState>,
    queue_cv: Condvar,
    /// Non-owning handler associations, resolved at dispatch time.
    /// Separate lock from the queue: registration never contends with
    /// scheduling.
    registry: Mutex<HashMap<HandlerId, Weak<dyn Handler>>>,
    next_handler_id: AtomicU32,
    /// Dispatch thread id, set once when the worker comes up.
    worker: OnceLock<ThreadId>,
}

/// The owning scheduler of one worker thread and its message queue.
///
/// # Lifecycle
///
/// ```text
/// new() ──► start(priority) ──► running ──► stop() ──► inert
///                │ blocks until the worker        (not restartable)
///                │ has entered its loop
/// ```
///
/// `stop` is idempotent; events still queued when it runs are discarded
/// without dispatch (an event whose dispatch has begun finishes). A
/// Looper dropped while running is stopped with a warning - treat that
/// as a usage error, not a feature.
///
/// # Concurrency
///
/// `post`, `register_handler`, `unregister_handler`,
/// `create_reply_token`, and the reply operations are safe from any
/// number of threads, including the Looper's own worker thread. Each
/// Looper is fully self-contained: no state is shared across Loopers.
///
/// # Example
///
/// ```
/// use avpipe_looper::{Handler, Looper, Message};
/// use std::sync::Arc;
///
/// struct Sink;
/// impl Handler for Sink {
///     fn on_message(&self, _message: Message) {}
/// }
///
/// let looper = Looper::new("audio.decoder");
/// looper.start(0).expect("start");
///
/// let sink: Arc<dyn Handler> = Arc::new(Sink);
/// let id = looper.register_handler(Arc::downgrade(&sink)).expect("register");
///
/// // delayed by 10ms, dispatched no earlier than its due time
/// looper.post(Message::new(id, 1).with_str("op", "decode"), 10_000);
/// looper.stop();
/// ```
pub struct Looper {
    inner: Arc<Inner>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Looper {
    /// Creates an idle Looper. No thread exists until [`start`](Self::start).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                queue: Mutex::new(QueueState {
                    events: BinaryHeap::new(),
                    next_seq: 0,
                    started: false,
                    stopped: false,
                }),
                queue_cv: Condvar::new(),
                registry: Mutex::new(HashMap::new()),
                next_handler_id: AtomicU32::new(1),
                worker: OnceLock::new(),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Returns the Looper's name (also the worker thread name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current time on the monotonic Looper clock, in microseconds.
    ///
    /// All due times are computed on this clock; it never goes
    /// backwards and is unaffected by wall-clock adjustments.
    #[must_use]
    pub fn now_us() -> i64 {
        monotonic_now_us()
    }

    /// Returns `true` between a successful `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        let queue = self.inner.queue.lock();
        queue.started && !queue.stopped
    }

    /// Spawns the worker thread and blocks until it has entered its
    /// dispatch loop, so a `post` issued immediately after `start`
    /// returns is observed by the running loop.
    ///
    /// `priority` is recorded best-effort; no platform scheduling call
    /// is made.
    ///
    /// # Errors
    ///
    /// - [`LooperError::AlreadyStarted`] on a second call (including
    ///   after `stop` - Loopers are not restartable)
    /// - [`LooperError::Spawn`] if the OS refuses the thread
    pub fn start(&self, priority: i32) -> Result<(), LooperError> {
        {
            let mut queue = self.inner.queue.lock();
            if queue.started {
                return Err(LooperError::AlreadyStarted);
            }
            queue.started = true;
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(self.inner.name.clone())
            .spawn(move || {
                let _ = inner.worker.set(thread::current().id());
                let _ = ready_tx.send(());
                inner.run();
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.inner.queue.lock().started = false;
                return Err(LooperError::Spawn(err.to_string()));
            }
        };

        // Start latch: the worker signals once before entering the loop.
        if ready_rx.recv().is_err() {
            return Err(LooperError::Spawn("worker exited before ready".into()));
        }
        *self.thread.lock() = Some(handle);

        info!(looper = %self.inner.name, priority, "looper started");
        Ok(())
    }

    /// Stops the dispatch loop and joins the worker thread.
    ///
    /// Idempotent: a second call is a no-op. **Events still queued are
    /// discarded without dispatch** - `post` promises enqueuing, never
    /// delivery. A dispatch already in progress runs to completion
    /// before the worker exits.
    ///
    /// Callable from the worker thread itself (a handler may stop its
    /// own Looper); the join is skipped in that case and the loop exits
    /// when the handler returns.
    pub fn stop(&self) {
        {
            let mut queue = self.inner.queue.lock();
            if queue.stopped {
                return;
            }
            queue.stopped = true;

            let discarded = queue.events.len();
            queue.events.clear();
            if discarded > 0 {
                debug!(
                    looper = %self.inner.name,
                    discarded,
                    "discarding undelivered events at stop"
                );
            }
        }
        self.inner.queue_cv.notify_all();

        let on_worker = self.inner.worker.get().copied() == Some(thread::current().id());
        if !on_worker {
            if let Some(handle) = self.thread.lock().take() {
                if handle.join().is_err() {
                    warn!(looper = %self.inner.name, "worker thread panicked");
                }
            }
        }

        info!(looper = %self.inner.name, "looper stopped");
    }

    /// Registers a handler and returns its fresh identifier.
    ///
    /// The association is non-owning: the Looper holds a [`Weak`] and
    /// resolves it at each dispatch. Identifiers grow monotonically and
    /// are never reused for this Looper's lifetime. Callable from any
    /// thread, before or after `start`.
    ///
    /// # Errors
    ///
    /// [`LooperError::InvalidHandler`] if `handler` no longer upgrades.
    pub fn register_handler(
        &self,
        handler: Weak<dyn Handler>,
    ) -> Result<HandlerId, LooperError> {
        if handler.upgrade().is_none() {
            return Err(LooperError::InvalidHandler);
        }

        let id = HandlerId::new(self.inner.next_handler_id.fetch_add(1, Ordering::Relaxed));
        self.inner.registry.lock().insert(id, handler);
        debug!(looper = %self.inner.name, %id, "handler registered");
        Ok(id)
    }

    /// Removes a handler association. Idempotent.
    ///
    /// Messages already queued for `id` are dropped at dispatch time
    /// when the lookup fails. Unregistering prevents *future* dispatch
    /// only - a dispatch already running is not retracted.
    ///
    /// Owners must unregister before dropping a handler.
    pub fn unregister_handler(&self, id: HandlerId) {
        if self.inner.registry.lock().remove(&id).is_some() {
            debug!(looper = %self.inner.name, %id, "handler unregistered");
        }
    }

    /// Enqueues `message` for dispatch no earlier than
    /// `now + max(delay_us, 0)`.
    ///
    /// Guarantees enqueuing only: a later `stop` discards pending
    /// events, and an unregistered target drops the message silently at
    /// dispatch. Events with equal due times dispatch in post order.
    ///
    /// A post after `stop` is dropped immediately (the loop that would
    /// drain it is gone).
    pub fn post(&self, message: Message, delay_us: i64) {
        let due_us = monotonic_now_us().saturating_add(delay_us.max(0));

        let became_head = {
            let mut queue = self.inner.queue.lock();
            if queue.stopped {
                debug!(
                    looper = %self.inner.name,
                    what = message.what(),
                    "post after stop; dropping message"
                );
                return;
            }

            let seq = queue.next_seq;
            queue.next_seq += 1;
            queue.events.push(Event {
                due_us,
                seq,
                message,
            });
            queue.events.peek().is_some_and(|head| head.seq == seq)
        };

        // Wake the worker only when the new event is now the earliest
        // pending; anything else dispatches no sooner than the current
        // head, which the worker is already timed against.
        if became_head {
            self.inner.queue_cv.notify_one();
        }
    }

    /// Allocates a fresh reply token bound to this Looper.
    ///
    /// Attach it to a message with [`Message::with_reply`] before
    /// posting; the handler fulfills it via [`post_reply`](Self::post_reply).
    #[must_use]
    pub fn create_reply_token(&self) -> Arc<ReplyToken> {
        ReplyToken::shared()
    }

    /// Blocks the calling thread until `token` is fulfilled and returns
    /// the reply.
    ///
    /// Unbounded; prefer [`await_response_timeout`](Self::await_response_timeout)
    /// unless the replier is known to be alive and prompt.
    ///
    /// # Errors
    ///
    /// [`LooperError::WouldDeadlock`] when called from this Looper's
    /// own dispatch thread for an unfulfilled token: only that thread
    /// could run the handler that fulfills it, so the wait could never
    /// finish.
    pub fn await_response(&self, token: &Arc<ReplyToken>) -> Result<Message, LooperError> {
        self.check_await_context(token)?;
        Ok(token.wait())
    }

    /// Bounded [`await_response`](Self::await_response).
    ///
    /// # Errors
    ///
    /// [`LooperError::ReplyTimeout`] if `timeout` elapses first;
    /// [`LooperError::WouldDeadlock`] as for `await_response`.
    pub fn await_response_timeout(
        &self,
        token: &Arc<ReplyToken>,
        timeout: Duration,
    ) -> Result<Message, LooperError> {
        self.check_await_context(token)?;
        token.wait_timeout(timeout).ok_or(LooperError::ReplyTimeout)
    }

    /// Fulfills `token` with `reply` and wakes the awaiting thread.
    ///
    /// First write wins: fulfilling an already fulfilled token is a
    /// no-op and wakes nobody.
    pub fn post_reply(&self, token: &Arc<ReplyToken>, reply: Message) {
        if !token.fulfill(reply) {
            debug!(
                looper = %self.inner.name,
                "reply token already fulfilled; duplicate reply ignored"
            );
        }
    }

    /// The deadlock guard: the worker id is resolved at await time, so
    /// tokens created before `start` are covered too.
    fn check_await_context(&self, token: &Arc<ReplyToken>) -> Result<(), LooperError> {
        let on_worker = self.inner.worker.get().copied() == Some(thread::current().id());
        if on_worker && !token.is_fulfilled() {
            return Err(LooperError::WouldDeadlock);
        }
        Ok(())
    }
}

impl Inner {
    /// The dispatch loop. Runs on the worker thread only.
    fn run(&self) {
        debug!(looper = %self.name, "dispatch loop entered");

        loop {
            // Hold the queue lock only while deciding what to do next;
            // it is released before the handler runs so handlers can
            // post, register, and reply without deadlocking the loop.
            let event = {
                let mut queue = self.queue.lock();
                loop {
                    if queue.stopped {
                        return;
                    }
                    let now = monotonic_now_us();
                    match queue.events.peek() {
                        Some(head) if head.due_us <= now => break queue.events.pop(),
                        Some(head) => {
                            // Bounded: either the head comes due, or an
                            // earlier post wakes us first.
                            let wait = Duration::from_micros((head.due_us - now) as u64);
                            self.queue_cv.wait_for(&mut queue, wait);
                        }
                        None => self.queue_cv.wait(&mut queue),
                    }
                }
            };

            if let Some(event) = event {
                self.deliver(event.message);
            }
        }
    }

    fn deliver(&self, message: Message) {
        let target = message.target();
        let association = self.registry.lock().get(&target).cloned();

        match association.and_then(|weak| weak.upgrade()) {
            Some(handler) => handler.on_message(message),
            None => {
                // Unregistered or already-dropped target: the message
                // is discarded, by contract, without error to the poster.
                debug!(
                    looper = %self.name,
                    %target,
                    what = message.what(),
                    "no live handler for target; dropping message"
                );
            }
        }
    }
}

impl Drop for Looper {
    fn drop(&mut self) {
        let running = {
            let queue = self.inner.queue.lock();
            queue.started && !queue.stopped
        };
        if running {
            warn!(
                looper = %self.inner.name,
                "looper dropped while running; stopping (callers should stop() first)"
            );
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl Handler for Nop {
        fn on_message(&self, _message: Message) {}
    }

    #[test]
    fn clock_is_monotonic() {
        let a = Looper::now_us();
        let b = Looper::now_us();
        assert!(b >= a);
        assert!(a >= 0);
    }

    #[test]
    fn handler_ids_are_fresh_and_monotonic() {
        let looper = Looper::new("test");
        let h: Arc<dyn Handler> = Arc::new(Nop);

        let a = looper.register_handler(Arc::downgrade(&h)).unwrap();
        let b = looper.register_handler(Arc::downgrade(&h)).unwrap();
        assert!(b > a);

        // Unregistering never frees an id for reuse.
        looper.unregister_handler(a);
        let c = looper.register_handler(Arc::downgrade(&h)).unwrap();
        assert!(c > b);
    }

    #[test]
    fn register_rejects_dead_weak() {
        let looper = Looper::new("test");
        let dead = {
            let h: Arc<dyn Handler> = Arc::new(Nop);
            Arc::downgrade(&h)
        };

        assert!(matches!(
            looper.register_handler(dead),
            Err(LooperError::InvalidHandler)
        ));
    }

    #[test]
    fn unregister_is_idempotent() {
        let looper = Looper::new("test");
        let h: Arc<dyn Handler> = Arc::new(Nop);
        let id = looper.register_handler(Arc::downgrade(&h)).unwrap();

        looper.unregister_handler(id);
        looper.unregister_handler(id);
        looper.unregister_handler(HandlerId::new(999));
    }

    #[test]
    fn registration_works_before_start() {
        let looper = Looper::new("test");
        let h: Arc<dyn Handler> = Arc::new(Nop);
        assert!(looper.register_handler(Arc::downgrade(&h)).is_ok());
        assert!(!looper.is_running());
    }

    #[test]
    fn stop_before_start_is_a_noop() {
        let looper = Looper::new("test");
        looper.stop();
        looper.stop();
        assert!(!looper.is_running());
    }

    #[test]
    fn token_before_start_begins_unfulfilled() {
        let looper = Looper::new("test");
        let token = looper.create_reply_token();
        assert!(!token.is_fulfilled());
    }
}
