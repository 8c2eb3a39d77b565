//! Synchronous call/response tests over reply tokens.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use avpipe_looper::{Handler, Looper, LooperError, Message, ReplyToken};
use avpipe_types::ErrorCode;

const WHAT_QUERY: u32 = 0x200;
const WHAT_REPLY: u32 = 0x201;

/// Replies to every query with the doubled `value` field.
struct Doubler {
    looper: Arc<Looper>,
}

impl Handler for Doubler {
    fn on_message(&self, mut message: Message) {
        let value = message.int64("value").unwrap_or(0);
        if let Some(token) = message.take_reply_token() {
            let reply = Message::new(message.target(), WHAT_REPLY).with_int64("value", value * 2);
            self.looper.post_reply(&token, reply);
        }
    }
}

fn doubler_setup(name: &str) -> (Arc<Looper>, avpipe_types::HandlerId, Arc<dyn Handler>) {
    let looper = Arc::new(Looper::new(name));
    looper.start(0).unwrap();

    let handler: Arc<dyn Handler> = Arc::new(Doubler {
        looper: Arc::clone(&looper),
    });
    let id = looper.register_handler(Arc::downgrade(&handler)).unwrap();
    (looper, id, handler)
}

#[test]
fn cross_thread_round_trip() {
    let (looper, id, _handler) = doubler_setup("reply.round-trip");

    let token = looper.create_reply_token();
    looper.post(
        Message::new(id, WHAT_QUERY)
            .with_int64("value", 21)
            .with_reply(Arc::clone(&token)),
        0,
    );

    let reply = looper.await_response(&token).unwrap();
    assert_eq!(reply.what(), WHAT_REPLY);
    assert_eq!(reply.int64("value"), Some(42));

    looper.stop();
}

#[test]
fn bounded_await_succeeds_within_timeout() {
    let (looper, id, _handler) = doubler_setup("reply.bounded");

    let token = looper.create_reply_token();
    looper.post(
        Message::new(id, WHAT_QUERY)
            .with_int64("value", 5)
            .with_reply(Arc::clone(&token)),
        0,
    );

    let reply = looper
        .await_response_timeout(&token, Duration::from_secs(2))
        .unwrap();
    assert_eq!(reply.int64("value"), Some(10));

    looper.stop();
}

#[test]
fn bounded_await_times_out_without_replier() {
    let looper = Looper::new("reply.timeout");
    looper.start(0).unwrap();

    // Token never attached to any message; nobody will fulfill it.
    let token = looper.create_reply_token();
    let err = looper
        .await_response_timeout(&token, Duration::from_millis(30))
        .unwrap_err();

    assert!(matches!(err, LooperError::ReplyTimeout));
    assert_eq!(err.code(), "LOOPER_REPLY_TIMEOUT");
    assert!(err.is_recoverable());

    looper.stop();
}

/// Fulfills the same token twice with different values.
struct DoubleReplier {
    looper: Arc<Looper>,
}

impl Handler for DoubleReplier {
    fn on_message(&self, mut message: Message) {
        if let Some(token) = message.take_reply_token() {
            let target = message.target();
            self.looper
                .post_reply(&token, Message::new(target, WHAT_REPLY).with_int64("n", 1));
            self.looper
                .post_reply(&token, Message::new(target, WHAT_REPLY).with_int64("n", 2));
        }
    }
}

#[test]
fn first_reply_wins_duplicate_is_ignored() {
    let looper = Arc::new(Looper::new("reply.duplicate"));
    looper.start(0).unwrap();

    let handler: Arc<dyn Handler> = Arc::new(DoubleReplier {
        looper: Arc::clone(&looper),
    });
    let id = looper.register_handler(Arc::downgrade(&handler)).unwrap();

    let token = looper.create_reply_token();
    looper.post(
        Message::new(id, WHAT_QUERY).with_reply(Arc::clone(&token)),
        0,
    );

    let reply = looper.await_response(&token).unwrap();
    assert_eq!(reply.int64("n"), Some(1));

    looper.stop();
}

/// Tries to await a fresh token from inside its own dispatch and
/// records what the Looper said.
struct SelfAwaiter {
    looper: Arc<Looper>,
    outcome: Mutex<Option<&'static str>>,
}

impl Handler for SelfAwaiter {
    fn on_message(&self, _message: Message) {
        let token = self.looper.create_reply_token();
        let code = match self.looper.await_response(&token) {
            Ok(_) => "ok",
            Err(err) => err.code(),
        };
        *self.outcome.lock() = Some(code);
    }
}

#[test]
fn awaiting_from_own_dispatch_thread_is_refused() {
    let looper = Arc::new(Looper::new("reply.would-deadlock"));
    looper.start(0).unwrap();

    let awaiter = Arc::new(SelfAwaiter {
        looper: Arc::clone(&looper),
        outcome: Mutex::new(None),
    });
    let handler: Arc<dyn Handler> = awaiter.clone();
    let id = looper.register_handler(Arc::downgrade(&handler)).unwrap();

    looper.post(Message::new(id, WHAT_QUERY), 0);

    let start = std::time::Instant::now();
    while awaiter.outcome.lock().is_none() && start.elapsed() < Duration::from_secs(2) {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(*awaiter.outcome.lock(), Some("LOOPER_WOULD_DEADLOCK"));

    looper.stop();
}

/// Awaits a token handed to it at construction time.
struct StoredTokenAwaiter {
    looper: Arc<Looper>,
    token: Arc<ReplyToken>,
    outcome: Mutex<Option<&'static str>>,
}

impl Handler for StoredTokenAwaiter {
    fn on_message(&self, _message: Message) {
        let code = match self.looper.await_response(&self.token) {
            Ok(_) => "ok",
            Err(err) => err.code(),
        };
        *self.outcome.lock() = Some(code);
    }
}

#[test]
fn token_created_before_start_still_trips_the_deadlock_guard() {
    let looper = Arc::new(Looper::new("reply.pre-start-guard"));

    // Created while the Looper has no worker thread yet.
    let token = looper.create_reply_token();
    looper.start(0).unwrap();

    let awaiter = Arc::new(StoredTokenAwaiter {
        looper: Arc::clone(&looper),
        token,
        outcome: Mutex::new(None),
    });
    let handler: Arc<dyn Handler> = awaiter.clone();
    let id = looper.register_handler(Arc::downgrade(&handler)).unwrap();

    looper.post(Message::new(id, WHAT_QUERY), 0);

    let start = std::time::Instant::now();
    while awaiter.outcome.lock().is_none() && start.elapsed() < Duration::from_secs(2) {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(*awaiter.outcome.lock(), Some("LOOPER_WOULD_DEADLOCK"));

    looper.stop();
}

#[test]
fn already_fulfilled_token_is_awaitable_from_anywhere() {
    let looper = Looper::new("reply.pre-fulfilled");
    looper.start(0).unwrap();

    let token = looper.create_reply_token();
    looper.post_reply(
        &token,
        Message::new(avpipe_types::HandlerId::new(1), WHAT_REPLY).with_int64("n", 9),
    );

    // No block, no deadlock guard trip: the value is already there.
    let reply = looper.await_response(&token).unwrap();
    assert_eq!(reply.int64("n"), Some(9));

    looper.stop();
}
