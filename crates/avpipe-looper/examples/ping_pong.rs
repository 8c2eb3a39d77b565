//! Ping-pong over two loopers.
//!
//! Demonstrates:
//! - Handler registration by weak reference
//! - Delayed posting between loopers
//! - A synchronous call with a reply token

use std::sync::Arc;

use avpipe_looper::{Handler, HandlerId, Looper, Message};
use parking_lot::Mutex;

const WHAT_PING: u32 = 0x1;
const WHAT_DONE: u32 = 0x2;

struct Ponger {
    looper: Arc<Looper>,
    peer: Mutex<Option<HandlerId>>,
}

impl Handler for Ponger {
    fn on_message(&self, mut message: Message) {
        let round = message.int64("round").unwrap_or(0);
        println!("ponger: ping round {round}");

        if round >= 3 {
            if let Some(token) = message.take_reply_token() {
                self.looper
                    .post_reply(&token, Message::new(message.target(), WHAT_DONE));
            }
            return;
        }

        if let Some(peer) = *self.peer.lock() {
            let mut reply = Message::new(peer, WHAT_PING).with_int64("round", round + 1);
            if let Some(token) = message.take_reply_token() {
                reply = reply.with_reply(token);
            }
            // 50ms between rounds
            self.looper.post(reply, 50_000);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let looper = Arc::new(Looper::new("demo.pingpong"));
    looper.start(0).expect("start");

    let a = Arc::new(Ponger {
        looper: Arc::clone(&looper),
        peer: Mutex::new(None),
    });
    let b = Arc::new(Ponger {
        looper: Arc::clone(&looper),
        peer: Mutex::new(None),
    });

    let a_dyn: Arc<dyn Handler> = a.clone();
    let b_dyn: Arc<dyn Handler> = b.clone();
    let a_id = looper.register_handler(Arc::downgrade(&a_dyn)).expect("register a");
    let b_id = looper.register_handler(Arc::downgrade(&b_dyn)).expect("register b");
    *a.peer.lock() = Some(b_id);
    *b.peer.lock() = Some(a_id);

    let token = looper.create_reply_token();
    looper.post(
        Message::new(a_id, WHAT_PING)
            .with_int64("round", 0)
            .with_reply(Arc::clone(&token)),
        0,
    );

    let done = looper.await_response(&token).expect("reply");
    println!("done: what={:#x}", done.what());

    looper.stop();
    println!("looper stopped: {}", !looper.is_running());
}
