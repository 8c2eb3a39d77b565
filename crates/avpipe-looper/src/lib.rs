//! Per-component event loops for avpipe.
//!
//! Every codec, source, and pipeline stage in an avpipe engine runs
//! behind a [`Looper`]: a dedicated worker thread draining a
//! time-ordered queue of [`Message`]s and dispatching them to registered
//! [`Handler`]s. Stages never call each other across threads directly
//! and never share ad-hoc locks - they post messages.
//!
//! # Architecture
//!
//! ```text
//!                    ┌────────────────────────────────┐
//!                    │            Looper              │
//!                    │                                │
//! post(msg, delay) ─►│  event queue (ordered by due   │
//!                    │  time, FIFO within a tick)     │
//!                    │        │                       │
//!                    │        ▼  worker thread        │
//!                    │  dispatch loop ──► registry    │
//!                    │        │           lookup      │
//!                    │        ▼                       │
//!                    │  Handler::on_message(msg)      │
//!                    └────────────────────────────────┘
//! ```
//!
//! # Delivery Contract
//!
//! | Guarantee | Holds |
//! |-----------|-------|
//! | Dispatch order non-decreasing in due time | Yes |
//! | FIFO among equal due times | Yes |
//! | Never dispatched before due time | Yes |
//! | Enqueued implies dispatched | **No** - `stop()` discards pending events |
//! | Cross-Looper ordering | No |
//!
//! `post` guarantees enqueuing only. Events still queued when `stop()`
//! runs are discarded without dispatch, and a message addressed to an
//! unregistered handler is dropped silently. Callers needing delivery
//! confirmation attach a [`ReplyToken`] and await the reply.
//!
//! # Synchronous calls
//!
//! [`Looper::create_reply_token`] / [`Looper::await_response`] /
//! [`Looper::post_reply`] layer a blocking call/response convention on
//! top of the queue. Awaiting a reply from the Looper's own dispatch
//! thread is refused with [`LooperError::WouldDeadlock`] rather than
//! hanging.
//!
//! # Usage
//!
//! ```
//! use avpipe_looper::{Handler, Looper};
//! use avpipe_message::Message;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl Handler for Printer {
//!     fn on_message(&self, message: Message) {
//!         println!("what={:#x}", message.what());
//!     }
//! }
//!
//! let looper = Looper::new("demo");
//! looper.start(0).expect("first start succeeds");
//!
//! let printer: Arc<Printer> = Arc::new(Printer);
//! let handler: Arc<dyn Handler> = printer;
//! let id = looper
//!     .register_handler(Arc::downgrade(&handler))
//!     .expect("live handler");
//!
//! looper.post(Message::new(id, 0x10), 0);
//! looper.stop();
//! ```

mod error;
mod event;
mod handler;
mod looper;

pub use error::LooperError;
pub use handler::Handler;
pub use looper::Looper;

// Re-export the message layer for convenience
pub use avpipe_message::{Message, ReplyToken, Value};
pub use avpipe_types::HandlerId;
