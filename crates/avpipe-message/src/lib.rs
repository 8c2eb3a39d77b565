//! Message types for avpipe.
//!
//! Everything in an avpipe pipeline communicates by posting [`Message`]s
//! into per-component Loopers instead of calling across threads directly.
//! This crate defines the envelope and its two satellites:
//!
//! - [`Message`] - an opcode-tagged envelope addressed to a handler,
//!   carrying an extensible set of typed fields
//! - [`Value`] - the typed-field sum (integers, floats, strings, shared
//!   buffers, opaque shared objects)
//! - [`ReplyToken`] - a one-shot promise pairing a blocked caller with
//!   the eventual reply to a message it posted
//!
//! # Message Flow
//!
//! ```text
//! ┌──────────┐  post(msg, delay)   ┌──────────┐  on_message   ┌──────────┐
//! │  Caller  │ ──────────────────► │  Looper  │ ────────────► │ Handler  │
//! │  thread  │                     │  queue   │               │          │
//! └──────────┘                     └──────────┘               └──────────┘
//!       │                                                          │
//!       │ await_response(token)                  post_reply(token) │
//!       └───────────────◄──── ReplyToken ────►────────────────────-┘
//! ```
//!
//! # Ownership
//!
//! A message is immutable from the moment it is posted: ownership moves
//! from the poster into the queue, then into the dispatch call. Cloning
//! a message clones its field map; buffer and object fields are shared,
//! not deep-copied.
//!
//! # Usage
//!
//! ```
//! use avpipe_message::Message;
//! use avpipe_types::HandlerId;
//!
//! let msg = Message::new(HandlerId::new(1), 0x100)
//!     .with_int64("time_us", 40_000)
//!     .with_str("mime", "audio/opus");
//!
//! assert_eq!(msg.int64("time_us"), Some(40_000));
//! assert_eq!(msg.str_field("mime"), Some("audio/opus"));
//! ```

mod message;
mod reply;
mod value;

pub use message::Message;
pub use reply::ReplyToken;
pub use value::Value;
