//! A handler that drains a media source from inside a Looper.
//!
//! `SourceReader` is the bridge between the two halves of this crate
//! family: it owns a [`MediaSource`] and pulls one packet per dispatched
//! read message, re-posting itself until the source reports end of
//! stream. Callers kick off a drain with a reply token and block (on
//! their own thread) until the reader fulfills it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use avpipe_looper::{Handler, Looper, LooperError};
use avpipe_message::{Message, ReplyToken};
use avpipe_types::{ErrorCode, HandlerId};

use crate::{MediaError, MediaSource, ReadOptions, SeekMode};

/// Opcode: pull one packet from the source.
pub const WHAT_READ: u32 = 0x5244;
/// Opcode of the reply posted when a drain completes.
pub const WHAT_DRAINED: u32 = 0x444e;

/// Reply field: packets delivered before the stream ended.
pub const FIELD_PACKETS: &str = "packets";
/// Reply field: error code, present only when the drain failed.
pub const FIELD_ERROR: &str = "error";

/// Drives a [`MediaSource`] one packet per dispatch.
///
/// # Usage
///
/// ```no_run
/// # use avpipe_looper::Looper;
/// # use avpipe_media::{SourceReader, MediaSource};
/// # use std::sync::Arc;
/// # fn open_source() -> Box<dyn MediaSource> { unimplemented!() }
/// let looper = Arc::new(Looper::new("media.reader"));
/// looper.start(0).expect("start");
///
/// let reader = SourceReader::new(Arc::clone(&looper), open_source());
/// reader.attach().expect("attach");
/// reader.start().expect("source start");
///
/// let token = reader.drain().expect("drain");
/// let done = looper.await_response(&token).expect("reply");
/// println!("packets: {:?}", done.int64("packets"));
/// ```
pub struct SourceReader {
    looper: Arc<Looper>,
    source: Mutex<Box<dyn MediaSource>>,
    options: Mutex<ReadOptions>,
    drained: AtomicU64,
    pending_reply: Mutex<Option<Arc<ReplyToken>>>,
    id: Mutex<Option<HandlerId>>,
}

impl SourceReader {
    #[must_use]
    pub fn new(looper: Arc<Looper>, source: Box<dyn MediaSource>) -> Arc<Self> {
        Arc::new(Self {
            looper,
            source: Mutex::new(source),
            options: Mutex::new(ReadOptions::new()),
            drained: AtomicU64::new(0),
            pending_reply: Mutex::new(None),
            id: Mutex::new(None),
        })
    }

    /// Registers this reader with its Looper.
    ///
    /// # Errors
    ///
    /// Propagates [`LooperError::InvalidHandler`] from registration.
    pub fn attach(self: &Arc<Self>) -> Result<HandlerId, LooperError> {
        let handler: Arc<dyn Handler> = Arc::clone(self) as Arc<dyn Handler>;
        let id = self.looper.register_handler(Arc::downgrade(&handler))?;
        *self.id.lock() = Some(id);
        Ok(id)
    }

    /// Unregisters this reader. Call before dropping the last reference.
    pub fn detach(&self) {
        if let Some(id) = self.id.lock().take() {
            self.looper.unregister_handler(id);
        }
    }

    /// Starts the underlying source.
    ///
    /// # Errors
    ///
    /// Whatever the source reports.
    pub fn start(&self) -> Result<(), MediaError> {
        self.source.lock().start(None)
    }

    /// Stops the underlying source. Reads dispatched afterwards report
    /// [`MediaError::NotInitialized`] and end the drain.
    ///
    /// # Errors
    ///
    /// Whatever the source reports.
    pub fn stop(&self) -> Result<(), MediaError> {
        self.source.lock().stop()
    }

    /// Requests that the next read seeks before pulling. The request is
    /// consumed by that one read.
    pub fn seek_to(&self, time_us: i64, mode: SeekMode) {
        self.options.lock().set_seek_to(time_us, mode);
    }

    /// Packets delivered by the drain in progress (or the last one).
    #[must_use]
    pub fn packets_drained(&self) -> u64 {
        self.drained.load(Ordering::Relaxed)
    }

    /// Kicks off a drain: reads packet after packet until the source
    /// reports end of stream, then fulfills the returned token with a
    /// [`WHAT_DRAINED`] reply carrying [`FIELD_PACKETS`] (and
    /// [`FIELD_ERROR`] when the stream ended abnormally).
    ///
    /// # Errors
    ///
    /// [`LooperError::InvalidHandler`] if the reader is not attached.
    pub fn drain(&self) -> Result<Arc<ReplyToken>, LooperError> {
        let id = (*self.id.lock()).ok_or(LooperError::InvalidHandler)?;
        self.drained.store(0, Ordering::Relaxed);

        let token = self.looper.create_reply_token();
        self.looper
            .post(Message::new(id, WHAT_READ).with_reply(Arc::clone(&token)), 0);
        Ok(token)
    }

    fn finish(&self, target: HandlerId, error: Option<MediaError>) {
        let drained = self.drained.load(Ordering::Relaxed);
        match &error {
            None => info!(looper = self.looper.name(), drained, "source drained"),
            Some(err) => warn!(
                looper = self.looper.name(),
                drained,
                error = err.code(),
                "drain ended abnormally"
            ),
        }

        if let Some(token) = self.pending_reply.lock().take() {
            let mut reply =
                Message::new(target, WHAT_DRAINED).with_int64(FIELD_PACKETS, drained as i64);
            if let Some(err) = error {
                reply = reply.with_str(FIELD_ERROR, err.code());
            }
            self.looper.post_reply(&token, reply);
        }
    }
}

impl Handler for SourceReader {
    fn on_message(&self, mut message: Message) {
        if message.what() != WHAT_READ {
            debug!(what = message.what(), "source reader ignoring unknown opcode");
            return;
        }

        // The kickoff message carries the drain's reply token; the
        // self-posted continuations do not.
        if let Some(token) = message.take_reply_token() {
            *self.pending_reply.lock() = Some(token);
        }

        let target = message.target();
        let result = {
            let mut source = self.source.lock();
            let mut options = self.options.lock();
            let result = source.read(&options);
            options.clear_non_persistent();
            result
        };

        match result {
            Ok(packet) => {
                self.drained.fetch_add(1, Ordering::Relaxed);
                if packet.is_eos() {
                    self.finish(target, None);
                } else {
                    self.looper.post(Message::new(target, WHAT_READ), 0);
                }
            }
            Err(MediaError::FormatChanged) => {
                info!(looper = self.looper.name(), "source format changed; continuing");
                self.looper.post(Message::new(target, WHAT_READ), 0);
            }
            Err(MediaError::EndOfStream) => self.finish(target, None),
            Err(err) => self.finish(target, Some(err)),
        }
    }
}
