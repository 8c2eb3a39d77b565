//! The message envelope.
//!
//! A [`Message`] is addressed to one handler (by [`HandlerId`]), tagged
//! with an opcode (`what`), and carries an extensible map of typed
//! fields. Field keys are unique; setting a key again replaces the
//! earlier value. Field order is irrelevant.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use avpipe_types::HandlerId;

use crate::{ReplyToken, Value};

/// An addressed, opcode-tagged, field-carrying unit of work.
///
/// Messages are built with `with_*` setters and treated as immutable
/// once posted: ownership transfers from the poster to the queue, then
/// to the dispatch call, and the message is dropped after the handler
/// returns unless the handler retains or re-posts it.
///
/// # Opcode Convention
///
/// `what` is an opaque `u32` interpreted only by the target handler.
/// Handlers conventionally define their opcodes as `pub const`s.
///
/// # Example
///
/// ```
/// use avpipe_message::Message;
/// use avpipe_types::HandlerId;
///
/// const WHAT_DECODE: u32 = 0x2001;
///
/// let msg = Message::new(HandlerId::new(3), WHAT_DECODE)
///     .with_int64("pts_us", 16_666)
///     .with_bool("key_frame", true);
///
/// assert_eq!(msg.what(), WHAT_DECODE);
/// assert_eq!(msg.int64("pts_us"), Some(16_666));
/// assert_eq!(msg.bool_field("key_frame"), Some(true));
/// assert!(msg.int64("dts_us").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    target: HandlerId,
    what: u32,
    fields: HashMap<String, Value>,
    reply_token: Option<Arc<ReplyToken>>,
}

impl Message {
    /// Creates an empty message addressed to `target` with opcode `what`.
    #[must_use]
    pub fn new(target: HandlerId, what: u32) -> Self {
        Self {
            target,
            what,
            fields: HashMap::new(),
            reply_token: None,
        }
    }

    /// Returns the addressed handler.
    #[must_use]
    pub fn target(&self) -> HandlerId {
        self.target
    }

    /// Returns the opcode.
    #[must_use]
    pub fn what(&self) -> u32 {
        self.what
    }

    /// Returns a copy of this message re-addressed to another handler.
    ///
    /// Used when a handler forwards work downstream.
    #[must_use]
    pub fn retargeted(mut self, target: HandlerId) -> Self {
        self.target = target;
        self
    }

    // === Builder-style field setters ===

    /// Sets an `i32` field.
    #[must_use]
    pub fn with_int32(mut self, key: impl Into<String>, value: i32) -> Self {
        self.fields.insert(key.into(), Value::Int32(value));
        self
    }

    /// Sets an `i64` field.
    #[must_use]
    pub fn with_int64(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.insert(key.into(), Value::Int64(value));
        self
    }

    /// Sets an `f32` field.
    #[must_use]
    pub fn with_float(mut self, key: impl Into<String>, value: f32) -> Self {
        self.fields.insert(key.into(), Value::Float(value));
        self
    }

    /// Sets an `f64` field.
    #[must_use]
    pub fn with_double(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), Value::Double(value));
        self
    }

    /// Sets a `bool` field.
    #[must_use]
    pub fn with_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.fields.insert(key.into(), Value::Bool(value));
        self
    }

    /// Sets a string field.
    #[must_use]
    pub fn with_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Sets a shared byte-buffer field.
    #[must_use]
    pub fn with_buffer(mut self, key: impl Into<String>, value: Arc<[u8]>) -> Self {
        self.fields.insert(key.into(), Value::Buffer(value));
        self
    }

    /// Sets an opaque shared-object field.
    #[must_use]
    pub fn with_object(
        mut self,
        key: impl Into<String>,
        value: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        self.fields.insert(key.into(), Value::Object(value));
        self
    }

    /// Attaches a reply token, turning this message into the request
    /// half of a synchronous call.
    #[must_use]
    pub fn with_reply(mut self, token: Arc<ReplyToken>) -> Self {
        self.reply_token = Some(token);
        self
    }

    // === Typed getters ===

    /// Returns the `i32` field stored under `key`, if present and typed so.
    #[must_use]
    pub fn int32(&self, key: &str) -> Option<i32> {
        self.fields.get(key).and_then(Value::as_int32)
    }

    /// Returns the `i64` field stored under `key`, if present and typed so.
    #[must_use]
    pub fn int64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_int64)
    }

    /// Returns the `f32` field stored under `key`, if present and typed so.
    #[must_use]
    pub fn float(&self, key: &str) -> Option<f32> {
        self.fields.get(key).and_then(Value::as_float)
    }

    /// Returns the `f64` field stored under `key`, if present and typed so.
    #[must_use]
    pub fn double(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_double)
    }

    /// Returns the `bool` field stored under `key`, if present and typed so.
    #[must_use]
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Returns the string field stored under `key`, if present and typed so.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns the shared buffer stored under `key`, if present and typed so.
    #[must_use]
    pub fn buffer(&self, key: &str) -> Option<&Arc<[u8]>> {
        self.fields.get(key).and_then(Value::as_buffer)
    }

    /// Downcasts the object field stored under `key` to a concrete type.
    #[must_use]
    pub fn object<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.fields.get(key).and_then(|v| v.downcast::<T>())
    }

    /// Returns the raw field stored under `key`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns `true` if a field named `key` exists, of any type.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the message carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the attached reply token, if any.
    #[must_use]
    pub fn reply_token(&self) -> Option<&Arc<ReplyToken>> {
        self.reply_token.as_ref()
    }

    /// Detaches and returns the reply token, if any.
    ///
    /// Handlers take the token out before fulfilling it so a retained
    /// or re-posted message cannot be replied to twice.
    #[must_use]
    pub fn take_reply_token(&mut self) -> Option<Arc<ReplyToken>> {
        self.reply_token.take()
    }
}
