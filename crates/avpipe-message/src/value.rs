//! Typed field values.
//!
//! [`Value`] is an explicit sum type: a field is exactly one of the
//! listed kinds, and readers ask for the kind they expect. There is no
//! implicit numeric coercion - `int32` on an `Int64` field returns
//! `None`.

use std::any::Any;
use std::sync::Arc;

/// A typed message field.
///
/// Buffers and objects are shared by reference: cloning a `Value`
/// (or the message holding it) never copies payload bytes.
///
/// The `Object` variant carries an opaque `Arc<dyn Any + Send + Sync>`
/// for in-process payloads such as media packets; because of it, `Value`
/// is deliberately **not** serializable - messages never cross a process
/// boundary.
///
/// # Example
///
/// ```
/// use avpipe_message::Value;
/// use std::sync::Arc;
///
/// let v = Value::Buffer(Arc::from(&b"frame"[..]));
/// assert_eq!(v.as_buffer().map(|b| b.len()), Some(5));
/// ```
#[derive(Clone)]
pub enum Value {
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer (timestamps, byte offsets).
    Int64(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Boolean flag.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Shared byte buffer.
    Buffer(Arc<[u8]>),
    /// Opaque shared object (e.g. a media packet handed between stages).
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Returns the inner `i32`, if this is an [`Value::Int32`].
    #[must_use]
    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `i64`, if this is an [`Value::Int64`].
    #[must_use]
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `f32`, if this is a [`Value::Float`].
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `f64`, if this is a [`Value::Double`].
    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `bool`, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner string slice, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the shared buffer, if this is a [`Value::Buffer`].
    #[must_use]
    pub fn as_buffer(&self) -> Option<&Arc<[u8]>> {
        match self {
            Self::Buffer(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the opaque object, if this is a [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Downcasts an [`Value::Object`] field to a concrete shared type.
    ///
    /// # Example
    ///
    /// ```
    /// use avpipe_message::Value;
    /// use std::sync::Arc;
    ///
    /// let v = Value::Object(Arc::new(42u64));
    /// assert_eq!(v.downcast::<u64>().map(|n| *n), Some(42));
    /// assert!(v.downcast::<String>().is_none());
    /// ```
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(v) => Arc::clone(v).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "Int32({v})"),
            Self::Int64(v) => write!(f, "Int64({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Double(v) => write!(f, "Double({v})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Buffer(v) => write!(f, "Buffer({} bytes)", v.len()),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_match_variant() {
        assert_eq!(Value::Int32(7).as_int32(), Some(7));
        assert_eq!(Value::Int64(7).as_int64(), Some(7));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
    }

    #[test]
    fn no_numeric_coercion() {
        assert!(Value::Int64(7).as_int32().is_none());
        assert!(Value::Int32(7).as_int64().is_none());
        assert!(Value::Float(1.0).as_double().is_none());
    }

    #[test]
    fn buffer_clone_shares_bytes() {
        let buf: Arc<[u8]> = Arc::from(&[1u8, 2, 3][..]);
        let v = Value::Buffer(Arc::clone(&buf));
        let copy = v.clone();

        let (a, b) = (v.as_buffer().unwrap(), copy.as_buffer().unwrap());
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn object_downcast() {
        let v = Value::Object(Arc::new(String::from("payload")));
        assert_eq!(v.downcast::<String>().unwrap().as_str(), "payload");
        assert!(v.downcast::<u32>().is_none());
    }

    #[test]
    fn debug_hides_object_contents() {
        let v = Value::Object(Arc::new(1u8));
        assert_eq!(format!("{v:?}"), "Object(..)");
    }
}
