//! Identifier types for avpipe.
//!
//! Handler identifiers are plain monotonically increasing integers,
//! assigned by the owning Looper at registration time and never reused
//! for the lifetime of that Looper. They deliberately carry no global
//! identity: a `HandlerId` is only meaningful to the Looper that
//! issued it.

use serde::{Deserialize, Serialize};

/// Identifier for a registered message handler.
///
/// A `HandlerId` is assigned by [`register_handler`] and addresses
/// messages to one handler within one Looper. IDs start at 1 and grow
/// monotonically; an ID is never reissued while the Looper is alive,
/// so a message addressed to an unregistered ID can never be delivered
/// to a different, later handler by accident.
///
/// # Equality Semantics
///
/// Two `HandlerId`s compare equal iff they carry the same number.
/// Comparing IDs issued by different Loopers is meaningless - the
/// caller is responsible for keeping them apart.
///
/// # Example
///
/// ```
/// use avpipe_types::HandlerId;
///
/// let a = HandlerId::new(1);
/// let b = HandlerId::new(2);
///
/// assert_ne!(a, b);
/// assert_eq!(a.value(), 1);
/// ```
///
/// [`register_handler`]: https://docs.rs/avpipe-looper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(u32);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - see below
impl HandlerId {
    /// Wraps a raw handler number.
    ///
    /// Normally you receive a `HandlerId` from `register_handler`
    /// rather than constructing one; this exists for tests and for
    /// re-addressing a message to a known target.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw handler number.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

// NOTE: HandlerId intentionally does NOT implement Default.
// A defaulted ID would address no registered handler and every message
// sent to it would be silently dropped. Obtain IDs from register_handler.

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler:{}", self.0)
    }
}
