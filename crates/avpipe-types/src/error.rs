//! Unified error interface for avpipe.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that
//! callers - handlers, pipeline glue, logging - can treat errors from
//! different layers uniformly.
//!
//! # Design
//!
//! - **Machine-readable codes**: stable UPPER_SNAKE_CASE strings with a
//!   per-crate prefix (`LOOPER_`, `MEDIA_`), for programmatic handling
//!   and log correlation.
//! - **Recoverability**: whether retrying (or a corrective action by the
//!   caller) can succeed. A dispatch timeout is recoverable; awaiting a
//!   reply from the thread that must produce it is not.
//!
//! # Example
//!
//! ```
//! use avpipe_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum QueueError {
//!     Full,
//!     Closed,
//! }
//!
//! impl ErrorCode for QueueError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Full => "QUEUE_FULL",
//!             Self::Closed => "QUEUE_CLOSED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! assert_eq!(QueueError::Full.code(), "QUEUE_FULL");
//! assert!(QueueError::Full.is_recoverable());
//! ```

/// Unified error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"LOOPER_ALREADY_STARTED"`
/// - **Prefixed per layer**: `LOOPER_`, `MEDIA_`
/// - **Stable**: codes are API contract and must not change once shipped
///
/// # Recoverability
///
/// An error is recoverable when retrying the operation may succeed or
/// the caller can take a corrective action. Programming errors (waiting
/// on a reply only the waiting thread can produce) and malformed input
/// are not recoverable.
pub trait ErrorCode {
    /// Returns the machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying or a corrective action may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Checks an error code against avpipe conventions: non-empty, carrying
/// the expected prefix, UPPER_SNAKE_CASE throughout.
///
/// Returns what is wrong rather than panicking, so linting or plugin
/// registration code can report a bad code instead of aborting; the
/// `assert_*` helpers below wrap this for tests.
///
/// # Errors
///
/// A human-readable description of the first violated rule.
///
/// # Example
///
/// ```
/// use avpipe_types::validate_error_code;
///
/// assert!(validate_error_code("CORE_TIMEOUT", "CORE_").is_ok());
/// assert!(validate_error_code("core_timeout", "CORE_").is_err());
/// ```
pub fn validate_error_code(code: &str, expected_prefix: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("error code must not be empty".into());
    }
    if !code.starts_with(expected_prefix) {
        return Err(format!(
            "error code '{code}' must start with prefix '{expected_prefix}'"
        ));
    }

    let chars_ok = code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    let shape_ok = !code.starts_with('_') && !code.ends_with('_') && !code.contains("__");
    if !chars_ok || !shape_ok {
        return Err(format!("error code '{code}' must be UPPER_SNAKE_CASE"));
    }

    Ok(())
}

/// Test helper: panics with the validator's message if the error's code
/// breaks convention.
///
/// # Panics
///
/// See [`validate_error_code`].
///
/// # Example
///
/// ```
/// use avpipe_types::{assert_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "CORE_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "CORE_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    if let Err(reason) = validate_error_code(err.code(), expected_prefix) {
        panic!("{reason}");
    }
}

/// Validates every variant of an error enum at once.
///
/// # Example
///
/// ```
/// use avpipe_types::{assert_error_codes, ErrorCode};
///
/// #[derive(Debug)]
/// enum E { A, B }
///
/// impl ErrorCode for E {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::A => "X_A",
///             Self::B => "X_B",
///         }
///     }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_codes(&[E::A, E::B], "X_");
/// ```
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}
