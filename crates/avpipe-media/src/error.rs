//! Media layer status codes.
//!
//! These are produced by sources and codecs and consumed by the
//! handlers driving them. The looper core never interprets them.
//!
//! # Error Code Convention
//!
//! All media errors use the `MEDIA_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`MediaError::Unsupported`] | `MEDIA_UNSUPPORTED` | No |
//! | [`MediaError::EndOfStream`] | `MEDIA_END_OF_STREAM` | No |
//! | [`MediaError::FormatChanged`] | `MEDIA_FORMAT_CHANGED` | Yes |
//! | [`MediaError::InvalidParameter`] | `MEDIA_INVALID_PARAMETER` | No |
//! | [`MediaError::NotInitialized`] | `MEDIA_NOT_INITIALIZED` | No |

use avpipe_types::ErrorCode;
use thiserror::Error;

/// Status codes surfaced by media sources and codecs.
///
/// `FormatChanged` is informational: the source changed its output
/// format mid-stream, the caller re-queries the format and keeps
/// reading. Everything else ends the current operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// The source or codec does not implement the requested operation.
    #[error("operation not supported")]
    Unsupported,

    /// The source has no more data. Terminal for this stream.
    #[error("end of stream")]
    EndOfStream,

    /// The output format changed mid-stream; re-query the format and
    /// continue reading with the new configuration.
    #[error("format changed mid-stream")]
    FormatChanged,

    /// A caller-supplied parameter was rejected.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The source was read before `start` or after `stop`.
    #[error("source not initialized")]
    NotInitialized,
}

impl ErrorCode for MediaError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unsupported => "MEDIA_UNSUPPORTED",
            Self::EndOfStream => "MEDIA_END_OF_STREAM",
            Self::FormatChanged => "MEDIA_FORMAT_CHANGED",
            Self::InvalidParameter(_) => "MEDIA_INVALID_PARAMETER",
            Self::NotInitialized => "MEDIA_NOT_INITIALIZED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::FormatChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avpipe_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(
            &[
                MediaError::Unsupported,
                MediaError::EndOfStream,
                MediaError::FormatChanged,
                MediaError::InvalidParameter("rate".into()),
                MediaError::NotInitialized,
            ],
            "MEDIA_",
        );
    }

    #[test]
    fn only_format_changed_is_recoverable() {
        assert!(MediaError::FormatChanged.is_recoverable());
        assert!(!MediaError::EndOfStream.is_recoverable());
        assert!(!MediaError::Unsupported.is_recoverable());
        assert!(!MediaError::NotInitialized.is_recoverable());
    }
}
