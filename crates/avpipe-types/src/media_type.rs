//! Media-type discriminator.
//!
//! [`MediaType`] tags packets and formats as audio or video so that
//! consumers can select the matching sample-info variant without
//! inspecting payload bytes.

use serde::{Deserialize, Serialize};

/// Kind of media carried by a packet, format, or stream.
///
/// The tag drives which sample-info variant a packet carries: an
/// `Audio` packet holds audio sample info, a `Video` packet holds video
/// sample info, and `Unknown` holds none.
///
/// # Example
///
/// ```
/// use avpipe_types::MediaType;
///
/// assert!(MediaType::Audio.is_audio());
/// assert!(!MediaType::Unknown.is_video());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// Not yet tagged. Freshly created packets start here.
    #[default]
    Unknown,
    /// Audio samples.
    Audio,
    /// Video frames.
    Video,
}

impl MediaType {
    /// Returns `true` for [`MediaType::Audio`].
    #[must_use]
    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio)
    }

    /// Returns `true` for [`MediaType::Video`].
    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Audio => "audio",
            Self::Video => "video",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(MediaType::default(), MediaType::Unknown);
    }

    #[test]
    fn predicates() {
        assert!(MediaType::Audio.is_audio());
        assert!(MediaType::Video.is_video());
        assert!(!MediaType::Unknown.is_audio());
        assert!(!MediaType::Unknown.is_video());
    }

    #[test]
    fn display() {
        assert_eq!(MediaType::Audio.to_string(), "audio");
        assert_eq!(MediaType::Video.to_string(), "video");
        assert_eq!(MediaType::Unknown.to_string(), "unknown");
    }
}
