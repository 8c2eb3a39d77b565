//! The pull-based media source contract.
//!
//! A source is driven by one handler at a time from inside a Looper
//! dispatch; the trait itself carries no locking. `read` blocks until a
//! packet is available unless the options request non-blocking mode.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use avpipe_types::MediaType;

use crate::{MediaError, MediaPacket, SampleInfo};

/// Output format of a media source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    /// MIME type, e.g. `audio/opus` or `video/avc`.
    pub mime: String,
    pub media_type: MediaType,
    /// Default sample metadata for packets in this format.
    pub sample_info: SampleInfo,
}

impl MediaFormat {
    #[must_use]
    pub fn new(mime: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            mime: mime.into(),
            media_type,
            sample_info: SampleInfo::None,
        }
    }
}

/// How a seek target time maps onto actual sample positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekMode {
    /// The nearest sync sample at or before the target.
    PreviousSync,
    /// The nearest sync sample at or after the target.
    NextSync,
    /// The sync sample closest to the target in either direction.
    #[default]
    ClosestSync,
    /// The sample closest to the target, sync or not.
    Closest,
}

/// Options modifying one or more `read` calls.
///
/// Defaults: no seek requested, zero lateness, blocking. A seek request
/// is non-persistent - sources serving multi-packet reads call
/// [`clear_non_persistent`](Self::clear_non_persistent) after honoring
/// it once, so subsequent reads continue sequentially.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    seek_to: Option<(i64, SeekMode)>,
    lateness_us: i64,
    non_blocking: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets everything back to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_seek_to(&mut self, time_us: i64, mode: SeekMode) {
        self.seek_to = Some((time_us, mode));
    }

    pub fn clear_seek_to(&mut self) {
        self.seek_to = None;
    }

    #[must_use]
    pub fn seek_to(&self) -> Option<(i64, SeekMode)> {
        self.seek_to
    }

    /// Tells the source how far behind the caller is running, so it may
    /// skip ahead.
    pub fn set_late_by(&mut self, lateness_us: i64) {
        self.lateness_us = lateness_us;
    }

    #[must_use]
    pub fn late_by(&self) -> i64 {
        self.lateness_us
    }

    pub fn set_non_blocking(&mut self) {
        self.non_blocking = true;
    }

    pub fn clear_non_blocking(&mut self) {
        self.non_blocking = false;
    }

    #[must_use]
    pub fn non_blocking(&self) -> bool {
        self.non_blocking
    }

    /// Clears the options that apply to a single read (the seek
    /// request); lateness and blocking mode persist.
    pub fn clear_non_persistent(&mut self) {
        self.clear_seek_to();
    }
}

/// A pull-based upstream provider of media packets.
///
/// # Call Protocol
///
/// `start` before anything except `format`; `read` until it returns
/// [`MediaError::EndOfStream`]; `stop` releases whatever the source
/// holds, after which only `start`-less `format` calls are meaningful.
/// A `read` after `stop` (or before `start`) reports
/// [`MediaError::NotInitialized`].
///
/// [`MediaError::FormatChanged`] from `read` means the output format
/// changed mid-stream: re-query `format` and keep reading, prepared for
/// packets of the new configuration.
///
/// The `pause`, `set_buffers`, and `set_stop_time_us` extensions are
/// optional; the defaults report [`MediaError::Unsupported`].
pub trait MediaSource: Send {
    /// Prepares the source for reading. `params` may carry a requested
    /// output configuration; sources that cannot honor it reject with
    /// [`MediaError::InvalidParameter`].
    fn start(&mut self, params: Option<&MediaFormat>) -> Result<(), MediaError>;

    /// Releases the source's buffers and stops any upstream pulling.
    fn stop(&mut self) -> Result<(), MediaError>;

    /// Returns the format of the data this source outputs.
    fn format(&self) -> Result<MediaFormat, MediaError>;

    /// Returns the next packet, blocking until one is available unless
    /// `options.non_blocking()` is set.
    fn read(&mut self, options: &ReadOptions) -> Result<MediaPacket, MediaError>;

    /// Suspends pulling from upstream until a subsequent seeking read.
    fn pause(&mut self) -> Result<(), MediaError> {
        Err(MediaError::Unsupported)
    }

    /// Requests that reads are served exclusively from these buffers.
    /// Called after `start` and before the first `read`.
    fn set_buffers(&mut self, _buffers: Vec<Arc<[u8]>>) -> Result<(), MediaError> {
        Err(MediaError::Unsupported)
    }

    /// Requests the source stop emitting packets with timestamps at or
    /// past `stop_time_us`; `-1` cancels an earlier request.
    fn set_stop_time_us(&mut self, _stop_time_us: i64) -> Result<(), MediaError> {
        Err(MediaError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_no_seek_not_late_blocking() {
        let options = ReadOptions::new();
        assert!(options.seek_to().is_none());
        assert_eq!(options.late_by(), 0);
        assert!(!options.non_blocking());
    }

    #[test]
    fn clear_non_persistent_keeps_lateness_and_blocking_mode() {
        let mut options = ReadOptions::new();
        options.set_seek_to(1_000_000, SeekMode::NextSync);
        options.set_late_by(5_000);
        options.set_non_blocking();

        options.clear_non_persistent();

        assert!(options.seek_to().is_none());
        assert_eq!(options.late_by(), 5_000);
        assert!(options.non_blocking());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut options = ReadOptions::new();
        options.set_seek_to(42, SeekMode::Closest);
        options.set_late_by(1);
        options.set_non_blocking();

        options.reset();
        assert_eq!(options, ReadOptions::default());
    }

    #[test]
    fn seek_round_trip() {
        let mut options = ReadOptions::new();
        options.set_seek_to(16_666, SeekMode::PreviousSync);
        assert_eq!(options.seek_to(), Some((16_666, SeekMode::PreviousSync)));

        options.clear_seek_to();
        assert!(options.seek_to().is_none());
    }

    struct Minimal;

    impl MediaSource for Minimal {
        fn start(&mut self, _params: Option<&MediaFormat>) -> Result<(), MediaError> {
            Ok(())
        }
        fn stop(&mut self) -> Result<(), MediaError> {
            Ok(())
        }
        fn format(&self) -> Result<MediaFormat, MediaError> {
            Ok(MediaFormat::new("audio/raw", MediaType::Audio))
        }
        fn read(&mut self, _options: &ReadOptions) -> Result<MediaPacket, MediaError> {
            Err(MediaError::EndOfStream)
        }
    }

    #[test]
    fn optional_operations_default_to_unsupported() {
        let mut source = Minimal;
        assert_eq!(source.pause(), Err(MediaError::Unsupported));
        assert_eq!(source.set_buffers(Vec::new()), Err(MediaError::Unsupported));
        assert_eq!(source.set_stop_time_us(0), Err(MediaError::Unsupported));
    }
}
