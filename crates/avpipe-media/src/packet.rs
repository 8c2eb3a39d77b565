//! The media packet value type.
//!
//! A packet carries exactly one of an owned byte buffer or an opaque
//! native handle, never both. Cloning shares the payload by reference
//! count; packets are cheap to pass through messages.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use avpipe_types::MediaType;

use crate::MediaError;

/// Per-sample metadata for audio packets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioSampleInfo {
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    pub pts_us: i64,
}

/// Per-sample metadata for video packets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoSampleInfo {
    pub width: u32,
    pub height: u32,
    pub key_frame: bool,
    pub pts_us: i64,
}

/// Sample metadata, discriminated by the packet's media type.
///
/// An explicit sum type: the discriminant is the data, there is no
/// dispatch hierarchy behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SampleInfo {
    #[default]
    None,
    Audio(AudioSampleInfo),
    Video(VideoSampleInfo),
}

/// Packet payload: owned bytes or an opaque platform handle.
///
/// The two variants are mutually exclusive. A handle packet has no
/// readable bytes (`MediaPacket::data` returns `None`); consumers that
/// understand the handle downcast it.
#[derive(Clone)]
pub enum PacketData {
    Buffer(Arc<[u8]>),
    NativeHandle(Arc<dyn Any + Send + Sync>),
}

impl std::fmt::Debug for PacketData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Self::NativeHandle(_) => write!(f, "NativeHandle(..)"),
        }
    }
}

/// One unit of media data moving through the pipeline.
///
/// # Example
///
/// ```
/// use avpipe_media::MediaPacket;
/// use avpipe_types::MediaType;
///
/// let mut packet = MediaPacket::with_size(1024);
/// packet.set_media_type(MediaType::Audio);
///
/// let info = packet.audio_info_mut().expect("audio packet");
/// info.sample_rate_hz = 48_000;
/// info.channel_count = 2;
///
/// // Clones share the buffer, not duplicate it.
/// let copy = packet.clone();
/// assert_eq!(copy.size(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct MediaPacket {
    data: PacketData,
    media_type: MediaType,
    eos: bool,
    sample_info: SampleInfo,
}

impl MediaPacket {
    /// Creates a buffer packet with `size` zeroed bytes.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self::with_buffer(Arc::from(vec![0u8; size]))
    }

    /// Creates a buffer packet wrapping shared bytes.
    #[must_use]
    pub fn with_buffer(data: Arc<[u8]>) -> Self {
        Self {
            data: PacketData::Buffer(data),
            media_type: MediaType::Unknown,
            eos: false,
            sample_info: SampleInfo::None,
        }
    }

    /// Creates a packet carrying an opaque native handle.
    #[must_use]
    pub fn with_handle(handle: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            data: PacketData::NativeHandle(handle),
            media_type: MediaType::Unknown,
            eos: false,
            sample_info: SampleInfo::None,
        }
    }

    /// Returns the buffer bytes, or `None` for a handle packet.
    #[must_use]
    pub fn data(&self) -> Option<&Arc<[u8]>> {
        match &self.data {
            PacketData::Buffer(bytes) => Some(bytes),
            PacketData::NativeHandle(_) => None,
        }
    }

    /// Downcasts a handle packet's payload to a concrete type.
    #[must_use]
    pub fn handle<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match &self.data {
            PacketData::NativeHandle(handle) => Arc::clone(handle).downcast::<T>().ok(),
            PacketData::Buffer(_) => None,
        }
    }

    /// Returns the payload variant.
    #[must_use]
    pub fn packet_data(&self) -> &PacketData {
        &self.data
    }

    /// Buffer length in bytes; zero for a handle packet.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.data {
            PacketData::Buffer(bytes) => bytes.len(),
            PacketData::NativeHandle(_) => 0,
        }
    }

    /// Replaces the buffer bytes.
    ///
    /// # Errors
    ///
    /// [`MediaError::Unsupported`] on a handle packet - only buffer
    /// packets carry replaceable bytes.
    pub fn set_data(&mut self, data: Arc<[u8]>) -> Result<(), MediaError> {
        match &self.data {
            PacketData::Buffer(_) => {
                self.data = PacketData::Buffer(data);
                Ok(())
            }
            PacketData::NativeHandle(_) => Err(MediaError::Unsupported),
        }
    }

    /// Reallocates the buffer to `size` zeroed bytes.
    ///
    /// # Errors
    ///
    /// [`MediaError::Unsupported`] on a handle packet;
    /// [`MediaError::InvalidParameter`] for a zero size.
    pub fn set_size(&mut self, size: usize) -> Result<(), MediaError> {
        if size == 0 {
            return Err(MediaError::InvalidParameter("size must be non-zero".into()));
        }
        self.set_data(Arc::from(vec![0u8; size]))
    }

    #[must_use]
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Sets the media type, re-seeding the sample info to the matching
    /// variant when the tag actually changes. Metadata already stored
    /// in the old variant is discarded.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        if self.media_type == media_type {
            return;
        }
        self.media_type = media_type;
        self.sample_info = match media_type {
            MediaType::Audio => SampleInfo::Audio(AudioSampleInfo::default()),
            MediaType::Video => SampleInfo::Video(VideoSampleInfo::default()),
            MediaType::Unknown => SampleInfo::None,
        };
    }

    #[must_use]
    pub fn is_eos(&self) -> bool {
        self.eos
    }

    pub fn set_eos(&mut self, eos: bool) {
        self.eos = eos;
    }

    #[must_use]
    pub fn sample_info(&self) -> &SampleInfo {
        &self.sample_info
    }

    /// Returns the audio sample info if this is an audio packet.
    #[must_use]
    pub fn audio_info(&self) -> Option<&AudioSampleInfo> {
        match &self.sample_info {
            SampleInfo::Audio(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn audio_info_mut(&mut self) -> Option<&mut AudioSampleInfo> {
        match &mut self.sample_info {
            SampleInfo::Audio(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the video sample info if this is a video packet.
    #[must_use]
    pub fn video_info(&self) -> Option<&VideoSampleInfo> {
        match &self.sample_info {
            SampleInfo::Video(info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn video_info_mut(&mut self) -> Option<&mut VideoSampleInfo> {
        match &mut self.sample_info {
            SampleInfo::Video(info) => Some(info),
            _ => None,
        }
    }
}
