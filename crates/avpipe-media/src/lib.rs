//! Media collaborator contracts for avpipe.
//!
//! The looper core dispatches messages; this crate defines what the
//! handlers on the receiving end actually move around:
//!
//! - [`MediaPacket`]: the unit of media data - shared bytes or an
//!   opaque native handle, tagged with audio/video sample metadata.
//! - [`MediaSource`]: the blocking pull contract of demuxers, capture
//!   devices, and test fixtures, with [`ReadOptions`] for seeking.
//! - [`CodecRegistry`]: an explicit, per-pipeline factory lookup for
//!   codec instances. There is no process-global registry; every
//!   pipeline (and every test) owns its own.
//! - [`SourceReader`]: a ready-made [`Handler`](avpipe_looper::Handler)
//!   that drains a source one packet per dispatch.
//!
//! None of these types contain scheduling or synchronization logic of
//! their own; they ride on the looper layer.
//!
//! Status codes are [`MediaError`] values. The looper core never
//! inspects them; they flow from sources and codecs to the handlers
//! driving them.

mod error;
mod packet;
mod registry;
mod source;
mod source_reader;

pub use error::MediaError;
pub use packet::{AudioSampleInfo, MediaPacket, PacketData, SampleInfo, VideoSampleInfo};
pub use registry::{Codec, CodecFactory, CodecId, CodecInfo, CodecRegistry};
pub use source::{MediaFormat, MediaSource, ReadOptions, SeekMode};
pub use source_reader::{SourceReader, FIELD_ERROR, FIELD_PACKETS, WHAT_DRAINED, WHAT_READ};

// Re-export the discriminator shared with the type layer
pub use avpipe_types::MediaType;
