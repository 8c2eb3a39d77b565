//! Core types for the avpipe media engine.
//!
//! This crate is the bottom of the avpipe stack: identifier types,
//! the unified error-code convention, and the media-type discriminator
//! shared by every other crate.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  avpipe-media   : MediaPacket, MediaSource, codecs   │
//! │  avpipe-looper  : Looper, Handler, Event             │
//! │  avpipe-message : Message, Value, ReplyToken         │
//! │  avpipe-types   : HandlerId, ErrorCode  ◄── HERE     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Contents
//!
//! - [`HandlerId`] - identity of a registered message handler
//! - [`ErrorCode`] - machine-readable error codes + recoverability
//! - [`MediaType`] - audio/video/unknown discriminator
//!
//! # Usage
//!
//! ```
//! use avpipe_types::{HandlerId, MediaType};
//!
//! let id = HandlerId::new(1);
//! assert_eq!(id.to_string(), "handler:1");
//! assert!(MediaType::Audio.is_audio());
//! ```

mod error;
mod id;
mod media_type;

pub use error::{assert_error_code, assert_error_codes, validate_error_code, ErrorCode};
pub use id::HandlerId;
pub use media_type::MediaType;
