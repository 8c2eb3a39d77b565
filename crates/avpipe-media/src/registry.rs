//! Codec factory lookup.
//!
//! The registry is an explicit object handed to the call sites that
//! need codec creation; there is no process-wide registration. Each
//! pipeline (and each test) builds its own.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use avpipe_types::MediaType;

/// Identity of a codec implementation, independent of vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    Unknown,
    // audio
    Aac,
    Opus,
    Flac,
    Pcm,
    // video
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
}

impl CodecId {
    #[must_use]
    pub fn media_type(self) -> MediaType {
        match self {
            Self::Aac | Self::Opus | Self::Flac | Self::Pcm => MediaType::Audio,
            Self::H264 | Self::H265 | Self::Vp8 | Self::Vp9 | Self::Av1 => MediaType::Video,
            Self::Unknown => MediaType::Unknown,
        }
    }
}

/// One codec a factory can build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecInfo {
    /// Implementation name, unique per factory, e.g. `sw.opus.decoder`.
    pub name: String,
    pub id: CodecId,
    pub encoder: bool,
    /// MIME type this codec consumes or produces.
    pub mime: String,
}

/// An instantiated codec. Opaque to this layer: the driving handler
/// knows what to feed it.
pub trait Codec: Send + Sync {
    fn info(&self) -> CodecInfo;
}

/// A provider of codec instances, registered under a unique name with
/// a priority used to rank competing providers.
pub trait CodecFactory: Send + Sync {
    /// Unique factory name. Registering a second factory under the same
    /// name replaces the first.
    fn name(&self) -> &str;

    /// Rank among factories claiming the same codec; higher wins.
    fn priority(&self) -> i16;

    fn supported_codecs(&self) -> Vec<CodecInfo>;

    /// Builds a codec by identity, or `None` if this factory has no
    /// matching implementation.
    fn create_by_id(&self, id: CodecId, encoder: bool) -> Option<Arc<dyn Codec>>;

    /// Builds a codec by implementation name.
    fn create_by_name(&self, name: &str) -> Option<Arc<dyn Codec>>;
}

/// An isolated collection of codec factories.
///
/// Creation walks factories in descending priority; among factories of
/// equal priority the most recently registered is asked first.
///
/// # Example
///
/// ```
/// use avpipe_media::{CodecId, CodecRegistry};
/// use std::sync::Arc;
///
/// let registry = CodecRegistry::new();
/// // registry.register_factory(Arc::new(MyFactory));
/// assert!(registry.create_by_id(CodecId::Opus, false).is_none());
/// ```
#[derive(Default)]
pub struct CodecRegistry {
    factories: RwLock<Vec<Arc<dyn CodecFactory>>>,
}

impl CodecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory, replacing any earlier factory with the same name.
    pub fn register_factory(&self, factory: Arc<dyn CodecFactory>) {
        let mut factories = self.factories.write();
        let name = factory.name().to_owned();
        let replaced = factories.iter().any(|f| f.name() == name);
        factories.retain(|f| f.name() != name);
        factories.push(factory);

        debug!(factory = %name, replaced, "codec factory registered");
    }

    /// Returns the registered factory with this name, if any.
    #[must_use]
    pub fn factory(&self, name: &str) -> Option<Arc<dyn CodecFactory>> {
        self.factories
            .read()
            .iter()
            .find(|f| f.name() == name)
            .cloned()
    }

    /// Creates a codec by identity from the highest-priority factory
    /// that can build it.
    #[must_use]
    pub fn create_by_id(&self, id: CodecId, encoder: bool) -> Option<Arc<dyn Codec>> {
        for factory in self.ranked() {
            if let Some(codec) = factory.create_by_id(id, encoder) {
                return Some(codec);
            }
        }
        debug!(?id, encoder, "no factory could create codec");
        None
    }

    /// Creates a codec by implementation name, trying factories in
    /// priority order.
    #[must_use]
    pub fn create_by_name(&self, name: &str) -> Option<Arc<dyn Codec>> {
        for factory in self.ranked() {
            if let Some(codec) = factory.create_by_name(name) {
                return Some(codec);
            }
        }
        debug!(codec = name, "no factory could create codec");
        None
    }

    /// Union of all registered factories' supported codecs.
    #[must_use]
    pub fn supported_codecs(&self) -> Vec<CodecInfo> {
        self.ranked()
            .iter()
            .flat_map(|f| f.supported_codecs())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// Snapshot sorted by descending priority, newest-first among equal
    /// priorities (stable sort over reversed registration order).
    fn ranked(&self) -> Vec<Arc<dyn CodecFactory>> {
        let factories = self.factories.read();
        let mut ranked: Vec<_> = factories.iter().rev().cloned().collect();
        ranked.sort_by_key(|f| std::cmp::Reverse(f.priority()));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubCodec {
        info: CodecInfo,
    }

    impl Codec for StubCodec {
        fn info(&self) -> CodecInfo {
            self.info.clone()
        }
    }

    struct StubFactory {
        name: String,
        priority: i16,
        codecs: Vec<CodecInfo>,
    }

    impl StubFactory {
        fn new(name: &str, priority: i16, ids: &[CodecId]) -> Arc<Self> {
            let codecs = ids
                .iter()
                .map(|&id| CodecInfo {
                    name: format!("{name}.{id:?}"),
                    id,
                    encoder: false,
                    mime: String::new(),
                })
                .collect();
            Arc::new(Self {
                name: name.to_owned(),
                priority,
                codecs,
            })
        }
    }

    impl CodecFactory for StubFactory {
        fn name(&self) -> &str {
            &self.name
        }
        fn priority(&self) -> i16 {
            self.priority
        }
        fn supported_codecs(&self) -> Vec<CodecInfo> {
            self.codecs.clone()
        }
        fn create_by_id(&self, id: CodecId, encoder: bool) -> Option<Arc<dyn Codec>> {
            self.codecs
                .iter()
                .find(|c| c.id == id && c.encoder == encoder)
                .map(|c| Arc::new(StubCodec { info: c.clone() }) as Arc<dyn Codec>)
        }
        fn create_by_name(&self, name: &str) -> Option<Arc<dyn Codec>> {
            self.codecs
                .iter()
                .find(|c| c.name == name)
                .map(|c| Arc::new(StubCodec { info: c.clone() }) as Arc<dyn Codec>)
        }
    }

    #[test]
    fn empty_registry_creates_nothing() {
        let registry = CodecRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.create_by_id(CodecId::Opus, false).is_none());
        assert!(registry.create_by_name("sw.opus.decoder").is_none());
    }

    #[test]
    fn higher_priority_factory_wins_contested_codec() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::Opus]));
        registry.register_factory(StubFactory::new("hw", 10, &[CodecId::Opus]));

        let codec = registry.create_by_id(CodecId::Opus, false).unwrap();
        assert_eq!(codec.info().name, "hw.Opus");
    }

    #[test]
    fn lower_priority_factory_serves_uncontested_codec() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::Flac]));
        registry.register_factory(StubFactory::new("hw", 10, &[CodecId::Opus]));

        let codec = registry.create_by_id(CodecId::Flac, false).unwrap();
        assert_eq!(codec.info().name, "sw.Flac");
    }

    #[test]
    fn same_name_registration_is_last_write_wins() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::Opus]));
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::Aac]));

        assert_eq!(registry.len(), 1);
        assert!(registry.create_by_id(CodecId::Opus, false).is_none());
        assert!(registry.create_by_id(CodecId::Aac, false).is_some());
    }

    #[test]
    fn equal_priority_prefers_newest_registration() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("first", 5, &[CodecId::Vp9]));
        registry.register_factory(StubFactory::new("second", 5, &[CodecId::Vp9]));

        let codec = registry.create_by_id(CodecId::Vp9, false).unwrap();
        assert_eq!(codec.info().name, "second.Vp9");
    }

    #[test]
    fn create_by_name_reaches_the_owning_factory() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::Opus, CodecId::Aac]));

        let codec = registry.create_by_name("sw.Aac").unwrap();
        assert_eq!(codec.info().id, CodecId::Aac);
    }

    #[test]
    fn encoder_flag_distinguishes_instances() {
        let registry = CodecRegistry::new();
        registry.register_factory(StubFactory::new("sw", 1, &[CodecId::H264]));

        // Stub factory only carries decoders.
        assert!(registry.create_by_id(CodecId::H264, false).is_some());
        assert!(registry.create_by_id(CodecId::H264, true).is_none());
    }

    #[test]
    fn codec_id_maps_to_media_type() {
        assert!(CodecId::Opus.media_type().is_audio());
        assert!(CodecId::Av1.media_type().is_video());
        assert_eq!(CodecId::Unknown.media_type(), MediaType::Unknown);
    }
}
