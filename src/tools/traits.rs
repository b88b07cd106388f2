//! Capability traits for the external collaborators of the pipeline

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// Where a track's encrypted media comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackSource {
    /// A media playlist URL chosen from the enhanced manifest
    Enhanced(String),
    /// The legacy lossy delivery path, looked up by the helper itself
    Legacy,
}

/// Elementary stream kind for music videos
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Video-only stream
    Video,
    /// Audio-only stream
    Audio,
}

impl StreamKind {
    /// Name used on helper command lines and in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        }
    }
}

/// Ordered `key=value` tags for the external muxer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagList(Vec<(String, String)>);

impl TagList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag; empty values are kept so the muxer clears the field
    pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    /// Value of the first tag named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tags were added
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagList {
    /// Colon-joined `key=value` pairs, as MP4Box `-itags` expects
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Key exchange, segment download and decryption
///
/// Every call is long-running and atomic: it either leaves a complete file at
/// `dest` or fails.
#[async_trait]
pub trait DecryptingFetcher: Send + Sync {
    /// Download and decrypt a whole track into a container at `dest`
    async fn fetch_track(
        &self,
        track_id: &str,
        source: &TrackSource,
        credential: &str,
        dest: &Path,
    ) -> Result<()>;

    /// Download and decrypt one elementary stream of a music video
    async fn fetch_elementary(
        &self,
        item_id: &str,
        url: &str,
        kind: StreamKind,
        credential: &str,
        dest: &Path,
    ) -> Result<()>;

    /// Look up the master manifest URL of a music video
    async fn playback_manifest(&self, item_id: &str, credential: &str) -> Result<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Container muxing and descriptive tag embedding
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Embed descriptive tags into an existing container
    async fn apply_tags(&self, path: &Path, tags: &TagList) -> Result<()>;

    /// Combine video and audio elementary streams into `out`, tagging it
    async fn remux(&self, video: &Path, audio: &Path, tags: &TagList, out: &Path) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Stream copying and conversion for animated artwork
#[async_trait]
pub trait StreamCopier: Send + Sync {
    /// Copy the stream at `url` into `dest` without re-encoding
    async fn copy(&self, url: &str, dest: &Path) -> Result<()>;

    /// Convert a video file into an animated GIF
    async fn to_gif(&self, src: &Path, dest: &Path) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Local helper that knows higher-fidelity manifests for some tracks
#[async_trait]
pub trait ManifestProbe: Send + Sync {
    /// Ask for a manifest URL; `None` when the helper has nothing
    async fn resolve(&self, track_id: &str) -> Result<Option<String>>;
}
