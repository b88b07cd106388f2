//! Stubs used when an external tool is not configured
//!
//! Each returns [`Error::NotSupported`](crate::Error::NotSupported) so the
//! affected track fails with a clear message while the rest of the run goes on.

use super::traits::{DecryptingFetcher, Muxer, StreamCopier, StreamKind, TagList, TrackSource};
use async_trait::async_trait;
use std::path::Path;

/// Fetcher used when no helper executable is configured
pub struct UnavailableFetcher;

fn no_helper() -> crate::Error {
    crate::Error::NotSupported(
        "Acquisition requires the fetch helper. Configure fetch_helper_path in config.".into(),
    )
}

#[async_trait]
impl DecryptingFetcher for UnavailableFetcher {
    async fn fetch_track(
        &self,
        _track_id: &str,
        _source: &TrackSource,
        _credential: &str,
        _dest: &Path,
    ) -> crate::Result<()> {
        Err(no_helper())
    }

    async fn fetch_elementary(
        &self,
        _item_id: &str,
        _url: &str,
        _kind: StreamKind,
        _credential: &str,
        _dest: &Path,
    ) -> crate::Result<()> {
        Err(no_helper())
    }

    async fn playback_manifest(&self, _item_id: &str, _credential: &str) -> crate::Result<String> {
        Err(no_helper())
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Muxer used when MP4Box is not installed
pub struct UnavailableMuxer;

#[async_trait]
impl Muxer for UnavailableMuxer {
    async fn apply_tags(&self, _path: &Path, _tags: &TagList) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "Tag embedding requires MP4Box. Configure mp4box_path in config or ensure MP4Box is in PATH."
                .into(),
        ))
    }

    async fn remux(
        &self,
        _video: &Path,
        _audio: &Path,
        _tags: &TagList,
        _out: &Path,
    ) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "Music video remux requires MP4Box. Configure mp4box_path in config or ensure MP4Box is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Copier used when ffmpeg is not installed
pub struct UnavailableCopier;

#[async_trait]
impl StreamCopier for UnavailableCopier {
    async fn copy(&self, _url: &str, _dest: &Path) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "Animated artwork requires ffmpeg. Configure ffmpeg_path in config or ensure ffmpeg is in PATH."
                .into(),
        ))
    }

    async fn to_gif(&self, _src: &Path, _dest: &Path) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "GIF conversion requires ffmpeg. Configure ffmpeg_path in config or ensure ffmpeg is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
