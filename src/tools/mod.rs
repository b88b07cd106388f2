//! External capabilities behind traits
//!
//! The pipeline never shells out directly. It talks to:
//!
//! - [`DecryptingFetcher`]: key exchange, segment download and decryption
//! - [`Muxer`]: descriptive tags and music-video remuxing
//! - [`StreamCopier`]: animated artwork copies and GIF conversion
//! - [`ManifestProbe`]: optional local helper that knows better manifests
//!
//! Each has a CLI-backed implementation and a stub that reports
//! [`Error::NotSupported`](crate::Error::NotSupported) when the tool is absent.

mod cli;
mod noop;
mod probe;
mod traits;

pub use cli::{CREDENTIAL_ENV, CliFetcher, FfmpegCopier, Mp4BoxMuxer, find_decrypter};
pub use noop::{UnavailableCopier, UnavailableFetcher, UnavailableMuxer};
pub use probe::TcpManifestProbe;
pub use traits::{
    DecryptingFetcher, ManifestProbe, Muxer, StreamCopier, StreamKind, TagList, TrackSource,
};

use crate::config::Config;
use std::sync::Arc;

/// The set of external capabilities a run uses
#[derive(Clone)]
pub struct Toolset {
    /// Decrypting fetch
    pub fetcher: Arc<dyn DecryptingFetcher>,
    /// Tag embedding and remuxing
    pub muxer: Arc<dyn Muxer>,
    /// Animated artwork copier
    pub copier: Arc<dyn StreamCopier>,
    /// Manifest probe, when enabled
    pub probe: Option<Arc<dyn ManifestProbe>>,
    /// Whether `mp4decrypt` is available (required for music videos)
    pub has_decrypter: bool,
}

impl Toolset {
    /// Build the toolset from configuration, searching PATH where allowed
    pub fn from_config(config: &Config) -> Self {
        let tools = &config.tools;

        let fetcher: Arc<dyn DecryptingFetcher> = match tools.fetch_helper_path {
            Some(ref path) => Arc::new(CliFetcher::new(path.clone())),
            None => Arc::new(UnavailableFetcher),
        };

        let muxer: Arc<dyn Muxer> = if let Some(ref path) = tools.mp4box_path {
            Arc::new(Mp4BoxMuxer::new(path.clone()))
        } else if tools.search_path {
            Mp4BoxMuxer::from_path()
                .map(|m| Arc::new(m) as Arc<dyn Muxer>)
                .unwrap_or_else(|| Arc::new(UnavailableMuxer))
        } else {
            Arc::new(UnavailableMuxer)
        };

        let copier: Arc<dyn StreamCopier> = if let Some(ref path) = tools.ffmpeg_path {
            Arc::new(FfmpegCopier::new(path.clone()))
        } else if tools.search_path {
            FfmpegCopier::from_path()
                .map(|c| Arc::new(c) as Arc<dyn StreamCopier>)
                .unwrap_or_else(|| Arc::new(UnavailableCopier))
        } else {
            Arc::new(UnavailableCopier)
        };

        let probe = config
            .probe
            .probe_enabled
            .then(|| Arc::new(TcpManifestProbe::new(config.probe.probe_address.clone())) as Arc<dyn ManifestProbe>);

        let has_decrypter =
            find_decrypter(tools.mp4decrypt_path.as_deref(), tools.search_path).is_some();

        tracing::info!(
            fetcher = fetcher.name(),
            muxer = muxer.name(),
            copier = copier.name(),
            probe = probe.is_some(),
            has_decrypter,
            "external tools initialized"
        );

        Self {
            fetcher,
            muxer,
            copier,
            probe,
            has_decrypter,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unconfigured_tools_degrade_to_stubs() {
        let mut config = Config::default();
        config.tools.search_path = false;
        let tools = Toolset::from_config(&config);
        assert_eq!(tools.fetcher.name(), "unavailable");
        assert_eq!(tools.muxer.name(), "unavailable");
        assert_eq!(tools.copier.name(), "unavailable");
        assert!(tools.probe.is_none());
        assert!(!tools.has_decrypter);
    }

    #[test]
    fn configured_paths_select_cli_implementations() {
        let mut config = Config::default();
        config.tools.search_path = false;
        config.tools.fetch_helper_path = Some(PathBuf::from("/opt/helper"));
        config.tools.mp4box_path = Some(PathBuf::from("/opt/MP4Box"));
        config.tools.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg"));
        config.probe.probe_enabled = true;
        let tools = Toolset::from_config(&config);
        assert_eq!(tools.fetcher.name(), "cli-helper");
        assert_eq!(tools.muxer.name(), "mp4box");
        assert_eq!(tools.copier.name(), "ffmpeg");
        assert!(tools.probe.is_some());
    }
}
