//! Adaptive-bitrate manifest parsing and variant selection
//!
//! This module is split into submodules:
//! - [`audio`] - Pick the audio variant matching a [`QualityPolicy`](crate::types::QualityPolicy)
//! - [`inventory`] - Enumerate which audio categories a manifest offers
//! - [`video`] - Pick video and music-video audio renditions
//!
//! Selection is a pure function of the parsed manifest and the policy: variants are
//! stably sorted by descending bandwidth and the first match wins.

pub mod audio;
pub mod inventory;
pub mod video;

pub use audio::select_audio;
pub use inventory::{AlacQuality, Inventory, has_atmos};
pub use video::{select_mv_audio, select_video};

use crate::error::{Error, Result};
use m3u8_rs::Playlist;
use url::Url;

/// One `EXT-X-STREAM-INF` entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    /// CODECS attribute, e.g. "alac", "ec-3", "mp4a.40.2"
    pub codec: String,
    /// AUDIO group label, e.g. "audio-alac-stereo-48000-24"
    pub audio_group: String,
    /// BANDWIDTH in bits per second
    pub bandwidth: u64,
    /// URI relative to the manifest
    pub uri: String,
    /// RESOLUTION as (width, height), video only
    pub resolution: Option<(u64, u64)>,
}

/// One `EXT-X-MEDIA` alternative rendition with a URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendition {
    /// GROUP-ID attribute
    pub group_id: String,
    /// URI relative to the manifest
    pub uri: String,
}

/// A parsed master manifest
#[derive(Clone, Debug)]
pub struct Manifest {
    url: Url,
    /// Non-I-frame variants in manifest order
    pub variants: Vec<Variant>,
    /// Alternative renditions that carry a URI
    pub renditions: Vec<Rendition>,
}

/// The outcome of a successful selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedVariant {
    /// Absolute URL of the chosen media playlist
    pub url: String,
    /// Human-readable quality, e.g. "24B-48.0kHz" or "256 kbps"
    pub quality: String,
    /// Group label or id of the chosen rendition
    pub label: String,
}

impl Manifest {
    /// Parse manifest text fetched from `url`
    ///
    /// # Errors
    /// Returns [`Error::Manifest`] if the text is not a master playlist.
    pub fn parse(text: &str, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Manifest(format!("invalid manifest URL {url}: {e}")))?;
        let master = match m3u8_rs::parse_playlist_res(text.as_bytes()) {
            Ok(Playlist::MasterPlaylist(master)) => master,
            Ok(Playlist::MediaPlaylist(_)) => {
                return Err(Error::Manifest(format!("{url} is a media playlist, not a master")));
            }
            Err(e) => return Err(Error::Manifest(format!("failed to parse {url}: {e}"))),
        };

        let variants = master
            .variants
            .into_iter()
            .filter(|v| !v.is_i_frame)
            .map(|v| Variant {
                codec: v.codecs.unwrap_or_default(),
                audio_group: v.audio.unwrap_or_default(),
                bandwidth: v.bandwidth,
                uri: v.uri,
                resolution: v.resolution.map(|r| (r.width, r.height)),
            })
            .collect();
        let renditions = master
            .alternatives
            .into_iter()
            .filter_map(|alt| {
                alt.uri.map(|uri| Rendition {
                    group_id: alt.group_id,
                    uri,
                })
            })
            .collect();

        Ok(Self {
            url,
            variants,
            renditions,
        })
    }

    /// The URL the manifest was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Variants stably sorted by descending bandwidth
    pub fn by_bandwidth(&self) -> Vec<&Variant> {
        let mut sorted: Vec<&Variant> = self.variants.iter().collect();
        sorted.sort_by(|a, b| b.bandwidth.cmp(&a.bandwidth));
        sorted
    }

    /// Resolve a manifest-relative URI to an absolute URL
    pub fn resolve(&self, uri: &str) -> Result<String> {
        self.url
            .join(uri)
            .map(String::from)
            .map_err(|e| Error::Manifest(format!("cannot resolve {uri} against {}: {e}", self.url)))
    }
}

/// Numeric `-`-separated segments of a group label, in order
pub(crate) fn numeric_segments(label: &str) -> Vec<u32> {
    label.split('-').filter_map(|s| s.parse().ok()).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Master manifest shaped like a real lossless catalog manifest
    pub const AUDIO_MASTER: &str = "#EXTM3U
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio-stereo-256\",NAME=\"AAC\",DEFAULT=YES,AUTOSELECT=YES,URI=\"aac/256.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=6000000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-192000-24\"
alac/192000-24.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=3000000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-96000-24\"
alac/96000-24.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1500000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-48000-24\"
alac/48000-24.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1200000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-44100-16\"
alac/44100-16.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,CODECS=\"ec-3\",AUDIO=\"audio-atmos-2768\"
atmos/2768.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=700000,CODECS=\"ec-3\",AUDIO=\"audio-atmos-768\"
atmos/768.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=600000,CODECS=\"ac-3\",AUDIO=\"audio-ac3-640\"
ac3/640.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=300000,CODECS=\"mp4a.40.2\",AUDIO=\"audio-stereo-256\"
aac/256.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=290000,CODECS=\"mp4a.40.2\",AUDIO=\"audio-stereo-256-binaural\"
aac/256-binaural.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=280000,CODECS=\"mp4a.40.2\",AUDIO=\"audio-stereo-256-downmix\"
aac/256-downmix.m3u8
";

    pub const MASTER_URL: &str = "https://aod.example.com/itunes/song/1/P1_Master.m3u8";
}
