//! Configuration types for catalog-dl

use crate::error::{Error, Result};
use crate::types::{
    AacType, AudioMode, CoverFormat, LyricsFormat, LyricsType, MvAudioType, ProbeMode,
    QualityPolicy, RunOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Catalog API access (tokens, language, endpoint)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Developer bearer token for the catalog API (a leading "Bearer " is stripped)
    #[serde(default)]
    pub authorization_token: String,

    /// Subscriber media credential, needed for lyrics, legacy AAC and music videos
    #[serde(default)]
    pub media_user_token: String,

    /// Catalog language (`l=` query parameter, default: "en-US")
    #[serde(default = "default_language")]
    pub language: String,

    /// Catalog API base URL (default: "https://amp-api.music.apple.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl CatalogConfig {
    /// Bearer token without any "Bearer " prefix
    pub fn bearer_token(&self) -> &str {
        self.authorization_token
            .strip_prefix("Bearer ")
            .unwrap_or(&self.authorization_token)
    }

    /// Whether the media credential looks usable (longer than 50 characters)
    pub fn has_media_token(&self) -> bool {
        self.media_user_token.len() > 50
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            authorization_token: String::new(),
            media_user_token: String::new(),
            language: default_language(),
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Output layout (save folders, templates, edition labels)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root for ALAC and AAC runs (default: "./downloads/alac")
    #[serde(default = "default_alac_save_folder")]
    pub alac_save_folder: PathBuf,

    /// Root for Atmos runs (default: "./downloads/atmos")
    #[serde(default = "default_atmos_save_folder")]
    pub atmos_save_folder: PathBuf,

    /// Artist folder template; empty disables the artist level
    #[serde(default = "default_artist_folder_format")]
    pub artist_folder_format: String,

    /// Album folder template
    #[serde(default = "default_album_folder_format")]
    pub album_folder_format: String,

    /// Playlist folder template
    #[serde(default = "default_playlist_folder_format")]
    pub playlist_folder_format: String,

    /// Track file template (without extension)
    #[serde(default = "default_song_file_format")]
    pub song_file_format: String,

    /// Maximum characters kept from free-text fields in templates (default: 200)
    #[serde(default = "default_limit_max")]
    pub limit_max: usize,

    /// Edition label for mastered releases
    #[serde(default = "default_apple_master_choice")]
    pub apple_master_choice: String,

    /// Edition label for explicit content
    #[serde(default = "default_explicit_choice")]
    pub explicit_choice: String,

    /// Edition label for clean content
    #[serde(default = "default_clean_choice")]
    pub clean_choice: String,

    /// Artist name used for playlists (default: "Apple Music")
    #[serde(default = "default_playlist_artist_name")]
    pub playlist_artist_name: String,

    /// Tag playlist tracks with their own album's disc/track numbers
    #[serde(default)]
    pub use_song_info_for_playlist: bool,

    /// Embed each playlist track's own cover instead of the playlist cover
    #[serde(default)]
    pub playlist_track_covers: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            alac_save_folder: default_alac_save_folder(),
            atmos_save_folder: default_atmos_save_folder(),
            artist_folder_format: default_artist_folder_format(),
            album_folder_format: default_album_folder_format(),
            playlist_folder_format: default_playlist_folder_format(),
            song_file_format: default_song_file_format(),
            limit_max: default_limit_max(),
            apple_master_choice: default_apple_master_choice(),
            explicit_choice: default_explicit_choice(),
            clean_choice: default_clean_choice(),
            playlist_artist_name: default_playlist_artist_name(),
            use_song_info_for_playlist: false,
            playlist_track_covers: false,
        }
    }
}

/// Quality ceilings and rendition preferences
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Highest ALAC sample rate in Hz (default: 192000)
    #[serde(default = "default_alac_max")]
    pub alac_max: u32,

    /// Highest Atmos bitrate in kbps (default: 2768)
    #[serde(default = "default_atmos_max")]
    pub atmos_max: u32,

    /// AAC subtype for `--aac` runs
    #[serde(default)]
    pub aac_type: AacType,

    /// Audio preference for music videos
    #[serde(default)]
    pub mv_audio_type: MvAudioType,

    /// Highest video height for music videos and animated artwork (default: 2160)
    #[serde(default = "default_mv_max")]
    pub mv_max: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            alac_max: default_alac_max(),
            atmos_max: default_atmos_max(),
            aac_type: AacType::default(),
            mv_audio_type: MvAudioType::default(),
            mv_max: default_mv_max(),
        }
    }
}

/// Cover and animated artwork settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// Cover dimensions substituted for `{w}x{h}` (default: "5000x5000")
    #[serde(default = "default_cover_size")]
    pub cover_size: String,

    /// Cover image format
    #[serde(default)]
    pub cover_format: CoverFormat,

    /// Embed the cover into each track
    #[serde(default = "default_true")]
    pub embed_cover: bool,

    /// Save the artist picture as `folder.<ext>` in the artist folder
    #[serde(default)]
    pub save_artist_cover: bool,

    /// Save editorial motion artwork next to the album
    #[serde(default)]
    pub save_animated_artwork: bool,

    /// Also convert the square motion artwork into a GIF `folder.jpg`
    #[serde(default)]
    pub animated_artwork_gif: bool,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            cover_size: default_cover_size(),
            cover_format: CoverFormat::default(),
            embed_cover: true,
            save_artist_cover: false,
            save_animated_artwork: false,
            animated_artwork_gif: false,
        }
    }
}

/// Lyrics settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Embed lyrics into the track tags
    #[serde(default)]
    pub embed_lrc: bool,

    /// Write a lyrics sidecar next to the track
    #[serde(default)]
    pub save_lrc_file: bool,

    /// Line- or word-synced lyrics
    #[serde(default)]
    pub lrc_type: LyricsType,

    /// Sidecar format
    #[serde(default)]
    pub lrc_format: LyricsFormat,
}

/// External tool paths
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Decrypting-fetch helper executable (required for acquisition)
    #[serde(default)]
    pub fetch_helper_path: Option<PathBuf>,

    /// Path to MP4Box executable (auto-detected if None)
    #[serde(default)]
    pub mp4box_path: Option<PathBuf>,

    /// Path to mp4decrypt executable (auto-detected if None)
    #[serde(default)]
    pub mp4decrypt_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            fetch_helper_path: None,
            mp4box_path: None,
            mp4decrypt_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Local manifest-resolution helper
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Ask the helper for higher-fidelity manifests
    #[serde(default)]
    pub probe_enabled: bool,

    /// Helper address (default: "127.0.0.1:20020")
    #[serde(default = "default_probe_address")]
    pub probe_address: String,

    /// Which tracks to probe
    #[serde(default)]
    pub probe_mode: ProbeMode,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_enabled: false,
            probe_address: default_probe_address(),
            probe_mode: ProbeMode::default(),
        }
    }
}

/// Main configuration for catalog-dl
///
/// Sub-configs are flattened, so the TOML file is a single flat table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog API access
    #[serde(flatten)]
    pub catalog: CatalogConfig,

    /// Output layout
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Quality ceilings and preferences
    #[serde(flatten)]
    pub quality: QualityConfig,

    /// Cover and animated artwork
    #[serde(flatten)]
    pub artwork: ArtworkConfig,

    /// Lyrics
    #[serde(flatten)]
    pub lyrics: LyricsConfig,

    /// External tools
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Local manifest-resolution helper
    #[serde(flatten)]
    pub probe: ProbeConfig,
}

impl Config {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot constrain on its own
    pub fn validate(&self) -> Result<()> {
        if self.download.song_file_format.trim().is_empty() {
            return Err(Error::config("song_file_format", "track template must not be empty"));
        }
        if self.download.limit_max == 0 {
            return Err(Error::config("limit_max", "limit_max must be at least 1"));
        }
        if !self.artwork.cover_size.contains('x') {
            return Err(Error::config(
                "cover_size",
                format!("cover size '{}' is not WIDTHxHEIGHT", self.artwork.cover_size),
            ));
        }
        Ok(())
    }

    /// Save root for a run in the given mode
    pub fn save_root(&self, mode: AudioMode) -> &Path {
        match mode {
            AudioMode::Atmos => &self.download.atmos_save_folder,
            AudioMode::Alac | AudioMode::Aac => &self.download.alac_save_folder,
        }
    }

    /// Quality policy for a run with these options
    pub fn quality_policy(&self, options: &RunOptions) -> QualityPolicy {
        QualityPolicy {
            mode: options.effective_mode(),
            aac_subtype: self.quality.aac_type,
            alac_max: self.quality.alac_max,
            atmos_max: self.quality.atmos_max,
        }
    }
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_api_base() -> String {
    "https://amp-api.music.apple.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_alac_save_folder() -> PathBuf {
    PathBuf::from("./downloads/alac")
}

fn default_atmos_save_folder() -> PathBuf {
    PathBuf::from("./downloads/atmos")
}

fn default_artist_folder_format() -> String {
    "{UrlArtistName}".to_string()
}

fn default_album_folder_format() -> String {
    "{AlbumName}".to_string()
}

fn default_playlist_folder_format() -> String {
    "{PlaylistName}".to_string()
}

fn default_song_file_format() -> String {
    "{SongNumber}. {SongName}".to_string()
}

fn default_limit_max() -> usize {
    200
}

fn default_apple_master_choice() -> String {
    "[M]".to_string()
}

fn default_explicit_choice() -> String {
    "[E]".to_string()
}

fn default_clean_choice() -> String {
    "[C]".to_string()
}

fn default_playlist_artist_name() -> String {
    "Apple Music".to_string()
}

fn default_alac_max() -> u32 {
    192_000
}

fn default_atmos_max() -> u32 {
    2768
}

fn default_mv_max() -> u32 {
    2160
}

fn default_cover_size() -> String {
    "5000x5000".to_string()
}

fn default_probe_address() -> String {
    "127.0.0.1:20020".to_string()
}

fn default_true() -> bool {
    true
}
