//! Error types for catalog-dl
//!
//! This module provides the error taxonomy used throughout the crate:
//! - Domain errors for each pipeline stage (catalog, manifest, acquisition, post-processing)
//! - Ambient errors (configuration, I/O, network, serialization, external tools)
//! - A [`Disposition`] mapping that tells the orchestrator how a failure is tallied

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalog-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catalog-dl
///
/// Each variant carries enough context to explain the failure in a log line.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "alac_save_folder")
        key: Option<String>,
    },

    /// Input URL could not be recognized as a catalog reference
    #[error("invalid input URL: {0}")]
    Input(String),

    /// Catalog API request or decode failure
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Manifest could not be fetched or is not a master playlist
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Manifest parsed fine but no variant satisfies the quality policy
    #[error("no matching variant: {0}")]
    NoMatchingVariant(String),

    /// Decrypting-fetch capability failed
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Tagging, muxing or sidecar writing failed
    #[error("post-processing error: {0}")]
    PostProcess(#[from] PostProcessError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (MP4Box, ffmpeg, fetch helper)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, no helper configured)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Catalog API errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Server answered with a non-success status
    #[error("{resource} returned HTTP {status}")]
    Status {
        /// The catalog resource that was requested
        resource: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body did not match the expected shape
    #[error("failed to decode {resource}: {reason}")]
    Decode {
        /// The catalog resource that was requested
        resource: String,
        /// Decoder message
        reason: String,
    },

    /// Response decoded but contained no usable data
    #[error("{resource} not found in catalog response")]
    Missing {
        /// The catalog resource that was requested
        resource: String,
    },

    /// Transport-level failure
    #[error("request for {resource} failed: {reason}")]
    Transport {
        /// The catalog resource that was requested
        resource: String,
        /// Transport error message
        reason: String,
    },
}

/// Decrypting-fetch capability errors
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Media credential missing or too short to be valid
    #[error("media credential missing or invalid")]
    InvalidCredential,

    /// Helper reported failure for a track
    #[error("fetch of {track_id} failed: {reason}")]
    FetchFailed {
        /// Catalog id of the track being fetched
        track_id: String,
        /// The reason reported by the capability
        reason: String,
    },

    /// Playback lookup returned no manifest
    #[error("no playback manifest for {track_id}; media credential may be expired")]
    NoPlayback {
        /// Catalog id of the item
        track_id: String,
    },
}

/// Post-processing errors (tags, mux, lyrics, artwork)
#[derive(Debug, Error)]
pub enum PostProcessError {
    /// Descriptive tag embedding through the muxer failed
    #[error("tag embedding failed for {path}: {reason}")]
    EmbedFailed {
        /// The container being tagged
        path: PathBuf,
        /// The reason embedding failed
        reason: String,
    },

    /// Remux of elementary streams failed
    #[error("remux into {path} failed: {reason}")]
    RemuxFailed {
        /// The output container
        path: PathBuf,
        /// The reason remuxing failed
        reason: String,
    },

    /// Structured tag writer failed
    #[error("tag write failed for {path}: {reason}")]
    TagWriteFailed {
        /// The container being tagged
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// Artwork could not be retrieved or written
    #[error("artwork {path} failed: {reason}")]
    ArtworkFailed {
        /// Destination of the artwork file
        path: PathBuf,
        /// The reason the fetch failed
        reason: String,
    },

    /// Temporary file removal failed
    #[error("cleanup of {path} failed: {reason}")]
    CleanupFailed {
        /// The file that could not be removed
        path: PathBuf,
        /// The reason removal failed
        reason: String,
    },
}

/// How a failure is tallied against the per-pass counters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Target skipped entirely, nothing counted
    SkipTarget,
    /// Track counted as "not a song" (catalog lookup failed)
    NotSong,
    /// Track counted as unavailable in the requested quality
    Unavailable,
    /// Track counted as an error and makes the batch eligible for another pass
    Error,
}

impl Error {
    /// Shorthand for a configuration error on a named key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Map this error onto the counter it affects when it ends a track
    pub fn disposition(&self) -> Disposition {
        match self {
            Error::Input(_) => Disposition::SkipTarget,
            Error::Catalog(_) => Disposition::NotSong,
            Error::Manifest(_) | Error::NoMatchingVariant(_) => Disposition::Unavailable,
            Error::Acquisition(_)
            | Error::PostProcess(_)
            | Error::Io(_)
            | Error::Network(_)
            | Error::Serialization(_)
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Config { .. }
            | Error::Other(_) => Disposition::Error,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config {
            message: e.to_string(),
            key: None,
        }
    }
}
