//! Acquisition orchestration split into focused submodules.
//!
//! The `CatalogDownloader` struct and its methods are organized by level:
//! - [`batch`] - Target expansion, the per-pass loop and whole-batch retry
//! - [`album`] - Folder layout, artwork, selection and the track loop of one entity
//! - [`track`] - The per-track state machine for songs
//! - [`music_video`] - The dual-stream path for music videos
//!
//! Everything runs sequentially: each step is awaited before the next one
//! starts, and per-pass state lives in a [`RunContext`](crate::types::RunContext)
//! passed down by `&mut`.

mod album;
mod batch;
mod music_video;
mod track;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use album::{ArtistContext, EntityRequest};

use crate::catalog::CatalogApi;
use crate::config::Config;
use crate::error::Result;
use crate::tagging::TagWriter;
use crate::tools::Toolset;
use crate::types::{Counters, QualityPolicy, RunOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// Asks the user to pick items from a numbered list
#[async_trait]
pub trait SelectionPrompt: Send + Sync {
    /// Show `rows` (already numbered from 1) under `title` and return the raw answer
    ///
    /// The answer is parsed with [`parse_selection`](crate::selection::parse_selection).
    async fn choose(&self, title: &str, rows: &[String]) -> Result<String>;
}

/// Decides whether a pass that ended with errors is retried
#[async_trait]
pub trait ContinuationSignal: Send + Sync {
    /// Called after a pass with a non-zero error count
    async fn should_continue(&self, counters: &Counters) -> bool;
}

/// The interactive collaborators of a run
#[derive(Clone)]
pub struct Prompts {
    /// Track and artist-item selection
    pub selection: Arc<dyn SelectionPrompt>,
    /// Retry confirmation
    pub continuation: Arc<dyn ContinuationSignal>,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct CatalogDownloader {
    /// Configuration (wrapped in Arc for sharing)
    pub(crate) config: Arc<Config>,
    /// Catalog metadata access
    pub(crate) catalog: Arc<dyn CatalogApi>,
    /// External capabilities (fetch helper, muxer, copier, probe)
    pub(crate) tools: Toolset,
    /// Structured tag writer
    pub(crate) tagger: Arc<dyn TagWriter>,
    /// Interactive collaborators
    pub(crate) prompts: Prompts,
    /// Mode flags for this invocation
    pub(crate) options: RunOptions,
    /// Codec/quality policy derived from config and flags
    pub(crate) policy: QualityPolicy,
}

impl CatalogDownloader {
    /// Create a downloader from its collaborators
    pub fn new(
        config: Config,
        options: RunOptions,
        catalog: Arc<dyn CatalogApi>,
        tools: Toolset,
        tagger: Arc<dyn TagWriter>,
        prompts: Prompts,
    ) -> Self {
        let policy = config.quality_policy(&options);
        tracing::info!(
            mode = ?policy.mode,
            aac_type = %policy.aac_subtype,
            alac_max = policy.alac_max,
            atmos_max = policy.atmos_max,
            "downloader initialized"
        );
        Self {
            config: Arc::new(config),
            catalog,
            tools,
            tagger,
            prompts,
            options,
            policy,
        }
    }

    /// Mode flags of this run
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Quality policy of this run
    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    /// Media credential handed to the fetch helper
    pub(crate) fn credential(&self) -> &str {
        &self.config.catalog.media_user_token
    }
}
