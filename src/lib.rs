//! # catalog-dl
//!
//! Adaptive-stream acquisition engine for albums, playlists and music videos
//! from a streaming music catalog.
//!
//! ## Design Philosophy
//!
//! catalog-dl is designed to be:
//! - **Policy-driven** - Codec and quality ceilings decide which manifest variant is fetched
//! - **Failure tolerant** - Per-track failures are tallied, and a batch can be retried as a whole
//! - **Sequential** - One track at a time, with completed tracks never acquired twice per run
//! - **Tool-agnostic** - Decryption, muxing and prompts sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_dl::{
//!     CatalogClient, CatalogDownloader, Config, LoftyTagWriter, Prompts, RunOptions, Toolset,
//! };
//! # use catalog_dl::{ContinuationSignal, Counters, SelectionPrompt};
//! # struct Never;
//! # #[async_trait::async_trait]
//! # impl SelectionPrompt for Never {
//! #     async fn choose(&self, _: &str, _: &[String]) -> catalog_dl::Result<String> { Ok("all".into()) }
//! # }
//! # #[async_trait::async_trait]
//! # impl ContinuationSignal for Never {
//! #     async fn should_continue(&self, _: &Counters) -> bool { false }
//! # }
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml".as_ref())?;
//!     let catalog = Arc::new(CatalogClient::new(&config.catalog)?);
//!     let tools = Toolset::from_config(&config);
//!     let prompts = Prompts {
//!         selection: Arc::new(Never),
//!         continuation: Arc::new(Never),
//!     };
//!
//!     let downloader = CatalogDownloader::new(
//!         config,
//!         RunOptions::default(),
//!         catalog,
//!         tools,
//!         Arc::new(LoftyTagWriter),
//!         prompts,
//!     );
//!     let report = downloader
//!         .run(&["https://music.apple.com/us/album/abbey-road/1441164426".to_string()])
//!         .await;
//!     println!("{} tracks completed", report.completed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Cover art URLs and files
pub mod artwork;
/// Catalog URLs, models and the HTTP client
pub mod catalog;
/// Configuration types
pub mod config;
/// Acquisition orchestration (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Lyrics conversion and sidecars
pub mod lyrics;
/// Master manifest parsing and variant selection
pub mod manifest;
/// Output name templates
pub mod naming;
/// Interactive range selection
pub mod selection;
/// Tag rules and the container tag writer
pub mod tagging;
/// External tool seams
pub mod tools;
/// Core types: modes, policy, counters and outcomes
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogApi, CatalogClient, Target};
pub use config::Config;
pub use downloader::{
    ArtistContext, CatalogDownloader, ContinuationSignal, EntityRequest, Prompts, SelectionPrompt,
};
pub use error::{AcquisitionError, CatalogError, Error, PostProcessError, Result};
pub use manifest::{Inventory, Manifest, select_audio, select_mv_audio, select_video};
pub use tagging::{LoftyTagWriter, TagWriter, TrackTags};
pub use tools::Toolset;
pub use types::{
    AacType, AudioMode, BatchReport, CompletionLedger, Counters, MvAudioType, QualityPolicy,
    RunOptions, TrackOutcome,
};
