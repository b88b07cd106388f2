//! Structured tags for finished containers
//!
//! - [`rules`] builds [`TrackTags`] and muxer [`TagList`](crate::tools::TagList)s
//!   from catalog data
//! - [`lofty_writer`] writes [`TrackTags`] into MP4 containers with `lofty`

pub mod lofty_writer;
pub mod rules;

pub use lofty_writer::LoftyTagWriter;
pub use rules::{
    Placement, TagContext, album_mux_tags, music_video_id_tags, music_video_mux_tags, track_tags,
};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// iTunes advisory rating
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// No rating given
    None,
    /// Explicit content
    Explicit,
    /// Edited version of explicit content
    Clean,
}

impl Advisory {
    /// Advisory for a catalog content rating
    pub fn from_rating(rating: Option<&str>) -> Self {
        match rating {
            Some("explicit") => Advisory::Explicit,
            Some("clean") => Advisory::Clean,
            _ => Advisory::None,
        }
    }
}

/// Tags written by a [`TagWriter`]; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackTags {
    /// Track title (also used as its sort name)
    pub title: Option<String>,
    /// Track artist (also used as its sort name)
    pub artist: Option<String>,
    /// Album title (also used as its sort name)
    pub album: Option<String>,
    /// Album artist (also used as its sort name)
    pub album_artist: Option<String>,
    /// Composer (also used as its sort name)
    pub composer: Option<String>,
    /// Release date
    pub date: Option<String>,
    /// Primary genre
    pub genre: Option<String>,
    /// Copyright line
    pub copyright: Option<String>,
    /// Publisher (record label)
    pub publisher: Option<String>,
    /// Unsynced lyrics text
    pub lyrics: Option<String>,
    /// (disc, total discs)
    pub disc: Option<(u32, u32)>,
    /// (track, total tracks)
    pub track: Option<(u32, u32)>,
    /// Advisory rating
    pub advisory: Option<Advisory>,
    /// Freeform `com.apple.iTunes` key/values, e.g. ISRC, UPC, MV_ID
    pub custom: Vec<(String, String)>,
}

impl TrackTags {
    /// Add a freeform tag; empty values are skipped
    pub fn push_custom(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.custom.push((key.to_string(), value.to_string()));
        }
    }

    /// Value of a freeform tag
    pub fn custom(&self, key: &str) -> Option<&str> {
        self.custom
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Writes structured tags into a finished container
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Write every `Some` field of `tags` into the file at `path`
    async fn write(&self, path: &Path, tags: &TrackTags) -> Result<()>;
}
