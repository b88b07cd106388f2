//! Orchestration tests against in-memory fakes.

use crate::catalog::{ArtistItem, ArtistRef, MusicVideoInfo};
use crate::downloader::test_helpers::*;
use crate::downloader::{ArtistContext, EntityRequest};
use crate::tools::{StreamKind, TrackSource};
use crate::types::{AudioMode, Counters, RunContext};
use std::sync::Arc;

mod batch;

const ALBUM_ID: &str = "1441164426";

fn request(id: &str) -> EntityRequest {
    EntityRequest {
        storefront: "us".to_string(),
        id: id.to_string(),
        track_hint: None,
        single_track: false,
        artist: None,
    }
}

/// Run one entity through a fresh pass and return the pass state
async fn run_entity(harness: &Harness, request: &EntityRequest) -> RunContext {
    let downloader = harness.downloader();
    let mut ctx = RunContext::default();
    downloader.acquire_entity(&mut ctx, request).await.unwrap();
    ctx
}

fn counters(total: u32, success: u32, error: u32, unavailable: u32, not_song: u32) -> Counters {
    Counters {
        total,
        success,
        error,
        unavailable,
        not_song,
    }
}
