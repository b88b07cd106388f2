//! Batch driver: target expansion, passes and whole-batch retry

use super::CatalogDownloader;
use super::album::{ArtistContext, EntityRequest};
use crate::catalog::{ArtistItem, ArtistRelationship, Target};
use crate::error::Result;
use crate::selection::parse_selection;
use crate::types::{BatchReport, CompletionLedger, RunContext};
use tracing::{error, info, warn};

/// One unit of work in a pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum WorkItem {
    /// Album or playlist
    Entity(EntityRequest),
    /// Song, resolved to its album on every pass
    Song {
        storefront: String,
        id: String,
    },
    /// Music video outside any entity
    MusicVideo {
        storefront: String,
        id: String,
        artist: Option<ArtistContext>,
    },
}

impl CatalogDownloader {
    /// Run every input until a pass ends without errors or the user stops
    ///
    /// Inputs are expanded once up front (artist pages may prompt). Each pass
    /// starts with zeroed counters and the ledger of the previous pass, so
    /// completed tracks are never acquired twice.
    pub async fn run(&self, inputs: &[String]) -> BatchReport {
        let work = self.plan(inputs).await;
        info!(inputs = inputs.len(), items = work.len(), "batch planned");

        let mut ledger = CompletionLedger::new();
        let mut passes = 0;
        loop {
            passes += 1;
            let mut ctx = RunContext::with_ledger(ledger);
            self.run_pass(&mut ctx, &work).await;

            let counters = ctx.counters;
            info!(
                pass = passes,
                completed = counters.success,
                total = counters.total,
                warnings = counters.warnings(),
                errors = counters.error,
                "Completed {}/{} | Warnings: {} | Errors: {}",
                counters.success,
                counters.total,
                counters.warnings(),
                counters.error
            );
            ledger = ctx.into_ledger();

            let retry = !self.options.inspect
                && counters.error > 0
                && self.prompts.continuation.should_continue(&counters).await;
            if !retry {
                return BatchReport {
                    passes,
                    counters,
                    completed: ledger.len(),
                };
            }
            info!(pass = passes + 1, "retrying batch");
        }
    }

    /// One pass over every work item
    pub(crate) async fn run_pass(&self, ctx: &mut RunContext, work: &[WorkItem]) {
        for item in work {
            match item {
                WorkItem::Entity(request) => {
                    if let Err(e) = self.acquire_entity(ctx, request).await {
                        error!(entity_id = %request.id, error = %e, "entity setup failed");
                    }
                }
                WorkItem::Song { storefront, id } => {
                    let album_id = match self.catalog.song(storefront, id).await {
                        Ok(song) => song.album_id,
                        Err(e) => {
                            error!(song_id = %id, error = %e, "song lookup failed");
                            continue;
                        }
                    };
                    let Some(request) = album_id.and_then(|album_id| {
                        EntityRequest::from_target(
                            Target::album_for_song(storefront, &album_id, id),
                            true,
                            None,
                        )
                    }) else {
                        warn!(song_id = %id, "song has no album, skipping");
                        continue;
                    };
                    if let Err(e) = self.acquire_entity(ctx, &request).await {
                        error!(entity_id = %request.id, error = %e, "entity setup failed");
                    }
                }
                WorkItem::MusicVideo {
                    storefront,
                    id,
                    artist,
                } => {
                    if self.options.inspect || self.options.cover_art_only {
                        continue;
                    }
                    self.acquire_standalone_video(ctx, storefront, id, artist.as_ref())
                        .await;
                }
            }
        }
    }

    /// Turn input URLs into work items, expanding artist pages
    pub(crate) async fn plan(&self, inputs: &[String]) -> Vec<WorkItem> {
        let mut work = Vec::new();
        for input in inputs {
            let target = match Target::parse(input) {
                Ok(target) => target,
                Err(e) => {
                    warn!(input = %input, error = %e, "skipping unrecognized input");
                    continue;
                }
            };
            match target {
                Target::Album { .. } | Target::Playlist { .. } => {
                    work.extend(
                        EntityRequest::from_target(target, self.options.single_track, None)
                            .map(WorkItem::Entity),
                    );
                }
                Target::Song { storefront, id } => work.push(WorkItem::Song { storefront, id }),
                Target::MusicVideo { storefront, id } => work.push(WorkItem::MusicVideo {
                    storefront,
                    id,
                    artist: None,
                }),
                Target::Artist { storefront, id } => match self.expand_artist(&storefront, &id).await {
                    Ok(items) => work.extend(items),
                    Err(e) => error!(artist_id = %id, error = %e, "artist expansion failed"),
                },
            }
        }
        work
    }

    async fn expand_artist(&self, storefront: &str, id: &str) -> Result<Vec<WorkItem>> {
        let artist = self.catalog.artist(storefront, id).await?;
        let context = ArtistContext {
            id: artist.id.clone(),
            name: artist.name.clone(),
        };

        let albums = self
            .catalog
            .artist_items(storefront, id, ArtistRelationship::Albums)
            .await?;
        let albums = self
            .choose_items(&format!("{} - albums", artist.name), albums)
            .await?;

        let videos = if self.options.cover_art_only {
            Vec::new()
        } else {
            match self
                .catalog
                .artist_items(storefront, id, ArtistRelationship::MusicVideos)
                .await
            {
                Ok(videos) => {
                    self.choose_items(&format!("{} - music videos", artist.name), videos)
                        .await?
                }
                Err(e) => {
                    warn!(artist_id = %id, error = %e, "music video listing failed");
                    Vec::new()
                }
            }
        };
        info!(
            artist = %artist.name,
            albums = albums.len(),
            music_videos = videos.len(),
            "artist expanded"
        );

        let mut work: Vec<WorkItem> = albums
            .into_iter()
            .map(|album| {
                WorkItem::Entity(EntityRequest {
                    storefront: storefront.to_string(),
                    id: album.id,
                    track_hint: None,
                    single_track: false,
                    artist: Some(context.clone()),
                })
            })
            .collect();
        work.extend(videos.into_iter().map(|video| WorkItem::MusicVideo {
            storefront: storefront.to_string(),
            id: video.id,
            artist: Some(context.clone()),
        }));
        Ok(work)
    }

    /// Let the user pick artist items unless every album is wanted
    async fn choose_items(&self, title: &str, items: Vec<ArtistItem>) -> Result<Vec<ArtistItem>> {
        if self.options.all_artist_albums || items.is_empty() {
            return Ok(items);
        }
        let rows: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{:>3}. {} ({})", i + 1, item.name, item.release_date))
            .collect();
        let answer = self.prompts.selection.choose(title, &rows).await?;
        let selection = parse_selection(&answer, items.len());
        for rejected in &selection.rejected {
            warn!(token = ?rejected, "ignoring selection token");
        }
        Ok(items
            .into_iter()
            .enumerate()
            .filter(|(i, _)| selection.contains(i + 1))
            .map(|(_, item)| item)
            .collect())
    }
}
