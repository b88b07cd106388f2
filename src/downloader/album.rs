//! One album or playlist: layout, artwork, selection and the track loop

use super::CatalogDownloader;
use super::track::{LEGACY_QUALITY, ResolvedSource, TrackJob};
use crate::artwork::write_cover;
use crate::catalog::{CatalogEntity, EntityKind, MusicVideoInfo, Target, Track, TrackKind};
use crate::error::Result;
use crate::manifest::{Inventory, Manifest, has_atmos, select_video};
use crate::naming::{FieldMap, Placeholder, edition_tag, folder_name};
use crate::selection::parse_selection;
use crate::types::{AudioMode, RunContext};
use crate::utils::file_exists;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tracks probed for Atmos before an atmos-only entity is acquired
const ATMOS_SCAN_TRACKS: usize = 3;

/// Artist folder fallback when no artist id is known
const UNKNOWN_ARTIST: &str = "UnknownArtist";

/// The artist page an entity was reached from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistContext {
    /// Artist catalog id
    pub id: String,
    /// Artist name as shown on the artist page
    pub name: String,
}

/// An album or playlist to acquire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRequest {
    /// Two-letter storefront
    pub storefront: String,
    /// Album or playlist id
    pub id: String,
    /// Track id from the `i` query parameter
    pub track_hint: Option<String>,
    /// Acquire only the track named by `track_hint`
    pub single_track: bool,
    /// Artist page this entity was expanded from
    pub artist: Option<ArtistContext>,
}

impl EntityRequest {
    /// Request for an album or playlist target; other targets yield `None`
    pub fn from_target(target: Target, single_track: bool, artist: Option<ArtistContext>) -> Option<Self> {
        match target {
            Target::Album {
                storefront,
                id,
                track_hint,
            } => Some(Self {
                storefront,
                id,
                track_hint,
                single_track,
                artist,
            }),
            Target::Playlist { storefront, id } => Some(Self {
                storefront,
                id,
                track_hint: None,
                single_track: false,
                artist,
            }),
            Target::Song { .. } | Target::Artist { .. } | Target::MusicVideo { .. } => None,
        }
    }
}

/// Folders an entity is laid out in
struct Layout {
    artist: Option<PathBuf>,
    entity: PathBuf,
}

impl CatalogDownloader {
    /// Acquire one album or playlist into the pass state
    ///
    /// # Errors
    /// Returns an error only when the entity itself cannot be set up (catalog
    /// lookup, folder creation, selection prompt). Per-track failures are tallied.
    pub(crate) async fn acquire_entity(&self, ctx: &mut RunContext, request: &EntityRequest) -> Result<()> {
        let entity = self.catalog.entity(&request.storefront, &request.id).await?;
        info!(
            entity_id = %entity.id,
            name = %entity.attributes.name,
            tracks = entity.tracks.len(),
            "entity loaded"
        );

        if self.options.inspect {
            self.inspect_entity(&entity).await;
            return Ok(());
        }

        if self.options.atmos_only && !self.entity_has_atmos(&entity).await {
            warn!(entity_id = %entity.id, "no Atmos rendition in the first tracks, skipping");
            ctx.counters.unavailable += 1;
            return Ok(());
        }

        let layout = self.layout(&entity, request.artist.as_ref()).await;
        tokio::fs::create_dir_all(&layout.entity).await?;

        if self.options.cover_art_only {
            self.cover_only(ctx, &entity, &layout.entity).await;
            return Ok(());
        }

        let cover = self.save_entity_covers(&entity, &layout).await;
        if self.config.artwork.save_animated_artwork {
            self.save_animated_artwork(&entity, &layout.entity).await;
        }

        let selected = self.select_tracks(&entity, request).await?;
        for track in &entity.tracks {
            if ctx.ledger.contains(&entity.id, track.ordinal) {
                ctx.counters.total += 1;
                ctx.counters.success += 1;
                continue;
            }
            if !selected.contains(&track.ordinal) {
                continue;
            }
            let job = TrackJob {
                entity: &entity,
                track,
                folder: &layout.entity,
                cover: cover.as_deref(),
            };
            self.acquire_track(ctx, &job).await;
        }
        Ok(())
    }

    /// Ordinals to acquire under the run's selection mode
    async fn select_tracks(&self, entity: &CatalogEntity, request: &EntityRequest) -> Result<BTreeSet<usize>> {
        let all = || entity.tracks.iter().map(|t| t.ordinal).collect::<BTreeSet<_>>();

        if request.single_track || self.options.single_track {
            if let Some(hint) = request.track_hint.as_deref() {
                let matched: BTreeSet<usize> = entity
                    .tracks
                    .iter()
                    .filter(|t| t.id == hint)
                    .map(|t| t.ordinal)
                    .collect();
                if matched.is_empty() {
                    warn!(entity_id = %entity.id, track_id = hint, "requested track is not in this entity");
                }
                return Ok(matched);
            }
        }

        if self.options.select {
            let rows: Vec<String> = entity.tracks.iter().map(track_row).collect();
            let answer = self
                .prompts
                .selection
                .choose(&entity.attributes.name, &rows)
                .await?;
            let selection = parse_selection(&answer, rows.len());
            for rejected in &selection.rejected {
                warn!(entity_id = %entity.id, token = ?rejected, "ignoring selection token");
            }
            return Ok(selection
                .indices
                .iter()
                .filter_map(|i| entity.tracks.get(i - 1).map(|t| t.ordinal))
                .collect());
        }

        Ok(all())
    }

    /// Resolve the artist and entity folders of an entity
    async fn layout(&self, entity: &CatalogEntity, artist: Option<&ArtistContext>) -> Layout {
        let download = &self.config.download;
        let limit = download.limit_max;
        let mode = self.policy.mode;
        let root = self.config.save_root(mode);
        let is_playlist = entity.kind == EntityKind::Playlist;
        let attrs = &entity.attributes;

        let artist_name = if is_playlist {
            download.playlist_artist_name.clone()
        } else {
            attrs.artist_name.clone()
        };
        let artist_id = if is_playlist {
            String::new()
        } else {
            artist
                .map(|a| a.id.clone())
                .or_else(|| entity.primary_artist().map(|a| a.id.clone()))
                .unwrap_or_default()
        };
        let artist_folder = self.artist_folder(root, &artist_name, &artist_id, artist);

        let quality = if FieldMap::mentions(self.entity_template(entity), Placeholder::Quality) {
            self.entity_quality(entity).await
        } else {
            String::new()
        };
        let codec = if self.policy.forces_legacy() {
            AudioMode::Aac.codec_label()
        } else {
            mode.codec_label()
        };
        let tag = edition_tag(
            attrs.is_mastered,
            attrs.content_rating.as_deref(),
            &download.apple_master_choice,
            &download.explicit_choice,
            &download.clean_choice,
        );

        let mut fields = FieldMap::new()
            .with_text(Placeholder::ArtistName, &artist_name, limit)
            .with(Placeholder::Quality, quality)
            .with(Placeholder::Codec, codec)
            .with(Placeholder::Tag, tag);
        if is_playlist {
            fields = fields
                .with_text(Placeholder::PlaylistName, &attrs.name, limit)
                .with(Placeholder::PlaylistId, entity.id.clone());
        } else {
            fields = fields
                .with(Placeholder::ReleaseDate, attrs.release_date.clone())
                .with(
                    Placeholder::ReleaseYear,
                    attrs.release_date.chars().take(4).collect::<String>(),
                )
                .with_text(Placeholder::AlbumName, &attrs.name, limit)
                .with(Placeholder::Upc, attrs.upc.clone())
                .with_text(Placeholder::RecordLabel, &attrs.record_label, limit)
                .with_text(Placeholder::Copyright, &attrs.copyright, limit)
                .with(Placeholder::AlbumId, entity.id.clone());
        }

        let entity_folder = folder_name(self.entity_template(entity), &fields, &entity.id);
        let parent = artist_folder.as_deref().unwrap_or(root);
        Layout {
            entity: parent.join(entity_folder),
            artist: artist_folder,
        }
    }

    fn entity_template(&self, entity: &CatalogEntity) -> &str {
        match entity.kind {
            EntityKind::Album => &self.config.download.album_folder_format,
            EntityKind::Playlist => &self.config.download.playlist_folder_format,
        }
    }

    /// Artist folder under `root`, or `None` when the artist template is empty
    fn artist_folder(
        &self,
        root: &Path,
        artist_name: &str,
        artist_id: &str,
        artist: Option<&ArtistContext>,
    ) -> Option<PathBuf> {
        let template = &self.config.download.artist_folder_format;
        if template.is_empty() {
            return None;
        }
        let limit = self.config.download.limit_max;
        let url_artist_name = artist.map_or(artist_name, |a| a.name.as_str());
        let fields = FieldMap::new()
            .with_text(Placeholder::ArtistName, artist_name, limit)
            .with(Placeholder::ArtistId, artist_id)
            .with_text(Placeholder::UrlArtistName, url_artist_name, limit);
        let fallback = if artist_id.is_empty() {
            UNKNOWN_ARTIST
        } else {
            artist_id
        };
        Some(root.join(folder_name(template, &fields, fallback)))
    }

    /// Folder a standalone music video is saved in
    pub(crate) async fn standalone_video_folder(
        &self,
        video: &MusicVideoInfo,
        artist: Option<&ArtistContext>,
    ) -> Result<PathBuf> {
        let root = self.config.save_root(self.policy.mode);
        let artist_id = artist.map(|a| a.id.as_str()).unwrap_or_default();
        let folder = self
            .artist_folder(root, &video.artist_name, artist_id, artist)
            .unwrap_or_else(|| root.to_path_buf());
        tokio::fs::create_dir_all(&folder).await?;
        Ok(folder)
    }

    /// Quality label of the first song, for the `{Quality}` folder placeholder
    async fn entity_quality(&self, entity: &CatalogEntity) -> String {
        let Some(track) = entity.tracks.iter().find(|t| t.kind == TrackKind::Song) else {
            return String::new();
        };
        let resolved = match self.catalog.song(&entity.storefront, &track.id).await {
            Ok(song) => self.resolve_source(track, &song).await,
            Err(e) => Err(e),
        };
        match resolved {
            Ok(ResolvedSource::Enhanced(variant)) => variant.quality,
            Ok(ResolvedSource::Legacy) => LEGACY_QUALITY.to_string(),
            Err(e) => {
                warn!(entity_id = %entity.id, error = %e, "could not determine folder quality");
                String::new()
            }
        }
    }

    /// Whether any of the first songs offers an Atmos rendition
    async fn entity_has_atmos(&self, entity: &CatalogEntity) -> bool {
        if entity.kind == EntityKind::Playlist {
            return false;
        }
        for track in entity.tracks.iter().take(ATMOS_SCAN_TRACKS) {
            if track.kind != TrackKind::Song {
                continue;
            }
            let manifest = match self.catalog.song(&entity.storefront, &track.id).await {
                Ok(song) => self.song_manifest(track, &song).await,
                Err(e) => Err(e),
            };
            match manifest {
                Ok(Some(manifest)) if has_atmos(&manifest) => return true,
                Ok(_) => {}
                Err(e) => debug!(track_id = %track.id, error = %e, "atmos probe skipped"),
            }
        }
        false
    }

    /// Log the available qualities of every song; acquires nothing
    async fn inspect_entity(&self, entity: &CatalogEntity) {
        for track in entity.tracks.iter().filter(|t| t.kind == TrackKind::Song) {
            let manifest = match self.catalog.song(&entity.storefront, &track.id).await {
                Ok(song) => self.song_manifest(track, &song).await,
                Err(e) => Err(e),
            };
            match manifest {
                Ok(Some(manifest)) => {
                    info!(
                        track_id = %track.id,
                        "{:02}. {}\n{}",
                        track.ordinal,
                        track.name,
                        Inventory::scan(&manifest)
                    );
                }
                Ok(None) => info!(track_id = %track.id, "{:02}. {} (legacy AAC only)", track.ordinal, track.name),
                Err(e) => warn!(track_id = %track.id, error = %e, "inspection failed"),
            }
        }
    }

    async fn cover_only(&self, ctx: &mut RunContext, entity: &CatalogEntity, folder: &Path) {
        ctx.counters.total += 1;
        let Some(template) = entity.attributes.artwork_url.as_deref() else {
            warn!(entity_id = %entity.id, "entity has no artwork");
            ctx.counters.error += 1;
            return;
        };
        match write_cover(self.catalog.as_ref(), folder, "cover", template, &self.config.artwork).await {
            Ok(path) => {
                info!(entity_id = %entity.id, path = %path.display(), "cover saved");
                ctx.counters.success += 1;
            }
            Err(e) => {
                warn!(entity_id = %entity.id, error = %e, "cover fetch failed");
                ctx.counters.error += 1;
            }
        }
    }

    /// Album cover and, for albums, the artist picture; returns the album cover
    async fn save_entity_covers(&self, entity: &CatalogEntity, layout: &Layout) -> Option<PathBuf> {
        let artwork = &self.config.artwork;
        if artwork.save_artist_cover && entity.kind == EntityKind::Album {
            let picture = entity
                .primary_artist()
                .and_then(|a| a.artwork_url.as_deref());
            if let (Some(folder), Some(template)) = (layout.artist.as_deref(), picture) {
                if let Err(e) = write_cover(self.catalog.as_ref(), folder, "folder", template, artwork).await {
                    warn!(entity_id = %entity.id, error = %e, "artist cover fetch failed");
                }
            }
        }

        let template = entity.attributes.artwork_url.as_deref()?;
        match write_cover(self.catalog.as_ref(), &layout.entity, "cover", template, artwork).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(entity_id = %entity.id, error = %e, "cover fetch failed");
                None
            }
        }
    }

    /// Square and tall motion artwork, plus the optional GIF folder image
    async fn save_animated_artwork(&self, entity: &CatalogEntity, folder: &Path) {
        let motion = &entity.attributes.motion;
        let square = folder.join("square_animated_artwork.mp4");
        let tall = folder.join("tall_animated_artwork.mp4");

        for (url, dest) in [(&motion.square, &square), (&motion.tall, &tall)] {
            let Some(url) = url.as_deref() else {
                continue;
            };
            if matches!(file_exists(dest).await, Ok(true)) {
                continue;
            }
            let copied = match self.motion_variant(url).await {
                Ok(variant_url) => self.tools.copier.copy(&variant_url, dest).await,
                Err(e) => Err(e),
            };
            match copied {
                Ok(()) => info!(path = %dest.display(), "animated artwork saved"),
                Err(e) => warn!(path = %dest.display(), error = %e, "animated artwork failed"),
            }
        }

        if self.config.artwork.animated_artwork_gif && matches!(file_exists(&square).await, Ok(true)) {
            let gif = folder.join("folder.jpg");
            if let Err(e) = self.tools.copier.to_gif(&square, &gif).await {
                warn!(path = %gif.display(), error = %e, "animated folder image failed");
            }
        }
    }

    async fn motion_variant(&self, url: &str) -> Result<String> {
        let text = self.catalog.fetch_text(url).await?;
        let manifest = Manifest::parse(&text, url)?;
        Ok(select_video(&manifest, self.config.quality.mv_max)?.url)
    }
}

fn track_row(track: &Track) -> String {
    let kind = match track.kind {
        TrackKind::Song => "",
        TrackKind::MusicVideo => " [video]",
    };
    format!(
        "{:>3}. {} - {}{}",
        track.ordinal, track.name, track.artist_name, kind
    )
}
