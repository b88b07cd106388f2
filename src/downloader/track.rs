//! Per-track acquisition for songs

use super::CatalogDownloader;
use crate::artwork::write_cover;
use crate::catalog::{CatalogEntity, EntityKind, SongInfo, Track, TrackKind};
use crate::error::{AcquisitionError, Error, Result};
use crate::lyrics;
use crate::manifest::{Manifest, SelectedVariant, select_audio};
use crate::naming::{FieldMap, Placeholder, edition_tag, track_file_name};
use crate::tagging::{TagContext, album_mux_tags, track_tags};
use crate::tools::TrackSource;
use crate::types::{AudioMode, LyricsFormat, RunContext, SkipReason, TrackOutcome, TrackStage};
use crate::utils::{file_exists, remove_file_if_exists};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Quality label of the legacy lossy delivery path
pub(crate) const LEGACY_QUALITY: &str = "256kbps";

/// One track of an entity, with where it goes
#[derive(Clone, Copy)]
pub(crate) struct TrackJob<'a> {
    pub(crate) entity: &'a CatalogEntity,
    pub(crate) track: &'a Track,
    pub(crate) folder: &'a Path,
    /// Album cover already on disk, embedded unless a per-track cover applies
    pub(crate) cover: Option<&'a Path>,
}

/// Where the audio comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ResolvedSource {
    /// Variant picked from the enhanced manifest
    Enhanced(SelectedVariant),
    /// Legacy lossy delivery
    Legacy,
}

impl ResolvedSource {
    fn quality(&self) -> &str {
        match self {
            ResolvedSource::Enhanced(variant) => &variant.quality,
            ResolvedSource::Legacy => LEGACY_QUALITY,
        }
    }

    fn codec(&self, mode: AudioMode) -> &'static str {
        match self {
            ResolvedSource::Enhanced(_) => mode.codec_label(),
            ResolvedSource::Legacy => AudioMode::Aac.codec_label(),
        }
    }

    fn to_track_source(&self) -> TrackSource {
        match self {
            ResolvedSource::Enhanced(variant) => TrackSource::Enhanced(variant.url.clone()),
            ResolvedSource::Legacy => TrackSource::Legacy,
        }
    }
}

impl CatalogDownloader {
    /// Drive one track to a terminal outcome and apply it to the pass state
    pub(crate) async fn acquire_track(&self, ctx: &mut RunContext, job: &TrackJob<'_>) -> bool {
        ctx.counters.total += 1;
        let outcome = self.track_outcome(job).await;
        settle(ctx, &job.entity.id, job.track.ordinal, &job.track.id, outcome)
    }

    async fn track_outcome(&self, job: &TrackJob<'_>) -> TrackOutcome {
        if self.options.cover_art_only {
            return TrackOutcome::Skipped(SkipReason::CoverArtOnly);
        }
        if job.track.kind == TrackKind::MusicVideo {
            return self
                .music_video_in_entity(job.entity, job.track, job.folder)
                .await;
        }

        let TrackJob { entity, track, folder, .. } = *job;
        let song = match self.catalog.song(&entity.storefront, &track.id).await {
            Ok(song) => song,
            Err(e) => return TrackOutcome::NotSong(e.to_string()),
        };

        // The manifest is consulted up front only when the file name depends on it
        let template = &self.config.download.song_file_format;
        let named_by_source = FieldMap::mentions(template, Placeholder::Quality)
            || FieldMap::mentions(template, Placeholder::Codec);
        let early = if named_by_source {
            match self.resolve_source(track, &song).await {
                Ok(source) => Some(source),
                Err(e) => return TrackOutcome::from_error(TrackStage::Manifest, e),
            }
        } else {
            None
        };
        let fields = match &early {
            Some(source) => self.track_fields(track, source.quality(), source.codec(self.policy.mode)),
            None => self.track_fields(track, "", self.policy.mode.codec_label()),
        };
        let path = folder.join(track_file_name(template, &fields, &track.id, "m4a"));

        if self.options.lyrics_only {
            return self.lyrics_only(entity, track, &path).await;
        }

        match file_exists(&path).await {
            Ok(true) => return TrackOutcome::Skipped(SkipReason::AlreadyExists),
            Ok(false) => {}
            Err(e) => return TrackOutcome::Failed { stage: TrackStage::Acquisition, error: e },
        }

        let source = match early {
            Some(source) => source,
            None => match self.resolve_source(track, &song).await {
                Ok(source) => source,
                Err(e) => return TrackOutcome::from_error(TrackStage::Manifest, e),
            },
        };
        debug!(track_id = %track.id, quality = source.quality(), "source resolved");

        if source == ResolvedSource::Legacy && !self.config.catalog.has_media_token() {
            return TrackOutcome::Failed {
                stage: TrackStage::Acquisition,
                error: AcquisitionError::InvalidCredential.into(),
            };
        }

        info!(track_id = %track.id, path = %path.display(), quality = source.quality(), "acquiring track");
        if let Err(e) = self
            .tools
            .fetcher
            .fetch_track(&track.id, &source.to_track_source(), self.credential(), &path)
            .await
        {
            return TrackOutcome::Failed { stage: TrackStage::Acquisition, error: e };
        }

        match self.post_process(job, &path).await {
            Ok(()) => TrackOutcome::Completed,
            Err(e) => TrackOutcome::Failed { stage: TrackStage::PostProcessing, error: e },
        }
    }

    /// Pick the delivery source for a song under the run's policy
    pub(crate) async fn resolve_source(&self, track: &Track, song: &SongInfo) -> Result<ResolvedSource> {
        if self.policy.forces_legacy() {
            return Ok(ResolvedSource::Legacy);
        }
        match self.song_manifest(track, song).await? {
            Some(manifest) => Ok(ResolvedSource::Enhanced(select_audio(&manifest, &self.policy)?)),
            None if self.policy.mode == AudioMode::Atmos => Err(Error::NoMatchingVariant(format!(
                "{} has no enhanced manifest, Atmos is not offered",
                track.id
            ))),
            None => Ok(ResolvedSource::Legacy),
        }
    }

    /// Fetch and parse a song's enhanced manifest, probing for a better one first
    ///
    /// Returns `None` when the song has no enhanced manifest.
    pub(crate) async fn song_manifest(&self, track: &Track, song: &SongInfo) -> Result<Option<Manifest>> {
        let Some(catalog_url) = song.enhanced_hls.as_deref() else {
            return Ok(None);
        };
        let url = self.probed_manifest_url(track, catalog_url).await;
        let text = self
            .catalog
            .fetch_text(&url)
            .await
            .map_err(|e| Error::Manifest(format!("failed to fetch {url}: {e}")))?;
        Manifest::parse(&text, &url).map(Some)
    }

    async fn probed_manifest_url(&self, track: &Track, fallback: &str) -> String {
        let Some(probe) = self.tools.probe.as_ref() else {
            return fallback.to_string();
        };
        if !self.config.probe.probe_mode.applies_to(&track.audio_traits) {
            return fallback.to_string();
        }
        match probe.resolve(&track.id).await {
            Ok(Some(url)) if url.ends_with(".m3u8") => {
                debug!(track_id = %track.id, %url, "using probed manifest");
                url
            }
            Ok(_) => fallback.to_string(),
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "manifest probe failed");
                fallback.to_string()
            }
        }
    }

    fn track_fields(&self, track: &Track, quality: &str, codec: &str) -> FieldMap {
        let download = &self.config.download;
        let limit = download.limit_max;
        FieldMap::new()
            .with(Placeholder::SongId, track.id.clone())
            .with(Placeholder::SongNumber, format!("{:02}", track.ordinal))
            .with_text(Placeholder::SongName, &track.name, limit)
            .with(Placeholder::DiscNumber, track.disc_number.to_string())
            .with(Placeholder::TrackNumber, track.track_number.to_string())
            .with(Placeholder::Quality, quality)
            .with(
                Placeholder::Tag,
                edition_tag(
                    track.is_mastered,
                    track.content_rating.as_deref(),
                    &download.apple_master_choice,
                    &download.explicit_choice,
                    &download.clean_choice,
                ),
            )
            .with(Placeholder::Codec, codec)
            .with_text(Placeholder::ArtistName, &track.artist_name, limit)
    }

    async fn lyrics_only(&self, entity: &CatalogEntity, track: &Track, path: &Path) -> TrackOutcome {
        let ttml = match self
            .catalog
            .lyrics(&entity.storefront, &track.id, self.config.lyrics.lrc_type)
            .await
        {
            Ok(ttml) => ttml,
            Err(e) => return TrackOutcome::Unavailable(format!("no lyrics: {e}")),
        };
        match self.save_lyrics_sidecar(path, &ttml).await {
            Ok(sidecar) => {
                info!(track_id = %track.id, path = %sidecar.display(), "lyrics saved");
                TrackOutcome::Completed
            }
            Err(e) => TrackOutcome::Failed { stage: TrackStage::PostProcessing, error: e },
        }
    }

    /// Write the lyrics sidecar next to `track_path` in the configured format
    async fn save_lyrics_sidecar(&self, track_path: &Path, ttml: &str) -> Result<PathBuf> {
        let format = self.config.lyrics.lrc_format;
        let contents = lyrics::render(ttml, format)?;
        let folder = track_path.parent().unwrap_or_else(|| Path::new("."));
        let stem = track_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        lyrics::write_sidecar(folder, &format!("{stem}.{}", format.extension()), &contents).await
    }

    /// Lyrics to embed, writing the sidecar on the way if configured
    async fn prepare_lyrics(&self, entity: &CatalogEntity, track: &Track, path: &Path) -> Option<String> {
        let lyrics_config = &self.config.lyrics;
        if !lyrics_config.embed_lrc && !lyrics_config.save_lrc_file {
            return None;
        }
        let ttml = match self
            .catalog
            .lyrics(&entity.storefront, &track.id, lyrics_config.lrc_type)
            .await
        {
            Ok(ttml) => ttml,
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "lyrics unavailable");
                return None;
            }
        };

        if lyrics_config.save_lrc_file {
            if let Err(e) = self.save_lyrics_sidecar(path, &ttml).await {
                warn!(track_id = %track.id, error = %e, "failed to save lyrics sidecar");
            }
        }
        if !lyrics_config.embed_lrc {
            return None;
        }
        match lyrics::render(&ttml, LyricsFormat::Lrc) {
            Ok(lrc) => Some(lrc),
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "lyrics could not be embedded");
                None
            }
        }
    }

    /// Per-track cover for playlists with `playlist_track_covers`
    async fn track_cover(&self, job: &TrackJob<'_>) -> Option<PathBuf> {
        let TrackJob { entity, track, folder, .. } = *job;
        if entity.kind != EntityKind::Playlist || !self.config.download.playlist_track_covers {
            return None;
        }
        let template = track.artwork_url.as_deref()?;
        match write_cover(
            self.catalog.as_ref(),
            folder,
            &format!("{}_cover", track.id),
            template,
            &self.config.artwork,
        )
        .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "per-track cover unavailable");
                None
            }
        }
    }

    async fn post_process(&self, job: &TrackJob<'_>, path: &Path) -> Result<()> {
        let TrackJob { entity, track, .. } = *job;
        let lyrics = self.prepare_lyrics(entity, track, path).await;

        let embed_cover = self.config.artwork.embed_cover;
        let track_cover = if embed_cover {
            self.track_cover(job).await
        } else {
            None
        };
        let cover = track_cover
            .as_deref()
            .or(job.cover.filter(|_| embed_cover));

        let result = self.tag_track(job, path, cover, lyrics.as_deref()).await;

        if let Some(own) = track_cover {
            if let Err(e) = remove_file_if_exists(&own).await {
                warn!(path = %own.display(), error = %e, "failed to remove per-track cover");
            }
        }
        result
    }

    async fn tag_track(
        &self,
        job: &TrackJob<'_>,
        path: &Path,
        cover: Option<&Path>,
        lyrics: Option<&str>,
    ) -> Result<()> {
        self.tools
            .muxer
            .apply_tags(path, &album_mux_tags(job.entity, cover))
            .await?;
        let tags = track_tags(&TagContext {
            entity: job.entity,
            track: job.track,
            download: &self.config.download,
            lyrics,
        });
        self.tagger.write(path, &tags).await
    }
}

/// Apply an outcome to the pass counters, recording successes in the ledger
///
/// Returns whether the outcome counted as a success.
pub(crate) fn settle(
    ctx: &mut RunContext,
    entity_id: &str,
    ordinal: usize,
    item_id: &str,
    outcome: TrackOutcome,
) -> bool {
    outcome.tally(&mut ctx.counters);
    match &outcome {
        TrackOutcome::Completed => info!(item_id, ordinal, "completed"),
        TrackOutcome::Skipped(reason) => info!(item_id, ordinal, reason = ?reason, "skipped"),
        TrackOutcome::Unavailable(reason) => warn!(item_id, ordinal, %reason, "unavailable"),
        TrackOutcome::NotSong(reason) => warn!(item_id, ordinal, %reason, "catalog lookup failed"),
        TrackOutcome::Failed { stage, error } => {
            error!(item_id, ordinal, stage = %stage, error = %error, "failed")
        }
    }
    let success = outcome.is_success();
    if success {
        ctx.ledger.record(entity_id, ordinal);
    }
    success
}
