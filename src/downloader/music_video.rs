//! Music videos: video and audio acquired separately, then remuxed

use super::{ArtistContext, CatalogDownloader};
use super::track::settle;
use crate::artwork::write_cover;
use crate::catalog::{CatalogEntity, MusicVideoInfo, Track};
use crate::error::{Error, Result};
use crate::manifest::{Manifest, SelectedVariant, select_mv_audio, select_video};
use crate::naming::{FieldMap, Placeholder, track_file_name};
use crate::tagging::{Placement, music_video_id_tags, music_video_mux_tags};
use crate::tools::StreamKind;
use crate::types::{RunContext, SkipReason, TrackOutcome, TrackStage};
use crate::utils::{file_exists, remove_file_if_exists};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ENTITY_TEMPLATE: &str = "{SongNumber}. {SongName}";
const STANDALONE_TEMPLATE: &str = "{SongName} ({SongId})";

/// Temporary files of one music-video acquisition
struct Intermediates {
    video: PathBuf,
    audio: PathBuf,
    thumbnail: Option<PathBuf>,
}

impl Intermediates {
    fn new(folder: &Path, video_id: &str) -> Self {
        Self {
            video: folder.join(format!("{video_id}_vid.mp4")),
            audio: folder.join(format!("{video_id}_aud.mp4")),
            thumbnail: None,
        }
    }

    async fn remove(self) {
        let paths = [Some(self.video), Some(self.audio), self.thumbnail];
        for path in paths.into_iter().flatten() {
            if let Err(e) = remove_file_if_exists(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}

/// Output file name of a music video
///
/// Inside an entity it is numbered by position; standalone videos carry their id.
pub(crate) fn music_video_file_name(
    video: &MusicVideoInfo,
    ordinal: Option<usize>,
    limit: usize,
) -> String {
    let fields = FieldMap::new()
        .with(Placeholder::SongId, video.id.clone())
        .with_text(Placeholder::SongName, &video.name, limit);
    match ordinal {
        Some(ordinal) => track_file_name(
            ENTITY_TEMPLATE,
            &fields.with(Placeholder::SongNumber, format!("{ordinal:02}")),
            &video.id,
            "mp4",
        ),
        None => track_file_name(STANDALONE_TEMPLATE, &fields, &video.id, "mp4"),
    }
}

impl CatalogDownloader {
    /// Why music videos cannot be acquired in this run, if they cannot
    pub(crate) fn music_video_skip_reason(&self) -> Option<SkipReason> {
        if self.options.lyrics_only {
            Some(SkipReason::LyricsOnly)
        } else if self.options.skip_mv {
            Some(SkipReason::MusicVideosDisabled)
        } else if !self.config.catalog.has_media_token() {
            Some(SkipReason::MissingCredential)
        } else if !self.tools.has_decrypter {
            Some(SkipReason::MissingDecrypter)
        } else {
            None
        }
    }

    /// A music video listed in an album or playlist
    pub(crate) async fn music_video_in_entity(
        &self,
        entity: &CatalogEntity,
        track: &Track,
        folder: &Path,
    ) -> TrackOutcome {
        if let Some(reason) = self.music_video_skip_reason() {
            return TrackOutcome::Skipped(reason);
        }
        let video = match self.catalog.music_video(&entity.storefront, &track.id).await {
            Ok(video) => video,
            Err(e) => return TrackOutcome::NotSong(e.to_string()),
        };
        let out = folder.join(music_video_file_name(
            &video,
            Some(track.ordinal),
            self.config.download.limit_max,
        ));
        self.music_video_outcome(&video, folder, &out, Some(Placement { entity, track }))
            .await
    }

    /// A music video given directly, saved under its artist folder
    pub(crate) async fn acquire_standalone_video(
        &self,
        ctx: &mut RunContext,
        storefront: &str,
        video_id: &str,
        artist: Option<&ArtistContext>,
    ) {
        ctx.counters.total += 1;
        if ctx.ledger.contains(video_id, 1) {
            ctx.counters.success += 1;
            return;
        }

        let outcome = match self.music_video_skip_reason() {
            Some(reason) => TrackOutcome::Skipped(reason),
            None => match self.catalog.music_video(storefront, video_id).await {
                Err(e) => TrackOutcome::NotSong(e.to_string()),
                Ok(video) => match self.standalone_video_folder(&video, artist).await {
                    Err(e) => TrackOutcome::Failed {
                        stage: TrackStage::PostProcessing,
                        error: e,
                    },
                    Ok(folder) => {
                        let out = folder.join(music_video_file_name(
                            &video,
                            None,
                            self.config.download.limit_max,
                        ));
                        self.music_video_outcome(&video, &folder, &out, None).await
                    }
                },
            },
        };
        settle(ctx, video_id, 1, video_id, outcome);
    }

    async fn music_video_outcome(
        &self,
        video: &MusicVideoInfo,
        folder: &Path,
        out: &Path,
        placement: Option<Placement<'_>>,
    ) -> TrackOutcome {
        match file_exists(out).await {
            Ok(true) => return TrackOutcome::Skipped(SkipReason::AlreadyExists),
            Ok(false) => {}
            Err(e) => return TrackOutcome::Failed { stage: TrackStage::Acquisition, error: e },
        }

        let manifest_url = match self
            .tools
            .fetcher
            .playback_manifest(&video.id, self.credential())
            .await
        {
            Ok(url) => url,
            Err(e) => return TrackOutcome::Failed { stage: TrackStage::Acquisition, error: e },
        };
        let (video_stream, audio_stream) = match self.music_video_streams(&manifest_url).await {
            Ok(streams) => streams,
            Err(e) => return TrackOutcome::from_error(TrackStage::Manifest, e),
        };
        debug!(
            video_id = %video.id,
            video = %video_stream.quality,
            audio = %audio_stream.label,
            "music video renditions selected"
        );

        let mut temp = Intermediates::new(folder, &video.id);
        info!(video_id = %video.id, path = %out.display(), "acquiring music video");
        let fetcher = &self.tools.fetcher;
        let credential = self.credential();
        let fetched = async {
            fetcher
                .fetch_elementary(
                    &video.id,
                    &video_stream.url,
                    StreamKind::Video,
                    credential,
                    &temp.video,
                )
                .await?;
            fetcher
                .fetch_elementary(
                    &video.id,
                    &audio_stream.url,
                    StreamKind::Audio,
                    credential,
                    &temp.audio,
                )
                .await
        }
        .await;
        if let Err(e) = fetched {
            return TrackOutcome::Failed { stage: TrackStage::Acquisition, error: e };
        }

        temp.thumbnail = self.music_video_thumbnail(video, folder).await;
        let tags = music_video_mux_tags(
            video,
            placement,
            &self.config.download,
            temp.thumbnail.as_deref(),
        );
        if let Err(e) = self.tools.muxer.remux(&temp.video, &temp.audio, &tags, out).await {
            warn!(video_id = %video.id, "remux failed, temporary streams kept for inspection");
            return TrackOutcome::Failed { stage: TrackStage::PostProcessing, error: e };
        }
        temp.remove().await;

        if let Err(e) = self.tagger.write(out, &music_video_id_tags(&video.id)).await {
            return TrackOutcome::Failed { stage: TrackStage::PostProcessing, error: e };
        }
        TrackOutcome::Completed
    }

    async fn music_video_streams(&self, url: &str) -> Result<(SelectedVariant, SelectedVariant)> {
        let text = self
            .catalog
            .fetch_text(url)
            .await
            .map_err(|e| Error::Manifest(format!("failed to fetch {url}: {e}")))?;
        let manifest = Manifest::parse(&text, url)?;
        let video = select_video(&manifest, self.config.quality.mv_max)?;
        let audio = select_mv_audio(&manifest, self.config.quality.mv_audio_type)?;
        Ok((video, audio))
    }

    async fn music_video_thumbnail(&self, video: &MusicVideoInfo, folder: &Path) -> Option<PathBuf> {
        if !self.config.artwork.embed_cover {
            return None;
        }
        let template = video.artwork_url.as_deref()?;
        match write_cover(
            self.catalog.as_ref(),
            folder,
            &format!("{}_thumb", video.id),
            template,
            &self.config.artwork,
        )
        .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(video_id = %video.id, error = %e, "thumbnail unavailable");
                None
            }
        }
    }
}
