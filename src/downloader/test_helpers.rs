//! Shared fakes and fixtures for orchestration tests.

use crate::catalog::{
    ArtistItem, ArtistRef, ArtistRelationship, CatalogApi, CatalogEntity, EntityAttributes,
    EntityKind, MusicVideoInfo, SongInfo, Track, TrackKind,
};
use crate::config::Config;
use crate::downloader::{CatalogDownloader, ContinuationSignal, Prompts, SelectionPrompt};
use crate::error::{CatalogError, Error, Result};
use crate::tagging::{TagWriter, TrackTags};
use crate::tools::{
    DecryptingFetcher, ManifestProbe, Muxer, StreamCopier, StreamKind, TagList, Toolset,
    TrackSource,
};
use crate::types::{Counters, LyricsType, RunOptions};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) use crate::manifest::fixtures::{AUDIO_MASTER, MASTER_URL};

/// Media credential long enough to pass validation
pub(crate) const MEDIA_TOKEN: &str =
    "media-user-token-0123456789abcdefghijklmnopqrstuvwxyz0123456789";

/// Master manifest with only lossless variants (no Atmos)
pub(crate) const LOSSLESS_ONLY: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1500000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-48000-24\"
alac/48000-24.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=300000,CODECS=\"mp4a.40.2\",AUDIO=\"audio-stereo-256\"
aac/256.m3u8
";

/// Music-video master manifest with video variants and audio renditions
pub(crate) const VIDEO_MASTER: &str = "#EXTM3U
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio-stereo-256\",NAME=\"Stereo\",URI=\"audio/stereo_gr256_main.m3u8\"
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio-atmos\",NAME=\"Atmos\",URI=\"audio/atmos_gr2768_main.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=20000000,CODECS=\"hvc1.2.4.L150\",RESOLUTION=3840x2160,AUDIO=\"audio-atmos\"
video/hevc_3840x2160.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=6000000,CODECS=\"avc1.640028\",RESOLUTION=1920x1080,AUDIO=\"audio-stereo-256\"
video/avc_1920x1080.m3u8
";

pub(crate) const VIDEO_URL: &str = "https://mvod.example.com/itunes/video/9/master.m3u8";

/// A song row of an entity
pub(crate) fn song_track(id: &str, ordinal: usize, name: &str) -> Track {
    Track {
        id: id.to_string(),
        ordinal,
        kind: TrackKind::Song,
        name: name.to_string(),
        artist_name: "The Beatles".to_string(),
        album_name: "Abbey Road".to_string(),
        disc_number: 1,
        track_number: u32::try_from(ordinal).unwrap(),
        audio_traits: vec!["lossless".to_string()],
        content_rating: None,
        composer: String::new(),
        genres: vec!["Rock".to_string()],
        isrc: String::new(),
        release_date: "1969-09-26".to_string(),
        artwork_url: None,
        is_mastered: false,
        album: None,
        artist_id: Some("136975".to_string()),
    }
}

/// A music-video row of an entity
pub(crate) fn video_track(id: &str, ordinal: usize, name: &str) -> Track {
    Track {
        kind: TrackKind::MusicVideo,
        ..song_track(id, ordinal, name)
    }
}

/// An album with the given tracks
pub(crate) fn album(id: &str, tracks: Vec<Track>) -> CatalogEntity {
    CatalogEntity {
        id: id.to_string(),
        storefront: "us".to_string(),
        kind: EntityKind::from_id(id),
        attributes: EntityAttributes {
            name: "Abbey Road".to_string(),
            artist_name: "The Beatles".to_string(),
            release_date: "1969-09-26".to_string(),
            track_count: tracks.len(),
            ..Default::default()
        },
        artists: vec![ArtistRef {
            id: "136975".to_string(),
            name: "The Beatles".to_string(),
            artwork_url: None,
        }],
        tracks,
    }
}

/// Song info pointing at `manifest_url`, or without an enhanced manifest
pub(crate) fn song_info(id: &str, manifest_url: Option<&str>) -> SongInfo {
    SongInfo {
        id: id.to_string(),
        enhanced_hls: manifest_url.map(str::to_string),
        album_id: Some("1441164426".to_string()),
        disc_number: 1,
        track_number: 1,
        album_name: "Abbey Road".to_string(),
        album_artist_name: "The Beatles".to_string(),
    }
}

fn missing(resource: String) -> Error {
    CatalogError::Missing { resource }.into()
}

/// In-memory catalog
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub(crate) entities: HashMap<String, CatalogEntity>,
    pub(crate) songs: HashMap<String, SongInfo>,
    pub(crate) videos: HashMap<String, MusicVideoInfo>,
    pub(crate) artists: HashMap<String, ArtistRef>,
    pub(crate) artist_albums: HashMap<String, Vec<ArtistItem>>,
    pub(crate) artist_videos: HashMap<String, Vec<ArtistItem>>,
    pub(crate) lyrics: HashMap<String, String>,
    pub(crate) texts: HashMap<String, String>,
    pub(crate) bytes: HashMap<String, Vec<u8>>,
    pub(crate) song_lookups: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub(crate) fn with_entity(mut self, entity: CatalogEntity) -> Self {
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    pub(crate) fn with_song(mut self, song: SongInfo) -> Self {
        self.songs.insert(song.id.clone(), song);
        self
    }

    pub(crate) fn with_text(mut self, url: &str, text: &str) -> Self {
        self.texts.insert(url.to_string(), text.to_string());
        self
    }

    pub(crate) fn song_lookups(&self) -> Vec<String> {
        self.song_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn entity(&self, _storefront: &str, id: &str) -> Result<CatalogEntity> {
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| missing(format!("entity {id}")))
    }

    async fn song(&self, _storefront: &str, id: &str) -> Result<SongInfo> {
        self.song_lookups.lock().unwrap().push(id.to_string());
        self.songs
            .get(id)
            .cloned()
            .ok_or_else(|| missing(format!("songs/{id}")))
    }

    async fn music_video(&self, _storefront: &str, id: &str) -> Result<MusicVideoInfo> {
        self.videos
            .get(id)
            .cloned()
            .ok_or_else(|| missing(format!("music-videos/{id}")))
    }

    async fn artist(&self, _storefront: &str, id: &str) -> Result<ArtistRef> {
        self.artists
            .get(id)
            .cloned()
            .ok_or_else(|| missing(format!("artists/{id}")))
    }

    async fn artist_items(
        &self,
        _storefront: &str,
        id: &str,
        relationship: ArtistRelationship,
    ) -> Result<Vec<ArtistItem>> {
        let source = match relationship {
            ArtistRelationship::Albums => &self.artist_albums,
            ArtistRelationship::MusicVideos => &self.artist_videos,
        };
        Ok(source.get(id).cloned().unwrap_or_default())
    }

    async fn lyrics(&self, _storefront: &str, id: &str, _kind: LyricsType) -> Result<String> {
        self.lyrics
            .get(id)
            .cloned()
            .ok_or_else(|| missing(format!("songs/{id}/lyrics")))
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.texts.get(url).cloned().ok_or_else(|| missing(url.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self
            .bytes
            .get(url)
            .cloned()
            .unwrap_or_else(|| b"IMAGEDATA".to_vec()))
    }
}

/// A recorded `fetch_track` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FetchCall {
    pub(crate) track_id: String,
    pub(crate) source: TrackSource,
    pub(crate) dest: PathBuf,
}

/// Fetcher that writes placeholder files and records every call
#[derive(Default)]
pub(crate) struct RecordingFetcher {
    /// Remaining failures per track id
    pub(crate) failures: Mutex<HashMap<String, u32>>,
    pub(crate) playback_url: Option<String>,
    pub(crate) calls: Mutex<Vec<FetchCall>>,
    pub(crate) elementary: Mutex<Vec<(StreamKind, String)>>,
    pub(crate) elementary_credentials: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub(crate) fn failing(track_id: &str, times: u32) -> Self {
        let fetcher = Self::default();
        fetcher
            .failures
            .lock()
            .unwrap()
            .insert(track_id.to_string(), times);
        fetcher
    }

    pub(crate) fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn take_failure(&self, id: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl DecryptingFetcher for RecordingFetcher {
    async fn fetch_track(
        &self,
        track_id: &str,
        source: &TrackSource,
        _credential: &str,
        dest: &Path,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(FetchCall {
            track_id: track_id.to_string(),
            source: source.clone(),
            dest: dest.to_path_buf(),
        });
        if self.take_failure(track_id) {
            return Err(crate::error::AcquisitionError::FetchFailed {
                track_id: track_id.to_string(),
                reason: "scripted failure".to_string(),
            }
            .into());
        }
        tokio::fs::write(dest, b"m4a").await?;
        Ok(())
    }

    async fn fetch_elementary(
        &self,
        _item_id: &str,
        url: &str,
        kind: StreamKind,
        credential: &str,
        dest: &Path,
    ) -> Result<()> {
        self.elementary.lock().unwrap().push((kind, url.to_string()));
        self.elementary_credentials
            .lock()
            .unwrap()
            .push(credential.to_string());
        tokio::fs::write(dest, kind.as_str()).await?;
        Ok(())
    }

    async fn playback_manifest(&self, item_id: &str, _credential: &str) -> Result<String> {
        self.playback_url.clone().ok_or_else(|| {
            crate::error::AcquisitionError::NoPlayback {
                track_id: item_id.to_string(),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Muxer that records tag lists and writes remux outputs
#[derive(Default)]
pub(crate) struct FakeMuxer {
    pub(crate) applied: Mutex<Vec<(PathBuf, String)>>,
    pub(crate) remuxed: Mutex<Vec<(PathBuf, String)>>,
    pub(crate) fail_remux: bool,
}

#[async_trait]
impl Muxer for FakeMuxer {
    async fn apply_tags(&self, path: &Path, tags: &TagList) -> Result<()> {
        self.applied
            .lock()
            .unwrap()
            .push((path.to_path_buf(), tags.to_string()));
        Ok(())
    }

    async fn remux(&self, _video: &Path, _audio: &Path, tags: &TagList, out: &Path) -> Result<()> {
        if self.fail_remux {
            return Err(Error::ExternalTool("scripted remux failure".to_string()));
        }
        self.remuxed
            .lock()
            .unwrap()
            .push((out.to_path_buf(), tags.to_string()));
        tokio::fs::write(out, b"mp4").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Copier that writes placeholder files
#[derive(Default)]
pub(crate) struct FakeCopier {
    pub(crate) copies: Mutex<Vec<(String, PathBuf)>>,
    pub(crate) gifs: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl StreamCopier for FakeCopier {
    async fn copy(&self, url: &str, dest: &Path) -> Result<()> {
        self.copies
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        tokio::fs::write(dest, b"mp4").await?;
        Ok(())
    }

    async fn to_gif(&self, _src: &Path, dest: &Path) -> Result<()> {
        self.gifs.lock().unwrap().push(dest.to_path_buf());
        tokio::fs::write(dest, b"GIF89a").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Probe with a fixed answer
pub(crate) struct FakeProbe {
    pub(crate) answer: Option<String>,
    pub(crate) asked: Mutex<Vec<String>>,
}

#[async_trait]
impl ManifestProbe for FakeProbe {
    async fn resolve(&self, track_id: &str) -> Result<Option<String>> {
        self.asked.lock().unwrap().push(track_id.to_string());
        Ok(self.answer.clone())
    }
}

/// Tag writer that records what it was asked to write
#[derive(Default)]
pub(crate) struct FakeTagWriter {
    pub(crate) written: Mutex<Vec<(PathBuf, TrackTags)>>,
    pub(crate) fail: bool,
}

impl FakeTagWriter {
    pub(crate) fn written(&self) -> Vec<(PathBuf, TrackTags)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagWriter for FakeTagWriter {
    async fn write(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        if self.fail {
            return Err(crate::error::PostProcessError::TagWriteFailed {
                path: path.to_path_buf(),
                reason: "scripted failure".to_string(),
            }
            .into());
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), tags.clone()));
        Ok(())
    }
}

/// Selection prompt answering from a script
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    pub(crate) answers: Mutex<VecDeque<String>>,
    pub(crate) shown: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedPrompt {
    pub(crate) fn answering(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            shown: Mutex::default(),
        }
    }
}

#[async_trait]
impl SelectionPrompt for ScriptedPrompt {
    async fn choose(&self, title: &str, rows: &[String]) -> Result<String> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), rows.to_vec()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Other("prompt script exhausted".to_string()))
    }
}

/// Continuation signal answering from a script (stops when exhausted)
#[derive(Default)]
pub(crate) struct ScriptedContinuation {
    pub(crate) answers: Mutex<VecDeque<bool>>,
    pub(crate) asked: Mutex<Vec<Counters>>,
}

impl ScriptedContinuation {
    pub(crate) fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::default(),
        }
    }

    pub(crate) fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl ContinuationSignal for ScriptedContinuation {
    async fn should_continue(&self, counters: &Counters) -> bool {
        self.asked.lock().unwrap().push(*counters);
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// A downloader wired to fakes, with its output in a temp dir
pub(crate) struct Harness {
    pub(crate) config: Config,
    pub(crate) options: RunOptions,
    pub(crate) catalog: Arc<FakeCatalog>,
    pub(crate) fetcher: Arc<RecordingFetcher>,
    pub(crate) muxer: Arc<FakeMuxer>,
    pub(crate) copier: Arc<FakeCopier>,
    pub(crate) tagger: Arc<FakeTagWriter>,
    pub(crate) prompt: Arc<ScriptedPrompt>,
    pub(crate) continuation: Arc<ScriptedContinuation>,
    pub(crate) probe: Option<Arc<FakeProbe>>,
    pub(crate) has_decrypter: bool,
    pub(crate) temp_dir: TempDir,
}

impl Harness {
    /// Harness over `catalog` with default fakes
    ///
    /// Output goes to `<tmp>/alac` (or `<tmp>/atmos`), with a flat
    /// `{ArtistName}/{AlbumName}` layout and no cover embedding.
    pub(crate) fn new(catalog: FakeCatalog) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.download.alac_save_folder = temp_dir.path().join("alac");
        config.download.atmos_save_folder = temp_dir.path().join("atmos");
        config.download.artist_folder_format = "{ArtistName}".to_string();
        config.catalog.media_user_token = MEDIA_TOKEN.to_string();
        config.artwork.embed_cover = false;
        config.tools.search_path = false;

        Self {
            config,
            options: RunOptions::default(),
            catalog: Arc::new(catalog),
            fetcher: Arc::new(RecordingFetcher::default()),
            muxer: Arc::new(FakeMuxer::default()),
            copier: Arc::new(FakeCopier::default()),
            tagger: Arc::new(FakeTagWriter::default()),
            prompt: Arc::new(ScriptedPrompt::default()),
            continuation: Arc::new(ScriptedContinuation::default()),
            probe: None,
            has_decrypter: true,
            temp_dir,
        }
    }

    pub(crate) fn downloader(&self) -> CatalogDownloader {
        let tools = Toolset {
            fetcher: self.fetcher.clone(),
            muxer: self.muxer.clone(),
            copier: self.copier.clone(),
            probe: self
                .probe
                .clone()
                .map(|p| p as Arc<dyn ManifestProbe>),
            has_decrypter: self.has_decrypter,
        };
        CatalogDownloader::new(
            self.config.clone(),
            self.options.clone(),
            self.catalog.clone(),
            tools,
            self.tagger.clone(),
            Prompts {
                selection: self.prompt.clone(),
                continuation: self.continuation.clone(),
            },
        )
    }

    /// Folder the default fixture album lands in
    pub(crate) fn album_dir(&self) -> PathBuf {
        self.temp_dir
            .path()
            .join("alac")
            .join("The Beatles")
            .join("Abbey Road")
    }

    pub(crate) fn fetched_ids(&self) -> Vec<String> {
        self.fetcher.calls().into_iter().map(|c| c.track_id).collect()
    }

    pub(crate) fn ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }
}

/// The fixture album "1441164426" with three songs and their manifests
pub(crate) fn three_song_catalog() -> FakeCatalog {
    let tracks = vec![
        song_track("1441164430", 1, "Come Together"),
        song_track("1441164431", 2, "Something"),
        song_track("1441164432", 3, "Maxwell's Silver Hammer"),
    ];
    let mut catalog = FakeCatalog::default().with_entity(album("1441164426", tracks));
    for id in ["1441164430", "1441164431", "1441164432"] {
        catalog = catalog.with_song(song_info(id, Some(MASTER_URL)));
    }
    catalog.with_text(MASTER_URL, AUDIO_MASTER)
}
