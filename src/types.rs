//! Core types for catalog-dl

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Audio delivery mode requested for a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    /// Apple Lossless (default)
    #[default]
    Alac,
    /// AAC (see [`AacType`] for the subtype)
    Aac,
    /// Dolby Atmos (E-AC-3), with Dolby Audio (AC-3) fallback
    Atmos,
}

impl AudioMode {
    /// Label used for the `{Codec}` template placeholder
    pub fn codec_label(&self) -> &'static str {
        match self {
            AudioMode::Alac => "ALAC",
            AudioMode::Aac => "AAC",
            AudioMode::Atmos => "ATMOS",
        }
    }
}

/// AAC rendition subtype
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AacType {
    /// Legacy lossy delivery (not served by the enhanced manifest)
    #[default]
    AacLc,
    /// Stereo AAC from the enhanced manifest
    Aac,
    /// Binaural AAC
    AacBinaural,
    /// Downmixed AAC
    AacDownmix,
}

impl AacType {
    /// Rendition label this subtype matches after `audio-stereo-<n>` normalization
    pub fn label(&self) -> &'static str {
        match self {
            AacType::AacLc => "aac-lc",
            AacType::Aac => "aac",
            AacType::AacBinaural => "aac-binaural",
            AacType::AacDownmix => "aac-downmix",
        }
    }
}

impl fmt::Display for AacType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AacType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aac-lc" => Ok(AacType::AacLc),
            "aac" => Ok(AacType::Aac),
            "aac-binaural" => Ok(AacType::AacBinaural),
            "aac-downmix" => Ok(AacType::AacDownmix),
            other => Err(Error::config(
                "aac_type",
                format!("unknown AAC type '{other}' (expected aac, aac-lc, aac-binaural, aac-downmix)"),
            )),
        }
    }
}

/// Audio rendition preference for music videos
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MvAudioType {
    /// Prefer Atmos, then AC-3, then stereo AAC
    #[default]
    Atmos,
    /// Prefer AC-3, then stereo AAC
    Ac3,
    /// Stereo AAC only
    Aac,
}

impl MvAudioType {
    /// Alternative-rendition group ids allowed for this preference
    pub fn allowed_groups(&self) -> &'static [&'static str] {
        match self {
            MvAudioType::Atmos => &["audio-atmos", "audio-ac3", "audio-stereo-256"],
            MvAudioType::Ac3 => &["audio-ac3", "audio-stereo-256"],
            MvAudioType::Aac => &["audio-stereo-256"],
        }
    }
}

impl FromStr for MvAudioType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atmos" => Ok(MvAudioType::Atmos),
            "ac3" => Ok(MvAudioType::Ac3),
            "aac" => Ok(MvAudioType::Aac),
            other => Err(Error::config(
                "mv_audio_type",
                format!("unknown music video audio type '{other}' (expected atmos, ac3, aac)"),
            )),
        }
    }
}

/// Cover image format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverFormat {
    /// JPEG at the configured size
    #[default]
    Jpg,
    /// PNG at the configured size
    Png,
    /// Original upload, extension taken from the artwork URL
    Original,
}

/// Lyrics sidecar format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsFormat {
    /// Line-timed LRC text
    #[default]
    Lrc,
    /// Raw TTML as returned by the catalog
    Ttml,
}

impl LyricsFormat {
    /// File extension for the sidecar
    pub fn extension(&self) -> &'static str {
        match self {
            LyricsFormat::Lrc => "lrc",
            LyricsFormat::Ttml => "ttml",
        }
    }
}

/// Which lyrics resource to request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LyricsType {
    /// Line-synced lyrics
    #[default]
    Lyrics,
    /// Word-synced lyrics
    SyllableLyrics,
}

impl LyricsType {
    /// Path segment under `songs/{id}/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            LyricsType::Lyrics => "lyrics",
            LyricsType::SyllableLyrics => "syllable-lyrics",
        }
    }
}

/// When to ask the local manifest-resolution helper for a better manifest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Never probe
    Off,
    /// Probe every track
    All,
    /// Probe only tracks advertising hi-res lossless
    #[default]
    Hires,
}

impl ProbeMode {
    /// Whether a track with these audio traits should be probed
    pub fn applies_to(&self, audio_traits: &[String]) -> bool {
        match self {
            ProbeMode::Off => false,
            ProbeMode::All => true,
            ProbeMode::Hires => audio_traits.iter().any(|t| t == "hi-res-lossless"),
        }
    }
}

/// Codec/quality policy, built once per run from config and flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityPolicy {
    /// Requested delivery mode
    pub mode: AudioMode,
    /// AAC subtype (only meaningful in AAC mode)
    pub aac_subtype: AacType,
    /// Highest accepted ALAC sample rate in Hz
    pub alac_max: u32,
    /// Highest accepted Atmos bitrate in kbps
    pub atmos_max: u32,
}

impl QualityPolicy {
    /// Whether this policy always takes the legacy lossy path
    pub fn forces_legacy(&self) -> bool {
        self.mode == AudioMode::Aac && self.aac_subtype == AacType::AacLc
    }
}

/// Per-invocation mode flags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Delivery mode (ALAC unless `--aac` or `--atmos`)
    pub mode: AudioMode,
    /// Ask which tracks to acquire for every entity
    pub select: bool,
    /// Acquire only the track named by the `i` query parameter
    pub single_track: bool,
    /// Take every album of an artist without prompting
    pub all_artist_albums: bool,
    /// Report available qualities without acquiring anything
    pub inspect: bool,
    /// Write lyrics sidecars only
    pub lyrics_only: bool,
    /// Skip entities without Atmos in their first tracks
    pub atmos_only: bool,
    /// Skip every music video
    pub skip_mv: bool,
    /// Fetch cover art only
    pub cover_art_only: bool,
}

impl RunOptions {
    /// Effective delivery mode (`atmos_only` implies Atmos)
    pub fn effective_mode(&self) -> AudioMode {
        if self.atmos_only {
            AudioMode::Atmos
        } else {
            self.mode
        }
    }
}

/// Per-pass tallies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Tracks (or standalone items) visited
    pub total: u32,
    /// Completed, skipped or already present
    pub success: u32,
    /// Failed in a way that makes the batch eligible for another pass
    pub error: u32,
    /// Not available in the requested quality
    pub unavailable: u32,
    /// Catalog lookup for the song failed
    pub not_song: u32,
}

impl Counters {
    /// Unavailable plus not-song, reported as warnings
    pub fn warnings(&self) -> u32 {
        self.unavailable + self.not_song
    }
}

/// Entity id to completed ordinals, grown monotonically during a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionLedger {
    entries: HashMap<String, BTreeSet<usize>>,
}

impl CompletionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed ordinal. Returns false if it was already recorded.
    pub fn record(&mut self, entity_id: &str, ordinal: usize) -> bool {
        self.entries
            .entry(entity_id.to_string())
            .or_default()
            .insert(ordinal)
    }

    /// Whether the ordinal is already complete for this entity
    pub fn contains(&self, entity_id: &str, ordinal: usize) -> bool {
        self.entries
            .get(entity_id)
            .is_some_and(|set| set.contains(&ordinal))
    }

    /// Completed ordinals for an entity, ascending
    pub fn completed(&self, entity_id: &str) -> Vec<usize> {
        self.entries
            .get(entity_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of recorded (entity, ordinal) pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutable state for one batch pass
#[derive(Debug, Default)]
pub struct RunContext {
    /// Tallies for this pass only
    pub counters: Counters,
    /// Completion ledger carried across passes
    pub ledger: CompletionLedger,
}

impl RunContext {
    /// Start a pass with zeroed counters and an existing ledger
    pub fn with_ledger(ledger: CompletionLedger) -> Self {
        Self {
            counters: Counters::default(),
            ledger,
        }
    }

    /// Give up the ledger so the next pass can reuse it
    pub fn into_ledger(self) -> CompletionLedger {
        self.ledger
    }
}

/// Why a track was skipped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Cover-art-only mode
    CoverArtOnly,
    /// Target file already present on disk
    AlreadyExists,
    /// Music videos disabled for this run
    MusicVideosDisabled,
    /// Media credential missing or too short for music videos
    MissingCredential,
    /// Decrypting muxer not installed
    MissingDecrypter,
    /// Lyrics-only mode does not touch music videos
    LyricsOnly,
}

/// Stage at which a track failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStage {
    /// Manifest fetch or variant selection
    Manifest,
    /// Decrypting fetch
    Acquisition,
    /// Tagging, muxing or cleanup
    PostProcessing,
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackStage::Manifest => "manifest",
            TrackStage::Acquisition => "acquisition",
            TrackStage::PostProcessing => "post-processing",
        };
        f.write_str(s)
    }
}

/// Terminal state of the per-track state machine
#[derive(Debug)]
pub enum TrackOutcome {
    /// Acquired and tagged
    Completed,
    /// Skipped without error (counts as success)
    Skipped(SkipReason),
    /// Not offered in the requested quality
    Unavailable(String),
    /// Catalog lookup failed
    NotSong(String),
    /// Failed; counts as an error
    Failed {
        /// Where it failed
        stage: TrackStage,
        /// What went wrong
        error: Error,
    },
}

impl TrackOutcome {
    /// Whether this outcome counts toward `success`
    pub fn is_success(&self) -> bool {
        matches!(self, TrackOutcome::Completed | TrackOutcome::Skipped(_))
    }

    /// Build the outcome for an error raised at `stage`, following its disposition
    pub fn from_error(stage: TrackStage, error: Error) -> Self {
        use crate::error::Disposition;
        match error.disposition() {
            Disposition::NotSong => TrackOutcome::NotSong(error.to_string()),
            Disposition::Unavailable => TrackOutcome::Unavailable(error.to_string()),
            Disposition::SkipTarget | Disposition::Error => TrackOutcome::Failed { stage, error },
        }
    }

    /// Apply this outcome to the pass counters
    pub fn tally(&self, counters: &mut Counters) {
        match self {
            TrackOutcome::Completed | TrackOutcome::Skipped(_) => counters.success += 1,
            TrackOutcome::Unavailable(_) => counters.unavailable += 1,
            TrackOutcome::NotSong(_) => counters.not_song += 1,
            TrackOutcome::Failed { .. } => counters.error += 1,
        }
    }
}

/// Final result of a batch run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of passes executed
    pub passes: u32,
    /// Counters of the last pass
    pub counters: Counters,
    /// Ledger size at the end of the run
    pub completed: usize,
}
