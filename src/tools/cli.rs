//! Implementations that drive external executables

use super::traits::{DecryptingFetcher, Muxer, StreamCopier, StreamKind, TagList, TrackSource};
use crate::error::{AcquisitionError, Error, PostProcessError, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Environment variable the fetch helper reads the media credential from
pub const CREDENTIAL_ENV: &str = "CATALOG_MEDIA_USER_TOKEN";

async fn run(binary: &Path, tool: &str, args: &[&OsStr], envs: &[(&str, &str)]) -> Result<Output> {
    debug!(tool, ?args, "running external tool");
    Command::new(binary)
        .args(args)
        .envs(envs.iter().copied())
        .output()
        .await
        .map_err(|e| Error::ExternalTool(format!("Failed to execute {}: {}", tool, e)))
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

/// Decrypting fetcher backed by a helper executable
///
/// The helper takes one of four subcommands:
/// - `track <id> <url> <dest>`
/// - `legacy <id> <dest>`
/// - `elementary <id> <video|audio> <url> <dest>`
/// - `playback <id>`, printing the manifest URL on stdout
///
/// The credential is passed in [`CREDENTIAL_ENV`]. A non-zero exit is a failure.
pub struct CliFetcher {
    binary_path: PathBuf,
}

impl CliFetcher {
    /// Create a fetcher with an explicit helper path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    async fn run_checked(
        &self,
        item_id: &str,
        args: &[&OsStr],
        credential: &str,
    ) -> Result<Output> {
        let output = run(&self.binary_path, "fetch helper", args, &[(CREDENTIAL_ENV, credential)]).await?;
        if !output.status.success() {
            return Err(AcquisitionError::FetchFailed {
                track_id: item_id.to_string(),
                reason: failure_reason(&output),
            }
            .into());
        }
        Ok(output)
    }
}

#[async_trait]
impl DecryptingFetcher for CliFetcher {
    async fn fetch_track(
        &self,
        track_id: &str,
        source: &TrackSource,
        credential: &str,
        dest: &Path,
    ) -> Result<()> {
        match source {
            TrackSource::Enhanced(url) => {
                self.run_checked(
                    track_id,
                    &[OsStr::new("track"), OsStr::new(track_id), OsStr::new(url), dest.as_os_str()],
                    credential,
                )
                .await?;
            }
            TrackSource::Legacy => {
                self.run_checked(
                    track_id,
                    &[OsStr::new("legacy"), OsStr::new(track_id), dest.as_os_str()],
                    credential,
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn fetch_elementary(
        &self,
        item_id: &str,
        url: &str,
        kind: StreamKind,
        credential: &str,
        dest: &Path,
    ) -> Result<()> {
        self.run_checked(
            item_id,
            &[
                OsStr::new("elementary"),
                OsStr::new(item_id),
                OsStr::new(kind.as_str()),
                OsStr::new(url),
                dest.as_os_str(),
            ],
            credential,
        )
        .await?;
        Ok(())
    }

    async fn playback_manifest(&self, item_id: &str, credential: &str) -> Result<String> {
        let output = self
            .run_checked(item_id, &[OsStr::new("playback"), OsStr::new(item_id)], credential)
            .await?;
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if url.is_empty() {
            return Err(AcquisitionError::NoPlayback {
                track_id: item_id.to_string(),
            }
            .into());
        }
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "cli-helper"
    }
}

/// Muxer backed by GPAC's `MP4Box`
pub struct Mp4BoxMuxer {
    binary_path: PathBuf,
}

impl Mp4BoxMuxer {
    /// Create a muxer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find MP4Box in PATH
    pub fn from_path() -> Option<Self> {
        which::which("MP4Box").ok().map(Self::new)
    }
}

#[async_trait]
impl Muxer for Mp4BoxMuxer {
    async fn apply_tags(&self, path: &Path, tags: &TagList) -> Result<()> {
        let rendered = tags.to_string();
        let output = run(
            &self.binary_path,
            "MP4Box",
            &[OsStr::new("-itags"), OsStr::new(&rendered), path.as_os_str()],
            &[],
        )
        .await?;
        if !output.status.success() {
            return Err(PostProcessError::EmbedFailed {
                path: path.to_path_buf(),
                reason: failure_reason(&output),
            }
            .into());
        }
        Ok(())
    }

    async fn remux(&self, video: &Path, audio: &Path, tags: &TagList, out: &Path) -> Result<()> {
        let rendered = tags.to_string();
        let output = run(
            &self.binary_path,
            "MP4Box",
            &[
                OsStr::new("-itags"),
                OsStr::new(&rendered),
                OsStr::new("-quiet"),
                OsStr::new("-add"),
                video.as_os_str(),
                OsStr::new("-add"),
                audio.as_os_str(),
                OsStr::new("-keep-utc"),
                OsStr::new("-new"),
                out.as_os_str(),
            ],
            &[],
        )
        .await?;
        if !output.status.success() {
            return Err(PostProcessError::RemuxFailed {
                path: out.to_path_buf(),
                reason: failure_reason(&output),
            }
            .into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mp4box"
    }
}

/// Stream copier backed by `ffmpeg`
pub struct FfmpegCopier {
    binary_path: PathBuf,
}

impl FfmpegCopier {
    /// Create a copier with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    async fn run_to(&self, args: &[&OsStr], dest: &Path) -> Result<()> {
        let output = run(&self.binary_path, "ffmpeg", args, &[]).await?;
        if !output.status.success() {
            return Err(PostProcessError::ArtworkFailed {
                path: dest.to_path_buf(),
                reason: failure_reason(&output),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl StreamCopier for FfmpegCopier {
    async fn copy(&self, url: &str, dest: &Path) -> Result<()> {
        self.run_to(
            &[
                OsStr::new("-loglevel"),
                OsStr::new("quiet"),
                OsStr::new("-y"),
                OsStr::new("-i"),
                OsStr::new(url),
                OsStr::new("-c"),
                OsStr::new("copy"),
                dest.as_os_str(),
            ],
            dest,
        )
        .await
    }

    async fn to_gif(&self, src: &Path, dest: &Path) -> Result<()> {
        self.run_to(
            &[
                OsStr::new("-loglevel"),
                OsStr::new("quiet"),
                OsStr::new("-y"),
                OsStr::new("-i"),
                src.as_os_str(),
                OsStr::new("-vf"),
                OsStr::new("scale=440:-1"),
                OsStr::new("-r"),
                OsStr::new("24"),
                OsStr::new("-f"),
                OsStr::new("gif"),
                dest.as_os_str(),
            ],
            dest,
        )
        .await
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Locate the `mp4decrypt` binary from an explicit path or PATH
pub fn find_decrypter(configured: Option<&Path>, search_path: bool) -> Option<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(_) => None,
        None if search_path => which::which("mp4decrypt").ok(),
        None => None,
    }
}
