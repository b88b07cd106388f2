//! `lofty`-backed tag writer for MP4 containers

use super::{Advisory, TagWriter, TrackTags};
use crate::error::{PostProcessError, Result};
use async_trait::async_trait;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::mp4::{AdvisoryRating, Atom, AtomData, AtomIdent, Ilst, Mp4File};
use lofty::prelude::Accessor;
use lofty::tag::TagExt;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Mean of the freeform atoms written for custom tags
const FREEFORM_MEAN: &str = "com.apple.iTunes";

/// Writes [`TrackTags`] into the `ilst` atom, keeping atoms it does not touch
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTagWriter;

fn set_text(ilst: &mut Ilst, fourcc: &[u8; 4], value: &str) {
    ilst.replace_atom(Atom::new(
        AtomIdent::Fourcc(*fourcc),
        AtomData::UTF8(value.to_string()),
    ));
}

fn set_with_sort(ilst: &mut Ilst, fourcc: &[u8; 4], sort: &[u8; 4], value: &Option<String>) {
    if let Some(value) = value {
        set_text(ilst, fourcc, value);
        set_text(ilst, sort, value);
    }
}

/// Apply every `Some` field of `tags` to `ilst`
pub(crate) fn apply(ilst: &mut Ilst, tags: &TrackTags) {
    set_with_sort(ilst, b"\xa9nam", b"sonm", &tags.title);
    set_with_sort(ilst, b"\xa9ART", b"soar", &tags.artist);
    set_with_sort(ilst, b"\xa9alb", b"soal", &tags.album);
    set_with_sort(ilst, b"aART", b"soaa", &tags.album_artist);
    set_with_sort(ilst, b"\xa9wrt", b"soco", &tags.composer);

    let plain = [
        (b"\xa9day", &tags.date),
        (b"\xa9gen", &tags.genre),
        (b"cprt", &tags.copyright),
        (b"\xa9lyr", &tags.lyrics),
    ];
    for (fourcc, value) in plain {
        if let Some(value) = value {
            set_text(ilst, fourcc, value);
        }
    }
    if let Some(publisher) = &tags.publisher {
        set_freeform(ilst, "publisher", publisher);
    }

    if let Some((disc, total)) = tags.disc {
        ilst.set_disk(disc);
        ilst.set_disk_total(total);
    }
    if let Some((track, total)) = tags.track {
        ilst.set_track(track);
        ilst.set_track_total(total);
    }

    match tags.advisory {
        Some(Advisory::Explicit) => ilst.set_advisory_rating(AdvisoryRating::Explicit),
        Some(Advisory::Clean) => ilst.set_advisory_rating(AdvisoryRating::Clean),
        Some(Advisory::None) => ilst.set_advisory_rating(AdvisoryRating::Inoffensive),
        None => {}
    }

    for (key, value) in &tags.custom {
        set_freeform(ilst, key, value);
    }
}

fn set_freeform(ilst: &mut Ilst, name: &str, value: &str) {
    ilst.replace_atom(Atom::new(
        AtomIdent::Freeform {
            mean: Cow::Borrowed(FREEFORM_MEAN),
            name: Cow::Owned(name.to_string()),
        },
        AtomData::UTF8(value.to_string()),
    ));
}

fn write_blocking(path: PathBuf, tags: TrackTags) -> Result<()> {
    let failed = |reason: String| PostProcessError::TagWriteFailed {
        path: path.clone(),
        reason,
    };

    let mut file = std::fs::File::open(&path).map_err(|e| failed(e.to_string()))?;
    let mp4 = Mp4File::read_from(&mut file, ParseOptions::new()).map_err(|e| failed(e.to_string()))?;
    drop(file);

    let mut ilst = mp4.ilst().cloned().unwrap_or_default();
    apply(&mut ilst, &tags);
    ilst.save_to_path(&path, WriteOptions::default())
        .map_err(|e| failed(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        let path = path.to_path_buf();
        let tags = tags.clone();
        let task_path = path.clone();
        tokio::task::spawn_blocking(move || write_blocking(task_path, tags))
            .await
            .map_err(|e| PostProcessError::TagWriteFailed {
                path,
                reason: format!("tag writer task failed: {e}"),
            })?
    }
}
