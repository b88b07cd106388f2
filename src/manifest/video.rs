//! Video and music-video audio rendition selection

use super::{Manifest, SelectedVariant, Variant};
use crate::error::{Error, Result};
use crate::types::MvAudioType;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static URI_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)x(\d+)").expect("static regex is valid"));

#[allow(clippy::expect_used)]
static RENDITION_RANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_gr(\d+)_").expect("static regex is valid"));

/// Encoded height of a video variant
///
/// Taken from a `_<w>x<h>` URI fragment, else from the RESOLUTION attribute.
fn height(variant: &Variant) -> Option<u64> {
    URI_RESOLUTION
        .captures(&variant.uri)
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .or_else(|| variant.resolution.map(|(_, h)| h))
}

/// Highest-bandwidth video variant whose height is at most `max_height`
///
/// # Errors
/// Returns [`Error::NoMatchingVariant`] if every variant is taller or has no
/// readable height.
pub fn select_video(manifest: &Manifest, max_height: u32) -> Result<SelectedVariant> {
    let variant = manifest
        .by_bandwidth()
        .into_iter()
        .find_map(|v| {
            let h = height(v)?;
            (h <= u64::from(max_height)).then_some((v, h))
        });

    let (variant, h) = variant
        .ok_or_else(|| Error::NoMatchingVariant(format!("no video variant <= {max_height}p")))?;

    Ok(SelectedVariant {
        url: manifest.resolve(&variant.uri)?,
        quality: format!("{h}p"),
        label: variant.codec.clone(),
    })
}

/// Music-video audio rendition with the highest `_gr<n>_` rank among allowed groups
///
/// # Errors
/// Returns [`Error::NoMatchingVariant`] if no allowed group offers a rendition.
pub fn select_mv_audio(manifest: &Manifest, preference: MvAudioType) -> Result<SelectedVariant> {
    let allowed = preference.allowed_groups();
    let mut best: Option<(u32, &super::Rendition)> = None;

    for rendition in &manifest.renditions {
        if !allowed.contains(&rendition.group_id.as_str()) {
            continue;
        }
        let Some(rank) = RENDITION_RANK
            .captures(&rendition.uri)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            continue;
        };
        if best.is_none_or(|(top, _)| rank > top) {
            best = Some((rank, rendition));
        }
    }

    let (_, rendition) = best.ok_or_else(|| {
        Error::NoMatchingVariant(format!("no music video audio in {}", allowed.join(", ")))
    })?;

    Ok(SelectedVariant {
        url: manifest.resolve(&rendition.uri)?,
        quality: rendition.group_id.clone(),
        label: rendition.group_id.clone(),
    })
}
