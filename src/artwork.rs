//! Cover art URLs and cover files
//!
//! Catalog artwork URLs are templates containing `{w}x{h}`. The configured
//! size is substituted, the extension swapped for PNG, or the URL rewritten
//! to the unscaled original upload.

use crate::catalog::CatalogApi;
use crate::config::ArtworkConfig;
use crate::error::{PostProcessError, Result};
use crate::types::CoverFormat;
use crate::utils::remove_file_if_exists;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SIZE_TOKEN: &str = "{w}x{h}";

/// File extension a cover will be saved with
///
/// For [`CoverFormat::Original`] it is the extension of the uploaded asset,
/// read from the second-to-last URL segment.
pub fn cover_extension(template: &str, format: CoverFormat) -> String {
    match format {
        CoverFormat::Jpg => "jpg".to_string(),
        CoverFormat::Png => "png".to_string(),
        CoverFormat::Original => {
            let segments: Vec<&str> = template.split('/').collect();
            segments
                .len()
                .checked_sub(2)
                .and_then(|i| segments.get(i))
                .and_then(|seg| seg.rsplit_once('.'))
                .map(|(_, ext)| ext.to_string())
                .unwrap_or_else(|| "jpg".to_string())
        }
    }
}

/// Concrete download URL for an artwork template
pub fn cover_url(template: &str, size: &str, format: CoverFormat) -> String {
    let mut url = template.to_string();
    if format == CoverFormat::Png {
        if let Some((head, tail)) = url.split_once(SIZE_TOKEN) {
            url = format!("{head}{SIZE_TOKEN}{}", tail.replacen(".jpg", ".png", 1));
        }
    }
    url = url.replacen(SIZE_TOKEN, size, 1);
    if format == CoverFormat::Original {
        url = url.replacen("is1-ssl.mzstatic.com/image/thumb", "a5.mzstatic.com/us/r1000/0", 1);
        if let Some(idx) = url.rfind('/') {
            url.truncate(idx);
        }
    }
    url
}

/// Download a cover into `{folder}/{name}.{ext}`, replacing any existing file
///
/// An original-format fetch that fails falls back to the sized JPEG.
///
/// # Errors
/// Returns [`PostProcessError::ArtworkFailed`] if nothing usable could be
/// fetched, or an I/O error if the file cannot be written.
pub async fn write_cover(
    catalog: &dyn CatalogApi,
    folder: &Path,
    name: &str,
    template: &str,
    config: &ArtworkConfig,
) -> Result<PathBuf> {
    let ext = cover_extension(template, config.cover_format);
    let path = folder.join(format!("{name}.{ext}"));
    remove_file_if_exists(&path).await?;

    let url = cover_url(template, &config.cover_size, config.cover_format);
    debug!(%url, path = %path.display(), "fetching cover");
    let bytes = match catalog.fetch_bytes(&url).await {
        Ok(bytes) => bytes,
        Err(e) if config.cover_format == CoverFormat::Original => {
            warn!(error = %e, "original cover unavailable, falling back to sized JPEG");
            let fallback = cover_url(template, &config.cover_size, CoverFormat::Jpg);
            catalog.fetch_bytes(&fallback).await.map_err(|e| artwork_failed(&path, e))?
        }
        Err(e) => return Err(artwork_failed(&path, e)),
    };

    if bytes.is_empty() {
        return Err(PostProcessError::ArtworkFailed {
            path,
            reason: "empty response body".to_string(),
        }
        .into());
    }
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

fn artwork_failed(path: &Path, e: crate::Error) -> crate::Error {
    PostProcessError::ArtworkFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
