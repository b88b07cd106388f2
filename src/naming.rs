//! File and folder name templates
//!
//! Templates are plain strings with `{Name}` placeholders. [`render`] is pure:
//! it substitutes every known placeholder present in the [`FieldMap`] and
//! leaves anything else (unknown names, unset fields, stray braces) as written.
//!
//! Every rendered name is sanitized and held to [`MAX_NAME_LEN`] bytes, falling
//! back to id-based names when the descriptive one is too long.

use crate::utils::{limit_chars, sanitize_component};
use std::collections::HashMap;
use std::fmt;

/// Maximum length in bytes of a rendered file or folder name
pub const MAX_NAME_LEN: usize = 100;

/// Every placeholder a template may use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Track catalog id
    SongId,
    /// Zero-padded ordinal in the entity
    SongNumber,
    /// Track title
    SongName,
    /// Disc number
    DiscNumber,
    /// Track number on its disc
    TrackNumber,
    /// Delivery quality, e.g. "24B-96.0kHz"
    Quality,
    /// Edition tag (mastered/explicit/clean labels)
    Tag,
    /// Codec label
    Codec,
    /// Artist name
    ArtistName,
    /// Artist catalog id
    ArtistId,
    /// Artist name as given by the artist page the run started from
    UrlArtistName,
    /// Release date `YYYY-MM-DD`
    ReleaseDate,
    /// Release year
    ReleaseYear,
    /// Album title
    AlbumName,
    /// Universal product code
    Upc,
    /// Record label
    RecordLabel,
    /// Copyright line
    Copyright,
    /// Album catalog id
    AlbumId,
    /// Playlist title
    PlaylistName,
    /// Playlist catalog id
    PlaylistId,
}

impl Placeholder {
    /// Placeholder name as written between braces
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::SongId => "SongId",
            Placeholder::SongNumber => "SongNumber",
            Placeholder::SongName => "SongName",
            Placeholder::DiscNumber => "DiscNumber",
            Placeholder::TrackNumber => "TrackNumber",
            Placeholder::Quality => "Quality",
            Placeholder::Tag => "Tag",
            Placeholder::Codec => "Codec",
            Placeholder::ArtistName => "ArtistName",
            Placeholder::ArtistId => "ArtistId",
            Placeholder::UrlArtistName => "UrlArtistName",
            Placeholder::ReleaseDate => "ReleaseDate",
            Placeholder::ReleaseYear => "ReleaseYear",
            Placeholder::AlbumName => "AlbumName",
            Placeholder::Upc => "UPC",
            Placeholder::RecordLabel => "RecordLabel",
            Placeholder::Copyright => "Copyright",
            Placeholder::AlbumId => "AlbumId",
            Placeholder::PlaylistName => "PlaylistName",
            Placeholder::PlaylistId => "PlaylistId",
        }
    }

    /// Look up a placeholder by name; `SongNumer` is the legacy spelling of `SongNumber`
    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "SongId" => Placeholder::SongId,
            "SongNumber" | "SongNumer" => Placeholder::SongNumber,
            "SongName" => Placeholder::SongName,
            "DiscNumber" => Placeholder::DiscNumber,
            "TrackNumber" => Placeholder::TrackNumber,
            "Quality" => Placeholder::Quality,
            "Tag" => Placeholder::Tag,
            "Codec" => Placeholder::Codec,
            "ArtistName" => Placeholder::ArtistName,
            "ArtistId" => Placeholder::ArtistId,
            "UrlArtistName" => Placeholder::UrlArtistName,
            "ReleaseDate" => Placeholder::ReleaseDate,
            "ReleaseYear" => Placeholder::ReleaseYear,
            "AlbumName" => Placeholder::AlbumName,
            "UPC" => Placeholder::Upc,
            "RecordLabel" => Placeholder::RecordLabel,
            "Copyright" => Placeholder::Copyright,
            "AlbumId" => Placeholder::AlbumId,
            "PlaylistName" => Placeholder::PlaylistName,
            "PlaylistId" => Placeholder::PlaylistId,
            _ => return None,
        };
        Some(p)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

/// Values for the placeholders of one render
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMap {
    values: HashMap<Placeholder, String>,
}

impl FieldMap {
    /// Empty map; every placeholder renders literally until set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, placeholder: Placeholder, value: impl Into<String>) -> &mut Self {
        self.values.insert(placeholder, value.into());
        self
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.set(placeholder, value);
        self
    }

    /// Set a free-text value truncated to `limit` characters
    pub fn with_text(self, placeholder: Placeholder, value: &str, limit: usize) -> Self {
        self.with(placeholder, limit_chars(value, limit))
    }

    /// The value set for a placeholder
    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    /// Whether the template mentions a placeholder (either spelling)
    pub fn mentions(template: &str, placeholder: Placeholder) -> bool {
        template.contains(&placeholder.to_string())
            || (placeholder == Placeholder::SongNumber && template.contains("{SongNumer}"))
    }
}

/// Substitute the placeholders of `template`
///
/// # Examples
///
/// ```
/// use catalog_dl::naming::{render, FieldMap, Placeholder};
///
/// let fields = FieldMap::new()
///     .with(Placeholder::SongNumber, "03")
///     .with(Placeholder::SongName, "Something");
/// assert_eq!(render("{SongNumer}. {SongName} {Other}", &fields), "03. Something {Other}");
/// ```
pub fn render(template: &str, fields: &FieldMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match Placeholder::from_name(name).and_then(|p| fields.get(p)) {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Edition tag: the configured labels for mastered, explicit and clean, space-joined
pub fn edition_tag(
    is_mastered: bool,
    content_rating: Option<&str>,
    master_label: &str,
    explicit_label: &str,
    clean_label: &str,
) -> String {
    let mut parts = Vec::new();
    if is_mastered {
        parts.push(master_label);
    }
    match content_rating {
        Some("explicit") => parts.push(explicit_label),
        Some("clean") => parts.push(clean_label),
        _ => {}
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

fn with_extension(stem: &str, ext: &str) -> String {
    format!("{}.{}", sanitize_component(stem), ext)
}

/// Render a track file name with its extension
///
/// Falls back to an id-only rendering (SongName replaced by the id, descriptive
/// fields cleared) and then to the bare `{id}.{ext}` so the result never
/// exceeds [`MAX_NAME_LEN`] bytes.
pub fn track_file_name(template: &str, fields: &FieldMap, id: &str, ext: &str) -> String {
    let name = with_extension(&render(template, fields), ext);
    if name.len() <= MAX_NAME_LEN {
        return name;
    }

    let fallback = fields
        .clone()
        .with(Placeholder::SongName, id)
        .with(Placeholder::ArtistName, "")
        .with(Placeholder::Quality, "")
        .with(Placeholder::Tag, "")
        .with(Placeholder::Codec, "");
    let name = with_extension(&render(template, &fallback), ext);
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    with_extension(id, ext)
}

/// Render a folder name, falling back to `fallback` when it is too long
///
/// Trailing dots and surrounding whitespace are stripped.
pub fn folder_name(template: &str, fields: &FieldMap, fallback: &str) -> String {
    let rendered = sanitize_component(&render(template, fields));
    let trimmed = rendered.trim().trim_end_matches('.').trim_end();
    if trimmed.len() <= MAX_NAME_LEN {
        trimmed.to_string()
    } else {
        sanitize_component(fallback)
    }
}
