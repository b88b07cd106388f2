//! Catalog API wire shapes and the domain types built from them

use serde::Deserialize;

/// Album or playlist
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// A released album
    Album,
    /// A curated or user playlist
    Playlist,
}

impl EntityKind {
    /// Kind implied by a catalog id (`pl.` prefix means playlist)
    pub fn from_id(id: &str) -> Self {
        if id.starts_with("pl.") {
            EntityKind::Playlist
        } else {
            EntityKind::Album
        }
    }

    /// Collection name in catalog API paths
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Album => "albums",
            EntityKind::Playlist => "playlists",
        }
    }
}

/// Kind of an item in an entity's track list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio track
    Song,
    /// Music video
    MusicVideo,
}

/// Editorial motion artwork for an album
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MotionArtwork {
    /// Square master manifest URL
    pub square: Option<String>,
    /// Tall master manifest URL
    pub tall: Option<String>,
}

/// Album or playlist attributes used for folder names and tags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityAttributes {
    /// Album or playlist title
    pub name: String,
    /// Album artist (playlists carry the curator)
    pub artist_name: String,
    /// Release date as `YYYY-MM-DD` (may be empty for playlists)
    pub release_date: String,
    /// "explicit", "clean" or None
    pub content_rating: Option<String>,
    /// Universal product code
    pub upc: String,
    /// Copyright line
    pub copyright: String,
    /// Record label
    pub record_label: String,
    /// Track count as reported by the catalog (may exceed the listed tracks)
    pub track_count: usize,
    /// Mastered-for-iTunes or digital master flag
    pub is_mastered: bool,
    /// Artwork URL template with `{w}x{h}`
    pub artwork_url: Option<String>,
    /// Editorial motion artwork
    pub motion: MotionArtwork,
}

/// Minimal artist reference
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistRef {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Artist picture URL template
    pub artwork_url: Option<String>,
}

/// A track's own album
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlbumRef {
    /// Catalog id
    pub id: String,
    /// Album artist
    pub artist_name: String,
    /// Web URL of the album
    pub url: String,
}

/// One item of an entity's track list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    /// Catalog id
    pub id: String,
    /// 1-based position in the entity
    pub ordinal: usize,
    /// Song or music video
    pub kind: TrackKind,
    /// Title
    pub name: String,
    /// Track artist
    pub artist_name: String,
    /// Name of the track's own album
    pub album_name: String,
    /// Disc number on its own album
    pub disc_number: u32,
    /// Track number on its own album
    pub track_number: u32,
    /// Codec traits such as "lossless", "hi-res-lossless", "atmos"
    pub audio_traits: Vec<String>,
    /// "explicit", "clean" or None
    pub content_rating: Option<String>,
    /// Composer credit
    pub composer: String,
    /// Genres, most specific first
    pub genres: Vec<String>,
    /// International standard recording code
    pub isrc: String,
    /// Release date as `YYYY-MM-DD`
    pub release_date: String,
    /// Per-track artwork URL template
    pub artwork_url: Option<String>,
    /// Digital master flag
    pub is_mastered: bool,
    /// The track's own album
    pub album: Option<AlbumRef>,
    /// The track's primary artist id
    pub artist_id: Option<String>,
}

/// An album or playlist with its ordered track list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntity {
    /// Catalog id (`pl.` prefix for playlists)
    pub id: String,
    /// Two-letter storefront the entity was fetched from
    pub storefront: String,
    /// Album or playlist
    pub kind: EntityKind,
    /// Descriptive attributes
    pub attributes: EntityAttributes,
    /// Credited artists
    pub artists: Vec<ArtistRef>,
    /// All tracks, every page flattened, in catalog order
    pub tracks: Vec<Track>,
}

impl CatalogEntity {
    /// Highest disc number among the tracks (the last track's disc)
    pub fn disc_total(&self) -> u32 {
        self.tracks.last().map(|t| t.disc_number).unwrap_or(1)
    }

    /// Primary artist, if the catalog returned one
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }
}

/// Catalog entry for a single song, as used to locate its delivery
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongInfo {
    /// Catalog id
    pub id: String,
    /// Enhanced (adaptive) master manifest URL; absent for legacy-only songs
    pub enhanced_hls: Option<String>,
    /// Id of the song's own album
    pub album_id: Option<String>,
    /// Disc number on its own album
    pub disc_number: u32,
    /// Track number on its own album
    pub track_number: u32,
    /// Name of its own album
    pub album_name: String,
    /// Artist of its own album
    pub album_artist_name: String,
}

/// Catalog entry for a music video
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MusicVideoInfo {
    /// Catalog id
    pub id: String,
    /// Title
    pub name: String,
    /// Artist
    pub artist_name: String,
    /// Album the video belongs to, if any
    pub album_name: String,
    /// Genres
    pub genres: Vec<String>,
    /// Release date as `YYYY-MM-DD`
    pub release_date: String,
    /// International standard recording code
    pub isrc: String,
    /// "explicit", "clean" or None
    pub content_rating: Option<String>,
    /// Disc number
    pub disc_number: u32,
    /// Track number
    pub track_number: u32,
    /// Thumbnail URL template
    pub artwork_url: Option<String>,
}

/// One row of an artist's discography or video list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistItem {
    /// Catalog id
    pub id: String,
    /// Title
    pub name: String,
    /// Release date as `YYYY-MM-DD`
    pub release_date: String,
    /// Web URL, fed back into the batch as a target
    pub url: String,
}

/// Which part of an artist to list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtistRelationship {
    /// Albums, singles and EPs
    Albums,
    /// Music videos
    MusicVideos,
}

impl ArtistRelationship {
    /// Path segment under `artists/{id}/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            ArtistRelationship::Albums => "albums",
            ArtistRelationship::MusicVideos => "music-videos",
        }
    }
}

// Wire shapes. Every field is optional on the wire, so everything defaults.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawDocument {
    pub data: Vec<RawResource>,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: RawAttributes,
    pub relationships: RawRelationships,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRelationships {
    pub tracks: Option<RawDocument>,
    pub artists: Option<RawDocument>,
    pub albums: Option<RawDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawArtwork {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawVideo {
    pub video: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawEditorialVideo {
    pub motion_detail_square: Option<RawVideo>,
    pub motion_detail_tall: Option<RawVideo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawAssetUrls {
    pub enhanced_hls: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawAttributes {
    pub name: String,
    pub artist_name: String,
    pub album_name: String,
    pub release_date: String,
    pub content_rating: Option<String>,
    pub upc: String,
    pub copyright: String,
    pub record_label: String,
    pub track_count: usize,
    pub is_mastered_for_itunes: bool,
    pub is_apple_digital_master: bool,
    pub artwork: Option<RawArtwork>,
    pub editorial_video: Option<RawEditorialVideo>,
    pub disc_number: u32,
    pub track_number: u32,
    pub audio_traits: Vec<String>,
    pub composer_name: String,
    pub genre_names: Vec<String>,
    pub isrc: String,
    pub url: String,
    pub extended_asset_urls: Option<RawAssetUrls>,
    pub ttml: Option<String>,
}

impl RawAttributes {
    fn artwork_url(&self) -> Option<String> {
        self.artwork
            .as_ref()
            .and_then(|a| a.url.clone())
            .filter(|u| !u.is_empty())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl RawResource {
    fn related(&self, pick: fn(&RawRelationships) -> &Option<RawDocument>) -> &[RawResource] {
        pick(&self.relationships)
            .as_ref()
            .map(|doc| doc.data.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn into_artist_ref(self) -> ArtistRef {
        let artwork_url = self.attributes.artwork_url();
        ArtistRef {
            id: self.id,
            name: self.attributes.name,
            artwork_url,
        }
    }

    pub(crate) fn into_track(self, ordinal: usize) -> Track {
        let album = self.related(|r| &r.albums).first().map(|a| AlbumRef {
            id: a.id.clone(),
            artist_name: a.attributes.artist_name.clone(),
            url: a.attributes.url.clone(),
        });
        let artist_id = self.related(|r| &r.artists).first().map(|a| a.id.clone());
        let kind = if self.kind == "music-videos" {
            TrackKind::MusicVideo
        } else {
            TrackKind::Song
        };
        let artwork_url = self.attributes.artwork_url();
        let attrs = self.attributes;
        Track {
            id: self.id,
            ordinal,
            kind,
            name: attrs.name,
            artist_name: attrs.artist_name,
            album_name: attrs.album_name,
            disc_number: attrs.disc_number,
            track_number: attrs.track_number,
            audio_traits: attrs.audio_traits,
            content_rating: non_empty(attrs.content_rating),
            composer: attrs.composer_name,
            genres: attrs.genre_names,
            isrc: attrs.isrc,
            release_date: attrs.release_date,
            artwork_url,
            is_mastered: attrs.is_apple_digital_master,
            album,
            artist_id,
        }
    }

    /// Build an entity. `extra_tracks` are pages fetched after the first one.
    pub(crate) fn into_entity(
        mut self,
        storefront: &str,
        extra_tracks: Vec<RawResource>,
    ) -> CatalogEntity {
        let kind = EntityKind::from_id(&self.id);
        let mut raw_tracks = self
            .relationships
            .tracks
            .take()
            .map(|doc| doc.data)
            .unwrap_or_default();
        raw_tracks.extend(extra_tracks);
        let tracks = raw_tracks
            .into_iter()
            .enumerate()
            .map(|(i, raw)| raw.into_track(i + 1))
            .collect();
        let artists = self
            .relationships
            .artists
            .take()
            .map(|doc| doc.data.into_iter().map(RawResource::into_artist_ref).collect())
            .unwrap_or_default();

        let artwork_url = self.attributes.artwork_url();
        let attrs = self.attributes;
        let motion = attrs
            .editorial_video
            .map(|ev| MotionArtwork {
                square: non_empty(ev.motion_detail_square.and_then(|v| v.video)),
                tall: non_empty(ev.motion_detail_tall.and_then(|v| v.video)),
            })
            .unwrap_or_default();

        CatalogEntity {
            id: self.id,
            storefront: storefront.to_string(),
            kind,
            attributes: EntityAttributes {
                name: attrs.name,
                artist_name: attrs.artist_name,
                release_date: attrs.release_date,
                content_rating: non_empty(attrs.content_rating),
                upc: attrs.upc,
                copyright: attrs.copyright,
                record_label: attrs.record_label,
                track_count: attrs.track_count,
                is_mastered: attrs.is_apple_digital_master || attrs.is_mastered_for_itunes,
                artwork_url,
                motion,
            },
            artists,
            tracks,
        }
    }

    pub(crate) fn into_song_info(self) -> SongInfo {
        let album = self.related(|r| &r.albums).first().map(|a| {
            (a.id.clone(), a.attributes.artist_name.clone())
        });
        let attrs = self.attributes;
        let (album_id, album_artist_name) = match album {
            Some((id, artist)) => (Some(id), artist),
            None => (None, String::new()),
        };
        SongInfo {
            id: self.id,
            enhanced_hls: non_empty(attrs.extended_asset_urls.and_then(|u| u.enhanced_hls)),
            album_id,
            disc_number: attrs.disc_number,
            track_number: attrs.track_number,
            album_name: attrs.album_name,
            album_artist_name,
        }
    }

    pub(crate) fn into_music_video(self) -> MusicVideoInfo {
        let artwork_url = self.attributes.artwork_url();
        let attrs = self.attributes;
        MusicVideoInfo {
            id: self.id,
            name: attrs.name,
            artist_name: attrs.artist_name,
            album_name: attrs.album_name,
            genres: attrs.genre_names,
            release_date: attrs.release_date,
            isrc: attrs.isrc,
            content_rating: non_empty(attrs.content_rating),
            disc_number: attrs.disc_number,
            track_number: attrs.track_number,
            artwork_url,
        }
    }

    pub(crate) fn into_artist_item(self) -> ArtistItem {
        ArtistItem {
            id: self.id,
            name: self.attributes.name,
            release_date: self.attributes.release_date,
            url: self.attributes.url,
        }
    }
}
