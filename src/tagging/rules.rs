//! Which catalog fields end up in which tag

use super::{Advisory, TrackTags};
use crate::catalog::{CatalogEntity, EntityKind, MusicVideoInfo, Track};
use crate::config::DownloadConfig;
use crate::tools::TagList;
use std::path::Path;

/// Everything needed to tag one track of an entity
#[derive(Clone, Copy, Debug)]
pub struct TagContext<'a> {
    /// The album or playlist being acquired
    pub entity: &'a CatalogEntity,
    /// The track being tagged
    pub track: &'a Track,
    /// Layout settings (playlist artist, song-info inheritance)
    pub download: &'a DownloadConfig,
    /// Lyrics to embed, if any
    pub lyrics: Option<&'a str>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn track_total(entity: &CatalogEntity) -> u32 {
    let listed = entity.tracks.len();
    let total = match entity.kind {
        EntityKind::Album if entity.attributes.track_count > 0 => entity.attributes.track_count,
        _ => listed,
    };
    u32::try_from(total).unwrap_or(u32::MAX)
}

fn ordinal(track: &Track) -> u32 {
    u32::try_from(track.ordinal).unwrap_or(u32::MAX)
}

/// Structured tags for a finished audio track
///
/// Playlist tracks are numbered by their playlist position unless
/// `use_song_info_for_playlist` is set, in which case disc/track numbers and
/// album identity come from the track's own album.
pub fn track_tags(ctx: &TagContext<'_>) -> TrackTags {
    let TagContext {
        entity,
        track,
        download,
        lyrics,
    } = *ctx;
    let attrs = &entity.attributes;
    let total = track_total(entity);

    let (disc, number, album, album_artist) = match entity.kind {
        EntityKind::Playlist if !download.use_song_info_for_playlist => (
            (1, 1),
            (ordinal(track), total),
            attrs.name.clone(),
            download.playlist_artist_name.clone(),
        ),
        EntityKind::Playlist => (
            (track.disc_number, entity.disc_total()),
            (track.track_number, total),
            track.album_name.clone(),
            track
                .album
                .as_ref()
                .map(|a| a.artist_name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| track.artist_name.clone()),
        ),
        EntityKind::Album => (
            (track.disc_number, entity.disc_total()),
            (track.track_number, total),
            non_empty(&track.album_name).unwrap_or_else(|| attrs.name.clone()),
            attrs.artist_name.clone(),
        ),
    };

    let date = non_empty(&attrs.release_date).or_else(|| non_empty(&track.release_date));

    let mut tags = TrackTags {
        title: Some(track.name.clone()),
        artist: Some(track.artist_name.clone()),
        album: Some(album),
        album_artist: Some(album_artist),
        composer: non_empty(&track.composer),
        date,
        genre: track.genres.first().cloned(),
        copyright: non_empty(&attrs.copyright),
        publisher: non_empty(&attrs.record_label),
        lyrics: lyrics.and_then(non_empty),
        disc: Some(disc),
        track: Some(number),
        advisory: Some(Advisory::from_rating(track.content_rating.as_deref())),
        custom: Vec::new(),
    };

    tags.push_custom("PERFORMER", &track.artist_name);
    tags.push_custom("RELEASETIME", &track.release_date);
    tags.push_custom("ISRC", &track.isrc);
    tags.push_custom("LABEL", &attrs.record_label);
    tags.push_custom("UPC", &attrs.upc);
    if let Some(album) = &track.album {
        tags.push_custom("ALBUM_URL", &album.url);
    }
    if let Some(artist_id) = &track.artist_id {
        tags.push_custom(
            "ARTIST_URL",
            &format!("https://music.apple.com/{}/artist/{}", entity.storefront, artist_id),
        );
    }
    tags
}

/// Descriptive tags applied through the muxer right after acquisition
pub fn album_mux_tags(entity: &CatalogEntity, cover: Option<&Path>) -> TagList {
    let mut tags = TagList::new();
    tags.push("tool", "")
        .push("artist", entity.attributes.artist_name.clone());
    if let Some(cover) = cover {
        tags.push("cover", cover.display().to_string());
    }
    tags
}

/// Where a music video sits, when it is part of an entity
#[derive(Clone, Copy, Debug)]
pub struct Placement<'a> {
    /// The album or playlist
    pub entity: &'a CatalogEntity,
    /// The video's row in that entity
    pub track: &'a Track,
}

/// Muxer tags for a remuxed music video
pub fn music_video_mux_tags(
    video: &MusicVideoInfo,
    placement: Option<Placement<'_>>,
    download: &DownloadConfig,
    thumbnail: Option<&Path>,
) -> TagList {
    let rating = match video.content_rating.as_deref() {
        Some("explicit") => "1",
        Some("clean") => "2",
        _ => "0",
    };

    let mut tags = TagList::new();
    tags.push("tool", "")
        .push("artist", video.artist_name.clone())
        .push("title", video.name.clone())
        .push("genre", video.genres.first().cloned().unwrap_or_default())
        .push("created", video.release_date.clone())
        .push("ISRC", video.isrc.clone())
        .push("rating", rating);

    match placement {
        Some(Placement { entity, track })
            if entity.kind == EntityKind::Playlist && !download.use_song_info_for_playlist =>
        {
            tags.push("disk", "1/1")
                .push("album", entity.attributes.name.clone())
                .push("track", video.name.clone())
                .push("tracknum", format!("{}/{}", track.ordinal, track_total(entity)))
                .push("album_artist", download.playlist_artist_name.clone())
                .push("performer", video.artist_name.clone())
                .push("copyright", entity.attributes.copyright.clone())
                .push("UPC", entity.attributes.upc.clone());
        }
        Some(Placement { entity, track }) => {
            tags.push("album", non_empty(&track.album_name).unwrap_or_else(|| entity.attributes.name.clone()))
                .push("disk", format!("{}/{}", track.disc_number, entity.disc_total()))
                .push("track", video.name.clone())
                .push("tracknum", format!("{}/{}", track.track_number, track_total(entity)))
                .push("album_artist", entity.attributes.artist_name.clone())
                .push("performer", video.artist_name.clone())
                .push("copyright", entity.attributes.copyright.clone())
                .push("UPC", entity.attributes.upc.clone());
        }
        None => {
            tags.push("album", video.album_name.clone())
                .push("disk", video.disc_number.to_string())
                .push("track", video.name.clone())
                .push("tracknum", video.track_number.to_string())
                .push("performer", video.artist_name.clone());
        }
    }

    if let Some(thumbnail) = thumbnail {
        tags.push("cover", thumbnail.display().to_string());
    }
    tags
}

/// The custom tag identifying a remuxed music video
pub fn music_video_id_tags(video_id: &str) -> TrackTags {
    let mut tags = TrackTags::default();
    tags.push_custom("MV_ID", video_id);
    tags
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AlbumRef, EntityAttributes, TrackKind};

    fn track(ordinal: usize, disc: u32, number: u32) -> Track {
        Track {
            id: format!("10{ordinal}"),
            ordinal,
            kind: TrackKind::Song,
            name: format!("Song {ordinal}"),
            artist_name: "Track Artist".into(),
            album_name: "Own Album".into(),
            disc_number: disc,
            track_number: number,
            audio_traits: vec!["lossless".into()],
            content_rating: Some("explicit".into()),
            composer: "Writer".into(),
            genres: vec!["Jazz".into(), "Music".into()],
            isrc: "USABC0000001".into(),
            release_date: "2001-02-03".into(),
            artwork_url: None,
            is_mastered: false,
            album: Some(AlbumRef {
                id: "900".into(),
                artist_name: "Own Album Artist".into(),
                url: "https://music.apple.com/us/album/own/900".into(),
            }),
            artist_id: Some("55".into()),
        }
    }

    fn entity(kind: EntityKind, tracks: Vec<Track>) -> CatalogEntity {
        CatalogEntity {
            id: if kind == EntityKind::Playlist { "pl.abc".into() } else { "1".into() },
            storefront: "us".into(),
            kind,
            attributes: EntityAttributes {
                name: "Entity Name".into(),
                artist_name: "Entity Artist".into(),
                release_date: "1999-09-09".into(),
                upc: "0000111".into(),
                copyright: "(P) Label".into(),
                record_label: "Label".into(),
                track_count: tracks.len(),
                ..Default::default()
            },
            artists: Vec::new(),
            tracks,
        }
    }

    #[test]
    fn album_tracks_use_their_own_numbers() {
        let e = entity(EntityKind::Album, vec![track(1, 1, 1), track(2, 2, 1)]);
        let download = DownloadConfig::default();
        let tags = track_tags(&TagContext {
            entity: &e,
            track: &e.tracks[1],
            download: &download,
            lyrics: Some("la la"),
        });
        assert_eq!(tags.disc, Some((2, 2)));
        assert_eq!(tags.track, Some((1, 2)));
        assert_eq!(tags.album.as_deref(), Some("Own Album"));
        assert_eq!(tags.album_artist.as_deref(), Some("Entity Artist"));
        assert_eq!(tags.date.as_deref(), Some("1999-09-09"));
        assert_eq!(tags.genre.as_deref(), Some("Jazz"));
        assert_eq!(tags.lyrics.as_deref(), Some("la la"));
        assert_eq!(tags.advisory, Some(Advisory::Explicit));
        assert_eq!(tags.custom("RELEASETIME"), Some("2001-02-03"));
        assert_eq!(tags.custom("LABEL"), Some("Label"));
        assert_eq!(
            tags.custom("ARTIST_URL"),
            Some("https://music.apple.com/us/artist/55")
        );
    }

    #[test]
    fn playlist_tracks_are_numbered_by_position() {
        let e = entity(EntityKind::Playlist, vec![track(1, 3, 9), track(2, 1, 4)]);
        let download = DownloadConfig::default();
        let tags = track_tags(&TagContext {
            entity: &e,
            track: &e.tracks[1],
            download: &download,
            lyrics: None,
        });
        assert_eq!(tags.disc, Some((1, 1)));
        assert_eq!(tags.track, Some((2, 2)));
        assert_eq!(tags.album.as_deref(), Some("Entity Name"));
        assert_eq!(tags.album_artist.as_deref(), Some("Apple Music"));
        assert!(tags.lyrics.is_none());
    }

    #[test]
    fn playlist_tracks_can_inherit_song_info() {
        let e = entity(EntityKind::Playlist, vec![track(1, 3, 9), track(2, 1, 4)]);
        let download = DownloadConfig {
            use_song_info_for_playlist: true,
            ..Default::default()
        };
        let tags = track_tags(&TagContext {
            entity: &e,
            track: &e.tracks[0],
            download: &download,
            lyrics: None,
        });
        assert_eq!(tags.disc, Some((3, 1)));
        assert_eq!(tags.track, Some((9, 2)));
        assert_eq!(tags.album.as_deref(), Some("Own Album"));
        assert_eq!(tags.album_artist.as_deref(), Some("Own Album Artist"));
    }

    #[test]
    fn album_mux_tags_carry_cover() {
        let e = entity(EntityKind::Album, vec![]);
        let tags = album_mux_tags(&e, Some(Path::new("/x/cover.jpg")));
        assert_eq!(tags.to_string(), "tool=:artist=Entity Artist:cover=/x/cover.jpg");
        assert_eq!(album_mux_tags(&e, None).to_string(), "tool=:artist=Entity Artist");
    }

    #[test]
    fn music_video_tags_follow_placement() {
        let video = MusicVideoInfo {
            id: "77".into(),
            name: "Clip".into(),
            artist_name: "Band".into(),
            album_name: "Clips".into(),
            genres: vec!["Pop".into()],
            release_date: "2020-01-01".into(),
            isrc: "X1".into(),
            content_rating: Some("clean".into()),
            disc_number: 1,
            track_number: 3,
            artwork_url: None,
        };
        let download = DownloadConfig::default();

        let standalone = music_video_mux_tags(&video, None, &download, Some(Path::new("t.jpg")));
        assert_eq!(standalone.get("rating"), Some("2"));
        assert_eq!(standalone.get("tracknum"), Some("3"));
        assert_eq!(standalone.get("cover"), Some("t.jpg"));
        assert!(standalone.get("album_artist").is_none());

        let e = entity(EntityKind::Playlist, vec![track(1, 1, 1), track(2, 1, 2)]);
        let placed = music_video_mux_tags(
            &video,
            Some(Placement {
                entity: &e,
                track: &e.tracks[1],
            }),
            &download,
            None,
        );
        assert_eq!(placed.get("disk"), Some("1/1"));
        assert_eq!(placed.get("tracknum"), Some("2/2"));
        assert_eq!(placed.get("album_artist"), Some("Apple Music"));
        assert_eq!(music_video_id_tags("77").custom("MV_ID"), Some("77"));
    }
}
