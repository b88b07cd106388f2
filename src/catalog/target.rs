//! Input URL recognition
//!
//! Five URL shapes are accepted on `music.apple.com` and `beta.music.apple.com`:
//! album, song, playlist, artist and music video. Anything else is rejected
//! before a single request is made.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Builds the shared pattern for one URL kind; `id` is the id sub-pattern
fn pattern(kind: &str, id: &str) -> String {
    format!(
        r"^https://(?:beta\.music|music)\.apple\.com/(\w{{2}})(?:/{kind}|/{kind}/.+)/(?:id)?({id})(?:$|\?)"
    )
}

macro_rules! url_regex {
    ($name:ident, $kind:literal, $id:literal) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(&pattern($kind, $id)).expect("static regex is valid"));
    };
}

url_regex!(ALBUM_URL, "album", r"\d+");
url_regex!(SONG_URL, "song", r"\d+");
url_regex!(PLAYLIST_URL, "playlist", r"pl\.[\w-]+");
url_regex!(ARTIST_URL, "artist", r"\d+");
url_regex!(MUSIC_VIDEO_URL, "music-video", r"\d+");

/// A recognized catalog reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Album, optionally pointing at one track through the `i` query parameter
    Album {
        /// Two-letter storefront
        storefront: String,
        /// Album id
        id: String,
        /// Track id from the `i` query parameter
        track_hint: Option<String>,
    },
    /// Playlist (`pl.` id)
    Playlist {
        /// Two-letter storefront
        storefront: String,
        /// Playlist id
        id: String,
    },
    /// Single song; resolved to its album before acquisition
    Song {
        /// Two-letter storefront
        storefront: String,
        /// Song id
        id: String,
    },
    /// Artist; expands into albums and music videos
    Artist {
        /// Two-letter storefront
        storefront: String,
        /// Artist id
        id: String,
    },
    /// Standalone music video
    MusicVideo {
        /// Two-letter storefront
        storefront: String,
        /// Video id
        id: String,
    },
}

impl Target {
    /// Recognize a catalog URL
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_dl::catalog::Target;
    ///
    /// let target = Target::parse("https://music.apple.com/us/album/abbey-road/1441164426?i=1441164430").unwrap();
    /// assert_eq!(target.storefront(), "us");
    /// assert_eq!(target.id(), "1441164426");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some((sf, id)) = captures(&ALBUM_URL, raw) {
            return Ok(Target::Album {
                storefront: sf,
                id,
                track_hint: query_param(raw, "i"),
            });
        }
        if let Some((storefront, id)) = captures(&PLAYLIST_URL, raw) {
            return Ok(Target::Playlist { storefront, id });
        }
        if let Some((storefront, id)) = captures(&SONG_URL, raw) {
            return Ok(Target::Song { storefront, id });
        }
        if let Some((storefront, id)) = captures(&ARTIST_URL, raw) {
            return Ok(Target::Artist { storefront, id });
        }
        if let Some((storefront, id)) = captures(&MUSIC_VIDEO_URL, raw) {
            return Ok(Target::MusicVideo { storefront, id });
        }
        Err(Error::Input(raw.to_string()))
    }

    /// Album reference for a song, pointing at the song via `track_hint`
    pub fn album_for_song(storefront: &str, album_id: &str, song_id: &str) -> Self {
        Target::Album {
            storefront: storefront.to_string(),
            id: album_id.to_string(),
            track_hint: Some(song_id.to_string()),
        }
    }

    /// Two-letter storefront
    pub fn storefront(&self) -> &str {
        match self {
            Target::Album { storefront, .. }
            | Target::Playlist { storefront, .. }
            | Target::Song { storefront, .. }
            | Target::Artist { storefront, .. }
            | Target::MusicVideo { storefront, .. } => storefront,
        }
    }

    /// Catalog id
    pub fn id(&self) -> &str {
        match self {
            Target::Album { id, .. }
            | Target::Playlist { id, .. }
            | Target::Song { id, .. }
            | Target::Artist { id, .. }
            | Target::MusicVideo { id, .. } => id,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Target::Album { .. } => "album",
            Target::Playlist { .. } => "playlist",
            Target::Song { .. } => "song",
            Target::Artist { .. } => "artist",
            Target::MusicVideo { .. } => "music-video",
        };
        write!(f, "{kind} {}/{}", self.storefront(), self.id())
    }
}

fn captures(re: &Regex, raw: &str) -> Option<(String, String)> {
    let caps = re.captures(raw)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

fn query_param(raw: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_with_and_without_slug() {
        let t = Target::parse("https://music.apple.com/us/album/folklore/1528112358").unwrap();
        assert_eq!(
            t,
            Target::Album {
                storefront: "us".into(),
                id: "1528112358".into(),
                track_hint: None
            }
        );

        let t = Target::parse("https://beta.music.apple.com/jp/album/id1528112358").unwrap();
        assert_eq!(t.storefront(), "jp");
        assert_eq!(t.id(), "1528112358");
    }

    #[test]
    fn album_track_hint_from_query() {
        let t = Target::parse("https://music.apple.com/gb/album/x/1528112358?i=1528112361").unwrap();
        match t {
            Target::Album { track_hint, .. } => assert_eq!(track_hint.as_deref(), Some("1528112361")),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn playlist_song_artist_and_video() {
        let t = Target::parse("https://music.apple.com/us/playlist/todays-hits/pl.f4d106fed2bd41149aaacabb233eb5eb").unwrap();
        assert!(matches!(t, Target::Playlist { ref id, .. } if id == "pl.f4d106fed2bd41149aaacabb233eb5eb"));

        let t = Target::parse("https://music.apple.com/us/song/cardigan/1528112361").unwrap();
        assert!(matches!(t, Target::Song { .. }));

        let t = Target::parse("https://music.apple.com/us/artist/taylor-swift/159260351").unwrap();
        assert!(matches!(t, Target::Artist { .. }));

        let t = Target::parse("https://music.apple.com/us/music-video/willow/1545187339").unwrap();
        assert!(matches!(t, Target::MusicVideo { .. }));
        assert_eq!(t.to_string(), "music-video us/1545187339");
    }

    #[test]
    fn malformed_urls_are_input_errors() {
        for raw in [
            "https://example.com/us/album/x/123",
            "https://music.apple.com/usa/album/x/123",
            "https://music.apple.com/us/album/x/abc",
            "http://music.apple.com/us/album/x/123",
            "not a url",
        ] {
            assert!(matches!(Target::parse(raw), Err(Error::Input(_))), "{raw}");
        }
    }

    #[test]
    fn song_resolves_to_album_with_hint() {
        let t = Target::album_for_song("us", "1528112358", "1528112361");
        assert!(matches!(t, Target::Album { track_hint: Some(ref h), .. } if h == "1528112361"));
    }
}
