//! The song a round is played against.
//!
//! A [`TrackRecord`] is produced by whatever catalog the host talks to and
//! is never modified once a round starts. Every field may be missing:
//! absent metadata becomes an empty string, an empty list or `None`, and
//! the corresponding hint is simply empty.

use std::fmt;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::decoder::Codec;

/// Characters that start an annotation after the actual title, as in
/// "Title (feat. Someone)" or "Title - Remix".
const ANNOTATION_DELIMITERS: [char; 2] = ['(', '-'];

/// Strips annotations from a track title.
///
/// Truncates at the first `(` or `-` and trims whitespace. Titles without
/// either character are returned unchanged. A title that starts with a
/// delimiter cleans to the empty string.
#[must_use]
pub fn clean_title(title: &str) -> &str {
    match title.find(ANNOTATION_DELIMITERS) {
        Some(index) => title[..index].trim(),
        None => title,
    }
}

/// Joins artist credits for display: "A", "A and B", "A, B, and C".
#[must_use]
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let mut joined = String::new();
            for name in init {
                joined.push_str(name.as_ref());
                joined.push_str(", ");
            }
            joined.push_str("and ");
            joined.push_str(last.as_ref());
            joined
        }
    }
}

/// Immutable metadata of a round's target song.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "TrackInfo")]
pub struct TrackRecord {
    display_name: String,
    artist: String,
    album: String,
    release_date: String,
    genres: Vec<String>,
    album_art: Option<Url>,
    preview: Option<Url>,
}

impl TrackRecord {
    /// Creates a record from a raw provider title, which is cleaned.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            display_name: clean_title(title).to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Sets the artist from a list of credits, see [`join_names`].
    #[must_use]
    pub fn with_artists<S: AsRef<str>>(mut self, artists: &[S]) -> Self {
        self.artist = join_names(artists);
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    #[must_use]
    pub fn with_release_date(mut self, release_date: impl Into<String>) -> Self {
        self.release_date = release_date.into();
        self
    }

    #[must_use]
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_album_art(mut self, url: Url) -> Self {
        self.album_art = Some(url);
        self
    }

    #[must_use]
    pub fn with_preview(mut self, url: Url) -> Self {
        self.preview = Some(url);
        self
    }

    /// The cleaned title guesses are matched against.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn artist(&self) -> &str {
        &self.artist
    }

    #[must_use]
    pub fn album(&self) -> &str {
        &self.album
    }

    /// Release date with whatever granularity the provider offers, for
    /// example "1965", "1965-08" or "1965-08-06".
    #[must_use]
    pub fn release_date(&self) -> &str {
        &self.release_date
    }

    #[must_use]
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    #[must_use]
    pub fn album_art(&self) -> Option<&Url> {
        self.album_art.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Url> {
        self.preview.as_ref()
    }

    /// The preview's codec as far as its URL's extension tells.
    #[must_use]
    pub fn preview_codec(&self) -> Option<Codec> {
        let url = self.preview.as_ref()?;
        let (_, extension) = url.path_segments()?.next_back()?.rsplit_once('.')?;
        Codec::from_extension(extension)
    }
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.artist.is_empty() {
            write!(f, "\"{}\"", self.display_name)
        } else {
            write!(f, "\"{} - {}\"", self.artist, self.display_name)
        }
    }
}

/// Track information as served by the catalog, with provider field names.
///
/// Providers send `null` as readily as they omit a key, so every field is
/// optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackInfo {
    #[serde(alias = "name", alias = "title")]
    track_name: Option<String>,
    #[serde(alias = "artist")]
    artist_name: Option<String>,
    artists: Option<Vec<String>>,
    #[serde(alias = "album")]
    album_name: Option<String>,
    release_date: Option<String>,
    #[serde(alias = "genres")]
    genre: Option<Vec<String>>,
    #[serde(alias = "album_art", deserialize_with = "lenient_url")]
    album_image_url: Option<Url>,
    #[serde(alias = "preview", alias = "preview_url", deserialize_with = "lenient_url")]
    clip: Option<Url>,
}

impl From<TrackInfo> for TrackRecord {
    fn from(info: TrackInfo) -> Self {
        let artist = match info.artist_name {
            Some(artist) if !artist.is_empty() => artist,
            _ => join_names(&info.artists.unwrap_or_default()),
        };

        Self {
            display_name: clean_title(info.track_name.as_deref().unwrap_or_default()).to_owned(),
            artist,
            album: info.album_name.unwrap_or_default(),
            release_date: info.release_date.unwrap_or_default(),
            genres: info.genre.unwrap_or_default(),
            album_art: info.album_image_url,
            preview: info.clip,
        }
    }
}

/// Parses an optional URL, treating null, empty and malformed values as
/// absent.
fn lenient_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match Url::parse(&value) {
        Ok(url) => Some(url),
        Err(e) => {
            if !value.is_empty() {
                debug!("ignoring malformed url \"{value}\": {e}");
            }
            None
        }
    }))
}
