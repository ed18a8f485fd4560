//! A pool of candidate tracks to draw round targets from.
//!
//! Hosts fill a catalog from whatever the provider returned, for example a
//! player's recently played tracks. Duplicates collapse into one entry so
//! that songs played often are not more likely to be drawn.

use std::fs;

use crate::{
    error::{Error, Result},
    track::TrackRecord,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    tracks: Vec<TrackRecord>,
}

impl Catalog {
    /// Catalog files are track metadata only, no audio.
    const MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

    /// Builds a catalog, keeping the first of any duplicate tracks.
    pub fn new<I>(tracks: I) -> Self
    where
        I: IntoIterator<Item = TrackRecord>,
    {
        let mut unique: Vec<TrackRecord> = Vec::new();
        for track in tracks {
            if unique.contains(&track) {
                trace!("skipping duplicate track {track}");
            } else {
                unique.push(track);
            }
        }
        Self { tracks: unique }
    }

    /// Parses a JSON array of tracks, or a single track object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let tracks = if value.is_array() {
            serde_json::from_value::<Vec<TrackRecord>>(value)?
        } else {
            vec![serde_json::from_value::<TrackRecord>(value)?]
        };
        Ok(Self::new(tracks))
    }

    /// Loads a catalog from a JSON file, see [`Self::from_json`].
    pub fn from_file(path: &str) -> Result<Self> {
        // Prevent out-of-memory condition on mislabeled files.
        let file_size = fs::metadata(path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!("{path} is too large")));
        }

        let catalog = Self::from_json(&fs::read_to_string(path)?)?;
        debug!("loaded {} tracks from {path}", catalog.len());
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> {
        self.tracks.iter()
    }

    /// Draws a track uniformly at random.
    ///
    /// # Errors
    ///
    /// `NotFound` when the catalog is empty.
    pub fn choose(&self, rng: &mut fastrand::Rng) -> Result<&TrackRecord> {
        if self.tracks.is_empty() {
            return Err(Error::not_found("no tracks to choose a round target from"));
        }
        let index = rng.usize(..self.tracks.len());
        Ok(&self.tracks[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn empty_catalog_has_nothing_to_choose() {
        let err = Catalog::default()
            .choose(&mut fastrand::Rng::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn duplicates_collapse() {
        let catalog = Catalog::new([
            TrackRecord::new("Yesterday").with_artist("The Beatles"),
            TrackRecord::new("Help!").with_artist("The Beatles"),
            TrackRecord::new("Yesterday").with_artist("The Beatles"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.iter().map(TrackRecord::display_name).collect::<Vec<_>>(),
            ["Yesterday", "Help!"]
        );
    }

    #[test]
    fn chooses_every_track_eventually() {
        let catalog = Catalog::new([TrackRecord::new("A"), TrackRecord::new("B")]);
        let mut rng = fastrand::Rng::with_seed(1);
        let picks: Vec<_> = (0..64)
            .map(|_| catalog.choose(&mut rng).unwrap().display_name().to_owned())
            .collect();
        assert!(picks.iter().any(|name| name == "A"));
        assert!(picks.iter().any(|name| name == "B"));
    }

    #[test]
    fn parses_array_or_single_track() {
        let catalog = Catalog::from_json(
            r#"[{"track_name": "Yesterday"}, {"track_name": "Help! (Live)"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);

        let single = Catalog::from_json(r#"{"track_name": "Something"}"#).unwrap();
        assert_eq!(single.iter().next().unwrap().display_name(), "Something");

        assert!(Catalog::from_json("42").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        fs::write(&path, r#"[{"track_name": "Yesterday"}]"#).unwrap();
        let catalog = Catalog::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
