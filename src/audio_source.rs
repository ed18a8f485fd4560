//! Where preview audio for the snippet hint comes from.
//!
//! The round engine asks an [`AudioSource`] for a track's preview only when
//! the snippet hint is due. Returning empty bytes means "no preview", which
//! the engine reports as insufficient audio.

use std::{fs, path::PathBuf};

use crate::{
    error::{Error, Result},
    track::TrackRecord,
};

/// Supplies raw preview audio for a track.
pub trait AudioSource: Send + Sync {
    /// Returns the preview audio of `track`, or empty bytes if there is none.
    fn fetch(&self, track: &TrackRecord) -> Result<Vec<u8>>;
}

impl<F> AudioSource for F
where
    F: Fn(&TrackRecord) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, track: &TrackRecord) -> Result<Vec<u8>> {
        self(track)
    }
}

/// Serves the same preview audio for every track.
///
/// Useful when the host already downloaded the preview before starting the
/// round.
#[derive(Clone, Debug, Default)]
pub struct MemoryAudio(Vec<u8>);

impl MemoryAudio {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AudioSource for MemoryAudio {
    fn fetch(&self, _track: &TrackRecord) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Reads previews referenced by `file://` URLs from local disk.
///
/// Tracks without a preview yield empty bytes. Previews on other schemes
/// must be downloaded by the host first.
#[derive(Clone, Debug)]
pub struct FileAudio {
    max_size: u64,
}

impl FileAudio {
    /// Previews are short clips; anything bigger is not a preview.
    pub const DEFAULT_MAX_SIZE: u64 = 16 * 1024 * 1024;

    #[must_use]
    pub fn new() -> Self {
        Self {
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    fn path(track: &TrackRecord) -> Result<Option<PathBuf>> {
        let Some(url) = track.preview() else {
            return Ok(None);
        };

        if url.scheme() != "file" {
            return Err(Error::unimplemented(format!(
                "cannot read preview of track {track} from {}",
                url.scheme()
            )));
        }

        url.to_file_path()
            .map(Some)
            .map_err(|()| Error::invalid_argument(format!("{url} is not a local path")))
    }
}

impl Default for FileAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for FileAudio {
    fn fetch(&self, track: &TrackRecord) -> Result<Vec<u8>> {
        let Some(path) = Self::path(track)? else {
            debug!("track {track} has no preview");
            return Ok(Vec::new());
        };

        // Prevent out-of-memory condition on mislabeled files.
        let file_size = fs::metadata(&path)?.len();
        if file_size > self.max_size {
            return Err(Error::resource_exhausted(format!(
                "{} is too large for a preview ({file_size} bytes)",
                path.display()
            )));
        }

        trace!("reading preview of track {track} from {}", path.display());
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn memory_audio_serves_same_bytes() {
        let source = MemoryAudio::new(vec![1, 2, 3]);
        let track = TrackRecord::new("Anything");
        assert_eq!(source.fetch(&track).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn closures_are_sources() {
        let source =
            |track: &TrackRecord| -> Result<Vec<u8>> { Ok(track.display_name().as_bytes().to_vec()) };
        assert_eq!(source.fetch(&TrackRecord::new("abc")).unwrap(), b"abc");
    }

    #[test]
    fn file_audio_reads_local_previews() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.wav");
        fs::write(&path, b"RIFF").unwrap();

        let track = TrackRecord::new("Local").with_preview(Url::from_file_path(&path).unwrap());
        assert_eq!(FileAudio::new().fetch(&track).unwrap(), b"RIFF");
    }

    #[test]
    fn file_audio_without_preview_is_empty() {
        let bytes = FileAudio::new().fetch(&TrackRecord::new("None")).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn file_audio_rejects_oversized_and_remote_previews() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.mp3");
        fs::write(&path, [0; 64]).unwrap();
        let track = TrackRecord::new("Huge").with_preview(Url::from_file_path(&path).unwrap());
        let err = FileAudio::new().with_max_size(32).fetch(&track).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceExhausted);

        let remote = TrackRecord::new("Remote")
            .with_preview(Url::parse("https://p.scdn.co/mp3-preview/x.mp3").unwrap());
        let err = FileAudio::new().fetch(&remote).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unimplemented);
    }
}
