//! Provides the `AudioFile` abstraction over preview audio handed to the
//! decoder.
//!
//! Preview clips are short (typically 30 seconds), so they arrive fully
//! buffered in memory. `AudioFile` exposes them through `Read` and `Seek`
//! and tells Symphonia the exact byte length, which lets it probe and seek
//! without guessing.
//!
//! # Examples
//!
//! ```no_run
//! use spotle::audio_file::AudioFile;
//! use std::io::Read;
//!
//! let mut audio = AudioFile::from_bytes(std::fs::read("preview.mp3")?);
//! assert!(!audio.is_empty());
//!
//! let mut buf = vec![0; 1024];
//! let n = audio.read(&mut buf)?;
//! ```

use std::io::{Cursor, Read, Seek};

use symphonia::core::io::MediaSource;

/// Combines Read and Seek traits for audio stream handling.
///
/// Thread-safety is required because Symphonia's `MediaSource` is
/// `Send + Sync`.
pub trait ReadSeek: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> ReadSeek for T {}

/// A seekable audio byte stream of known length.
pub struct AudioFile {
    inner: Box<dyn ReadSeek>,

    /// The total size of the audio in bytes, if known
    byte_len: Option<u64>,
}

impl AudioFile {
    /// Wraps a stream of `byte_len` bytes, if known.
    pub fn new<R>(reader: R, byte_len: Option<u64>) -> Self
    where
        R: ReadSeek + 'static,
    {
        Self {
            inner: Box::new(reader),
            byte_len,
        }
    }

    /// Wraps fully downloaded audio bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let byte_len = u64::try_from(bytes.len()).ok();
        Self::new(Cursor::new(bytes), byte_len)
    }

    /// Audio whose reads fail once `limit` bytes have been read, like a
    /// connection dropping halfway through a download.
    #[cfg(test)]
    pub(crate) fn failing_after(bytes: Vec<u8>, limit: u64) -> Self {
        let byte_len = u64::try_from(bytes.len()).ok();
        Self::new(
            tests::FailingReader {
                inner: Cursor::new(bytes),
                limit,
            },
            byte_len,
        )
    }

    /// Returns `true` if the audio is known to contain no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.byte_len == Some(0)
    }
}

impl Read for AudioFile {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for AudioFile {
    #[inline]
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl MediaSource for AudioFile {
    /// Preview audio is always fully available, so it is always seekable.
    #[inline]
    fn is_seekable(&self) -> bool {
        true
    }

    #[inline]
    fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }
}
