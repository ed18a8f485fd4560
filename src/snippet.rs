//! Randomly positioned audio snippets cut from preview clips.
//!
//! A snippet is the fourth hint of a round: a short piece of the target
//! song taken from a random position, so that replaying a round does not
//! give away the same moment twice. Snippets are never cached.
//!
//! Extraction decodes the whole preview, picks a start uniformly from
//! `[0, total - clip]` milliseconds, slices the samples and re-encodes them
//! as WAV. Audio that is missing or shorter than the clip fails with
//! [`Error::insufficient_audio`] rather than a decoder error.

use std::{fmt, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{
    audio_file::AudioFile,
    decoder::{Codec, Decoder, SampleFormat},
    encoder,
    error::{Error, Result},
};

/// Default snippet length.
pub const DEFAULT_CLIP_LENGTH: Duration = Duration::from_millis(1_500);

/// An encoded audio snippet and where it was taken from.
#[derive(Clone, PartialEq, Eq)]
pub struct Snippet {
    start: Duration,
    length: Duration,
    data: Vec<u8>,
}

impl Snippet {
    /// Offset into the preview where the snippet starts.
    #[must_use]
    pub fn start(&self) -> Duration {
        self.start
    }

    #[must_use]
    pub fn length(&self) -> Duration {
        self.length
    }

    /// The encoded WAV bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type of [`Self::data`].
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        encoder::MIME_TYPE
    }

    /// Encodes the snippet as base64 for embedding in text payloads.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Encodes the snippet as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

impl fmt::Debug for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snippet")
            .field("start", &self.start)
            .field("length", &self.length)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Extracts a snippet of `clip_length` from `audio` at a random position.
///
/// `codec` narrows format probing when known. The start position is drawn
/// from `rng` with millisecond granularity.
///
/// # Errors
///
/// * `OutOfRange` (insufficient audio) when `audio` is empty or shorter
///   than `clip_length`
/// * `InvalidArgument` when `clip_length` is zero
/// * Decoder errors when non-empty `audio` cannot be decoded, including
///   failures partway through the stream
pub fn extract(
    audio: Vec<u8>,
    codec: Option<Codec>,
    clip_length: Duration,
    rng: &mut fastrand::Rng,
) -> Result<Snippet> {
    let clip_ms = u64::try_from(clip_length.as_millis())
        .map_err(|_| Error::invalid_argument("clip length is too long"))?;
    if clip_ms == 0 {
        return Err(Error::invalid_argument("clip length must be positive"));
    }

    let file = AudioFile::from_bytes(audio);
    if file.is_empty() {
        return Err(Error::insufficient_audio("no audio available"));
    }

    cut(file, codec, clip_ms, rng)
}

/// Decodes `file` whole and cuts `clip_ms` out of it.
fn cut(
    file: AudioFile,
    codec: Option<Codec>,
    clip_ms: u64,
    rng: &mut fastrand::Rng,
) -> Result<Snippet> {
    let mut decoder = Decoder::new(file, codec)?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    if channels == 0 || sample_rate == 0 {
        return Err(Error::data_loss(format!(
            "audio reports {channels} channels at {sample_rate} Hz"
        )));
    }
    let samples: Vec<SampleFormat> = decoder.by_ref().collect();
    // Partial audio would be cut as if it were the whole preview.
    if let Some(e) = decoder.take_error() {
        return Err(e);
    }

    let frames = (samples.len() / usize::from(channels)) as u64;
    let total_ms = frames * 1_000 / u64::from(sample_rate);
    let Some(max_start) = total_ms.checked_sub(clip_ms) else {
        return Err(Error::insufficient_audio(format!(
            "{total_ms} ms of audio available, {clip_ms} ms requested"
        )));
    };

    let start_ms = rng.u64(0..=max_start);
    let start_frame = ms_to_frames(start_ms, sample_rate);
    let end_frame = (start_frame + ms_to_frames(clip_ms, sample_rate)).min(frames);

    let channels_len = usize::from(channels);
    let from = to_index(start_frame) * channels_len;
    let to = to_index(end_frame) * channels_len;
    let data = encoder::encode_wav(&samples[from..to], channels, sample_rate)?;

    debug!("cut {clip_ms} ms snippet at {start_ms} of {total_ms} ms");

    Ok(Snippet {
        start: Duration::from_millis(start_ms),
        length: Duration::from_millis(clip_ms),
        data,
    })
}

fn ms_to_frames(ms: u64, sample_rate: u32) -> u64 {
    ms * u64::from(sample_rate) / 1_000
}

#[expect(clippy::cast_possible_truncation)]
fn to_index(frame: u64) -> usize {
    frame as usize
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wav(sample_rate: u32, duration_ms: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..sample_rate * duration_ms / 1_000 {
            // A ramp, so slices taken from different offsets differ.
            writer.write_sample((i % 30_000) as i16).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    fn frames(snippet: &Snippet) -> u32 {
        hound::WavReader::new(Cursor::new(snippet.data()))
            .unwrap()
            .duration()
    }

    #[test]
    fn empty_audio_is_insufficient() {
        let err = extract(Vec::new(), None, DEFAULT_CLIP_LENGTH, &mut fastrand::Rng::new())
            .unwrap_err();
        assert!(err.is_insufficient_audio());
    }

    #[test]
    fn audio_shorter_than_clip_is_insufficient() {
        let audio = wav(8_000, 1_499);
        let err = extract(audio, Some(Codec::WAV), DEFAULT_CLIP_LENGTH, &mut fastrand::Rng::new())
            .unwrap_err();
        assert!(err.is_insufficient_audio());
    }

    #[test]
    fn audio_of_exactly_clip_length_starts_at_zero() {
        for _ in 0..10 {
            let snippet = extract(
                wav(8_000, 1_500),
                Some(Codec::WAV),
                DEFAULT_CLIP_LENGTH,
                &mut fastrand::Rng::new(),
            )
            .unwrap();
            assert_eq!(snippet.start(), Duration::ZERO);
            assert_eq!(frames(&snippet), 12_000);
        }
    }

    #[test]
    fn snippet_lies_within_preview() {
        let audio = wav(8_000, 5_000);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..20 {
            let snippet = extract(audio.clone(), None, DEFAULT_CLIP_LENGTH, &mut rng).unwrap();
            assert!(snippet.start() <= Duration::from_millis(3_500));
            assert_eq!(snippet.length(), DEFAULT_CLIP_LENGTH);
            assert_eq!(frames(&snippet), 12_000);
        }
    }

    #[test]
    fn start_varies_between_calls() {
        let audio = wav(8_000, 10_000);
        let mut rng = fastrand::Rng::with_seed(42);
        let starts: std::collections::HashSet<_> = (0..10)
            .map(|_| {
                extract(audio.clone(), Some(Codec::WAV), DEFAULT_CLIP_LENGTH, &mut rng)
                    .unwrap()
                    .start()
            })
            .collect();
        assert!(starts.len() > 1);
    }

    #[test]
    fn read_failure_is_not_mistaken_for_short_audio() {
        let file = AudioFile::failing_after(wav(8_000, 5_000), 4_096);
        let err = cut(file, Some(Codec::WAV), 1_500, &mut fastrand::Rng::new()).unwrap_err();
        assert!(!err.is_insufficient_audio());
        assert_eq!(err.kind, crate::error::ErrorKind::Unknown);
    }

    #[test]
    fn zero_clip_length_is_rejected() {
        let err = extract(wav(8_000, 2_000), None, Duration::ZERO, &mut fastrand::Rng::new())
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn data_uri_embeds_wav() {
        let snippet = extract(
            wav(8_000, 1_500),
            None,
            DEFAULT_CLIP_LENGTH,
            &mut fastrand::Rng::new(),
        )
        .unwrap();
        assert!(snippet.to_data_uri().starts_with("data:audio/wav;base64,UklGR"));
    }
}
