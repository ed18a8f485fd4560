//! Audio decoder implementation using Symphonia.
//!
//! Turns preview audio into interleaved 32-bit floating point samples.
//!
//! # Format Support
//!
//! * AAC: ADTS framing
//! * FLAC: Lossless compression
//! * MP3: The format most streaming previews are served in
//! * MP4: AAC audio in MP4 container
//! * WAV: Uncompressed PCM
//!
//! When the codec is known (for example from the preview URL's extension)
//! only that format is registered, otherwise all formats are probed.

use symphonia::{
    core::{
        audio::SampleBuffer,
        codecs::{CodecRegistry, DecoderOptions},
        errors::Error as SymphoniaError,
        formats::{FormatOptions, FormatReader},
        io::{MediaSourceStream, MediaSourceStreamOptions},
        meta::MetadataOptions,
        probe::{Hint, Probe},
    },
    default::{
        codecs::{AacDecoder, FlacDecoder, MpaDecoder, PcmDecoder},
        formats::{AdtsReader, FlacReader, IsoMp4Reader, MpaReader, WavReader},
    },
};

use crate::{
    audio_file::AudioFile,
    error::{Error, Result},
};

/// Sample type produced by the decoder, normalized to [-1.0, 1.0].
pub type SampleFormat = f32;

/// Sample rate assumed when the codec does not specify one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Channel count assumed when the codec does not specify one.
pub const DEFAULT_CHANNELS: u16 = 2;

/// Maximum number of consecutive corrupted packets to skip before giving up.
const MAX_RETRIES: usize = 3;

/// Audio codecs the decoder can be specialized for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    /// AAC in ADTS framing
    ADTS,
    /// Free Lossless Audio Codec
    FLAC,
    /// MPEG Layer-3
    MP3,
    /// AAC in an MP4 container
    MP4,
    /// Uncompressed PCM in a RIFF container
    WAV,
}

impl Codec {
    /// Derives the codec from a file extension, case-insensitively.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let codec = match extension.to_ascii_lowercase().as_str() {
            "aac" | "adts" => Self::ADTS,
            "flac" => Self::FLAC,
            "mp3" => Self::MP3,
            "mp4" | "m4a" => Self::MP4,
            "wav" | "wave" => Self::WAV,
            _ => return None,
        };
        Some(codec)
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::ADTS => "aac",
            Self::FLAC => "flac",
            Self::MP3 => "mp3",
            Self::MP4 => "mp4",
            Self::WAV => "wav",
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::ADTS => "audio/aac",
            Self::FLAC => "audio/flac",
            Self::MP3 => "audio/mpeg",
            Self::MP4 => "audio/mp4",
            Self::WAV => "audio/wav",
        }
    }
}

/// Audio decoder supporting multiple formats through Symphonia.
///
/// Iterating the decoder yields interleaved samples until the end of the
/// stream. Corrupted packets are skipped, up to [`MAX_RETRIES`] in a row.
/// Any other failure also ends iteration early; check
/// [`Decoder::take_error`] afterwards to tell it from a clean end.
///
/// # Example
/// ```no_run
/// use spotle::{audio_file::AudioFile, decoder::{Codec, Decoder}};
///
/// let file = AudioFile::from_bytes(std::fs::read("preview.mp3")?);
/// let mut decoder = Decoder::new(file, Some(Codec::MP3))?;
/// let samples: Vec<f32> = decoder.by_ref().collect();
/// if let Some(e) = decoder.take_error() {
///     return Err(e);
/// }
/// ```
pub struct Decoder {
    /// Format reader (demuxer) for extracting encoded audio packets
    demuxer: Box<dyn FormatReader>,

    /// Codec decoder for converting encoded packets to PCM samples
    decoder: Box<dyn symphonia::core::codecs::Decoder>,

    /// Identifier of the track being decoded within the container
    track_id: u32,

    /// Reusable sample buffer to minimize allocations
    buffer: Option<SampleBuffer<SampleFormat>>,

    /// Current position in the sample buffer
    position: usize,

    channels: u16,
    sample_rate: u32,

    /// The failure that ended decoding before the end of the stream
    error: Option<Error>,
}

impl Decoder {
    /// Creates a new decoder for the given audio file.
    ///
    /// Audio parameters are determined from the codec, falling back to
    /// [`DEFAULT_SAMPLE_RATE`] and [`DEFAULT_CHANNELS`].
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// * Format detection fails
    /// * Codec initialization fails
    /// * The container holds no default track
    pub fn new(file: AudioFile, codec: Option<Codec>) -> Result<Self> {
        let stream = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        let mut codecs = CodecRegistry::new();
        let mut probes = Probe::default();
        let (codecs, probe) = if let Some(codec) = codec {
            match codec {
                Codec::ADTS => {
                    codecs.register_all::<AacDecoder>();
                    probes.register_all::<AdtsReader>();
                }
                Codec::FLAC => {
                    codecs.register_all::<FlacDecoder>();
                    probes.register_all::<FlacReader>();
                }
                Codec::MP3 => {
                    codecs.register_all::<MpaDecoder>();
                    probes.register_all::<MpaReader>();
                }
                Codec::MP4 => {
                    // MP4 files can contain many audio codecs, but most likely AAC.
                    codecs.register_all::<AacDecoder>();
                    probes.register_all::<IsoMp4Reader>();
                }
                Codec::WAV => {
                    codecs.register_all::<PcmDecoder>();
                    probes.register_all::<WavReader>();
                }
            }

            hint.with_extension(codec.extension());
            hint.mime_type(codec.mime_type());

            (&codecs, &probes)
        } else {
            (
                symphonia::default::get_codecs(),
                symphonia::default::get_probe(),
            )
        };

        let demuxer = probe
            .format(
                &hint,
                stream,
                &FormatOptions {
                    enable_gapless: true,
                    ..Default::default()
                },
                &MetadataOptions::default(),
            )?
            .format;
        let default_track = demuxer
            .default_track()
            .ok_or(Error::not_found("default track not found"))?;
        let track_id = default_track.id;

        let decoder = codecs.make(&default_track.codec_params, &DecoderOptions::default())?;

        // The decoder may know more than the demuxer did.
        let codec_params = decoder.codec_params();
        let sample_rate = codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let channels = codec_params.channels.map_or(DEFAULT_CHANNELS, |channels| {
            u16::try_from(channels.count()).unwrap_or(u16::MAX)
        });

        trace!(
            "decoding {} with {channels} channels at {sample_rate} Hz",
            codec.map_or("probed audio", |codec| codec.extension())
        );

        Ok(Self {
            demuxer,
            decoder,
            track_id,

            buffer: None,
            position: 0,

            channels,
            sample_rate,
            error: None,
        })
    }

    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Takes the error that ended decoding early, if any.
    ///
    /// Returns `None` when iteration stopped at the end of the stream, or
    /// has not stopped yet.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Ends decoding early because of `error`.
    fn fail(&mut self, error: Error) -> bool {
        debug!("stopped decoding: {error}");
        self.error = Some(error);
        false
    }

    /// Decodes the next packet of the default track into the sample buffer.
    ///
    /// Returns `false` at the end of the stream or on an unrecoverable error,
    /// which is kept for [`Self::take_error`].
    fn refill(&mut self) -> bool {
        let mut skipped = 0;
        loop {
            if skipped > MAX_RETRIES {
                return self.fail(Error::data_loss(format!(
                    "skipped {skipped} malformed packets in a row"
                )));
            }

            let packet = match self.demuxer.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) => {
                    // Not an error, just the end of the stream.
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        return false;
                    }
                    return self.fail(e.into());
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return self.fail(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let error = match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let required = decoded.capacity() * spec.channels.count();
                    if self
                        .buffer
                        .as_ref()
                        .is_none_or(|buffer| buffer.capacity() < required)
                    {
                        self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buffer) = self.buffer.as_mut() {
                        buffer.copy_interleaved_ref(decoded);
                    }
                    self.position = 0;
                    return true;
                }
                Err(e) => e,
            };

            match error {
                SymphoniaError::DecodeError(e) => {
                    trace!("skipping malformed packet: {e}");
                    skipped += 1;
                }
                SymphoniaError::ResetRequired => self.decoder.reset(),
                e => return self.fail(e.into()),
            }
        }
    }
}

impl Iterator for Decoder {
    /// A single interleaved audio sample.
    type Item = SampleFormat;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop because a decoded packet may hold zero frames.
        while self
            .buffer
            .as_ref()
            .is_none_or(|buffer| self.position >= buffer.len())
        {
            if !self.refill() {
                return None;
            }
        }

        let sample = *self
            .buffer
            .as_ref()
            .and_then(|buf| buf.samples().get(self.position))?;
        self.position += 1;

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorKind;

    fn wav(channels: u16, sample_rate: u32, frames: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames * u32::from(channels) {
            writer.write_sample((i % 100) as i16 * 100).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn codec_from_extension() {
        assert_eq!(Codec::from_extension("MP3"), Some(Codec::MP3));
        assert_eq!(Codec::from_extension("m4a"), Some(Codec::MP4));
        assert_eq!(Codec::from_extension("ogg"), None);
    }

    #[test]
    fn decodes_every_sample_of_known_codec() {
        let file = AudioFile::from_bytes(wav(2, 8_000, 4_000));
        let mut decoder = Decoder::new(file, Some(Codec::WAV)).unwrap();
        assert_eq!(decoder.channels(), 2);
        assert_eq!(decoder.sample_rate(), 8_000);

        let samples: Vec<SampleFormat> = decoder.by_ref().collect();
        assert_eq!(samples.len(), 8_000);
        assert!(decoder.take_error().is_none());
        assert!(samples.iter().all(|sample| (-1.0..=1.0).contains(sample)));
    }

    #[test]
    fn probes_when_codec_unknown() {
        let file = AudioFile::from_bytes(wav(1, 16_000, 1_600));
        let decoder = Decoder::new(file, None).unwrap();
        assert_eq!(decoder.channels(), 1);
        assert_eq!(decoder.count(), 1_600);
    }

    #[test]
    fn read_failure_mid_stream_is_kept() {
        let bytes = wav(1, 8_000, 16_000);
        let file = AudioFile::failing_after(bytes, 8_192);
        let mut decoder = Decoder::new(file, Some(Codec::WAV)).unwrap();

        let samples: Vec<SampleFormat> = decoder.by_ref().collect();
        assert!(samples.len() < 16_000);

        let err = decoder.take_error().unwrap();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn rejects_garbage() {
        let file = AudioFile::from_bytes(b"definitely not audio".to_vec());
        assert!(Decoder::new(file, None).is_err());
    }
}
