//! Re-encodes decoded samples into a transport-friendly container.
//!
//! Snippets are written as 16-bit PCM WAV: every browser and audio stack
//! plays it, and at 1.5 seconds the lack of compression is irrelevant.

use std::io::Cursor;

use hound::{WavSpec, WavWriter};

use crate::{
    decoder::SampleFormat,
    error::{Error, Result},
};

/// MIME type of the encoded output.
pub const MIME_TYPE: &str = "audio/wav";

/// Encodes interleaved samples as a 16-bit PCM WAV file in memory.
///
/// # Errors
///
/// Returns `InvalidArgument` when `channels` or `sample_rate` is zero, or
/// when the sample count is not a whole number of frames.
pub fn encode_wav(samples: &[SampleFormat], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    if channels == 0 || sample_rate == 0 {
        return Err(Error::invalid_argument(format!(
            "cannot encode {channels} channels at {sample_rate} Hz"
        )));
    }
    if samples.len() % usize::from(channels) != 0 {
        return Err(Error::invalid_argument(format!(
            "{} samples do not divide into {channels} channels",
            samples.len()
        )));
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

#[expect(clippy::cast_possible_truncation)]
fn to_i16(sample: SampleFormat) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}
