//! WAV encoding (§6).
//!
//! The original hand-rolls PCM16 mono RIFF/WAVE bytes in
//! `_encode_wav` (`struct.pack` for each chunk header); this codebase
//! uses `hound` instead, the way `SinergaOptima-Dictum` and
//! `saorsa-labs-fae` both depend on it for WAV I/O. The byte layout is
//! unchanged — PCM16 mono little-endian — only the encoder is swapped
//! for an ecosystem crate instead of hand-written struct packing.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use vocora_core::PipelineError;

/// Encode mono `f32` samples in `[-1.0, 1.0]` as a complete PCM16 WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, PipelineError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| PipelineError::Fatal(format!("wav writer init: {e}")))?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let quantized = (clamped * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| PipelineError::Fatal(format!("wav sample write: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| PipelineError::Fatal(format!("wav finalize: {e}")))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_valid_riff_header() {
        let samples = vec![0.0_f32, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_wav(&samples, 24_000).expect("encode succeeds");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn empty_samples_still_produce_a_valid_file() {
        let bytes = encode_wav(&[], 16_000).expect("encode succeeds");
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn clamps_out_of_range_samples() {
        let bytes = encode_wav(&[2.0, -2.0], 16_000).expect("encode succeeds");
        assert!(!bytes.is_empty());
    }
}
