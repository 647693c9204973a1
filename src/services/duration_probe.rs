//! Duration metadata probe
//!
//! Reads the container header only; never decodes packets. Runs as a
//! background write-back after import, so failure is non-fatal.

use std::io::Cursor;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Error, Result};
use crate::models::SourceBlob;

/// Seam for the registry's background duration lookup
pub trait DurationProbe: Send + Sync {
    /// Duration of the blob's audio in seconds
    fn probe(&self, blob: &SourceBlob) -> Result<f64>;
}

/// Header-only probe backed by symphonia's format registry
#[derive(Debug, Default)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn probe(&self, blob: &SourceBlob) -> Result<f64> {
        let cursor = Cursor::new(blob.content.as_ref().clone());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some((_, ext)) = blob.name.rsplit_once('.') {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Probe(format!("unrecognized container: {}", e)))?;

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Probe("no audio track in source".to_string()))?;

        let params = &track.codec_params;
        let n_frames = params
            .n_frames
            .ok_or_else(|| Error::Probe("frame count missing from header".to_string()))?;

        if let Some(sample_rate) = params.sample_rate.filter(|&r| r > 0) {
            return Ok(n_frames as f64 / sample_rate as f64);
        }
        if let Some(tb) = params.time_base {
            let t = tb.calc_time(n_frames);
            return Ok(t.seconds as f64 + t.frac);
        }
        Err(Error::Probe("no time base for duration".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_probe_wav_duration() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer =
                hound::WavWriter::new(std::io::Cursor::new(&mut bytes), spec).unwrap();
            for _ in 0..16000 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        let blob = SourceBlob::new("two-seconds.wav", "audio/wav", Utc::now(), bytes);

        let duration = SymphoniaProbe.probe(&blob).unwrap();
        assert!((duration - 2.0).abs() < 0.01, "duration = {}", duration);
    }

    #[test]
    fn test_probe_garbage_fails() {
        let blob = SourceBlob::new("noise.bin", "", Utc::now(), vec![0xAB; 128]);
        assert!(matches!(SymphoniaProbe.probe(&blob), Err(Error::Probe(_))));
    }
}
