//! Block-RMS loudness analysis
//!
//! Turns one decoded channel of normalized f32 samples into a bounded
//! time series of decibel points plus summary statistics. The raw
//! measurement is dBFS (≤ 0 for a normalized signal); for display it is
//! shifted by +100 into a roughly 0–100 range and floored at 40, a
//! noise gate for chart legibility rather than a physical measurement.

use crate::error::{Error, Result};
use crate::models::{AnalysisResult, LoudnessPoint};

/// Silence floor substituted when a block's RMS is exactly zero
const SILENCE_FLOOR_DBFS: f64 = -100.0;

/// Offset rebasing dBFS into the positive display range
const DISPLAY_OFFSET_DB: f64 = 100.0;

/// Lower clamp of the display scale (-60 dBFS after the offset)
const NOISE_GATE_DB: f64 = 40.0;

/// Analyze one channel of decoded audio.
///
/// # Arguments
/// * `samples` - normalized float amplitudes in [-1, 1], temporal order
/// * `sample_rate` - decode sample rate in Hz
/// * `samples_per_second` - time-series density (points per second)
///
/// Any trailing partial block is discarded, so `average_db` and
/// `max_db` range over exactly the emitted points. Deterministic:
/// identical input yields bit-for-bit identical output.
pub fn analyze(samples: &[f32], sample_rate: u32, samples_per_second: u32) -> Result<AnalysisResult> {
    if sample_rate == 0 || samples_per_second == 0 {
        return Err(Error::InvalidSampleRate(format!(
            "sample_rate={} samples_per_second={}",
            sample_rate, samples_per_second
        )));
    }

    let block_size = (sample_rate / samples_per_second) as usize;
    if block_size == 0 {
        return Err(Error::InvalidSampleRate(format!(
            "sampling density {}/s exceeds sample rate {} Hz",
            samples_per_second, sample_rate
        )));
    }

    let total_blocks = samples.len() / block_size;
    if total_blocks == 0 {
        return Err(Error::InsufficientSamples(format!(
            "{} samples is shorter than one {}-sample block",
            samples.len(),
            block_size
        )));
    }

    let mut points = Vec::with_capacity(total_blocks);
    let mut total_db = 0.0;
    let mut max_db = f64::NEG_INFINITY;

    for i in 0..total_blocks {
        let start = i * block_size;
        let end = ((i + 1) * block_size).min(samples.len());
        let block = &samples[start..end];

        let sum_squares: f64 = block.iter().map(|&s| s as f64 * s as f64).sum();
        let rms = (sum_squares / block.len() as f64).sqrt();

        let dbfs = if rms > 0.0 {
            20.0 * rms.log10()
        } else {
            SILENCE_FLOOR_DBFS
        };
        let normalized = (dbfs + DISPLAY_OFFSET_DB).max(NOISE_GATE_DB);

        let db = round2(normalized);
        points.push(LoudnessPoint {
            time: round2(i as f64 / samples_per_second as f64),
            db,
        });

        total_db += db;
        if db > max_db {
            max_db = db;
        }
    }

    Ok(AnalysisResult {
        source_duration: samples.len() as f64 / sample_rate as f64,
        sample_rate,
        points,
        average_db: total_db / total_blocks as f64,
        max_db,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, seconds: f64, amplitude: f32) -> Vec<f32> {
        let count = (sample_rate as f64 * seconds) as usize;
        (0..count)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_all_zero_buffer_hits_the_floor() {
        // blockSize = 48000 / 20 = 2400; every block RMS = 0
        let samples = vec![0.0f32; 48000];
        let result = analyze(&samples, 48000, 20).unwrap();

        assert_eq!(result.points.len(), 20);
        assert!(result.points.iter().all(|p| p.db == 40.0));
        assert_eq!(result.average_db, 40.0);
        assert_eq!(result.max_db, 40.0);
    }

    #[test]
    fn test_full_scale_sine() {
        // RMS of a full-scale sine is 1/sqrt(2): -3.01 dBFS -> 96.99
        let samples = sine(48000, 1.0, 1.0);
        let result = analyze(&samples, 48000, 20).unwrap();

        assert_eq!(result.points.len(), 20);
        for point in &result.points {
            assert!((point.db - 96.99).abs() < 0.05, "point.db = {}", point.db);
        }
        assert!((result.average_db - 96.99).abs() < 0.05);
        assert!((result.max_db - 96.99).abs() < 0.05);
    }

    #[test]
    fn test_points_stay_within_display_range() {
        let mut samples = sine(44100, 0.5, 0.8);
        samples.extend(vec![0.0f32; 22050]);
        samples.extend(sine(44100, 0.25, 0.0001));

        let result = analyze(&samples, 44100, 10).unwrap();
        for point in &result.points {
            assert!(point.db >= 40.0 && point.db <= 100.0, "out of range: {}", point.db);
        }
    }

    #[test]
    fn test_buffer_shorter_than_one_block() {
        let samples = vec![0.5f32; 10]; // blockSize = 2400
        match analyze(&samples, 48000, 20) {
            Err(Error::InsufficientSamples(_)) => {}
            other => panic!("expected InsufficientSamples, got {:?}", other),
        }
    }

    #[test]
    fn test_density_above_sample_rate_is_invalid() {
        let samples = vec![0.5f32; 100];
        match analyze(&samples, 10, 20) {
            Err(Error::InvalidSampleRate(_)) => {}
            other => panic!("expected InvalidSampleRate, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_density_is_invalid() {
        let samples = vec![0.5f32; 100];
        assert!(matches!(
            analyze(&samples, 48000, 0),
            Err(Error::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_trailing_partial_block_is_discarded() {
        // 2.5 blocks of quiet plus a loud partial tail: the tail must
        // not influence the summary.
        let block = 2400;
        let mut samples = vec![0.01f32; block * 2];
        samples.extend(vec![1.0f32; block / 2]);

        let result = analyze(&samples, 48000, 20).unwrap();
        assert_eq!(result.points.len(), 2);

        let quiet_db = result.points[0].db;
        assert_eq!(result.max_db, quiet_db);
        assert_eq!(result.average_db, quiet_db);
    }

    #[test]
    fn test_summary_matches_emitted_points() {
        let mut samples = sine(48000, 0.5, 0.9);
        samples.extend(vec![0.0f32; 24000]);

        let result = analyze(&samples, 48000, 20).unwrap();
        let mean: f64 =
            result.points.iter().map(|p| p.db).sum::<f64>() / result.points.len() as f64;
        let max = result.points.iter().map(|p| p.db).fold(f64::MIN, f64::max);

        assert!((result.average_db - mean).abs() < 1e-9);
        assert_eq!(result.max_db, max);
    }

    #[test]
    fn test_point_times_advance_by_density() {
        let samples = vec![0.0f32; 48000];
        let result = analyze(&samples, 48000, 20).unwrap();

        assert_eq!(result.points[0].time, 0.0);
        assert_eq!(result.points[1].time, 0.05);
        assert_eq!(result.points[19].time, 0.95);
        assert_eq!(result.source_duration, 1.0);
        assert_eq!(result.sample_rate, 48000);
    }

    #[test]
    fn test_determinism() {
        let samples = sine(44100, 1.0, 0.7);
        let first = analyze(&samples, 44100, 20).unwrap();
        let second = analyze(&samples, 44100, 20).unwrap();
        assert_eq!(first, second);
    }
}
