//! End-to-end pipeline tests over real WAV fixtures:
//! filesystem import -> registry -> batch analysis -> threshold warnings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use soundcheck::services::{fs_import, threshold_evaluator};
use soundcheck::{
    BatchAnalysisOrchestrator, EventBus, MediaItemRegistry, Settings, SymphoniaDecoder,
    SymphoniaProbe, WarningKind, DEFAULT_SAMPLES_PER_SECOND,
};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, samples: &[f32]) -> PathBuf {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let path = dir.join(name);
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in samples {
        writer
            .write_sample((s * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn sine(sample_rate: u32, seconds: f64, amplitude: f32) -> Vec<f32> {
    let count = (sample_rate as f64 * seconds) as usize;
    (0..count)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            amplitude * (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32
        })
        .collect()
}

struct Pipeline {
    registry: Arc<MediaItemRegistry>,
    orchestrator: BatchAnalysisOrchestrator,
}

fn pipeline() -> Pipeline {
    let events = EventBus::new(256);
    let registry = MediaItemRegistry::new(Arc::new(SymphoniaProbe), events.clone());
    let orchestrator = BatchAnalysisOrchestrator::new(
        Arc::clone(&registry),
        Arc::new(SymphoniaDecoder),
        events,
        DEFAULT_SAMPLES_PER_SECOND,
    );
    Pipeline { registry, orchestrator }
}

async fn wait_for_durations(registry: &MediaItemRegistry) {
    for _ in 0..200 {
        let items = registry.items().await;
        if items.iter().all(|i| i.duration.is_some() || i.last_error.is_some()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_end_to_end_loudness_and_warnings() {
    let dir = TempDir::new().unwrap();
    write_wav(dir.path(), "hot.wav", 48000, &sine(48000, 2.0, 0.9));
    write_wav(dir.path(), "silence.wav", 48000, &vec![0.0; 48000]);

    let p = pipeline();
    let settings = Settings::default();

    let blobs = fs_import::collect_blobs(dir.path()).unwrap();
    let outcome = p.registry.add(blobs, &settings).await;
    assert_eq!(outcome.added.len(), 2);

    let report = p.orchestrator.run_batch().await.unwrap();
    assert_eq!(report.analyzed, 2);
    assert_eq!(report.failed, 0);

    let items = p.registry.items().await;
    let hot = items.iter().find(|i| i.blob.name == "hot.wav").unwrap();
    let silent = items.iter().find(|i| i.blob.name == "silence.wav").unwrap();

    // 0.9 amplitude sine: RMS 0.9/sqrt(2) => about -3.93 dBFS => 96.07
    let analysis = hot.analysis.as_ref().unwrap();
    assert!((analysis.average_db - 96.07).abs() < 0.5, "avg = {}", analysis.average_db);
    assert!((analysis.max_db - 96.07).abs() < 0.5);
    assert_eq!(analysis.points.len(), 40); // 2s at 20 points/s
    assert!((analysis.source_duration - 2.0).abs() < 0.01);
    assert_eq!(
        threshold_evaluator::evaluate(hot, &settings),
        [WarningKind::PeakTooHigh]
    );

    // Silence bottoms out at the 40.0 display floor
    let analysis = silent.analysis.as_ref().unwrap();
    assert!(analysis.points.iter().all(|pt| pt.db == 40.0));
    assert_eq!(analysis.average_db, 40.0);
    assert_eq!(
        threshold_evaluator::evaluate(silent, &settings),
        [WarningKind::AverageTooLow]
    );

    wait_for_durations(&p.registry).await;
    let hot = p.registry.get(hot.id).await.unwrap();
    assert!((hot.duration.unwrap() - 2.0).abs() < 0.01);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_undecodable_file_does_not_poison_the_batch() {
    let dir = TempDir::new().unwrap();
    write_wav(dir.path(), "good.wav", 44100, &sine(44100, 1.0, 0.5));
    std::fs::write(dir.path().join("broken.mp3"), vec![0xDE; 512]).unwrap();

    let p = pipeline();
    let settings = Settings::default();
    let blobs = fs_import::collect_blobs(dir.path()).unwrap();
    p.registry.add(blobs, &settings).await;

    let report = p.orchestrator.run_batch().await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.analyzed, 1);
    assert_eq!(report.failed, 1);

    let items = p.registry.items().await;
    let broken = items.iter().find(|i| i.blob.name == "broken.mp3").unwrap();
    assert!(broken.analysis.is_none());
    assert!(broken.last_error.is_some());
    let good = items.iter().find(|i| i.blob.name == "good.wav").unwrap();
    assert!(good.analysis.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reanalysis_is_deterministic() {
    let dir = TempDir::new().unwrap();
    write_wav(dir.path(), "tone.wav", 44100, &sine(44100, 1.5, 0.6));

    let p = pipeline();
    let settings = Settings::default();
    let blobs = fs_import::collect_blobs(dir.path()).unwrap();
    let outcome = p.registry.add(blobs, &settings).await;
    let id = outcome.added[0];

    p.orchestrator.run_batch().await.unwrap();
    let first = p.registry.get(id).await.unwrap().analysis.unwrap();

    // Everything is analyzed, so the second run re-analyzes all items
    let report = p.orchestrator.run_batch().await.unwrap();
    assert_eq!(report.analyzed, 1);
    let second = p.registry.get(id).await.unwrap().analysis.unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reimporting_the_same_folder_is_filtered() {
    let dir = TempDir::new().unwrap();
    write_wav(dir.path(), "tone.wav", 44100, &sine(44100, 0.5, 0.4));

    let p = pipeline();
    let settings = Settings::default();

    let first = p
        .registry
        .add(fs_import::collect_blobs(dir.path()).unwrap(), &settings)
        .await;
    assert_eq!(first.added.len(), 1);

    let second = p
        .registry
        .add(fs_import::collect_blobs(dir.path()).unwrap(), &settings)
        .await;
    assert!(second.added.is_empty());
    assert_eq!(second.duplicates_filtered, 1);
    assert_eq!(p.registry.len().await, 1);
}
