//! soundcheck - batch loudness analysis CLI
//!
//! Imports the given files, folders, and URLs, runs one sequential
//! analysis batch, and prints a per-item loudness report with
//! threshold warnings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use soundcheck::services::{fs_import, threshold_evaluator};
use soundcheck::{
    BatchAnalysisOrchestrator, EventBus, MediaItemRegistry, RemoteImportFetcher, SettingsStore,
    SoundcheckEvent, SymphoniaDecoder, SymphoniaProbe, DEFAULT_SAMPLES_PER_SECOND,
};

#[derive(Parser, Debug)]
#[command(name = "soundcheck", version, about = "Loudness analysis for media files")]
struct Args {
    /// Files or folders to import
    paths: Vec<PathBuf>,

    /// Remote URL to import (repeatable)
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "SOUNDCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Loudness time-series density in points per second
    #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_SECOND)]
    samples_per_second: u32,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ReportRow {
    name: String,
    duration: Option<f64>,
    average_db: Option<f64>,
    max_db: Option<f64>,
    warnings: Vec<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.paths.is_empty() && args.urls.is_empty() {
        bail!("nothing to analyze: pass files, folders, or --url");
    }

    let store = match &args.config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::new(SettingsStore::default_path()),
    };
    let settings = store.load().context("failed to load settings")?;
    info!(path = %store.path().display(), "settings loaded");

    let events = EventBus::new(256);
    let registry = MediaItemRegistry::new(Arc::new(SymphoniaProbe), events.clone());
    let orchestrator = BatchAnalysisOrchestrator::new(
        Arc::clone(&registry),
        Arc::new(SymphoniaDecoder),
        events.clone(),
        args.samples_per_second,
    );

    // Progress printer; runs until the bus is dropped
    let mut rx = events.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let SoundcheckEvent::ItemAnalysisStarted { name, index, total, .. } = event {
                info!("analyzing [{}/{}] {}", index, total, name);
            }
        }
    });

    for path in &args.paths {
        let blobs = fs_import::collect_blobs(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let outcome = registry.add(blobs, &settings).await;
        info!(
            path = %path.display(),
            added = outcome.added.len(),
            duplicates = outcome.duplicates_filtered,
            unsupported = outcome.unsupported,
            "imported"
        );
    }

    if !args.urls.is_empty() {
        let fetcher = RemoteImportFetcher::new(Arc::clone(&registry))?;
        for url in &args.urls {
            match fetcher.import_from_url(url, &settings).await {
                Ok(id) => info!(%url, item_id = %id, "imported from URL"),
                Err(e) => warn!(%url, error = %e, "URL import failed"),
            }
        }
    }

    if registry.is_empty().await {
        bail!("no supported media found in the given sources");
    }

    let report = orchestrator.run_batch().await?;
    info!(
        total = report.total,
        analyzed = report.analyzed,
        failed = report.failed,
        "batch finished"
    );

    let rows: Vec<ReportRow> = registry
        .items()
        .await
        .iter()
        .map(|item| ReportRow {
            name: item.blob.name.clone(),
            duration: item.duration,
            average_db: item.analysis.as_ref().map(|a| a.average_db),
            max_db: item.analysis.as_ref().map(|a| a.max_db),
            warnings: threshold_evaluator::evaluate(item, &settings)
                .iter()
                .map(|w| w.to_string())
                .collect(),
            error: item.last_error.clone(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows);
    }

    drop(events);
    progress.abort();

    if report.failed > 0 {
        bail!("{} of {} items failed to analyze", report.failed, report.total);
    }
    Ok(())
}

fn print_table(rows: &[ReportRow]) {
    println!(
        "{:<40} {:>9} {:>8} {:>8}  {}",
        "NAME", "DURATION", "AVG dB", "MAX dB", "WARNINGS"
    );
    for row in rows {
        let duration = row
            .duration
            .map(|d| format!("{:.2}s", d))
            .unwrap_or_else(|| "-".to_string());
        let avg = row
            .average_db
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let max = row
            .max_db
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let notes = if let Some(error) = &row.error {
            format!("error: {}", error)
        } else if row.warnings.is_empty() {
            "ok".to_string()
        } else {
            row.warnings.join(", ")
        };
        println!("{:<40} {:>9} {:>8} {:>8}  {}", row.name, duration, avg, max, notes);
    }
}
