//! Pipeline services

pub mod batch_orchestrator;
pub mod decoder;
pub mod duration_probe;
pub mod fs_import;
pub mod loudness_analyzer;
pub mod registry;
pub mod remote_fetcher;
pub mod threshold_evaluator;

pub use batch_orchestrator::{BatchAnalysisOrchestrator, BatchReport, DEFAULT_SAMPLES_PER_SECOND};
pub use decoder::{DecodedAudio, Decoder, SymphoniaDecoder};
pub use duration_probe::{DurationProbe, SymphoniaProbe};
pub use registry::{AddOutcome, MediaItemRegistry};
pub use remote_fetcher::RemoteImportFetcher;
pub use threshold_evaluator::WarningKind;
