//! Analysing several recordings at once.
//!
//! Every recording is decoded and rated on the blocking pool; the results are
//! collected in input order so the summary is stable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use analysis::pipeline::{self, PipelineError, Stage};
use analysis::rating::RatingConfig;
use analysis::source::Recording;
use analysis::Settings;
use common::MatchReport;

use crate::export::{self, ExportError};
use crate::input::MatchInput;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("loading {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} stage failed: {source}")]
    Pipeline {
        stage: Stage,
        #[source]
        source: PipelineError,
    },
    #[error("exporting: {0}")]
    Export(#[from] ExportError),
    #[error("analysis task panicked")]
    Panicked,
}

impl From<PipelineError> for MatchError {
    fn from(source: PipelineError) -> Self {
        MatchError::Pipeline {
            stage: source.stage(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub settings: Settings,
    pub rating: RatingConfig,
    pub out_dir: PathBuf,
    /// Aggregate the rounds of each recording on the rayon pool.
    pub parallel_rounds: bool,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub path: PathBuf,
    pub result: Result<Written, MatchError>,
}

#[derive(Debug)]
pub struct Written {
    pub report: MatchReport,
    pub json: PathBuf,
    pub csv: PathBuf,
}

fn analyse_input(input: &MatchInput, options: &BatchOptions) -> Result<MatchReport, MatchError> {
    let source = input.source().map_err(PipelineError::from)?;

    let analysis = if options.parallel_rounds {
        options.rating.effective_weights().map_err(PipelineError::from)?;
        let recording = Recording::collect(source).map_err(PipelineError::from)?;
        let stats = pipeline::aggregate_parallel(&recording, &options.settings).map_err(PipelineError::from)?;
        pipeline::analyse_stats(stats, &options.rating)?
    } else {
        pipeline::analyse(source, &options.settings, &options.rating)?
    };

    let name = input
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let report = export::build_report(&analysis, &name, &options.rating, chrono::Utc::now())?;

    if report.anomalies.total() > 0 {
        tracing::warn!(anomalies = ?report.anomalies, "Recording contained malformed events");
    }

    Ok(report)
}

/// Loads, analyses and exports one recording.
#[tracing::instrument(name = "Match", skip_all, fields(path = %path.display()))]
pub fn run_one(path: &Path, options: &BatchOptions) -> Result<Written, MatchError> {
    let input = MatchInput::load(path).map_err(|source| MatchError::Load {
        path: path.to_owned(),
        source,
    })?;

    let report = analyse_input(&input, options)?;
    let (json, csv) = export::write(&options.out_dir, &input.stem(), &report)?;

    tracing::info!(players = report.players.len(), rounds = report.info.rounds, "Wrote report");

    Ok(Written { report, json, csv })
}

pub async fn run(paths: Vec<PathBuf>, options: BatchOptions) -> Vec<MatchOutcome> {
    let options = Arc::new(options);

    let handles = paths.into_iter().map(|path| {
        let options = options.clone();
        async move {
            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || run_one(&task_path, &options))
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Analysis task failed");
                    Err(MatchError::Panicked)
                });
            MatchOutcome { path, result }
        }
    });

    futures::future::join_all(handles).await
}
