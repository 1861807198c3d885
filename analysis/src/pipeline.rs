//! End to end analysis of a match: aggregation, normalization, rating and
//! ranking.

use rayon::prelude::*;

use crate::aggregate::{MatchStats, MetricAggregator};
use crate::event::{Event, EventKind, OrderingError, TickClock};
use crate::normalize::{self, NormalizedMetrics};
use crate::rating::{self, ConfigError, RatingConfig, RatingResult};
use crate::ranking;
use crate::settings::Settings;
use crate::source::{Recording, SourceError, TelemetrySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Rating,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Ingestion => f.write_str("ingestion"),
            Stage::Rating => f.write_str("rating"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("ingestion failed: {0}")]
    Source(#[from] SourceError),
    #[error("ingestion failed: {0}")]
    Ordering(#[from] OrderingError),
    #[error("rating failed: {0}")]
    Rating(#[from] ConfigError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Source(_) | PipelineError::Ordering(_) => Stage::Ingestion,
            PipelineError::Rating(_) => Stage::Rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchAnalysis {
    pub stats: MatchStats,
    pub normalized: Vec<NormalizedMetrics>,
    pub ratings: Vec<RatingResult>,
}

impl MatchAnalysis {
    /// Recomputes ratings and standings for new weights. Aggregated and
    /// normalized metrics are reused as they are.
    pub fn rerate(&self, config: &RatingConfig) -> Result<Vec<RatingResult>, ConfigError> {
        rate_and_rank(&self.normalized, config)
    }
}

pub fn rate_and_rank(
    normalized: &[NormalizedMetrics],
    config: &RatingConfig,
) -> Result<Vec<RatingResult>, ConfigError> {
    let ratings = rating::rate(normalized, config)?;
    Ok(ranking::rank(ratings))
}

#[tracing::instrument(name = "Aggregate", skip_all, fields(map = %source.header().map))]
pub fn aggregate<S>(mut source: S, settings: &Settings) -> Result<MatchStats, PipelineError>
where
    S: TelemetrySource,
{
    let mut aggregator = MetricAggregator::new(source.header(), settings.clone());

    let mut count = 0usize;
    while let Some(event) = source.next_event()? {
        aggregator.ingest(&event)?;
        count += 1;
    }

    let stats = aggregator.finish();
    if stats.anomalies.total() > 0 {
        tracing::warn!(anomalies = ?stats.anomalies, "Dropped malformed events");
    }
    tracing::info!(events = count, rounds = stats.rounds_played(), "Aggregated match");

    Ok(stats)
}

pub fn analyse_stats(
    stats: MatchStats,
    config: &RatingConfig,
) -> Result<MatchAnalysis, PipelineError> {
    let normalized = normalize::normalize(&stats.metrics);
    let ratings = rate_and_rank(&normalized, config)?;

    Ok(MatchAnalysis {
        stats,
        normalized,
        ratings,
    })
}

pub fn analyse<S>(
    source: S,
    settings: &Settings,
    config: &RatingConfig,
) -> Result<MatchAnalysis, PipelineError>
where
    S: TelemetrySource,
{
    // weights are checked before any event is read
    config.effective_weights()?;

    let stats = aggregate(source, settings)?;
    analyse_stats(stats, config)
}

/// The events of one round, from its `round_start` up to the next one. The
/// first slice holds whatever came before the first round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSlice<'e> {
    pub round: Option<u32>,
    pub events: &'e [Event],
}

pub fn partition_rounds(events: &[Event]) -> Result<Vec<RoundSlice<'_>>, OrderingError> {
    let mut clock = TickClock::default();
    let mut slices = Vec::new();
    let mut start = 0;
    let mut round = None;

    for (i, event) in events.iter().enumerate() {
        clock.observe(event.tick)?;

        if let EventKind::RoundStart = event.kind {
            if i > start {
                slices.push(RoundSlice {
                    round,
                    events: &events[start..i],
                });
            }
            start = i;
            round = Some(event.round);
        }
    }

    if start < events.len() {
        slices.push(RoundSlice {
            round,
            events: &events[start..],
        });
    }

    Ok(slices)
}

/// Aggregates every round on its own and merges the results. Produces the
/// same statistics as the sequential pass.
#[tracing::instrument(name = "AggregateParallel", skip_all, fields(map = %recording.header.map))]
pub fn aggregate_parallel(
    recording: &Recording,
    settings: &Settings,
) -> Result<MatchStats, OrderingError> {
    let slices = partition_rounds(&recording.events)?;
    tracing::debug!(slices = slices.len(), "Partitioned recording");

    let parts = slices
        .par_iter()
        .map(|slice| {
            crate::aggregate::aggregate_events(&recording.header, settings.clone(), slice.events)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parts
        .into_iter()
        .fold(MatchStats::empty(&recording.header), MatchStats::merge))
}
