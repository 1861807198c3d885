//! Turning analysis results into reports, and reports into files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use analysis::aggregate::{MatchStats, PlayerRawMetrics};
use analysis::event::PlayerId;
use analysis::normalize::{Metric, NormalizedMetrics};
use analysis::perround::{RoundEvent, RoundSummary};
use analysis::pipeline::MatchAnalysis;
use analysis::rating::{ConfigError, RatingConfig, RatingResult};
use common::{
    AnomalySummary, ClutchReport, Contribution, EliminationReport, MatchInfo, MatchReport, MetricKey,
    MultiKillReport, NormalizedScores, PlayerReport, RawMetrics, RoundReport, WeaponReport, Weights,
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encoding csv: {0}")]
    Csv(#[from] common::row::CsvError),
    #[error("flattening report: {0}")]
    Row(#[from] common::RowError),
    #[error("report has no rating for player {0}")]
    MissingPlayer(u64),
    #[error(transparent)]
    Rating(#[from] ConfigError),
}

pub fn metric_key(metric: Metric) -> MetricKey {
    match metric {
        Metric::Kd => MetricKey::Kd,
        Metric::HeadshotPct => MetricKey::HeadshotPct,
        Metric::Adr => MetricKey::Adr,
        Metric::Multikill => MetricKey::Multikill,
        Metric::Clutch => MetricKey::Clutch,
    }
}

pub fn weights(config: &RatingConfig) -> Result<Weights, ConfigError> {
    let effective = config.effective_weights()?;
    Ok(Weights {
        kd: effective.get(Metric::Kd),
        headshot_pct: effective.get(Metric::HeadshotPct),
        adr: effective.get(Metric::Adr),
        multikill: effective.get(Metric::Multikill),
        clutch: effective.get(Metric::Clutch),
    })
}

fn raw_metrics(raw: &PlayerRawMetrics) -> RawMetrics {
    RawMetrics {
        kills: raw.kills,
        deaths: raw.deaths,
        assists: raw.assists,
        headshot_kills: raw.headshot_kills,
        team_kills: raw.team_kills,
        suicides: raw.suicides,
        damage: raw.damage,
        team_damage: raw.team_damage,
        self_damage: raw.self_damage,
        rounds_played: raw.rounds_played,
        kd: raw.kd_ratio(),
        headshot_pct: raw.headshot_pct(),
        adr: raw.adr(),
        two_kills: raw.multikills(2),
        three_kills: raw.multikills(3),
        four_kills: raw.multikills(4),
        aces: raw.multikills(5),
        multikill_points: raw.multikill_points,
        clutch_wins: raw.clutch_wins,
        clutch_losses: raw.clutch_losses,
        clutch_credit: raw.clutch_credit,
        crosshair_error: raw.crosshair_error(),
        time_to_damage: raw.time_to_damage(),
    }
}

fn normalized_scores(normalized: &NormalizedMetrics) -> NormalizedScores {
    NormalizedScores {
        kd: normalized.kd,
        headshot_pct: normalized.headshot_pct,
        adr: normalized.adr,
        multikill: normalized.multikill,
        clutch: normalized.clutch,
        clutch_win_rate: normalized.clutch_win_rate,
        crosshair: normalized.crosshair,
        time_to_damage: normalized.time_to_damage,
    }
}

/// The stored scores back in the shape the rating engine takes.
pub fn normalized_metrics(player: &PlayerReport) -> NormalizedMetrics {
    let scores = &player.normalized;
    NormalizedMetrics {
        player: PlayerId(player.id),
        kd: scores.kd,
        headshot_pct: scores.headshot_pct,
        adr: scores.adr,
        multikill: scores.multikill,
        clutch: scores.clutch,
        clutch_win_rate: scores.clutch_win_rate,
        crosshair: scores.crosshair,
        time_to_damage: scores.time_to_damage,
    }
}

/// Overwrites the rating part of a player report.
fn apply_rating(player: &mut PlayerReport, result: &RatingResult) {
    player.rating = result.rating;
    player.breakdown = result
        .breakdown
        .iter()
        .map(|c| Contribution {
            metric: metric_key(c.metric),
            normalized: c.normalized,
            weight: c.weight,
            value: c.value,
        })
        .collect();

    if let Some(standing) = result.standing {
        player.percentile = standing.percentile;
        player.placement = standing.placement;
        player.tier = standing.tier.label().to_owned();
    }
}

fn round_report(round: &RoundSummary) -> RoundReport {
    let mut kills = BTreeMap::new();
    let mut deaths = BTreeMap::new();
    for (player, line) in round.players.iter() {
        if line.kills > 0 {
            kills.insert(player.0, line.kills);
        }
        if line.deaths > 0 {
            deaths.insert(player.0, line.deaths);
        }
    }

    RoundReport {
        number: round.number,
        start_tick: round.start_tick,
        end_tick: round.end_tick,
        winner: round.winner.map(|t| t.label().to_owned()),
        reason: round.reason.clone().map(i32::from),
        eliminations: round
            .events
            .iter()
            .map(|event| match event {
                RoundEvent::Kill {
                    tick,
                    attacker,
                    died,
                } => EliminationReport {
                    tick: *tick,
                    attacker: attacker.map(|a| a.0),
                    victim: died.0,
                },
            })
            .collect(),
        kills,
        deaths,
    }
}

fn weapon_reports(stats: &MatchStats) -> Vec<WeaponReport> {
    stats
        .weapons
        .iter()
        .flat_map(|(player, weapons)| {
            weapons.iter().map(move |(weapon, tally)| WeaponReport {
                player: player.0,
                weapon: weapon.clone(),
                kills: tally.kills,
                headshot_kills: tally.headshot_kills,
            })
        })
        .collect()
}

pub fn build_report(
    analysis: &MatchAnalysis,
    source: &str,
    config: &RatingConfig,
    generated_at: chrono::DateTime<chrono::Utc>,
) -> Result<MatchReport, ExportError> {
    let stats = &analysis.stats;

    let mut players = Vec::with_capacity(analysis.ratings.len());
    for (result, normalized) in analysis.ratings.iter().zip(analysis.normalized.iter()) {
        let info = stats.player(result.player);
        let raw = stats
            .metrics
            .get(&result.player)
            .ok_or(ExportError::MissingPlayer(result.player.0))?;

        let mut player = PlayerReport {
            id: result.player.0,
            name: info.map(|p| p.name.clone()).unwrap_or_default(),
            team: info.map(|p| p.team.label().to_owned()).unwrap_or_default(),
            raw: raw_metrics(raw),
            normalized: normalized_scores(normalized),
            rating: 0.0,
            percentile: 0.0,
            placement: 0,
            tier: String::new(),
            breakdown: Vec::new(),
        };
        apply_rating(&mut player, result);
        players.push(player);
    }

    let anomalies = &stats.anomalies;

    Ok(MatchReport {
        info: MatchInfo {
            map: stats.map.clone(),
            source: source.to_owned(),
            rounds: stats.rounds_played(),
            generated_at,
        },
        weights: weights(config)?,
        anomalies: AnomalySummary {
            unknown_player: anomalies.unknown_player,
            round_mismatch: anomalies.round_mismatch,
            outside_round: anomalies.outside_round,
            repeated_elimination: anomalies.repeated_elimination,
        },
        players,
        rounds: stats.rounds.iter().map(round_report).collect(),
        clutches: stats
            .clutches
            .iter()
            .map(|c| ClutchReport {
                round: c.round,
                player: c.player.0,
                situation: c.to_string(),
                opened_at: c.opened_at,
                credit: c.credit,
            })
            .collect(),
        multikills: stats
            .multikills
            .iter()
            .map(|m| MultiKillReport {
                round: m.round,
                player: m.player.0,
                tier: m.tier,
                points: m.points,
            })
            .collect(),
        weapons: weapon_reports(stats),
    })
}

/// Rates a stored report again with new weights. Raw and normalized metrics
/// are left untouched.
#[tracing::instrument(skip_all, fields(source = %report.info.source))]
pub fn rerate(report: &MatchReport, config: &RatingConfig) -> Result<MatchReport, ExportError> {
    let normalized: Vec<NormalizedMetrics> =
        report.players.iter().map(normalized_metrics).collect();
    let results = analysis::pipeline::rate_and_rank(&normalized, config)?;
    let results: BTreeMap<u64, &RatingResult> = results.iter().map(|r| (r.player.0, r)).collect();

    let mut rerated = report.clone();
    rerated.weights = weights(config)?;
    for player in rerated.players.iter_mut() {
        let result = results
            .get(&player.id)
            .ok_or(ExportError::MissingPlayer(player.id))?;
        apply_rating(player, result);
    }

    tracing::debug!(players = rerated.players.len(), "Re-rated report");
    Ok(rerated)
}

pub fn report_path(out_dir: &Path, stem: &str) -> PathBuf {
    out_dir.join(format!("{}_report.json", stem))
}

pub fn stats_path(out_dir: &Path, stem: &str) -> PathBuf {
    out_dir.join(format!("{}_stats.csv", stem))
}

/// `inferno_report.json` names the stem `inferno`.
pub fn stem_of_report(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "match".to_owned());
    match stem.strip_suffix("_report") {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => stem,
    }
}

/// Writes `<stem>_report.json` and `<stem>_stats.csv` into `out_dir`.
pub fn write(
    out_dir: &Path,
    stem: &str,
    report: &MatchReport,
) -> Result<(PathBuf, PathBuf), ExportError> {
    std::fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_owned(),
        source,
    })?;

    let json_path = report_path(out_dir, stem);
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(&json_path, json).map_err(|source| ExportError::Io {
        path: json_path.clone(),
        source,
    })?;

    let csv_path = stats_path(out_dir, stem);
    let rows = report.rows()?;
    let file = std::fs::File::create(&csv_path).map_err(|source| ExportError::Io {
        path: csv_path.clone(),
        source,
    })?;
    common::row::write_csv(std::io::BufWriter::new(file), &rows)?;

    Ok((json_path, csv_path))
}

pub fn read_report(path: &Path) -> anyhow::Result<MatchReport> {
    use anyhow::Context;

    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("decoding {}", path.display()))
}
