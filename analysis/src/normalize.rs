//! Min-max scaling of raw metrics onto 0..=100 over the players of a match.
//!
//! Rate metrics are derived from the raw counters first (K/D, headshot
//! percentage, ADR, clutch win rate) and then scaled, so damage points and kill
//! counts end up on the same scale. With fewer than two participating players,
//! or when every participant has the same value, the score is the midpoint 50.

use std::collections::BTreeMap;

use crate::aggregate::PlayerRawMetrics;
use crate::event::PlayerId;

pub const MIDPOINT: f64 = 50.0;
pub const SCALE: f64 = 100.0;

/// The metrics that take part in the composite rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Kd,
    HeadshotPct,
    Adr,
    Multikill,
    Clutch,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Kd,
        Metric::HeadshotPct,
        Metric::Adr,
        Metric::Multikill,
        Metric::Clutch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Kd => "kd",
            Metric::HeadshotPct => "headshot_pct",
            Metric::Adr => "adr",
            Metric::Multikill => "multikill",
            Metric::Clutch => "clutch",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Values derived from the raw counters, before scaling.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DerivedMetrics {
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub multikill_points: f64,
    pub clutch_credit: f64,
    pub clutch_win_rate: f64,
    pub crosshair_error: Option<f64>,
    pub time_to_damage: Option<f64>,
}

impl From<&PlayerRawMetrics> for DerivedMetrics {
    fn from(raw: &PlayerRawMetrics) -> Self {
        Self {
            kd: raw.kd_ratio(),
            headshot_pct: raw.headshot_pct(),
            adr: raw.adr(),
            multikill_points: raw.multikill_points,
            clutch_credit: raw.clutch_credit,
            clutch_win_rate: raw.clutch_win_rate(),
            crosshair_error: raw.crosshair_error(),
            time_to_damage: raw.time_to_damage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedMetrics {
    pub player: PlayerId,
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub multikill: f64,
    pub clutch: f64,
    pub clutch_win_rate: f64,
    /// Lower raw error scores higher. `None` for players without samples.
    pub crosshair: Option<f64>,
    /// Faster damage scores higher. `None` for players without samples.
    pub time_to_damage: Option<f64>,
}

impl NormalizedMetrics {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Kd => self.kd,
            Metric::HeadshotPct => self.headshot_pct,
            Metric::Adr => self.adr,
            Metric::Multikill => self.multikill,
            Metric::Clutch => self.clutch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

fn min_max(values: &[Option<f64>], direction: Direction) -> Vec<Option<f64>> {
    let population: Vec<f64> = values.iter().flatten().copied().collect();

    let (min, max) = population
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(*v), max.max(*v))
        });
    let spread = max - min;
    let degenerate = population.len() < 2 || !(spread > f64::EPSILON);

    values
        .iter()
        .map(|value| {
            value.map(|v| {
                if degenerate {
                    return MIDPOINT;
                }
                let scaled = (v - min) / spread * SCALE;
                match direction {
                    Direction::HigherIsBetter => scaled,
                    Direction::LowerIsBetter => SCALE - scaled,
                }
            })
        })
        .collect()
}

fn column<F>(derived: &[DerivedMetrics], direction: Direction, f: F) -> Vec<f64>
where
    F: Fn(&DerivedMetrics) -> f64,
{
    let values: Vec<Option<f64>> = derived.iter().map(|d| Some(f(d))).collect();
    min_max(&values, direction)
        .into_iter()
        .map(|v| v.unwrap_or(MIDPOINT))
        .collect()
}

fn optional_column<F>(derived: &[DerivedMetrics], direction: Direction, f: F) -> Vec<Option<f64>>
where
    F: Fn(&DerivedMetrics) -> Option<f64>,
{
    let values: Vec<Option<f64>> = derived.iter().map(f).collect();
    min_max(&values, direction)
}

/// Scales every player's metrics against the whole population passed in.
/// The result is ordered by player id.
pub fn normalize(raw: &BTreeMap<PlayerId, PlayerRawMetrics>) -> Vec<NormalizedMetrics> {
    let players: Vec<PlayerId> = raw.keys().copied().collect();
    let derived: Vec<DerivedMetrics> = raw.values().map(DerivedMetrics::from).collect();

    let kd = column(&derived, Direction::HigherIsBetter, |d| d.kd);
    let headshot_pct = column(&derived, Direction::HigherIsBetter, |d| d.headshot_pct);
    let adr = column(&derived, Direction::HigherIsBetter, |d| d.adr);
    let multikill = column(&derived, Direction::HigherIsBetter, |d| d.multikill_points);
    let clutch = column(&derived, Direction::HigherIsBetter, |d| d.clutch_credit);
    let clutch_win_rate = column(&derived, Direction::HigherIsBetter, |d| d.clutch_win_rate);
    let crosshair = optional_column(&derived, Direction::LowerIsBetter, |d| d.crosshair_error);
    let time_to_damage = optional_column(&derived, Direction::LowerIsBetter, |d| d.time_to_damage);

    tracing::debug!(players = players.len(), "Normalized match metrics");

    players
        .into_iter()
        .enumerate()
        .map(|(i, player)| NormalizedMetrics {
            player,
            kd: kd[i],
            headshot_pct: headshot_pct[i],
            adr: adr[i],
            multikill: multikill[i],
            clutch: clutch[i],
            clutch_win_rate: clutch_win_rate[i],
            crosshair: crosshair[i],
            time_to_damage: time_to_damage[i],
        })
        .collect()
}
