use std::collections::BTreeMap;

use crate::MatchInfo;

/// The weighted metrics, as they appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Kd,
    HeadshotPct,
    Adr,
    Multikill,
    Clutch,
}

impl MetricKey {
    pub const ALL: [MetricKey; 5] = [
        MetricKey::Kd,
        MetricKey::HeadshotPct,
        MetricKey::Adr,
        MetricKey::Multikill,
        MetricKey::Clutch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricKey::Kd => "kd",
            MetricKey::HeadshotPct => "headshot_pct",
            MetricKey::Adr => "adr",
            MetricKey::Multikill => "multikill",
            MetricKey::Clutch => "clutch",
        }
    }

    pub fn from_key(key: &str) -> Option<MetricKey> {
        MetricKey::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Weights {
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub multikill: f64,
    pub clutch: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchReport {
    pub info: MatchInfo,
    /// Effective weights the ratings were computed with.
    pub weights: Weights,
    pub anomalies: AnomalySummary,
    pub players: Vec<PlayerReport>,
    pub rounds: Vec<RoundReport>,
    pub clutches: Vec<ClutchReport>,
    pub multikills: Vec<MultiKillReport>,
    pub weapons: Vec<WeaponReport>,
}

impl MatchReport {
    pub fn player(&self, id: u64) -> Option<&PlayerReport> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn rows(&self) -> Result<Vec<crate::PlayerRow>, crate::RowError> {
        self.players.iter().map(crate::PlayerRow::try_from).collect()
    }

    /// Players ordered by placement, best first.
    pub fn leaderboard(&self) -> Vec<&PlayerReport> {
        let mut players: Vec<&PlayerReport> = self.players.iter().collect();
        players.sort_by_key(|p| (p.placement, p.id));
        players
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnomalySummary {
    pub unknown_player: usize,
    pub round_mismatch: usize,
    pub outside_round: usize,
    pub repeated_elimination: usize,
}

impl AnomalySummary {
    pub fn total(&self) -> usize {
        self.unknown_player + self.round_mismatch + self.outside_round + self.repeated_elimination
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerReport {
    pub id: u64,
    pub name: String,
    pub team: String,
    pub raw: RawMetrics,
    pub normalized: NormalizedScores,
    pub rating: f64,
    pub percentile: f64,
    pub placement: usize,
    pub tier: String,
    /// Largest contribution first.
    pub breakdown: Vec<Contribution>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawMetrics {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshot_kills: u32,
    pub team_kills: u32,
    pub suicides: u32,
    pub damage: u64,
    pub team_damage: u64,
    pub self_damage: u64,
    pub rounds_played: u32,
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub two_kills: u32,
    pub three_kills: u32,
    pub four_kills: u32,
    pub aces: u32,
    pub multikill_points: f64,
    pub clutch_wins: u32,
    pub clutch_losses: u32,
    pub clutch_credit: f64,
    pub crosshair_error: Option<f64>,
    pub time_to_damage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedScores {
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub multikill: f64,
    pub clutch: f64,
    pub clutch_win_rate: f64,
    pub crosshair: Option<f64>,
    pub time_to_damage: Option<f64>,
}

impl NormalizedScores {
    pub fn get(&self, metric: MetricKey) -> f64 {
        match metric {
            MetricKey::Kd => self.kd,
            MetricKey::HeadshotPct => self.headshot_pct,
            MetricKey::Adr => self.adr,
            MetricKey::Multikill => self.multikill,
            MetricKey::Clutch => self.clutch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Contribution {
    pub metric: MetricKey,
    pub normalized: f64,
    pub weight: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundReport {
    pub number: u32,
    pub start_tick: u32,
    pub end_tick: Option<u32>,
    pub winner: Option<String>,
    /// Round end reason code, as found in the recording.
    pub reason: Option<i32>,
    pub eliminations: Vec<EliminationReport>,
    pub kills: BTreeMap<u64, u32>,
    pub deaths: BTreeMap<u64, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EliminationReport {
    pub tick: u32,
    pub attacker: Option<u64>,
    pub victim: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClutchReport {
    pub round: u32,
    pub player: u64,
    /// `1v2 win`, `1v3 loss` and so on.
    pub situation: String,
    pub opened_at: u32,
    pub credit: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MultiKillReport {
    pub round: u32,
    pub player: u64,
    pub tier: usize,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WeaponReport {
    pub player: u64,
    pub weapon: String,
    pub kills: u32,
    pub headshot_kills: u32,
}
