//! Exported match reports.
//!
//! A report comes in two shapes that carry the same information: the nested
//! [`MatchReport`] written as JSON, and one flat [`PlayerRow`] per player
//! written as CSV.

pub mod report;
pub mod row;

pub use report::{
    AnomalySummary, ClutchReport, Contribution, EliminationReport, MatchReport, MetricKey,
    MultiKillReport, NormalizedScores, PlayerReport, RawMetrics, RoundReport, WeaponReport,
    Weights,
};
pub use row::{PlayerRow, RowError};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchInfo {
    pub map: String,
    pub source: String,
    pub rounds: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
