//! Weighted composite rating.
//!
//! [`rate`] is a pure function of the normalized metrics and a
//! [`RatingConfig`], so adjusting the weights never requires going back to the
//! events.

use crate::event::PlayerId;
use crate::normalize::{Metric, NormalizedMetrics};
use crate::ranking::Standing;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("rating weights sum to zero")]
    ZeroWeightSum,
    #[error("weight for {metric} must be a finite non-negative number, got {value}")]
    InvalidWeight { metric: Metric, value: f64 },
    #[error("unknown weight key {0:?}")]
    UnknownKey(String),
    #[error("missing weight for {0}")]
    MissingKey(Metric),
    #[error("weight for {0} given twice")]
    DuplicateKey(Metric),
    #[error("malformed weight entry {0:?}, expected key=value")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingConfig {
    pub kd: f64,
    pub headshot_pct: f64,
    pub adr: f64,
    pub multikill: f64,
    pub clutch: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            kd: 0.25,
            headshot_pct: 0.20,
            adr: 0.20,
            multikill: 0.15,
            clutch: 0.20,
        }
    }
}

impl RatingConfig {
    pub fn weight(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Kd => self.kd,
            Metric::HeadshotPct => self.headshot_pct,
            Metric::Adr => self.adr,
            Metric::Multikill => self.multikill,
            Metric::Clutch => self.clutch,
        }
    }

    fn weight_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Kd => &mut self.kd,
            Metric::HeadshotPct => &mut self.headshot_pct,
            Metric::Adr => &mut self.adr,
            Metric::Multikill => &mut self.multikill,
            Metric::Clutch => &mut self.clutch,
        }
    }

    /// Divides every weight by their sum. Weights that do not add up to one
    /// are rescaled rather than rejected.
    pub fn effective_weights(&self) -> Result<EffectiveWeights, ConfigError> {
        for metric in Metric::ALL {
            let value = self.weight(metric);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { metric, value });
            }
        }

        let sum: f64 = Metric::ALL.iter().map(|m| self.weight(*m)).sum();
        if sum <= 0.0 {
            return Err(ConfigError::ZeroWeightSum);
        }
        if (sum - 1.0).abs() > 1e-9 {
            tracing::debug!(sum, "Renormalizing rating weights");
        }

        Ok(EffectiveWeights(Metric::ALL.map(|m| self.weight(m) / sum)))
    }
}

/// Parses `kd=0.3,headshot_pct=0.2,adr=0.2,multikill=0.15,clutch=0.15`.
/// Every key has to appear exactly once.
impl std::str::FromStr for RatingConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = RatingConfig {
            kd: 0.0,
            headshot_pct: 0.0,
            adr: 0.0,
            multikill: 0.0,
            clutch: 0.0,
        };
        let mut seen = [false; 5];

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(entry.to_owned()))?;
            let metric = Metric::from_key(key.trim())
                .ok_or_else(|| ConfigError::UnknownKey(key.trim().to_owned()))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Malformed(entry.to_owned()))?;

            if std::mem::replace(&mut seen[metric.index()], true) {
                return Err(ConfigError::DuplicateKey(metric));
            }
            *config.weight_mut(metric) = value;
        }

        if let Some(missing) = Metric::ALL.into_iter().find(|m| !seen[m.index()]) {
            return Err(ConfigError::MissingKey(missing));
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveWeights([f64; 5]);

impl EffectiveWeights {
    pub fn get(&self, metric: Metric) -> f64 {
        self.0[metric.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Contribution {
    pub metric: Metric,
    pub normalized: f64,
    pub weight: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RatingResult {
    pub player: PlayerId,
    pub rating: f64,
    /// Contributions, largest magnitude first.
    pub breakdown: Vec<Contribution>,
    /// Filled in by [`crate::ranking::rank`].
    pub standing: Option<Standing>,
}

impl RatingResult {
    pub fn contribution(&self, metric: Metric) -> Option<&Contribution> {
        self.breakdown.iter().find(|c| c.metric == metric)
    }
}

pub fn rate_player(normalized: &NormalizedMetrics, weights: &EffectiveWeights) -> RatingResult {
    let mut breakdown: Vec<Contribution> = Metric::ALL
        .iter()
        .map(|metric| {
            let score = normalized.get(*metric);
            let weight = weights.get(*metric);
            Contribution {
                metric: *metric,
                normalized: score,
                weight,
                value: score * weight,
            }
        })
        .collect();

    let rating = breakdown.iter().map(|c| c.value).sum();

    // stable, so equal contributions keep the metric order
    breakdown.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));

    RatingResult {
        player: normalized.player,
        rating,
        breakdown,
        standing: None,
    }
}

pub fn rate(
    normalized: &[NormalizedMetrics],
    config: &RatingConfig,
) -> Result<Vec<RatingResult>, ConfigError> {
    let weights = config.effective_weights()?;
    Ok(normalized.iter().map(|n| rate_player(n, &weights)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_normalized() {
        let weights = RatingConfig::default().effective_weights().unwrap();
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parses_exact_key_set() {
        let config: RatingConfig = "kd=0.5, headshot_pct=0.5, adr=0, multikill=0, clutch=0"
            .parse()
            .unwrap();
        assert_eq!(config.kd, 0.5);
        assert_eq!(config.clutch, 0.0);
    }

    #[test]
    fn parse_rejects_unknown_and_missing_keys() {
        assert_eq!(
            "kd=1,headshot_pct=0,adr=0,multikill=0,clutch=0,assists=1".parse::<RatingConfig>(),
            Err(ConfigError::UnknownKey("assists".to_owned()))
        );
        assert_eq!(
            "kd=1,headshot_pct=0,adr=0,multikill=0".parse::<RatingConfig>(),
            Err(ConfigError::MissingKey(Metric::Clutch))
        );
        assert_eq!(
            "kd=1,kd=0".parse::<RatingConfig>(),
            Err(ConfigError::DuplicateKey(Metric::Kd))
        );
        assert!(matches!(
            "kd:1".parse::<RatingConfig>(),
            Err(ConfigError::Malformed(_))
        ));
    }
}
