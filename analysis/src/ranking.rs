use crate::rating::RatingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Tier {
    Silver,
    SilverElite,
    GoldNova,
    MasterGuardian,
    DistinguishedMasterGuardian,
    LegendaryEagle,
    Supreme,
    GlobalElite,
}

const TIER_THRESHOLDS: [(f64, Tier); 7] = [
    (90.0, Tier::GlobalElite),
    (80.0, Tier::Supreme),
    (70.0, Tier::LegendaryEagle),
    (60.0, Tier::DistinguishedMasterGuardian),
    (50.0, Tier::MasterGuardian),
    (40.0, Tier::GoldNova),
    (30.0, Tier::SilverElite),
];

impl Tier {
    pub fn from_rating(rating: f64) -> Tier {
        TIER_THRESHOLDS
            .iter()
            .find(|(threshold, _)| rating >= *threshold)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Silver)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Silver => "Silver",
            Tier::SilverElite => "Silver Elite",
            Tier::GoldNova => "Gold Nova",
            Tier::MasterGuardian => "Master Guardian",
            Tier::DistinguishedMasterGuardian => "Distinguished Master Guardian",
            Tier::LegendaryEagle => "Legendary Eagle",
            Tier::Supreme => "Supreme",
            Tier::GlobalElite => "Global Elite",
        }
    }

    pub fn from_label(label: &str) -> Option<Tier> {
        [
            Tier::Silver,
            Tier::SilverElite,
            Tier::GoldNova,
            Tier::MasterGuardian,
            Tier::DistinguishedMasterGuardian,
            Tier::LegendaryEagle,
            Tier::Supreme,
            Tier::GlobalElite,
        ]
        .into_iter()
        .find(|t| t.label() == label)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Standing {
    /// Share of the players rated strictly lower, in percent. Tied players
    /// share the average of their ranks.
    pub percentile: f64,
    /// Dense placement by rating, 1 is the best.
    pub placement: usize,
    pub tier: Tier,
}

/// Percentile of `rating` within `population`, which must contain it.
pub fn percentile(rating: f64, population: &[f64]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }

    let lower = population.iter().filter(|r| **r < rating).count();
    let equal = population.iter().filter(|r| **r == rating).count();
    let average_rank = lower as f64 + equal.saturating_sub(1) as f64 / 2.0;

    average_rank / population.len() as f64 * 100.0
}

fn placement(rating: f64, distinct_descending: &[f64]) -> usize {
    distinct_descending
        .iter()
        .position(|r| *r == rating)
        .map(|p| p + 1)
        .unwrap_or(distinct_descending.len() + 1)
}

/// Annotates every result with its standing within the given population.
/// The order of the results is kept.
pub fn rank(results: Vec<RatingResult>) -> Vec<RatingResult> {
    let population: Vec<f64> = results.iter().map(|r| r.rating).collect();

    let mut distinct = population.clone();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();

    results
        .into_iter()
        .map(|result| {
            let standing = Standing {
                percentile: percentile(result.rating, &population),
                placement: placement(result.rating, &distinct),
                tier: Tier::from_rating(result.rating),
            };
            RatingResult {
                standing: Some(standing),
                ..result
            }
        })
        .collect()
}
