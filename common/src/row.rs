//! Flat, one row per player, view of a report.
//!
//! Every metric of the breakdown gets a weight and a contribution column; the
//! breakdown order is kept in `breakdown_order` as `;` separated metric keys,
//! so a row converts back into the exact [`PlayerReport`] it came from.

pub use csv::Error as CsvError;

use crate::report::{Contribution, MetricKey, NormalizedScores, PlayerReport, RawMetrics};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("unknown metric {0:?} in breakdown order")]
    UnknownMetric(String),
    #[error("metric {0} appears twice in the breakdown")]
    DuplicateMetric(MetricKey),
    #[error("breakdown has no entry for {0}")]
    MissingMetric(MetricKey),
    #[error("breakdown value for {0} does not match the normalized score")]
    Inconsistent(MetricKey),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRow {
    pub id: u64,
    pub name: String,
    pub team: String,

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

    pub norm_kd: f64,
    pub norm_headshot_pct: f64,
    pub norm_adr: f64,
    pub norm_multikill: f64,
    pub norm_clutch: f64,
    pub norm_clutch_win_rate: f64,
    pub norm_crosshair: Option<f64>,
    pub norm_time_to_damage: Option<f64>,

    pub rating: f64,
    pub percentile: f64,
    pub placement: usize,
    pub tier: String,

    pub weight_kd: f64,
    pub weight_headshot_pct: f64,
    pub weight_adr: f64,
    pub weight_multikill: f64,
    pub weight_clutch: f64,

    pub contrib_kd: f64,
    pub contrib_headshot_pct: f64,
    pub contrib_adr: f64,
    pub contrib_multikill: f64,
    pub contrib_clutch: f64,

    pub breakdown_order: String,
}

impl PlayerRow {
    fn weight(&self, metric: MetricKey) -> f64 {
        match metric {
            MetricKey::Kd => self.weight_kd,
            MetricKey::HeadshotPct => self.weight_headshot_pct,
            MetricKey::Adr => self.weight_adr,
            MetricKey::Multikill => self.weight_multikill,
            MetricKey::Clutch => self.weight_clutch,
        }
    }

    fn contribution(&self, metric: MetricKey) -> f64 {
        match metric {
            MetricKey::Kd => self.contrib_kd,
            MetricKey::HeadshotPct => self.contrib_headshot_pct,
            MetricKey::Adr => self.contrib_adr,
            MetricKey::Multikill => self.contrib_multikill,
            MetricKey::Clutch => self.contrib_clutch,
        }
    }

    fn set_contribution(&mut self, contribution: &Contribution) {
        let (weight, value) = match contribution.metric {
            MetricKey::Kd => (&mut self.weight_kd, &mut self.contrib_kd),
            MetricKey::HeadshotPct => (&mut self.weight_headshot_pct, &mut self.contrib_headshot_pct),
            MetricKey::Adr => (&mut self.weight_adr, &mut self.contrib_adr),
            MetricKey::Multikill => (&mut self.weight_multikill, &mut self.contrib_multikill),
            MetricKey::Clutch => (&mut self.weight_clutch, &mut self.contrib_clutch),
        };
        *weight = contribution.weight;
        *value = contribution.value;
    }

    fn breakdown_keys(&self) -> Result<Vec<MetricKey>, RowError> {
        let mut keys = Vec::with_capacity(MetricKey::ALL.len());
        for key in self.breakdown_order.split(';').filter(|k| !k.is_empty()) {
            let metric = MetricKey::from_key(key).ok_or_else(|| RowError::UnknownMetric(key.to_owned()))?;
            if keys.contains(&metric) {
                return Err(RowError::DuplicateMetric(metric));
            }
            keys.push(metric);
        }
        check_complete(&keys)?;
        Ok(keys)
    }
}

fn check_complete(keys: &[MetricKey]) -> Result<(), RowError> {
    match MetricKey::ALL.into_iter().find(|m| !keys.contains(m)) {
        Some(missing) => Err(RowError::MissingMetric(missing)),
        None => Ok(()),
    }
}

impl TryFrom<&PlayerReport> for PlayerRow {
    type Error = RowError;

    fn try_from(report: &PlayerReport) -> Result<Self, Self::Error> {
        let mut keys = Vec::with_capacity(report.breakdown.len());
        for contribution in report.breakdown.iter() {
            if keys.contains(&contribution.metric) {
                return Err(RowError::DuplicateMetric(contribution.metric));
            }
            if contribution.normalized != report.normalized.get(contribution.metric) {
                return Err(RowError::Inconsistent(contribution.metric));
            }
            keys.push(contribution.metric);
        }
        check_complete(&keys)?;

        let raw = &report.raw;
        let normalized = &report.normalized;
        let mut row = PlayerRow {
            id: report.id,
            name: report.name.clone(),
            team: report.team.clone(),
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
            kd: raw.kd,
            headshot_pct: raw.headshot_pct,
            adr: raw.adr,
            two_kills: raw.two_kills,
            three_kills: raw.three_kills,
            four_kills: raw.four_kills,
            aces: raw.aces,
            multikill_points: raw.multikill_points,
            clutch_wins: raw.clutch_wins,
            clutch_losses: raw.clutch_losses,
            clutch_credit: raw.clutch_credit,
            crosshair_error: raw.crosshair_error,
            time_to_damage: raw.time_to_damage,
            norm_kd: normalized.kd,
            norm_headshot_pct: normalized.headshot_pct,
            norm_adr: normalized.adr,
            norm_multikill: normalized.multikill,
            norm_clutch: normalized.clutch,
            norm_clutch_win_rate: normalized.clutch_win_rate,
            norm_crosshair: normalized.crosshair,
            norm_time_to_damage: normalized.time_to_damage,
            rating: report.rating,
            percentile: report.percentile,
            placement: report.placement,
            tier: report.tier.clone(),
            weight_kd: 0.0,
            weight_headshot_pct: 0.0,
            weight_adr: 0.0,
            weight_multikill: 0.0,
            weight_clutch: 0.0,
            contrib_kd: 0.0,
            contrib_headshot_pct: 0.0,
            contrib_adr: 0.0,
            contrib_multikill: 0.0,
            contrib_clutch: 0.0,
            breakdown_order: keys.iter().map(|k| k.key()).collect::<Vec<_>>().join(";"),
        };
        for contribution in report.breakdown.iter() {
            row.set_contribution(contribution);
        }

        Ok(row)
    }
}

impl TryFrom<PlayerRow> for PlayerReport {
    type Error = RowError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        let normalized = NormalizedScores {
            kd: row.norm_kd,
            headshot_pct: row.norm_headshot_pct,
            adr: row.norm_adr,
            multikill: row.norm_multikill,
            clutch: row.norm_clutch,
            clutch_win_rate: row.norm_clutch_win_rate,
            crosshair: row.norm_crosshair,
            time_to_damage: row.norm_time_to_damage,
        };

        let breakdown = row
            .breakdown_keys()?
            .into_iter()
            .map(|metric| Contribution {
                metric,
                normalized: normalized.get(metric),
                weight: row.weight(metric),
                value: row.contribution(metric),
            })
            .collect();

        Ok(PlayerReport {
            id: row.id,
            name: row.name,
            team: row.team,
            raw: RawMetrics {
                kills: row.kills,
                deaths: row.deaths,
                assists: row.assists,
                headshot_kills: row.headshot_kills,
                team_kills: row.team_kills,
                suicides: row.suicides,
                damage: row.damage,
                team_damage: row.team_damage,
                self_damage: row.self_damage,
                rounds_played: row.rounds_played,
                kd: row.kd,
                headshot_pct: row.headshot_pct,
                adr: row.adr,
                two_kills: row.two_kills,
                three_kills: row.three_kills,
                four_kills: row.four_kills,
                aces: row.aces,
                multikill_points: row.multikill_points,
                clutch_wins: row.clutch_wins,
                clutch_losses: row.clutch_losses,
                clutch_credit: row.clutch_credit,
                crosshair_error: row.crosshair_error,
                time_to_damage: row.time_to_damage,
            },
            normalized,
            rating: row.rating,
            percentile: row.percentile,
            placement: row.placement,
            tier: row.tier,
            breakdown,
        })
    }
}

pub fn write_csv<W>(writer: W, rows: &[PlayerRow]) -> Result<(), CsvError>
where
    W: std::io::Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv<R>(reader: R) -> Result<Vec<PlayerRow>, CsvError>
where
    R: std::io::Read,
{
    csv::Reader::from_reader(reader).deserialize().collect()
}
