//! Raw per player metrics.
//!
//! [`MetricAggregator`] consumes the events of one match in tick order. It
//! drives a [`RoundTracker`] for the alive state and feeds the order
//! sensitive detectors (multi-kills, clutches, crosshair placement and time
//! to damage) from it.

use std::collections::{BTreeMap, HashMap};

use crate::event::{Event, EventKind, OrderingError, Player, PlayerId, Team, Tick, ViewAngles};
use crate::perround::{self, RoundSummary};
use crate::roundtracker::{RoundTracker, Transition};
use crate::settings::Settings;
use crate::source::MatchHeader;

pub mod aim;
pub mod clutch;
pub mod multikill;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRawMetrics {
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
    /// Multi-kill credits, indexed 2k, 3k, 4k, 5k.
    pub multikills: [u32; 4],
    pub multikill_points: f64,
    pub clutch_wins: u32,
    pub clutch_losses: u32,
    pub clutch_credit: f64,
    pub crosshair_error_sum: f64,
    pub crosshair_samples: u32,
    pub time_to_damage_sum: u64,
    pub time_to_damage_samples: u32,
}

impl PlayerRawMetrics {
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(self.deaths)
        }
    }

    /// Share of kills that were headshots, in percent.
    pub fn headshot_pct(&self) -> f64 {
        if self.kills == 0 {
            return 0.0;
        }
        f64::from(self.headshot_kills) / f64::from(self.kills) * 100.0
    }

    pub fn adr(&self) -> f64 {
        if self.rounds_played == 0 {
            return 0.0;
        }
        self.damage as f64 / f64::from(self.rounds_played)
    }

    pub fn clutch_attempts(&self) -> u32 {
        self.clutch_wins + self.clutch_losses
    }

    pub fn clutch_win_rate(&self) -> f64 {
        match self.clutch_attempts() {
            0 => 0.0,
            attempts => f64::from(self.clutch_wins) / f64::from(attempts),
        }
    }

    pub fn multikills(&self, tier: usize) -> u32 {
        match tier {
            2..=5 => self.multikills[tier - 2],
            _ => 0,
        }
    }

    /// Mean crosshair error in degrees, `None` without samples.
    pub fn crosshair_error(&self) -> Option<f64> {
        (self.crosshair_samples > 0)
            .then(|| self.crosshair_error_sum / f64::from(self.crosshair_samples))
    }

    /// Mean time to damage in ticks, `None` without samples.
    pub fn time_to_damage(&self) -> Option<f64> {
        (self.time_to_damage_samples > 0)
            .then(|| self.time_to_damage_sum as f64 / f64::from(self.time_to_damage_samples))
    }

    pub fn merge(&mut self, other: &PlayerRawMetrics) {
        self.kills += other.kills;
        self.deaths += other.deaths;
        self.assists += other.assists;
        self.headshot_kills += other.headshot_kills;
        self.team_kills += other.team_kills;
        self.suicides += other.suicides;
        self.damage += other.damage;
        self.team_damage += other.team_damage;
        self.self_damage += other.self_damage;
        self.rounds_played += other.rounds_played;
        for (mine, theirs) in self.multikills.iter_mut().zip(other.multikills.iter()) {
            *mine += theirs;
        }
        self.multikill_points += other.multikill_points;
        self.clutch_wins += other.clutch_wins;
        self.clutch_losses += other.clutch_losses;
        self.clutch_credit += other.clutch_credit;
        self.crosshair_error_sum += other.crosshair_error_sum;
        self.crosshair_samples += other.crosshair_samples;
        self.time_to_damage_sum += other.time_to_damage_sum;
        self.time_to_damage_samples += other.time_to_damage_samples;
    }
}

/// Non fatal problems seen while ingesting. The offending events are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Anomalies {
    pub unknown_player: usize,
    pub round_mismatch: usize,
    pub outside_round: usize,
    pub repeated_elimination: usize,
}

impl Anomalies {
    pub fn total(&self) -> usize {
        self.unknown_player + self.round_mismatch + self.outside_round + self.repeated_elimination
    }

    pub fn merge(&mut self, other: &Anomalies) {
        self.unknown_player += other.unknown_player;
        self.round_mismatch += other.round_mismatch;
        self.outside_round += other.outside_round;
        self.repeated_elimination += other.repeated_elimination;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WeaponTally {
    pub kills: u32,
    pub headshot_kills: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClutchRecord {
    pub round: u32,
    pub player: PlayerId,
    pub enemies: usize,
    pub won: bool,
    pub opened_at: Tick,
    pub credit: f64,
}

impl std::fmt::Display for ClutchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = if self.won { "win" } else { "loss" };
        write!(f, "1v{} {}", self.enemies, outcome)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MultiKillRecord {
    pub round: u32,
    pub player: PlayerId,
    pub tier: usize,
    pub points: f64,
}

/// Everything the aggregator learned about one match.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchStats {
    pub map: String,
    pub players: Vec<Player>,
    pub metrics: BTreeMap<PlayerId, PlayerRawMetrics>,
    pub weapons: BTreeMap<PlayerId, BTreeMap<String, WeaponTally>>,
    pub rounds: Vec<RoundSummary>,
    pub clutches: Vec<ClutchRecord>,
    pub multikills: Vec<MultiKillRecord>,
    pub anomalies: Anomalies,
}

impl MatchStats {
    pub fn empty(header: &MatchHeader) -> Self {
        Self {
            map: header.map.clone(),
            players: header.players.clone(),
            metrics: header
                .players
                .iter()
                .map(|p| (p.id, PlayerRawMetrics::default()))
                .collect(),
            weapons: BTreeMap::new(),
            rounds: Vec::new(),
            clutches: Vec::new(),
            multikills: Vec::new(),
            anomalies: Anomalies::default(),
        }
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds.iter().filter(|r| r.end_tick.is_some()).count()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Combines the statistics of two disjoint parts of the same match.
    pub fn merge(mut self, other: MatchStats) -> MatchStats {
        for (id, metrics) in other.metrics.iter() {
            self.metrics.entry(*id).or_default().merge(metrics);
        }
        for (id, weapons) in other.weapons {
            let mine = self.weapons.entry(id).or_default();
            for (weapon, tally) in weapons {
                let entry = mine.entry(weapon).or_default();
                entry.kills += tally.kills;
                entry.headshot_kills += tally.headshot_kills;
            }
        }
        self.rounds.extend(other.rounds);
        self.clutches.extend(other.clutches);
        self.multikills.extend(other.multikills);
        self.anomalies.merge(&other.anomalies);

        self.sort_records();
        self
    }

    fn sort_records(&mut self) {
        self.rounds.sort_by_key(|r| (r.start_tick, r.number));
        self.clutches.sort_by_key(|c| (c.round, c.player));
        self.multikills.sort_by_key(|m| (m.round, m.player));
    }
}

#[derive(Debug, Clone)]
pub struct MetricAggregator {
    settings: Settings,
    header: MatchHeader,
    teams: HashMap<PlayerId, Team>,
    tracker: RoundTracker,
    metrics: BTreeMap<PlayerId, PlayerRawMetrics>,
    weapons: BTreeMap<PlayerId, BTreeMap<String, WeaponTally>>,
    multikill: multikill::MultiKillTracker,
    clutch: clutch::ClutchTracker,
    aim: aim::AimTracker,
    clutches: Vec<ClutchRecord>,
    multikills: Vec<MultiKillRecord>,
    anomalies: Anomalies,
}

impl MetricAggregator {
    pub fn new(header: &MatchHeader, settings: Settings) -> Self {
        Self {
            teams: header.players.iter().map(|p| (p.id, p.team)).collect(),
            tracker: RoundTracker::new(&header.players),
            metrics: header
                .players
                .iter()
                .map(|p| (p.id, PlayerRawMetrics::default()))
                .collect(),
            weapons: BTreeMap::new(),
            multikill: multikill::MultiKillTracker::new(settings.multikill_window),
            clutch: clutch::ClutchTracker::default(),
            aim: aim::AimTracker::new(settings.crosshair_lookback, settings.visibility_lapse_tolerance),
            clutches: Vec::new(),
            multikills: Vec::new(),
            anomalies: Anomalies::default(),
            header: header.clone(),
            settings,
        }
    }

    pub fn tracker(&self) -> &RoundTracker {
        &self.tracker
    }

    pub fn anomalies(&self) -> &Anomalies {
        &self.anomalies
    }

    /// Consumes one event. Only a tick regression is an error, everything
    /// else that does not fit is dropped and counted.
    pub fn ingest(&mut self, event: &Event) -> Result<(), OrderingError> {
        tracing::trace!(tick = event.tick, round = event.round, kind = ?event.kind, "Event");

        if let Some(unknown) = event.players().find(|p| !self.teams.contains_key(p)) {
            self.tracker.observe(event.tick)?;
            self.anomalies.unknown_player += 1;
            tracing::debug!(tick = event.tick, player = %unknown, "Dropping event for unknown player");
            return Ok(());
        }

        let active_round = self.tracker.current().map(|r| r.number);
        match (&event.kind, active_round) {
            (EventKind::RoundStart, _) => {}
            (_, None) => {
                self.tracker.observe(event.tick)?;
                self.anomalies.outside_round += 1;
                return Ok(());
            }
            (_, Some(active)) if active != event.round => {
                self.tracker.observe(event.tick)?;
                self.anomalies.round_mismatch += 1;
                tracing::debug!(tick = event.tick, active, round = event.round, "Dropping event for another round");
                return Ok(());
            }
            _ => {}
        };

        let transition = self.tracker.advance(event)?;

        match &event.kind {
            EventKind::RoundStart => self.start_round(event.tick, event.round),
            EventKind::RoundEnd { winner, .. } => self.end_round(event.round, *winner),
            EventKind::Kill {
                attacker,
                victim,
                assister,
                headshot,
                weapon,
                attacker_view,
            } => {
                if let Transition::AlreadyEliminated { .. } = transition {
                    self.anomalies.repeated_elimination += 1;
                    tracing::debug!(tick = event.tick, victim = %victim, "Victim was already eliminated");
                    return Ok(());
                }
                self.kill(
                    event.tick,
                    *attacker,
                    *victim,
                    *assister,
                    *headshot,
                    weapon.as_deref(),
                    *attacker_view,
                );
            }
            EventKind::Damage {
                attacker,
                victim,
                amount,
            } => {
                if let Some(attacker) = attacker {
                    self.damage(event.tick, *attacker, *victim, *amount);
                }
            }
            EventKind::VisibilitySample {
                observer,
                target,
                visible,
                observer_position,
                target_position,
            } => {
                self.aim.observe(
                    event.tick,
                    *observer,
                    *target,
                    *visible,
                    *observer_position,
                    *target_position,
                );
            }
            EventKind::ShotFired { shooter, view } => {
                if let Some(error) = self.aim.shot_error(event.tick, *shooter, *view) {
                    let metrics = self.metrics.entry(*shooter).or_default();
                    metrics.crosshair_error_sum += error;
                    metrics.crosshair_samples += 1;
                }
            }
        };

        Ok(())
    }

    fn start_round(&mut self, tick: Tick, round: u32) {
        self.credit_multikills();
        self.multikill.start_round(round);
        self.clutch.start_round();
        self.aim.reset();

        // short handed rosters can be in a clutch from the first tick
        if let Some(state) = self.tracker.current() {
            self.clutch.observe(state, tick);
        }
    }

    fn end_round(&mut self, round: u32, winner: Option<Team>) {
        self.credit_multikills();

        for (clutch, won) in self.clutch.finish_round(winner) {
            let credit = self.settings.clutch_credit(clutch.enemies, won);
            let metrics = self.metrics.entry(clutch.player).or_default();
            if won {
                metrics.clutch_wins += 1;
            } else {
                metrics.clutch_losses += 1;
            }
            metrics.clutch_credit += credit;

            self.clutches.push(ClutchRecord {
                round,
                player: clutch.player,
                enemies: clutch.enemies,
                won,
                opened_at: clutch.opened_at,
                credit,
            });
        }

        for player in self.header.players.iter() {
            self.metrics.entry(player.id).or_default().rounds_played += 1;
        }
    }

    fn credit_multikills(&mut self) {
        for (round, player, tier) in self.multikill.finish_round() {
            let points = self.settings.multikill_points(tier);
            let metrics = self.metrics.entry(player).or_default();
            metrics.multikills[tier - 2] += 1;
            metrics.multikill_points += points;

            self.multikills.push(MultiKillRecord {
                round,
                player,
                tier,
                points,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn kill(
        &mut self,
        tick: Tick,
        attacker: Option<PlayerId>,
        victim: PlayerId,
        assister: Option<PlayerId>,
        headshot: bool,
        weapon: Option<&str>,
        attacker_view: Option<ViewAngles>,
    ) {
        self.metrics.entry(victim).or_default().deaths += 1;
        let victim_team = self.teams.get(&victim).copied();

        match attacker {
            Some(attacker) if attacker == victim => {
                self.metrics.entry(attacker).or_default().suicides += 1;
            }
            Some(attacker) if self.teams.get(&attacker).copied() == victim_team => {
                self.metrics.entry(attacker).or_default().team_kills += 1;
            }
            Some(attacker) => {
                let metrics = self.metrics.entry(attacker).or_default();
                metrics.kills += 1;
                if headshot {
                    metrics.headshot_kills += 1;
                }

                if let Some(view) = attacker_view {
                    if let Some(error) = self.aim.kill_error(tick, attacker, victim, view) {
                        metrics.crosshair_error_sum += error;
                        metrics.crosshair_samples += 1;
                    }
                }

                if let Some(weapon) = weapon {
                    let tally = self
                        .weapons
                        .entry(attacker)
                        .or_default()
                        .entry(weapon.to_owned())
                        .or_default();
                    tally.kills += 1;
                    if headshot {
                        tally.headshot_kills += 1;
                    }
                }

                self.multikill.record(attacker, tick);
            }
            None => {}
        };

        if let Some(assister) = assister.filter(|a| Some(*a) != attacker) {
            if self.teams.get(&assister).copied() != victim_team {
                self.metrics.entry(assister).or_default().assists += 1;
            }
        }

        if let Some(round) = self.tracker.current() {
            self.clutch.observe(round, tick);
        }
    }

    fn damage(&mut self, tick: Tick, attacker: PlayerId, victim: PlayerId, amount: u32) {
        let same_team = self.teams.get(&attacker) == self.teams.get(&victim);
        let time_to_damage = self.aim.time_to_damage(tick, attacker, victim);

        let metrics = self.metrics.entry(attacker).or_default();
        if attacker == victim {
            metrics.self_damage += u64::from(amount);
        } else if same_team {
            metrics.team_damage += u64::from(amount);
        } else {
            metrics.damage += u64::from(amount);
            if let Some(ticks) = time_to_damage {
                metrics.time_to_damage_sum += u64::from(ticks);
                metrics.time_to_damage_samples += 1;
            }
        }
    }

    /// The statistics as they stand, counting a still running round's
    /// multi-kills but none of its open clutch situations.
    pub fn snapshot(&self) -> MatchStats {
        self.clone().finish()
    }

    pub fn finish(mut self) -> MatchStats {
        self.credit_multikills();

        let mut stats = MatchStats {
            map: self.header.map,
            players: self.header.players,
            metrics: self.metrics,
            weapons: self.weapons,
            rounds: perround::summarize(&self.tracker),
            clutches: self.clutches,
            multikills: self.multikills,
            anomalies: self.anomalies,
        };
        stats.sort_records();
        stats
    }
}

/// Convenience for tests and tools that already hold the whole event list.
pub fn aggregate_events<'e, I>(
    header: &MatchHeader,
    settings: Settings,
    events: I,
) -> Result<MatchStats, OrderingError>
where
    I: IntoIterator<Item = &'e Event>,
{
    let mut aggregator = MetricAggregator::new(header, settings);
    for event in events {
        aggregator.ingest(event)?;
    }
    Ok(aggregator.finish())
}
