use std::collections::BTreeMap;

use crate::event::{EndReason, PlayerId, Team, Tick};
use crate::roundtracker::RoundTracker;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundSummary {
    pub number: u32,
    pub start_tick: Tick,
    pub end_tick: Option<Tick>,
    pub winner: Option<Team>,
    pub reason: Option<EndReason>,
    pub events: Vec<RoundEvent>,
    pub players: BTreeMap<PlayerId, RoundLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RoundEvent {
    Kill {
        tick: Tick,
        attacker: Option<PlayerId>,
        died: PlayerId,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundLine {
    pub kills: u32,
    pub deaths: u32,
}

impl RoundLine {
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(self.deaths)
        }
    }
}

/// Round by round view of what the tracker saw. Only kills on enemies are
/// counted as kills, every elimination counts as a death.
pub fn summarize(tracker: &RoundTracker) -> Vec<RoundSummary> {
    tracker
        .rounds()
        .map(|round| {
            let _guard = tracing::debug_span!("Round", number = round.number).entered();

            let mut players = BTreeMap::<PlayerId, RoundLine>::new();
            let mut events = Vec::with_capacity(round.eliminations.len());

            for elimination in round.eliminations.iter() {
                players.entry(elimination.victim).or_default().deaths += 1;

                let enemy_kill = elimination
                    .attacker
                    .filter(|attacker| *attacker != elimination.victim)
                    .filter(|attacker| {
                        tracker.team_of(*attacker) != tracker.team_of(elimination.victim)
                    });
                if let Some(attacker) = enemy_kill {
                    players.entry(attacker).or_default().kills += 1;
                }

                events.push(RoundEvent::Kill {
                    tick: elimination.tick,
                    attacker: elimination.attacker,
                    died: elimination.victim,
                });
            }

            tracing::trace!(eliminations = events.len(), "Summarized round");

            RoundSummary {
                number: round.number,
                start_tick: round.start_tick,
                end_tick: round.outcome.as_ref().map(|o| o.end_tick),
                winner: round.outcome.as_ref().and_then(|o| o.winner),
                reason: round.outcome.as_ref().map(|o| o.reason.clone()),
                events,
                players,
            }
        })
        .collect()
}
