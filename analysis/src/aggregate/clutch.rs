use std::collections::BTreeSet;

use crate::event::{PlayerId, Team, Tick};
use crate::roundtracker::RoundState;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenClutch {
    pub player: PlayerId,
    pub team: Team,
    pub enemies: usize,
    pub opened_at: Tick,
}

/// Watches a round for 1vN situations.
///
/// A situation opens the moment a team is down to its last player while at
/// least one enemy is alive, including a player who starts the round alone
/// against several enemies. A round that starts one against one is no clutch.
/// Each player can open at most one situation per round.
#[derive(Debug, Clone, Default)]
pub struct ClutchTracker {
    open: Vec<OpenClutch>,
    seen: BTreeSet<PlayerId>,
}

impl ClutchTracker {
    pub fn start_round(&mut self) {
        self.open.clear();
        self.seen.clear();
    }

    pub fn observe(&mut self, round: &RoundState, tick: Tick) {
        for team in Team::ALL {
            if round.alive_count(team) != 1 {
                continue;
            }
            if round.started_with(team) < 2 && round.started_with(team.opponent()) < 2 {
                continue;
            }

            let enemies = round.alive_count(team.opponent());
            if enemies == 0 {
                continue;
            }

            let player = match round.alive_players(team).next() {
                Some(p) => p,
                None => continue,
            };
            if !self.seen.insert(player) {
                continue;
            }

            tracing::debug!(round = round.number, %player, enemies, "Clutch situation opened");
            self.open.push(OpenClutch {
                player,
                team,
                enemies,
                opened_at: tick,
            });
        }
    }

    /// Resolves every open situation against the round winner.
    pub fn finish_round(&mut self, winner: Option<Team>) -> Vec<(OpenClutch, bool)> {
        self.seen.clear();
        std::mem::take(&mut self.open)
            .into_iter()
            .map(|clutch| {
                let won = winner == Some(clutch.team);
                (clutch, won)
            })
            .collect()
    }
}
