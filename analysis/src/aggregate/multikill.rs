use std::collections::BTreeMap;

use crate::event::{PlayerId, Tick};

#[derive(Debug, Clone, Copy)]
struct Streak {
    last_kill: Tick,
    size: usize,
}

/// Chains kills of the same player inside one round. Two kills belong to the
/// same group when the gap between them is at most `window` ticks; only the
/// largest group a player reaches in the round earns a credit.
#[derive(Debug, Clone)]
pub struct MultiKillTracker {
    window: Tick,
    round: Option<u32>,
    streaks: BTreeMap<PlayerId, Streak>,
    best: BTreeMap<PlayerId, usize>,
}

impl MultiKillTracker {
    pub fn new(window: Tick) -> Self {
        Self {
            window,
            round: None,
            streaks: BTreeMap::new(),
            best: BTreeMap::new(),
        }
    }

    pub fn start_round(&mut self, round: u32) {
        self.streaks.clear();
        self.best.clear();
        self.round = Some(round);
    }

    pub fn record(&mut self, player: PlayerId, tick: Tick) {
        let window = self.window;
        let streak = self
            .streaks
            .entry(player)
            .and_modify(|streak| {
                if tick.saturating_sub(streak.last_kill) <= window {
                    streak.size += 1;
                } else {
                    streak.size = 1;
                }
                streak.last_kill = tick;
            })
            .or_insert(Streak {
                last_kill: tick,
                size: 1,
            });

        let best = self.best.entry(player).or_default();
        *best = (*best).max(streak.size);
    }

    /// Closes the running round, yielding `(round, player, tier)` for every
    /// player whose largest group had at least two kills.
    pub fn finish_round(&mut self) -> Vec<(u32, PlayerId, usize)> {
        let round = match self.round.take() {
            Some(r) => r,
            None => return Vec::new(),
        };
        self.streaks.clear();

        std::mem::take(&mut self.best)
            .into_iter()
            .filter(|(_, size)| *size >= 2)
            .map(|(player, size)| (round, player, size.min(5)))
            .collect()
    }
}
