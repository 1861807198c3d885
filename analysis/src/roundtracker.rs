//! Per round alive state.
//!
//! The tracker only looks at `round_start`, `kill` and `round_end`. Every
//! other event still advances the tick clock so ordering is enforced over the
//! whole stream.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::event::{
    EndReason, Event, EventKind, OrderingError, Player, PlayerId, Team, Tick, TickClock,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Elimination {
    pub tick: Tick,
    pub victim: PlayerId,
    pub attacker: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub winner: Option<Team>,
    pub reason: EndReason,
    pub end_tick: Tick,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub number: u32,
    pub start_tick: Tick,
    alive: BTreeMap<Team, BTreeSet<PlayerId>>,
    started_with: BTreeMap<Team, usize>,
    pub eliminations: Vec<Elimination>,
    pub outcome: Option<RoundOutcome>,
}

impl RoundState {
    fn new(number: u32, start_tick: Tick, rosters: &BTreeMap<Team, BTreeSet<PlayerId>>) -> Self {
        Self {
            number,
            start_tick,
            alive: rosters.clone(),
            started_with: rosters.iter().map(|(team, p)| (*team, p.len())).collect(),
            eliminations: Vec::new(),
            outcome: None,
        }
    }

    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.alive.values().any(|players| players.contains(&player))
    }

    pub fn alive_count(&self, team: Team) -> usize {
        self.alive.get(&team).map(|p| p.len()).unwrap_or(0)
    }

    pub fn alive_players(&self, team: Team) -> impl Iterator<Item = PlayerId> + '_ {
        self.alive.get(&team).into_iter().flatten().copied()
    }

    /// Number of players the team had when the round started.
    pub fn started_with(&self, team: Team) -> usize {
        self.started_with.get(&team).copied().unwrap_or(0)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// What a single event did to the round state.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    None,
    Started(u32),
    Eliminated { round: u32, victim: PlayerId },
    /// The victim was already dead in this round, the kill was ignored.
    AlreadyEliminated { round: u32, victim: PlayerId },
    /// The victim is on no roster, the kill was ignored.
    UnknownPlayer { round: u32, victim: PlayerId },
    Ended(u32),
    /// A kill or round end arrived while no round was active.
    OutsideRound,
}

#[derive(Debug, Clone)]
pub struct RoundTracker {
    rosters: BTreeMap<Team, BTreeSet<PlayerId>>,
    teams: HashMap<PlayerId, Team>,
    clock: TickClock,
    current: Option<RoundState>,
    /// Finished or abandoned rounds in the order they were played. A restart
    /// can repeat a round number.
    archive: Vec<RoundState>,
}

impl RoundTracker {
    pub fn new(players: &[Player]) -> Self {
        let mut rosters: BTreeMap<Team, BTreeSet<PlayerId>> = BTreeMap::new();
        for team in Team::ALL {
            rosters.entry(team).or_default();
        }
        for player in players {
            rosters.entry(player.team).or_default().insert(player.id);
        }

        Self {
            rosters,
            teams: players.iter().map(|p| (p.id, p.team)).collect(),
            clock: TickClock::default(),
            current: None,
            archive: Vec::new(),
        }
    }

    pub fn advance(&mut self, event: &Event) -> Result<Transition, OrderingError> {
        self.clock.observe(event.tick)?;

        let transition = match &event.kind {
            EventKind::RoundStart => {
                if let Some(unfinished) = self.current.take() {
                    tracing::debug!(
                        round = unfinished.number,
                        "Round started before the previous one ended"
                    );
                    self.archive.push(unfinished);
                }
                self.current = Some(RoundState::new(event.round, event.tick, &self.rosters));
                Transition::Started(event.round)
            }
            EventKind::Kill {
                attacker, victim, ..
            } => match self.current.as_mut() {
                Some(round) => {
                    let alive = match self.teams.get(victim) {
                        Some(team) => round.alive.entry(*team).or_default(),
                        None => {
                            return Ok(Transition::UnknownPlayer {
                                round: round.number,
                                victim: *victim,
                            })
                        }
                    };

                    if alive.remove(victim) {
                        round.eliminations.push(Elimination {
                            tick: event.tick,
                            victim: *victim,
                            attacker: *attacker,
                        });
                        Transition::Eliminated {
                            round: round.number,
                            victim: *victim,
                        }
                    } else {
                        Transition::AlreadyEliminated {
                            round: round.number,
                            victim: *victim,
                        }
                    }
                }
                None => Transition::OutsideRound,
            },
            EventKind::RoundEnd { winner, reason } => match self.current.take() {
                Some(mut round) => {
                    let number = round.number;
                    round.outcome = Some(RoundOutcome {
                        winner: *winner,
                        reason: reason.clone(),
                        end_tick: event.tick,
                    });
                    self.archive.push(round);
                    Transition::Ended(number)
                }
                None => Transition::OutsideRound,
            },
            _ => Transition::None,
        };

        Ok(transition)
    }

    /// Advances the clock without interpreting the event.
    pub fn observe(&mut self, tick: Tick) -> Result<(), OrderingError> {
        self.clock.observe(tick)
    }

    pub fn current(&self) -> Option<&RoundState> {
        self.current.as_ref()
    }

    /// The latest round played under this number.
    pub fn round(&self, round: u32) -> Option<&RoundState> {
        match self.current.as_ref() {
            Some(current) if current.number == round => Some(current),
            _ => self.archive.iter().rev().find(|r| r.number == round),
        }
    }

    pub fn is_alive(&self, player: PlayerId, round: u32) -> bool {
        self.round(round)
            .map(|r| r.is_alive(player))
            .unwrap_or(false)
    }

    pub fn alive_count(&self, team: Team, round: u32) -> usize {
        self.round(round)
            .map(|r| r.alive_count(team))
            .unwrap_or(0)
    }

    pub fn team_of(&self, player: PlayerId) -> Option<Team> {
        self.teams.get(&player).copied()
    }

    /// Archived rounds in the order they were played, followed by the round
    /// still running.
    pub fn rounds(&self) -> impl Iterator<Item = &RoundState> {
        self.archive.iter().chain(self.current.iter())
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.clock.last_seen()
    }
}
