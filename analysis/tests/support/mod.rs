#![allow(dead_code)]

use analysis::event::{EndReason, Event, EventKind, Player, PlayerId, Position, Team, Tick, ViewAngles};
use analysis::source::{MatchHeader, Recording};

pub const T1: PlayerId = PlayerId(1);
pub const T2: PlayerId = PlayerId(2);
pub const T3: PlayerId = PlayerId(3);
pub const CT1: PlayerId = PlayerId(11);
pub const CT2: PlayerId = PlayerId(12);
pub const CT3: PlayerId = PlayerId(13);
pub const CT4: PlayerId = PlayerId(14);

pub fn player(id: PlayerId, name: &str, team: Team) -> Player {
    Player {
        id,
        name: name.to_owned(),
        team,
    }
}

/// Three a side.
pub fn three_v_three() -> MatchHeader {
    MatchHeader {
        map: "de_nuke".to_owned(),
        players: vec![
            player(T1, "t-one", Team::Terrorist),
            player(T2, "t-two", Team::Terrorist),
            player(T3, "t-three", Team::Terrorist),
            player(CT1, "ct-one", Team::CounterTerrorist),
            player(CT2, "ct-two", Team::CounterTerrorist),
            player(CT3, "ct-three", Team::CounterTerrorist),
        ],
    }
}

/// Three terrorists against four counter-terrorists.
pub fn three_v_four() -> MatchHeader {
    let mut header = three_v_three();
    header.players.push(player(CT4, "ct-four", Team::CounterTerrorist));
    header
}

pub fn one_v_one() -> MatchHeader {
    MatchHeader {
        map: "aim_map".to_owned(),
        players: vec![
            player(T1, "fragger", Team::Terrorist),
            player(CT1, "feeder", Team::CounterTerrorist),
        ],
    }
}

/// A lone terrorist against two counter-terrorists.
pub fn one_v_two() -> MatchHeader {
    MatchHeader {
        map: "aim_map".to_owned(),
        players: vec![
            player(T1, "fragger", Team::Terrorist),
            player(CT1, "feeder", Team::CounterTerrorist),
            player(CT2, "camper", Team::CounterTerrorist),
        ],
    }
}

pub struct MatchBuilder {
    header: MatchHeader,
    events: Vec<Event>,
    round: u32,
}

impl MatchBuilder {
    pub fn new(header: MatchHeader) -> Self {
        Self {
            header,
            events: Vec::new(),
            round: 0,
        }
    }

    pub fn event(&mut self, tick: Tick, kind: EventKind) -> &mut Self {
        self.events.push(Event::new(tick, self.round, kind));
        self
    }

    pub fn round_start(&mut self, tick: Tick) -> &mut Self {
        self.round += 1;
        self.event(tick, EventKind::RoundStart)
    }

    /// Starts the numbering over, like a match restart does.
    pub fn restart(&mut self) -> &mut Self {
        self.round = 0;
        self
    }

    pub fn round_end(&mut self, tick: Tick, winner: Team) -> &mut Self {
        let reason = match winner {
            Team::Terrorist => EndReason::CTKilled,
            Team::CounterTerrorist => EndReason::TKilled,
        };
        self.event(
            tick,
            EventKind::RoundEnd {
                winner: Some(winner),
                reason,
            },
        )
    }

    pub fn kill(&mut self, tick: Tick, attacker: PlayerId, victim: PlayerId) -> &mut Self {
        self.event(
            tick,
            EventKind::Kill {
                attacker: Some(attacker),
                victim,
                assister: None,
                headshot: false,
                weapon: Some("ak47".to_owned()),
                attacker_view: None,
            },
        )
    }

    pub fn headshot(&mut self, tick: Tick, attacker: PlayerId, victim: PlayerId) -> &mut Self {
        self.event(
            tick,
            EventKind::Kill {
                attacker: Some(attacker),
                victim,
                assister: None,
                headshot: true,
                weapon: Some("ak47".to_owned()),
                attacker_view: None,
            },
        )
    }

    pub fn kill_aiming(&mut self, tick: Tick, attacker: PlayerId, victim: PlayerId, view: ViewAngles) -> &mut Self {
        self.event(
            tick,
            EventKind::Kill {
                attacker: Some(attacker),
                victim,
                assister: None,
                headshot: false,
                weapon: Some("deagle".to_owned()),
                attacker_view: Some(view),
            },
        )
    }

    pub fn damage(&mut self, tick: Tick, attacker: PlayerId, victim: PlayerId, amount: u32) -> &mut Self {
        self.event(
            tick,
            EventKind::Damage {
                attacker: Some(attacker),
                victim,
                amount,
            },
        )
    }

    /// `target` stands 100 units straight down the x axis of `observer`.
    pub fn visible(&mut self, tick: Tick, observer: PlayerId, target: PlayerId) -> &mut Self {
        self.event(
            tick,
            EventKind::VisibilitySample {
                observer,
                target,
                visible: true,
                observer_position: Position::new(0.0, 0.0, 0.0),
                target_position: Position::new(100.0, 0.0, 0.0),
            },
        )
    }

    pub fn hidden(&mut self, tick: Tick, observer: PlayerId, target: PlayerId) -> &mut Self {
        self.event(
            tick,
            EventKind::VisibilitySample {
                observer,
                target,
                visible: false,
                observer_position: Position::new(0.0, 0.0, 0.0),
                target_position: Position::new(100.0, 0.0, 0.0),
            },
        )
    }

    pub fn shot(&mut self, tick: Tick, shooter: PlayerId, yaw: f32) -> &mut Self {
        self.event(
            tick,
            EventKind::ShotFired {
                shooter,
                view: ViewAngles::new(0.0, yaw),
            },
        )
    }

    pub fn header(&self) -> &MatchHeader {
        &self.header
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn build(&self) -> Recording {
        Recording::new(self.header.clone(), self.events.clone())
    }
}

/// Compares floats up to a rounding error.
pub fn assert_close(left: f64, right: f64) {
    assert!(
        (left - right).abs() < 1e-9,
        "{} and {} differ by more than rounding",
        left,
        right
    );
}
