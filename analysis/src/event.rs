pub type Tick = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Team {
    #[serde(rename = "t")]
    Terrorist,
    #[serde(rename = "ct")]
    CounterTerrorist,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Terrorist, Team::CounterTerrorist];

    pub fn opponent(self) -> Team {
        match self {
            Team::Terrorist => Team::CounterTerrorist,
            Team::CounterTerrorist => Team::Terrorist,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::Terrorist => "T",
            Team::CounterTerrorist => "CT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// View angles in degrees, using the demo convention: yaw rotates around the
/// vertical axis, positive pitch looks down.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewAngles {
    pub pitch: f32,
    pub yaw: f32,
}

impl ViewAngles {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum EndReason {
    StillInProgress,
    BombExploded,
    VipEscaped,
    VipKilled,
    TSaved,
    CtStoppedEscape,
    RoundEndReasonTerroristsStopped,
    BombDefused,
    TKilled,
    CTKilled,
    Draw,
    HostageRescued,
    TimeRanOut,
    RoundEndReasonHostagesNotRescued,
    TerroristsNotEscaped,
    VipNotEscaped,
    GameStart,
    TSurrender,
    CTSurrender,
    TPlanted,
    CTReachedHostage,
}

// https://github.com/markus-wa/demoinfocs-golang/blob/205b0bb25e9f3e96e1d306d154199b4a6292940e/pkg/demoinfocs/events/events.go#L53
pub static ROUND_END_REASON: phf::Map<i32, EndReason> = phf::phf_map! {
    0_i32 => EndReason::StillInProgress,
    1_i32 => EndReason::BombExploded,
    2_i32 => EndReason::VipEscaped,
    3_i32 => EndReason::VipKilled,
    4_i32 => EndReason::TSaved,
    5_i32 => EndReason::CtStoppedEscape,
    6_i32 => EndReason::RoundEndReasonTerroristsStopped,
    7_i32 => EndReason::BombDefused,
    8_i32 => EndReason::TKilled,
    9_i32 => EndReason::CTKilled,
    10_i32 => EndReason::Draw,
    11_i32 => EndReason::HostageRescued,
    12_i32 => EndReason::TimeRanOut,
    13_i32 => EndReason::RoundEndReasonHostagesNotRescued,
    14_i32 => EndReason::TerroristsNotEscaped,
    15_i32 => EndReason::VipNotEscaped,
    16_i32 => EndReason::GameStart,
    17_i32 => EndReason::TSurrender,
    18_i32 => EndReason::CTSurrender,
    19_i32 => EndReason::TPlanted,
    20_i32 => EndReason::CTReachedHostage,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown round end reason code {0}")]
pub struct UnknownEndReason(pub i32);

impl TryFrom<i32> for EndReason {
    type Error = UnknownEndReason;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ROUND_END_REASON
            .get(&code)
            .cloned()
            .ok_or(UnknownEndReason(code))
    }
}

impl From<EndReason> for i32 {
    fn from(reason: EndReason) -> i32 {
        ROUND_END_REASON
            .entries()
            .find_map(|(code, r)| (*r == reason).then_some(*code))
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoundStart,
    RoundEnd {
        winner: Option<Team>,
        reason: EndReason,
    },
    Kill {
        attacker: Option<PlayerId>,
        victim: PlayerId,
        #[serde(default)]
        assister: Option<PlayerId>,
        #[serde(default)]
        headshot: bool,
        #[serde(default)]
        weapon: Option<String>,
        /// Attacker view angles at the moment of the kill, when the source has them.
        #[serde(default)]
        attacker_view: Option<ViewAngles>,
    },
    Damage {
        attacker: Option<PlayerId>,
        victim: PlayerId,
        amount: u32,
    },
    VisibilitySample {
        observer: PlayerId,
        target: PlayerId,
        visible: bool,
        observer_position: Position,
        target_position: Position,
    },
    ShotFired {
        shooter: PlayerId,
        view: ViewAngles,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    pub tick: Tick,
    pub round: u32,
    pub kind: EventKind,
}

impl Event {
    pub fn new(tick: Tick, round: u32, kind: EventKind) -> Self {
        Self { tick, round, kind }
    }

    /// Every player identifier the event refers to.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> {
        let ids: [Option<PlayerId>; 3] = match &self.kind {
            EventKind::RoundStart | EventKind::RoundEnd { .. } => [None, None, None],
            EventKind::Kill {
                attacker,
                victim,
                assister,
                ..
            } => [*attacker, Some(*victim), *assister],
            EventKind::Damage {
                attacker, victim, ..
            } => [*attacker, Some(*victim), None],
            EventKind::VisibilitySample {
                observer, target, ..
            } => [Some(*observer), Some(*target), None],
            EventKind::ShotFired { shooter, .. } => [Some(*shooter), None, None],
        };
        ids.into_iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event at tick {tick} precedes the last seen tick {last_seen}")]
pub struct OrderingError {
    pub tick: Tick,
    pub last_seen: Tick,
}

/// Rejects tick regressions. Equal ticks are allowed.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    last_seen: Option<Tick>,
}

impl TickClock {
    pub fn observe(&mut self, tick: Tick) -> Result<(), OrderingError> {
        if let Some(last_seen) = self.last_seen {
            if tick < last_seen {
                return Err(OrderingError { tick, last_seen });
            }
        }
        self.last_seen = Some(tick);
        Ok(())
    }

    pub fn last_seen(&self) -> Option<Tick> {
        self.last_seen
    }
}
