use std::collections::HashMap;

use crate::event::{PlayerId, Position, Tick, ViewAngles};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sighting {
    tick: Tick,
    observer_position: Position,
    target_position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Engagement {
    first_visible: Tick,
    last_visible: Tick,
}

/// Visibility bookkeeping for crosshair placement and time to damage.
///
/// Only samples with `visible` set are remembered. An engagement between an
/// observer and a target survives as long as the gap between two visible
/// samples stays within the lapse tolerance.
#[derive(Debug, Clone)]
pub struct AimTracker {
    lookback: Tick,
    lapse_tolerance: Tick,
    by_pair: HashMap<(PlayerId, PlayerId), Sighting>,
    by_observer: HashMap<PlayerId, Sighting>,
    engagements: HashMap<(PlayerId, PlayerId), Engagement>,
}

impl AimTracker {
    pub fn new(lookback: Tick, lapse_tolerance: Tick) -> Self {
        Self {
            lookback,
            lapse_tolerance,
            by_pair: HashMap::new(),
            by_observer: HashMap::new(),
            engagements: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.by_pair.clear();
        self.by_observer.clear();
        self.engagements.clear();
    }

    pub fn observe(
        &mut self,
        tick: Tick,
        observer: PlayerId,
        target: PlayerId,
        visible: bool,
        observer_position: Position,
        target_position: Position,
    ) {
        if !visible {
            return;
        }

        let sighting = Sighting {
            tick,
            observer_position,
            target_position,
        };
        self.by_pair.insert((observer, target), sighting);
        self.by_observer.insert(observer, sighting);

        let tolerance = self.lapse_tolerance;
        self.engagements
            .entry((observer, target))
            .and_modify(|engagement| {
                if tick.saturating_sub(engagement.last_visible) > tolerance {
                    engagement.first_visible = tick;
                }
                engagement.last_visible = tick;
            })
            .or_insert(Engagement {
                first_visible: tick,
                last_visible: tick,
            });
    }

    /// Crosshair error of a shot against whatever the shooter saw last.
    pub fn shot_error(&self, tick: Tick, shooter: PlayerId, view: ViewAngles) -> Option<f64> {
        let sighting = self.by_observer.get(&shooter)?;
        self.error_against(tick, sighting, view)
    }

    /// Crosshair error of a kill against the last sighting of the victim.
    pub fn kill_error(
        &self,
        tick: Tick,
        attacker: PlayerId,
        victim: PlayerId,
        view: ViewAngles,
    ) -> Option<f64> {
        let sighting = self.by_pair.get(&(attacker, victim))?;
        self.error_against(tick, sighting, view)
    }

    fn error_against(&self, tick: Tick, sighting: &Sighting, view: ViewAngles) -> Option<f64> {
        if tick.saturating_sub(sighting.tick) > self.lookback {
            return None;
        }
        angular_error(view, sighting.observer_position, sighting.target_position)
    }

    /// Ticks between the start of the running engagement and the damage.
    pub fn time_to_damage(&self, tick: Tick, attacker: PlayerId, victim: PlayerId) -> Option<Tick> {
        let engagement = self.engagements.get(&(attacker, victim))?;
        if tick.saturating_sub(engagement.last_visible) > self.lapse_tolerance {
            return None;
        }
        Some(tick.saturating_sub(engagement.first_visible))
    }
}

fn aim_direction(view: ViewAngles) -> [f64; 3] {
    let pitch = f64::from(view.pitch).to_radians();
    let yaw = f64::from(view.yaw).to_radians();
    [
        pitch.cos() * yaw.cos(),
        pitch.cos() * yaw.sin(),
        -pitch.sin(),
    ]
}

/// Angle in degrees between the view direction and the line from `from` to
/// `to`. `None` when both positions coincide.
pub fn angular_error(view: ViewAngles, from: Position, to: Position) -> Option<f64> {
    let bearing = [
        f64::from(to.x) - f64::from(from.x),
        f64::from(to.y) - f64::from(from.y),
        f64::from(to.z) - f64::from(from.z),
    ];
    let length = bearing.iter().map(|v| v * v).sum::<f64>().sqrt();
    if length < 1e-6 {
        return None;
    }

    let direction = aim_direction(view);
    let cos = direction
        .iter()
        .zip(bearing.iter())
        .map(|(d, b)| d * b)
        .sum::<f64>()
        / length;

    Some(cos.clamp(-1.0, 1.0).acos().to_degrees())
}
