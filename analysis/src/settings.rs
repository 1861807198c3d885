use crate::event::Tick;

/// Tunables for the order sensitive detectors.
///
/// The windows are expressed in ticks. At the usual 64 tick rate the defaults
/// are three seconds for chaining kills into a multi-kill, half a second of
/// tolerated visibility loss and one second of crosshair lookback.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Largest gap between two consecutive kills of the same player that still
    /// chains them into one multi-kill group. The boundary is inclusive.
    pub multikill_window: Tick,
    /// Largest gap between two visible samples of the same pair that keeps
    /// the engagement alive. The boundary is inclusive.
    pub visibility_lapse_tolerance: Tick,
    /// How far back a shot or kill may look for a visibility sample.
    pub crosshair_lookback: Tick,
    /// Points per multi-kill tier, indexed 2k, 3k, 4k, 5k.
    pub multikill_points: [f64; 4],
    /// Credit for a won clutch, indexed 1v1, 1v2, 1v3, 1v4 and above.
    pub clutch_win_credit: [f64; 4],
    /// Credit for a lost clutch regardless of the enemy count.
    pub clutch_loss_credit: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            multikill_window: 192,
            visibility_lapse_tolerance: 32,
            crosshair_lookback: 64,
            multikill_points: [1.0, 3.0, 6.0, 10.0],
            clutch_win_credit: [2.0, 5.0, 10.0, 15.0],
            clutch_loss_credit: 0.0,
        }
    }
}

impl Settings {
    pub fn multikill_points(&self, tier: usize) -> f64 {
        match tier {
            0 | 1 => 0.0,
            t => self.multikill_points[t.min(5) - 2],
        }
    }

    pub fn clutch_credit(&self, enemies: usize, won: bool) -> f64 {
        if !won {
            return self.clutch_loss_credit;
        }
        match enemies {
            0 => 0.0,
            n => self.clutch_win_credit[n.min(4) - 1],
        }
    }
}
