//! Fixed 60 Hz tick scheduling for hosts that drive the table from a
//! variable-rate frame callback.

use serde::{Deserialize, Serialize};

/// Frame deltas this close to one tick are treated as exactly one tick.
const SNAP_TOLERANCE: f32 = 0.02;

/// Turns elapsed wall time into a number of fixed ticks to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameClock {
    ticks_per_second: f32,
    /// Most ticks replayed for one frame after a stall.
    catch_up_cap: u32,
    /// Simulation speed multiplier.
    pub update_speed: f32,
    accumulator: f32,
    /// Ticks still to be swallowed by an impact pause.
    impact_frames: f32,
    total_ticks: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0, 5)
    }
}

impl FrameClock {
    pub fn new(ticks_per_second: f32, catch_up_cap: u32) -> Self {
        Self {
            ticks_per_second,
            catch_up_cap,
            update_speed: 1.0,
            accumulator: 0.0,
            impact_frames: 0.0,
            total_ticks: 0,
        }
    }

    /// Adds `elapsed_seconds` of wall time and returns how many ticks to run.
    ///
    /// Anything beyond the catch-up cap is dropped; only the fractional part
    /// of the accumulator survives.
    pub fn advance(&mut self, elapsed_seconds: f32) -> u32 {
        let mut delta = elapsed_seconds.max(0.0) * self.ticks_per_second;
        if (delta - 1.0).abs() <= SNAP_TOLERANCE {
            delta = 1.0;
        }
        delta *= self.update_speed;

        if self.impact_frames > 0.0 {
            self.impact_frames -= delta;
        } else {
            self.accumulator += delta;
        }

        let mut ticks = 0;
        while self.accumulator >= 1.0 && ticks < self.catch_up_cap {
            self.accumulator -= 1.0;
            ticks += 1;
        }
        self.accumulator %= 1.0;
        self.total_ticks += u64::from(ticks);
        ticks
    }

    /// Pauses tick production for `frames` ticks of wall time.
    pub fn impact_pause(&mut self, frames: f32) {
        self.impact_frames = self.impact_frames.max(frames);
    }

    /// Fraction of a tick accumulated but not yet simulated.
    pub fn alpha(&self) -> f32 {
        self.accumulator.clamp(0.0, 1.0)
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}
