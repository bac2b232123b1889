//! Simulation time model.
//!
//! # Design
//!
//! The driver advances two clocks in lockstep: `SimTime`, the canonical
//! wall-clock-seconds "now" passed into every `tick()` (battery drain,
//! heartbeat and coordination intervals are all specified in seconds), and
//! `TickCount`, a monotonic step counter used to index replay frames and to
//! drive the allocator's `ticks_since_last_realloc`. `TickCount` increments
//! by one every `tick_interval` seconds of `SimTime`.

use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Wall-clock seconds elapsed since simulation start.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn advance(self, by_secs: f64) -> SimTime {
        SimTime(self.0 + by_secs)
    }

    /// Seconds elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s", self.0)
    }
}

// ── TickCount ─────────────────────────────────────────────────────────────────

/// A monotonically increasing simulation step counter, one per `tick_interval`
/// seconds of `SimTime`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickCount(pub u64);

impl TickCount {
    pub const ZERO: TickCount = TickCount(0);

    #[inline]
    pub fn next(self) -> TickCount {
        TickCount(self.0 + 1)
    }
}

impl fmt::Display for TickCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl std::ops::Sub for TickCount {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: TickCount) -> u64 {
        self.0.saturating_sub(rhs.0)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration, covering the full external
/// configuration surface.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub num_agents: u32,
    pub num_targets: u32,
    pub duration_seconds: f64,
    pub seed: u64,
    pub tick_interval: f64,
    pub detection_probability: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            grid_width: 10,
            grid_height: 10,
            num_agents: 4,
            num_targets: 3,
            duration_seconds: 120.0,
            seed: 42,
            tick_interval: 0.5,
            detection_probability: 0.3,
        }
    }
}

impl SimConfig {
    /// Validate configuration ranges, returning a description of the first
    /// violation found.
    pub fn validate(&self) -> Result<(), String> {
        fn check(name: &str, ok: bool, range: &str) -> Result<(), String> {
            if ok {
                Ok(())
            } else {
                Err(format!("{name} must be in {range}"))
            }
        }

        check("grid_width", (5..=50).contains(&self.grid_width), "[5, 50]")?;
        check("grid_height", (5..=50).contains(&self.grid_height), "[5, 50]")?;
        check("num_agents", (2..=10).contains(&self.num_agents), "[2, 10]")?;
        check("num_targets", (1..=20).contains(&self.num_targets), "[1, 20]")?;
        check(
            "duration_seconds",
            (30.0..=600.0).contains(&self.duration_seconds),
            "[30, 600]",
        )?;
        check(
            "tick_interval",
            (0.1..=2.0).contains(&self.tick_interval),
            "[0.1, 2.0]",
        )?;
        check(
            "detection_probability",
            (0.1..=1.0).contains(&self.detection_probability),
            "[0.1, 1.0]",
        )?;
        Ok(())
    }

    /// Number of ticks a `duration_seconds` run spans at `tick_interval`.
    #[inline]
    pub fn total_ticks(&self) -> u64 {
        (self.duration_seconds / self.tick_interval).ceil() as u64
    }
}
