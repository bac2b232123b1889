//! Fleet-wide metrics tracking (§4.5, §11).
//!
//! Grounded on `metrics.py`'s `MetricsSnapshot`/`MetricsTracker`: a rolling
//! per-tick history plus a handful of running counters, recomputed once per
//! tick rather than incrementally re-derived from the full agent list every
//! time a caller asks.

use sar_bus::MessageStats;
use sar_core::{SimTime, TickCount};
use sar_drone::DroneState;

/// One tick's worth of fleet metrics, appended to [`MetricsTracker::history`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub tick: TickCount,
    pub elapsed_seconds: f64,
    pub coverage_percent: f64,
    pub targets_found: usize,
    pub total_targets: usize,
    pub active_agents: usize,
    pub total_agents: usize,
    pub handoffs: u64,
    pub messages_sent: u64,
    pub avg_battery: f64,
}

/// Running metrics for one simulation run.
///
/// `record_target_found`/`record_message` are driven from individual bus
/// messages as they're observed; `update` is called once per tick with the
/// full fleet snapshot to compute the tick's [`MetricsSnapshot`].
pub struct MetricsTracker {
    total_targets: usize,
    total_tiles: usize,
    total_agents: usize,
    start_time: Option<SimTime>,
    first_detection_elapsed: Option<f64>,
    handoff_count: u64,
    message_count: u64,
    history: Vec<MetricsSnapshot>,
}

impl MetricsTracker {
    pub fn new(total_targets: usize, total_tiles: usize, total_agents: usize) -> Self {
        MetricsTracker {
            total_targets,
            total_tiles,
            total_agents,
            start_time: None,
            first_detection_elapsed: None,
            handoff_count: 0,
            message_count: 0,
            history: Vec::new(),
        }
    }

    /// Reset all counters and history; called by [`crate::Sim::start`] and
    /// [`crate::Sim::reset`].
    pub fn start(&mut self, now: SimTime) {
        self.start_time = Some(now);
        self.first_detection_elapsed = None;
        self.handoff_count = 0;
        self.message_count = 0;
        self.history.clear();
    }

    /// Record a newly discovered target (only the first discovery of a given
    /// target should call this — dedup lives in `Ground`/`Sim`). Stamps
    /// `first_detection_elapsed` the first time it's called this run.
    ///
    /// No-ops if `start()` hasn't run yet, matching `metrics.py::update`'s
    /// `if not self.start_time: return` guard — elapsed time is meaningless
    /// without a start point, so this never fabricates one.
    pub fn record_target_found(&mut self, now: SimTime) {
        let Some(start) = self.start_time else {
            debug_assert!(false, "record_target_found called before start()");
            return;
        };
        if self.first_detection_elapsed.is_none() {
            self.first_detection_elapsed = Some(now.since(start));
        }
    }

    pub fn record_handoff(&mut self) {
        self.handoff_count += 1;
    }

    /// Record one outgoing message, bumping the handoff counter too if it's
    /// an `ACCEPT_HANDOFF` (mirrors `metrics.py`'s `record_message`).
    pub fn record_message(&mut self, kind: sar_proto::MessageKind) {
        self.message_count += 1;
        if kind == sar_proto::MessageKind::AcceptHandoff {
            self.record_handoff();
        }
    }

    /// Compute and append this tick's snapshot. No-ops if `start()` hasn't
    /// run yet (see [`MetricsTracker::record_target_found`]).
    pub fn update(
        &mut self,
        tick: TickCount,
        now: SimTime,
        drones: &[sar_drone::DroneStatus],
        visited_tiles: usize,
        targets_found: usize,
        msg_stats: &MessageStats,
    ) {
        let Some(start) = self.start_time else {
            debug_assert!(false, "update called before start()");
            return;
        };
        let active = drones.iter().filter(|d| d.state != DroneState::Dead).count();
        let avg_battery = if drones.is_empty() {
            0.0
        } else {
            drones.iter().map(|d| d.battery).sum::<f64>() / drones.len() as f64
        };
        let coverage_percent = if self.total_tiles == 0 {
            0.0
        } else {
            100.0 * visited_tiles as f64 / self.total_tiles as f64
        };

        self.history.push(MetricsSnapshot {
            tick,
            elapsed_seconds: now.since(start),
            coverage_percent,
            targets_found,
            total_targets: self.total_targets,
            active_agents: active,
            total_agents: self.total_agents,
            handoffs: self.handoff_count,
            messages_sent: msg_stats.total_sent,
            avg_battery,
        });
    }

    /// The most recent snapshot, if any ticks have run.
    pub fn current(&self) -> Option<&MetricsSnapshot> {
        self.history.last()
    }

    /// Seconds between `start()` and the first target discovery, or `None`
    /// if none has been found yet.
    pub fn time_to_first_detection(&self) -> Option<f64> {
        self.first_detection_elapsed
    }

    /// Final-snapshot-based run summary, mirroring `metrics.py`'s
    /// `get_summary`.
    pub fn summary(&self) -> Option<&MetricsSnapshot> {
        self.history.last()
    }

    pub fn history(&self) -> &[MetricsSnapshot] {
        &self.history
    }
}
