//! The Ground Agent: fleet observer and non-binding coordinator (§4.2).
//!
//! Grounded on `ground_agent.py`'s `GroundAgent`: a `HEARTBEAT` handler that
//! refreshes per-drone state and escalates on low/critical battery, a
//! `TARGET_FOUND` handler that dedups into the discovered-target set, a
//! `HANDOFF_REQUEST` handler that brokers the best available peer, and a
//! periodic coordination pass that prunes silent drones and logs fleet health
//! without ever mutating a drone directly — every outward effect is a
//! `GROUND_COMMAND` message, which drones are free to ignore.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use sar_bus::{Bus, BusResult};
use sar_core::{DroneId, Grid, Position, SimTime};
use sar_proto::{GroundCommand, Message, MessagePayload};

use crate::state::{DroneStatus, GroundStats};

pub const HEARTBEAT_TIMEOUT: f64 = 10.0;
pub const LOW_BATTERY: f64 = 25.0;
pub const CRITICAL_BATTERY: f64 = 15.0;
pub const COORDINATION_INTERVAL: f64 = 5.0;

/// Minimum battery a peer must have to be offered a handoff.
const HANDOFF_MIN_BATTERY: f64 = 40.0;

pub struct Ground {
    id: DroneId,
    drone_status: BTreeMap<DroneId, DroneStatus>,
    discovered_targets: BTreeSet<Position>,
    stats: GroundStats,
    inbox: VecDeque<Message>,
    last_coordination: SimTime,
}

impl Ground {
    pub fn new(now: SimTime) -> Self {
        Ground {
            id: DroneId::GROUND,
            drone_status: BTreeMap::new(),
            discovered_targets: BTreeSet::new(),
            stats: GroundStats::default(),
            inbox: VecDeque::new(),
            last_coordination: now,
        }
    }

    pub fn id(&self) -> DroneId {
        self.id
    }

    pub fn stats(&self) -> &GroundStats {
        &self.stats
    }

    pub fn drone_status(&self, id: DroneId) -> Option<&DroneStatus> {
        self.drone_status.get(&id)
    }

    pub fn discovered_targets(&self) -> &BTreeSet<Position> {
        &self.discovered_targets
    }

    /// Queue an inbound message for the next `tick`. Drops self-addressed
    /// traffic, mirroring `Drone::deliver`.
    pub fn deliver(&mut self, message: Message) {
        if message.sender_id != self.id {
            self.inbox.push_back(message);
        }
    }

    /// Driver-pushed full snapshot of a drone's state, independent of any
    /// message. Updates every field except the heartbeat wallclock, which
    /// only a `HEARTBEAT` message can refresh.
    pub fn observe_snapshot(&mut self, now: SimTime, drone: &sar_drone::DroneStatus) {
        let entry = self
            .drone_status
            .entry(drone.id)
            .or_insert_with(|| DroneStatus::new(drone.position, now));
        entry.position = drone.position;
        entry.battery = drone.battery;
        entry.state = drone.state;
        entry.assigned_tiles = drone.assigned_tiles;
        entry.visited_tiles = drone.visited_tiles;
        entry.targets_found = drone.targets_found;
    }

    /// Drain the inbox and, once per [`COORDINATION_INTERVAL`], run the
    /// periodic bookkeeping pass. Returns every `GROUND_COMMAND` emitted this
    /// call.
    pub fn tick(&mut self, now: SimTime, bus: &Bus) -> BusResult<Vec<Message>> {
        let mut emitted = Vec::new();

        while let Some(message) = self.inbox.pop_front() {
            self.stats.total_messages_received += 1;
            self.handle_message(now, message, bus, &mut emitted)?;
        }

        if now.since(self.last_coordination) >= COORDINATION_INTERVAL {
            self.coordinate(now);
            self.last_coordination = now;
        }

        Ok(emitted)
    }

    fn handle_message(
        &mut self,
        now: SimTime,
        message: Message,
        bus: &Bus,
        emitted: &mut Vec<Message>,
    ) -> BusResult<()> {
        let sender = message.sender_id;
        match message.payload {
            MessagePayload::Heartbeat { position, battery } => {
                let entry = self
                    .drone_status
                    .entry(sender)
                    .or_insert_with(|| DroneStatus::new(position, now));
                entry.position = position;
                entry.battery = battery;
                entry.last_heartbeat = now;
                entry.last_heartbeat_wallclock = now;
                entry.is_active = true;

                if battery < CRITICAL_BATTERY {
                    self.send_command(now, bus, GroundCommand::Recall { drone: sender }, emitted)?;
                } else if battery < LOW_BATTERY {
                    self.send_command(
                        now,
                        bus,
                        GroundCommand::CoordinateHandoff { drone: sender },
                        emitted,
                    )?;
                }
            }
            MessagePayload::TargetFound { position, .. } => {
                if self.discovered_targets.insert(position) {
                    self.stats.targets_found += 1;
                }
            }
            MessagePayload::HandoffRequest { tiles, .. } => {
                if let Some(target) = self.find_best_peer_for_handoff(sender) {
                    let half = tiles.len() / 2;
                    let offered: Vec<Position> = tiles.into_iter().take(half).collect();
                    self.send_command(
                        now,
                        bus,
                        GroundCommand::AssignTiles { target, tiles: offered },
                        emitted,
                    )?;
                }
            }
            MessagePayload::OfferTile { .. }
            | MessagePayload::AcceptOffer { .. }
            | MessagePayload::AcceptHandoff { .. }
            | MessagePayload::GroundCommand(_) => {}
        }
        Ok(())
    }

    fn find_best_peer_for_handoff(&self, requester: DroneId) -> Option<DroneId> {
        self.drone_status
            .iter()
            .filter(|&(&id, status)| {
                id != requester && status.is_active && status.battery > HANDOFF_MIN_BATTERY
            })
            .max_by(|(&a_id, a), (&b_id, b)| {
                let score = |s: &DroneStatus| s.battery - 0.5 * s.assigned_tiles as f64;
                score(a)
                    .partial_cmp(&score(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b_id.cmp(&a_id))
            })
            .map(|(&id, _)| id)
    }

    fn send_command(
        &mut self,
        now: SimTime,
        bus: &Bus,
        command: GroundCommand,
        emitted: &mut Vec<Message>,
    ) -> BusResult<()> {
        let payload = MessagePayload::GroundCommand(command);
        let id = bus.publish_from(self.id, now, payload.clone())?;
        self.stats.total_commands_sent += 1;
        emitted.push(Message { id, sender_id: self.id, timestamp: now, payload });
        Ok(())
    }

    /// Mark silent drones inactive, recompute the active count, and log
    /// fleet health. Never mutates a drone — purely Ground-local bookkeeping.
    fn coordinate(&mut self, now: SimTime) {
        self.stats.coordination_cycles += 1;

        for status in self.drone_status.values_mut() {
            if now.since(status.last_heartbeat_wallclock) > HEARTBEAT_TIMEOUT {
                status.is_active = false;
            }
        }

        self.stats.active_drones = self.drone_status.values().filter(|s| s.is_active).count() as u64;

        let idle = self
            .drone_status
            .iter()
            .filter(|(_, s)| s.is_active && s.assigned_tiles == 0)
            .count();
        if idle > 0 {
            tracing::info!(idle_drones = idle, "fleet has idle, unassigned drones");
        }

        let low_battery = self
            .drone_status
            .iter()
            .filter(|(_, s)| s.is_active && s.battery < LOW_BATTERY)
            .count();
        if low_battery > 0 {
            tracing::info!(low_battery_drones = low_battery, "fleet has low-battery drones");
        }
    }

    /// Driver-invoked coverage recomputation, independent of message traffic.
    pub fn update_coverage(&mut self, grid: &Grid) {
        self.stats.coverage_percent = grid.coverage_percent();
    }
}
