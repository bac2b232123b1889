//! The autonomous drone agent (§4.1).
//!
//! Grounded field-for-field on `drone_agent.py`'s `DroneAgent`: same battery
//! drain rates and thresholds, same inbox handlers, same `ordered_tiles` +
//! nearest-fallback target selection, same cached-path movement with a
//! greedy axis-dominant fallback. The struct is an owned Rust value (no
//! SoA split — see `DESIGN.md`) holding its own RNG, inbox, and path cache.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use sar_bus::{Bus, BusResult};
use sar_core::{DroneId, DroneRng, Grid, MessageId, Position, SimTime};
use sar_proto::{DetectionOracle, GroundCommand, Message, MessagePayload};

use crate::astar;
use crate::state::{DroneState, DroneStatus};

pub const BATTERY_DRAIN_MOVE: f64 = 0.5;
pub const BATTERY_DRAIN_IDLE: f64 = 0.1;
pub const BATTERY_DRAIN_SCAN: f64 = 0.3;
pub const LOW_BATTERY: f64 = 20.0;
pub const HANDOFF_ACCEPT_BATTERY: f64 = 40.0;
pub const CRITICAL_BATTERY: f64 = 5.0;
pub const HEARTBEAT_INTERVAL: f64 = 2.0;

/// Above this many assigned tiles, a drone probabilistically offers some of
/// its load to peers each tick.
const OFFLOAD_TILE_FLOOR: usize = 10;
const OFFLOAD_PROBABILITY: f64 = 0.1;
const OFFLOAD_BATCH: usize = 3;
const HANDOFF_ACCEPT_BATCH: usize = 10;

/// An autonomous searcher. Owns its RNG, inbox, and all mutable state; no
/// other component reaches into a `Drone` except through `deliver`,
/// `assign`/`reassign`, `tick`, and `snapshot`.
pub struct Drone {
    id: DroneId,
    position: Position,
    battery: f64,
    state: DroneState,
    rng: DroneRng,
    assigned_tiles: BTreeSet<Position>,
    visited_tiles: BTreeSet<Position>,
    ordered_tiles: Vec<Position>,
    inbox: VecDeque<Message>,
    pending_offers: HashMap<MessageId, Vec<Position>>,
    targets_found: Vec<Position>,
    path_cache: HashMap<Position, VecDeque<Position>>,
    handoff_pending: bool,
    last_heartbeat: SimTime,
    detection_probability: f64,
}

impl Drone {
    pub fn new(id: DroneId, position: Position, global_seed: u64, detection_probability: f64) -> Self {
        Drone {
            id,
            position,
            battery: 100.0,
            state: DroneState::Idle,
            rng: DroneRng::new(global_seed, id),
            assigned_tiles: BTreeSet::new(),
            visited_tiles: BTreeSet::new(),
            ordered_tiles: Vec::new(),
            inbox: VecDeque::new(),
            pending_offers: HashMap::new(),
            targets_found: Vec::new(),
            path_cache: HashMap::new(),
            handoff_pending: false,
            last_heartbeat: SimTime::ZERO,
            detection_probability,
        }
    }

    pub fn id(&self) -> DroneId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn state(&self) -> DroneState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == DroneState::Dead
    }

    /// Tiles this drone has personally visited. The driver unions these into
    /// the shared `Grid`'s coverage and into the allocator's `all_tiles \
    /// visited_tiles` computation each tick.
    pub fn visited_tiles(&self) -> &BTreeSet<Position> {
        &self.visited_tiles
    }

    /// Append `tiles` to the assignment. If `ordered` is given it replaces
    /// the sweep order wholesale; an idle drone with a non-empty assignment
    /// starts searching.
    pub fn assign(&mut self, tiles: &[Position], ordered: Option<Vec<Position>>) {
        self.assigned_tiles.extend(tiles.iter().copied());
        if let Some(order) = ordered {
            self.ordered_tiles = order;
        }
        if self.state == DroneState::Idle && !self.assigned_tiles.is_empty() {
            self.state = DroneState::Searching;
        }
    }

    /// Clear the current assignment, path cache, and target, then `assign`
    /// the new tiles — used for dynamic zone reallocation.
    pub fn reassign(&mut self, tiles: &[Position], ordered: Option<Vec<Position>>) {
        self.assigned_tiles.clear();
        self.ordered_tiles.clear();
        self.path_cache.clear();
        self.assign(tiles, ordered);
    }

    /// Append `message` to the inbox, unless it is a message this drone sent
    /// itself.
    pub fn deliver(&mut self, message: Message) {
        if message.sender_id != self.id {
            self.inbox.push_back(message);
        }
    }

    pub fn snapshot(&self) -> DroneStatus {
        DroneStatus {
            id: self.id,
            position: self.position,
            battery: self.battery,
            state: self.state,
            assigned_tiles: self.assigned_tiles.len(),
            visited_tiles: self.visited_tiles.len(),
            targets_found: self.targets_found.len(),
            last_heartbeat: self.last_heartbeat,
        }
    }

    /// One simulated step (§4.1, exact order). Returns every message this
    /// drone published this tick, for recording or test assertions.
    pub fn tick(
        &mut self,
        now: SimTime,
        grid: &Grid,
        oracle: &dyn DetectionOracle,
        peer_positions: &BTreeMap<DroneId, Position>,
        bus: &Bus,
    ) -> BusResult<Vec<Message>> {
        let mut emitted = Vec::new();

        if self.state == DroneState::Dead {
            return Ok(emitted);
        }
        if self.battery <= CRITICAL_BATTERY {
            self.state = DroneState::Dead;
            return Ok(emitted);
        }

        self.drain_inbox(now, bus, &mut emitted)?;

        if now.since(self.last_heartbeat) >= HEARTBEAT_INTERVAL {
            let payload = MessagePayload::Heartbeat {
                position: self.position,
                battery: self.battery,
            };
            let id = bus.publish_from(self.id, now, payload.clone())?;
            emitted.push(self.record(id, now, payload));
            self.last_heartbeat = now;
        }

        if self.battery < LOW_BATTERY && !self.handoff_pending && !self.assigned_tiles.is_empty() {
            let tiles: Vec<Position> = self.assigned_tiles.iter().copied().collect();
            let payload = MessagePayload::HandoffRequest {
                tiles,
                position: self.position,
                battery: self.battery,
            };
            let id = bus.publish_from(self.id, now, payload.clone())?;
            emitted.push(self.record(id, now, payload));
            self.handoff_pending = true;
        }

        if self.state == DroneState::Idle && !self.assigned_tiles.is_empty() {
            self.state = DroneState::Searching;
        }

        if self.state == DroneState::Searching {
            self.tick_search(now, grid, oracle, peer_positions, bus, &mut emitted)?;
        }

        self.maybe_offload(now, bus, &mut emitted)?;

        Ok(emitted)
    }

    fn record(&self, id: MessageId, timestamp: SimTime, payload: MessagePayload) -> Message {
        Message { id, sender_id: self.id, timestamp, payload }
    }

    fn tick_search(
        &mut self,
        now: SimTime,
        grid: &Grid,
        oracle: &dyn DetectionOracle,
        peer_positions: &BTreeMap<DroneId, Position>,
        bus: &Bus,
        emitted: &mut Vec<Message>,
    ) -> BusResult<()> {
        let Some(target) = self.next_target() else {
            self.state = DroneState::Idle;
            self.battery -= BATTERY_DRAIN_IDLE;
            return Ok(());
        };

        if self.position != target {
            let moved = self.move_towards(target, grid, peer_positions);
            if moved {
                self.battery -= BATTERY_DRAIN_MOVE;
            }
        }

        if self.position == target {
            self.visited_tiles.insert(target);
            self.battery -= BATTERY_DRAIN_SCAN;

            let result = oracle.detect(self.position, grid.target_positions());
            let detection = match result {
                Ok(detection) => detection,
                Err(_) => sar_proto::bernoulli_fallback(
                    self.position,
                    grid.target_positions(),
                    self.detection_probability,
                    &mut self.rng,
                ),
            };

            if detection.person_detected && !self.targets_found.contains(&self.position) {
                self.targets_found.push(self.position);
                let payload = MessagePayload::TargetFound {
                    position: self.position,
                    confidence: detection.confidence,
                    detections: detection.detections,
                    detection_method: detection.detection_method,
                };
                let id = bus.publish_from(self.id, now, payload.clone())?;
                emitted.push(self.record(id, now, payload));
            }
        }

        Ok(())
    }

    /// With small probability, offer up to [`OFFLOAD_BATCH`] tiles to peers
    /// once the assignment grows past [`OFFLOAD_TILE_FLOOR`].
    fn maybe_offload(&mut self, now: SimTime, bus: &Bus, emitted: &mut Vec<Message>) -> BusResult<()> {
        if self.assigned_tiles.len() > OFFLOAD_TILE_FLOOR && self.rng.gen_bool(OFFLOAD_PROBABILITY) {
            let tiles: Vec<Position> = self.assigned_tiles.iter().take(OFFLOAD_BATCH).copied().collect();
            let payload = MessagePayload::OfferTile { tiles: tiles.clone() };
            let id = bus.publish_from(self.id, now, payload.clone())?;
            self.pending_offers.insert(id, tiles);
            emitted.push(self.record(id, now, payload));
        }
        Ok(())
    }

    fn drain_inbox(&mut self, now: SimTime, bus: &Bus, emitted: &mut Vec<Message>) -> BusResult<()> {
        while let Some(message) = self.inbox.pop_front() {
            self.handle_message(now, message, bus, emitted)?;
        }
        Ok(())
    }

    fn handle_message(
        &mut self,
        now: SimTime,
        message: Message,
        bus: &Bus,
        emitted: &mut Vec<Message>,
    ) -> BusResult<()> {
        match message.payload {
            MessagePayload::OfferTile { tiles } => {
                if self.battery > HANDOFF_ACCEPT_BATTERY {
                    self.assigned_tiles.extend(tiles.iter().copied());
                    let payload = MessagePayload::AcceptOffer {
                        original_message_id: message.id,
                        tiles,
                    };
                    let id = bus.publish_from(self.id, now, payload.clone())?;
                    emitted.push(self.record(id, now, payload));
                }
            }
            MessagePayload::AcceptOffer { original_message_id, tiles } => {
                if self.pending_offers.contains_key(&original_message_id) {
                    for tile in &tiles {
                        self.assigned_tiles.remove(tile);
                    }
                    self.pending_offers.remove(&original_message_id);
                }
            }
            MessagePayload::HandoffRequest { tiles, .. } => {
                if self.battery > HANDOFF_ACCEPT_BATTERY && !self.handoff_pending {
                    let take = tiles.len().min(HANDOFF_ACCEPT_BATCH);
                    let accepted: Vec<Position> = tiles.into_iter().take(take).collect();
                    self.assigned_tiles.extend(accepted.iter().copied());
                    let payload = MessagePayload::AcceptHandoff {
                        from_agent: message.sender_id,
                        tiles: accepted,
                    };
                    let id = bus.publish_from(self.id, now, payload.clone())?;
                    emitted.push(self.record(id, now, payload));
                }
            }
            MessagePayload::AcceptHandoff { from_agent, tiles } => {
                if from_agent == self.id || self.handoff_pending {
                    for tile in &tiles {
                        self.assigned_tiles.remove(tile);
                    }
                    self.handoff_pending = false;
                }
            }
            MessagePayload::Heartbeat { .. } => {}
            MessagePayload::TargetFound { .. } => {}
            MessagePayload::GroundCommand(GroundCommand::AssignTiles { target, tiles }) if target == self.id => {
                self.assign(&tiles, None);
            }
            MessagePayload::GroundCommand(_) => {}
        }
        Ok(())
    }

    /// The next unvisited assigned tile: the first `ordered_tiles` entry
    /// still unvisited, or the Manhattan-nearest unvisited tile (lexical
    /// tie-break), or `None` if the assignment is fully covered.
    fn next_target(&self) -> Option<Position> {
        let unvisited: BTreeSet<Position> = self
            .assigned_tiles
            .difference(&self.visited_tiles)
            .copied()
            .collect();
        if unvisited.is_empty() {
            return None;
        }

        if let Some(&tile) = self.ordered_tiles.iter().find(|t| unvisited.contains(t)) {
            return Some(tile);
        }

        unvisited
            .iter()
            .min_by_key(|&&t| (t.manhattan(self.position), t.x, t.y))
            .copied()
    }

    /// Attempt one 4-connected step toward `target`, returning whether the
    /// drone actually moved (§4.1.3).
    fn move_towards(
        &mut self,
        target: Position,
        grid: &Grid,
        peer_positions: &BTreeMap<DroneId, Position>,
    ) -> bool {
        if self.position == target {
            return false;
        }

        let occupied: BTreeSet<Position> = peer_positions
            .iter()
            .filter(|&(&id, _)| id != self.id)
            .map(|(_, &pos)| pos)
            .collect();

        if let Some(cached) = self.path_cache.get(&target) {
            match cached.front() {
                Some(&next) if !occupied.contains(&next) => {
                    self.path_cache.get_mut(&target).unwrap().pop_front();
                    self.position = next;
                    return true;
                }
                _ => {
                    self.path_cache.remove(&target);
                }
            }
        }

        let path = astar::find_path(grid, self.position, target, &occupied);
        if let Some(&next) = path.first() {
            if !occupied.contains(&next) {
                let mut remaining: VecDeque<Position> = path.into_iter().collect();
                remaining.pop_front();
                self.position = next;
                self.path_cache.insert(target, remaining);
                return true;
            }
        }

        self.greedy_step(target, grid, &occupied)
    }

    /// Axis-dominant greedy fallback when A* finds no path: step toward the
    /// larger of |dx|/|dy| (ties favor x); if blocked, try the orthogonal
    /// step; if still blocked, stay in place.
    fn greedy_step(&mut self, target: Position, grid: &Grid, occupied: &BTreeSet<Position>) -> bool {
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;

        let mut candidates = Vec::with_capacity(2);
        if dx.abs() >= dy.abs() {
            if dx != 0 {
                candidates.push(Position::new(self.position.x + dx.signum(), self.position.y));
            }
            if dy != 0 {
                candidates.push(Position::new(self.position.x, self.position.y + dy.signum()));
            }
        } else {
            if dy != 0 {
                candidates.push(Position::new(self.position.x, self.position.y + dy.signum()));
            }
            if dx != 0 {
                candidates.push(Position::new(self.position.x + dx.signum(), self.position.y));
            }
        }

        for candidate in candidates {
            if grid.contains(candidate) && !occupied.contains(&candidate) {
                self.path_cache.remove(&target);
                self.position = candidate;
                return true;
            }
        }

        false
    }
}
