//! Voronoi-style nearest-centroid tile partitioning and the reallocation
//! trigger (§4.3).
//!
//! Grounded on `zone_allocator.py`'s `allocate_zones_voronoi` and
//! `should_reallocate`: a battery-adjusted nearest-drone assignment, with a
//! deterministic tie-break (the Python dict-iteration tie-break is
//! unspecified order; here it is the drone's lexical id, matching the
//! invariant that allocation must be reproducible from a seed).

use std::collections::BTreeMap;

use sar_core::{DroneId, Position};

/// Drones past this battery level never receive new tiles.
pub const DEAD_BATTERY_THRESHOLD: f64 = 5.0;

/// Minimum ticks between two reallocations, regardless of imbalance.
pub const MIN_REALLOC_INTERVAL: u64 = 20;

/// Reallocate unconditionally once this many ticks have passed, even if
/// balanced, to correct for drift the imbalance check doesn't catch.
pub const PERIODIC_REALLOC_INTERVAL: u64 = 50;

/// Trigger reallocation once the spread between the fullest and emptiest
/// drone exceeds this fraction of the mean load.
pub const IMBALANCE_FRACTION: f64 = 0.3;

/// Imbalance is only considered once the mean load exceeds this many tiles;
/// below it, small swarms would thrash on every tick.
pub const IMBALANCE_MEAN_FLOOR: f64 = 10.0;

/// A drone below this battery carrying more than [`LOW_BATTERY_TILE_FLOOR`]
/// tiles forces an immediate reallocation.
pub const LOW_BATTERY_THRESHOLD: f64 = 30.0;
pub const LOW_BATTERY_TILE_FLOOR: usize = 5;

/// Partition `unvisited_tiles` among the drones in `drone_positions`.
///
/// Each tile goes to the drone minimizing
/// `manhattan(tile, drone_pos) / max(0.5, battery / 100)` — a drone with
/// drained battery effectively looks farther away, so tiles migrate toward
/// healthier drones. Drones at or below [`DEAD_BATTERY_THRESHOLD`] battery
/// are excluded from receiving tiles but still appear as empty-vec keys in
/// the result, as do drones passed in `drone_positions` with no tiles
/// nearest to them. Ties break on the smaller [`DroneId`].
///
/// Missing entries in `batteries` default to 100.0 (matches the Python
/// source's `.get(drone_id, 100)` default).
pub fn allocate(
    drone_positions: &BTreeMap<DroneId, Position>,
    unvisited_tiles: &[Position],
    batteries: &BTreeMap<DroneId, f64>,
) -> BTreeMap<DroneId, Vec<Position>> {
    let mut result: BTreeMap<DroneId, Vec<Position>> =
        drone_positions.keys().map(|&id| (id, Vec::new())).collect();

    if drone_positions.is_empty() || unvisited_tiles.is_empty() {
        return result;
    }

    let active: Vec<(DroneId, Position)> = drone_positions
        .iter()
        .filter(|&(id, _)| batteries.get(id).copied().unwrap_or(100.0) > DEAD_BATTERY_THRESHOLD)
        .map(|(&id, &pos)| (id, pos))
        .collect();

    if active.is_empty() {
        return result;
    }

    for &tile in unvisited_tiles {
        let mut best: Option<(DroneId, f64)> = None;

        for &(drone_id, pos) in &active {
            let distance = tile.manhattan(pos) as f64;
            let battery = batteries.get(&drone_id).copied().unwrap_or(100.0);
            let battery_factor = (battery / 100.0).max(0.5);
            let adjusted = distance / battery_factor;

            best = match best {
                None => Some((drone_id, adjusted)),
                Some((best_id, best_adjusted)) => {
                    if adjusted < best_adjusted || (adjusted == best_adjusted && drone_id < best_id)
                    {
                        Some((drone_id, adjusted))
                    } else {
                        Some((best_id, best_adjusted))
                    }
                }
            };
        }

        if let Some((drone_id, _)) = best {
            result.entry(drone_id).or_default().push(tile);
        }
    }

    result
}

/// Decide whether the driver should recompute the partition this tick
/// (§4.3). `ticks_since_last` must have already advanced past
/// [`MIN_REALLOC_INTERVAL`] for any of the imbalance/battery/periodic
/// checks below to fire.
pub fn should_reallocate(
    current_allocation: &BTreeMap<DroneId, Vec<Position>>,
    batteries: &BTreeMap<DroneId, f64>,
    ticks_since_last: u64,
    min_interval: u64,
) -> bool {
    if ticks_since_last < min_interval {
        return false;
    }

    let tile_counts: Vec<usize> = current_allocation.values().map(Vec::len).collect();
    if tile_counts.is_empty() {
        return false;
    }

    let max_tiles = *tile_counts.iter().max().unwrap();
    let min_tiles = *tile_counts.iter().min().unwrap();
    let avg_tiles = tile_counts.iter().sum::<usize>() as f64 / tile_counts.len() as f64;

    if (max_tiles - min_tiles) as f64 > IMBALANCE_FRACTION * avg_tiles && avg_tiles > IMBALANCE_MEAN_FLOOR
    {
        return true;
    }

    for (drone_id, tiles) in current_allocation {
        let battery = batteries.get(drone_id).copied().unwrap_or(100.0);
        if battery < LOW_BATTERY_THRESHOLD && tiles.len() > LOW_BATTERY_TILE_FLOOR {
            return true;
        }
    }

    ticks_since_last >= PERIODIC_REALLOC_INTERVAL
}
