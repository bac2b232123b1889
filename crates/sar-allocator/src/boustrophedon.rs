//! Sweep ordering within a single drone's zone (§4.3).
//!
//! Grounded on `zone_allocator.py`'s `generate_boustrophedon_order` /
//! `optimize_for_speed`: group by row, sort each row left-to-right, visit
//! rows nearest-first, and alternate sweep direction row to row so a drone
//! never has to backtrack across its own zone.

use std::collections::{BTreeMap, BTreeSet};

use sar_core::{DroneId, Position};

/// Reorder `tiles` into a lawn-mower sweep starting near `start`.
///
/// Tiles are grouped by `y`, each row sorted by `x`, rows visited in order
/// of `|row_y - start.y|`, and alternate rows reversed so consecutive tiles
/// across a row transition are close together. Ties between rows equidistant
/// from `start.y` keep their natural (ascending `y`) order, since `BTreeMap`
/// iteration and a stable sort both preserve key order.
pub fn boustrophedon_order(tiles: &[Position], start: Position) -> Vec<Position> {
    if tiles.is_empty() {
        return Vec::new();
    }

    let mut rows: BTreeMap<i32, Vec<Position>> = BTreeMap::new();
    for &tile in tiles {
        rows.entry(tile.y).or_default().push(tile);
    }
    for row in rows.values_mut() {
        row.sort_by_key(|p| p.x);
    }

    let mut row_keys: Vec<i32> = rows.keys().copied().collect();
    row_keys.sort_by_key(|&y| (y - start.y).abs());

    let mut ordered = Vec::with_capacity(tiles.len());
    let mut reverse = false;
    for y in row_keys {
        let mut row = rows.remove(&y).unwrap();
        if reverse {
            row.reverse();
        }
        ordered.extend(row);
        reverse = !reverse;
    }
    ordered
}

/// Apply [`boustrophedon_order`] to every drone's allocation in place,
/// using each drone's current position as its sweep start.
pub fn optimize_for_speed(
    allocation: &BTreeMap<DroneId, Vec<Position>>,
    drone_positions: &BTreeMap<DroneId, Position>,
) -> BTreeMap<DroneId, Vec<Position>> {
    allocation
        .iter()
        .map(|(&drone_id, tiles)| {
            let start = drone_positions
                .get(&drone_id)
                .copied()
                .unwrap_or(Position::new(0, 0));
            (drone_id, boustrophedon_order(tiles, start))
        })
        .collect()
}

/// `true` iff `ordered` is a permutation of `original` — used by callers
/// (and tests) to check the sweep reorders without dropping or duplicating
/// tiles.
pub fn is_permutation(original: &[Position], ordered: &[Position]) -> bool {
    if original.len() != ordered.len() {
        return false;
    }
    let a: BTreeSet<_> = original.iter().copied().collect();
    let b: BTreeSet<_> = ordered.iter().copied().collect();
    a == b && original.len() == b.len()
}
