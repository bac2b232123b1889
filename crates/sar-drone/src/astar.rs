//! A* path planning on the tile grid (§4.1.3).
//!
//! Grounded on `dt-spatial/src/router.rs`'s Dijkstra structure (min-heap of
//! `Reverse` tuples, `dist`/`prev` maps, explicit reconstruction), adapted
//! to A* by adding the Manhattan-distance heuristic term and an explicit
//! insertion-order counter as the heap's tie-break key — `BinaryHeap`'s
//! comparison between equal-`f_score` entries would otherwise be
//! unspecified, unlike the Python source's `heapq`, which breaks ties on
//! insertion order via the same kind of counter.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use sar_core::{Grid, Position};

/// Find a shortest 4-connected path from `start` to `goal`, treating tiles
/// in `occupied` (other drones' current positions) as obstacles.
///
/// Returns the path excluding `start` but including `goal`, in traversal
/// order. Returns an empty vec if `start == goal` or no path exists.
pub fn find_path(
    grid: &Grid,
    start: Position,
    goal: Position,
    occupied: &BTreeSet<Position>,
) -> Vec<Position> {
    if start == goal {
        return Vec::new();
    }

    let mut open: BinaryHeap<Reverse<(u32, u64, Position)>> = BinaryHeap::new();
    let mut counter: u64 = 0;
    open.push(Reverse((start.manhattan(goal), counter, start)));

    let mut g_score: HashMap<Position, u32> = HashMap::new();
    g_score.insert(start, 0);
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut closed: BTreeSet<Position> = BTreeSet::new();

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return reconstruct(&came_from, start, goal);
        }
        if !closed.insert(current) {
            continue;
        }

        for neighbor in current.neighbors() {
            if !grid.contains(neighbor) || closed.contains(&neighbor) {
                continue;
            }
            if occupied.contains(&neighbor) && neighbor != goal {
                continue;
            }

            let tentative_g = g_score[&current] + 1;
            if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                counter += 1;
                let f_score = tentative_g + neighbor.manhattan(goal);
                open.push(Reverse((f_score, counter, neighbor)));
            }
        }
    }

    Vec::new()
}

fn reconstruct(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        if current == start {
            break;
        }
        path.push(current);
    }
    path.reverse();
    path
}
