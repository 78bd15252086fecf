// ═══════════════════════════════════════════════════════════════════════
// Pathfinding — cost-aware reachability over the hex grid.
//
// Terrain costs vary (roads 1, forests 2, fliers always 1), so this is
// a uniform-cost search with a priority frontier, not plain BFS. The
// returned costs are true minima.
// ═══════════════════════════════════════════════════════════════════════

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::hex::HexCoord;
use crate::terrain;
use crate::types::{Hex, Unit};

/// All hexes reachable from `start` within `max_cost` movement points,
/// mapped to their minimal accumulated cost. Hexes that fail `can_enter`
/// or are occupied by any other unit are excluded entirely; the start
/// hex is included at cost 0.
pub fn reachable_costs(
    unit: &Unit,
    grid: &[Hex],
    units: &[Unit],
    start: HexCoord,
    max_cost: u32,
) -> HashMap<(i32, i32), u32> {
    let lookup: HashMap<(i32, i32), &Hex> =
        grid.iter().map(|h| ((h.q, h.r), h)).collect();
    let occupied: HashSet<(i32, i32)> = units
        .iter()
        .filter(|u| u.id != unit.id)
        .filter_map(|u| u.position.map(HexCoord::key))
        .collect();

    let mut best: HashMap<(i32, i32), u32> = HashMap::new();
    let mut frontier: BinaryHeap<Reverse<(u32, (i32, i32))>> = BinaryHeap::new();
    best.insert(start.key(), 0);
    frontier.push(Reverse((0, start.key())));

    while let Some(Reverse((cost, key))) = frontier.pop() {
        if cost > best.get(&key).copied().unwrap_or(u32::MAX) {
            continue; // stale frontier entry
        }
        let current = HexCoord::new(key.0, key.1);
        for nb in current.neighbors() {
            let Some(hex) = lookup.get(&nb.key()) else { continue };
            if occupied.contains(&nb.key()) {
                continue;
            }
            let Some(step) = terrain::move_cost(unit, hex) else { continue };
            let next_cost = cost + step;
            if next_cost > max_cost {
                continue;
            }
            if next_cost < best.get(&nb.key()).copied().unwrap_or(u32::MAX) {
                best.insert(nb.key(), next_cost);
                frontier.push(Reverse((next_cost, nb.key())));
            }
        }
    }

    best
}
