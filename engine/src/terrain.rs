// ═══════════════════════════════════════════════════════════════════════
// Terrain model — per-type movement rules and the procedural map
// generator (smoothed value noise + river/lake/road/building passes).
//
// Determinism contract: the same (size, seed) pair reproduces the same
// grid bit-for-bit. The noise field is a pure function of seed and
// coordinate; the stamp passes each draw from their own salted ChaCha8
// stream, so no pass depends on call-order-sensitive global state.
// ═══════════════════════════════════════════════════════════════════════

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;
use crate::types::{Hex, Unit};

// ── Terrain types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Open,
    Road,
    Forest,
    Ruin,
    Swamp,
    Water,
    River,
    Lake,
    Rock,
    Mountain,
}

impl Terrain {
    pub const ALL: [Terrain; 10] = [
        Terrain::Open,
        Terrain::Road,
        Terrain::Forest,
        Terrain::Ruin,
        Terrain::Swamp,
        Terrain::Water,
        Terrain::River,
        Terrain::Lake,
        Terrain::Rock,
        Terrain::Mountain,
    ];
}

/// Movement and deployment rules for one terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainRules {
    pub move_cost: u32,
    pub impassable: bool,
    pub deploy_allowed: bool,
}

/// Static rule table. Costs are per-hex entry costs; impassable terrain
/// can never be entered regardless of traits.
pub const fn rules(terrain: Terrain) -> TerrainRules {
    match terrain {
        Terrain::Open => TerrainRules { move_cost: 1, impassable: false, deploy_allowed: true },
        Terrain::Road => TerrainRules { move_cost: 1, impassable: false, deploy_allowed: true },
        Terrain::Forest => TerrainRules { move_cost: 2, impassable: false, deploy_allowed: true },
        Terrain::Ruin => TerrainRules { move_cost: 2, impassable: false, deploy_allowed: true },
        Terrain::Swamp => TerrainRules { move_cost: 2, impassable: false, deploy_allowed: true },
        Terrain::Water => TerrainRules { move_cost: 2, impassable: false, deploy_allowed: false },
        Terrain::River => TerrainRules { move_cost: 2, impassable: false, deploy_allowed: false },
        Terrain::Lake => TerrainRules { move_cost: 2, impassable: true, deploy_allowed: false },
        Terrain::Rock => TerrainRules { move_cost: 2, impassable: true, deploy_allowed: false },
        Terrain::Mountain => TerrainRules { move_cost: 2, impassable: true, deploy_allowed: false },
    }
}

/// Can the unit legally enter this hex? Buildings block like impassable
/// terrain. Flying affects cost only, never legality.
pub fn can_enter(_unit: &Unit, hex: &Hex) -> bool {
    !rules(hex.terrain).impassable && !hex.has_building
}

/// Cost to step into this hex, or None if it cannot be entered at all.
/// Fliers pay 1 everywhere they are allowed to go.
pub fn move_cost(unit: &Unit, hex: &Hex) -> Option<u32> {
    if !can_enter(unit, hex) {
        return None;
    }
    if unit.is_flying() {
        return Some(1);
    }
    Some(rules(hex.terrain).move_cost.max(1))
}

// ── Procedural generation ──────────────────────────────────────────────

const RIVER_SALT: u64 = 0x7269_7665;
const LAKE_SALT: u64 = 0x6c61_6b65;
const ROAD_SALT: u64 = 0x726f_6164;
const BUILDING_SALT: u64 = 0x626c_6467;

/// Raw per-coordinate noise in [0, 1). Pure function of (seed, q, r).
fn value_noise(q: i32, r: i32, seed: u64) -> f64 {
    let mixed = seed
        .wrapping_add((q as i64 as u64).wrapping_mul(374_761_393))
        .wrapping_add((r as i64 as u64).wrapping_mul(668_265_263));
    ChaCha8Rng::seed_from_u64(mixed).gen::<f64>()
}

/// 3x3 smoothed noise with the fixed kernel [1,2,1, 2,4,2, 1,2,1].
fn smooth_noise(q: i32, r: i32, seed: u64) -> f64 {
    const KERNEL: [f64; 9] = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0];
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (i, w) in KERNEL.iter().enumerate() {
        let dq = (i % 3) as i32 - 1;
        let dr = (i / 3) as i32 - 1;
        sum += value_noise(q + dq, r + dr, seed) * w;
        weight += w;
    }
    sum / weight
}

fn hex_index(grid: &[Hex], q: i32, r: i32) -> Option<usize> {
    grid.iter().position(|h| h.q == q && h.r == r)
}

/// Generate a hexagonal board of the given radius. Two noise octaves are
/// blended 0.7/0.3 and thresholded into base terrain, then a river is
/// carved edge to edge, up to two lakes are pooled, road bands are
/// stamped, and buildings are dropped onto a few buildable hexes.
pub fn generate_terrain(size: i32, seed: u64) -> Vec<Hex> {
    let mut grid = Vec::new();
    for q in -size..=size {
        for r in -size..=size {
            if !HexCoord::new(q, r).in_radius(size) {
                continue;
            }
            let n1 = smooth_noise(q, r, seed);
            let n2 = smooth_noise(q * 2, r * 2, seed.wrapping_add(13));
            let n = n1 * 0.7 + n2 * 0.3;
            let terrain = if n > 0.72 {
                Terrain::Mountain
            } else if n > 0.6 {
                Terrain::Rock
            } else if n > 0.52 {
                Terrain::Forest
            } else if n < 0.18 {
                Terrain::Water
            } else if n < 0.24 {
                Terrain::Swamp
            } else if n < 0.3 {
                Terrain::Ruin
            } else {
                Terrain::Open
            };
            grid.push(Hex { q, r, terrain, has_building: false });
        }
    }

    carve_river(&mut grid, size, seed);
    stamp_lakes(&mut grid, seed);
    stamp_roads(&mut grid, size, seed);
    stamp_buildings(&mut grid, size, seed);
    grid
}

/// Carve one winding river from the quietest top-edge column down to the
/// bottom edge. Each step picks one of four candidate offsets; hexes on
/// the path become river (85%) or water (15%).
fn carve_river(grid: &mut [Hex], size: i32, seed: u64) {
    // Start column: minimum smoothed noise along the top edge.
    let mut start_q = -size;
    let mut best = f64::MAX;
    for q in -size..=size {
        let v = smooth_noise(q, -size, seed.wrapping_add(99));
        if v < best {
            best = v;
            start_q = q;
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ RIVER_SALT);
    let mut cq = start_q;
    let mut cr = -size;
    let mut steps = 0;
    while cr <= size && steps < 8 * size {
        if let Some(idx) = hex_index(grid, cq, cr) {
            grid[idx].terrain = if rng.gen_bool(0.85) { Terrain::River } else { Terrain::Water };
        }
        let candidates = [(cq, cr + 1), (cq + 1, cr), (cq - 1, cr + 1), (cq, cr + 2)];
        let in_bounds: Vec<(i32, i32)> = candidates
            .iter()
            .copied()
            .filter(|&(q, r)| HexCoord::new(q, r).in_radius(size))
            .collect();
        if in_bounds.is_empty() {
            break;
        }
        let (nq, nr) = in_bounds[rng.gen_range(0..in_bounds.len())];
        cq = nq;
        cr = nr;
        steps += 1;
    }
}

/// Pool up to two lake blobs around existing water/river hexes.
fn stamp_lakes(grid: &mut Vec<Hex>, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ LAKE_SALT);
    let mut made = 0;
    for i in 0..grid.len() {
        if made >= 2 {
            break;
        }
        let (coord, terrain) = (HexCoord::new(grid[i].q, grid[i].r), grid[i].terrain);
        if terrain != Terrain::Water && terrain != Terrain::River {
            continue;
        }
        if !rng.gen_bool(0.08) {
            continue;
        }
        let mut blob = vec![coord];
        for nb in coord.neighbors() {
            if rng.gen_bool(0.7) {
                blob.push(nb);
            }
        }
        for b in blob {
            if let Some(idx) = hex_index(grid, b.q, b.r) {
                grid[idx].terrain = Terrain::Lake;
            }
        }
        made += 1;
    }
}

/// Stamp horizontal road bands every max(2, size/3) rows, skipping
/// lake and river hexes.
fn stamp_roads(grid: &mut [Hex], size: i32, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ ROAD_SALT);
    let step = (size / 3).max(2);
    let mut r = -size;
    while r <= size {
        for q in -size..=size {
            if !HexCoord::new(q, r).in_radius(size) {
                continue;
            }
            if let Some(idx) = hex_index(grid, q, r) {
                let t = grid[idx].terrain;
                if t != Terrain::Lake && t != Terrain::River && rng.gen_bool(0.8) {
                    grid[idx].terrain = Terrain::Road;
                }
            }
        }
        r += step;
    }
}

/// Drop max(2, size/2) buildings on buildable terrain. Buildings block
/// movement and deployment exactly like impassable terrain.
fn stamp_buildings(grid: &mut [Hex], size: i32, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ BUILDING_SALT);
    let count = (size / 2).max(2) as usize;
    let mut candidates: Vec<usize> = grid
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            matches!(h.terrain, Terrain::Open | Terrain::Road | Terrain::Ruin)
        })
        .map(|(i, _)| i)
        .collect();
    for _ in 0..count {
        if candidates.is_empty() {
            break;
        }
        let pick = rng.gen_range(0..candidates.len());
        let idx = candidates.swap_remove(pick);
        grid[idx].has_building = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::sample_unit;

    #[test]
    fn generation_is_deterministic() {
        let a = generate_terrain(6, 1234);
        let b = generate_terrain(6, 1234);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!((x.q, x.r, x.terrain, x.has_building), (y.q, y.r, y.terrain, y.has_building));
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_terrain(6, 1);
        let b = generate_terrain(6, 2);
        let same = a.iter().zip(b.iter()).filter(|(x, y)| x.terrain == y.terrain).count();
        assert!(same < a.len(), "two seeds should not produce identical maps");
    }

    #[test]
    fn board_has_expected_hex_count() {
        // Radius n: 3n^2 + 3n + 1 hexes.
        let grid = generate_terrain(4, 7);
        assert_eq!(grid.len(), 3 * 16 + 12 + 1);
    }

    #[test]
    fn rule_table_matches_design() {
        assert_eq!(rules(Terrain::Open).move_cost, 1);
        assert_eq!(rules(Terrain::Road).move_cost, 1);
        assert_eq!(rules(Terrain::Forest).move_cost, 2);
        assert!(rules(Terrain::Lake).impassable);
        assert!(rules(Terrain::Rock).impassable);
        assert!(rules(Terrain::Mountain).impassable);
        assert!(!rules(Terrain::Water).deploy_allowed);
        assert!(!rules(Terrain::River).deploy_allowed);
        assert!(rules(Terrain::Swamp).deploy_allowed);
    }

    #[test]
    fn buildings_block_entry() {
        let unit = sample_unit("0-a", crate::types::Player::P0);
        let mut hex = Hex { q: 0, r: 0, terrain: Terrain::Open, has_building: false };
        assert!(can_enter(&unit, &hex));
        hex.has_building = true;
        assert!(!can_enter(&unit, &hex));
        assert_eq!(move_cost(&unit, &hex), None);
    }

    #[test]
    fn flying_overrides_cost_not_legality() {
        let mut unit = sample_unit("0-a", crate::types::Player::P0);
        unit.traits.push("Flying".to_string());
        let forest = Hex { q: 0, r: 0, terrain: Terrain::Forest, has_building: false };
        assert_eq!(move_cost(&unit, &forest), Some(1));
        let lake = Hex { q: 0, r: 0, terrain: Terrain::Lake, has_building: false };
        assert_eq!(move_cost(&unit, &lake), None);
    }

    #[test]
    fn river_reaches_far_side() {
        let grid = generate_terrain(6, 42);
        let wet = grid
            .iter()
            .filter(|h| matches!(h.terrain, Terrain::River | Terrain::Water | Terrain::Lake))
            .count();
        assert!(wet > 0, "carving should leave water on the map");
    }
}
