// ═══════════════════════════════════════════════════════════════════════
// Objectives — marker placement at game start and round-end control
// scoring. Each marker projects a 1-hex control zone.
// ═══════════════════════════════════════════════════════════════════════

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::hex::HexCoord;
use crate::setup;
use crate::terrain;
use crate::types::{GameOutcome, GameState, Hex, ObjectiveMarker, Player};

const OBJECTIVE_SALT: u64 = 0x6f62_6a73;

/// Markers within one hex of a unit count that unit's owner as present.
pub const CONTROL_RADIUS: u32 = 1;

/// Minimum spacing between two markers.
const MARKER_SPACING: u32 = 3;

/// How many markers a board of this radius carries (3-5).
pub fn marker_count(size: i32) -> usize {
    ((3 + size / 5) as usize).clamp(3, 5)
}

/// Place objective markers on the generated grid, deterministically from
/// the map seed. Markers avoid impassable terrain, buildings, and both
/// deployment bands, and keep a minimum spacing from each other.
pub fn place_objectives(grid: &[Hex], size: i32, seed: u64) -> Vec<ObjectiveMarker> {
    let mut candidates: Vec<HexCoord> = grid
        .iter()
        .filter(|h| {
            !terrain::rules(h.terrain).impassable
                && !h.has_building
                && !setup::in_deploy_band(Player::P0, h.r, size)
                && !setup::in_deploy_band(Player::P1, h.r, size)
        })
        .map(Hex::coord)
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ OBJECTIVE_SALT);
    candidates.shuffle(&mut rng);

    let mut placed: Vec<HexCoord> = Vec::new();
    for coord in candidates {
        if placed.len() >= marker_count(size) {
            break;
        }
        if placed.iter().all(|p| p.distance(coord) >= MARKER_SPACING) {
            placed.push(coord);
        }
    }

    placed
        .into_iter()
        .enumerate()
        .map(|(i, position)| ObjectiveMarker {
            id: i as u8,
            position,
            controlled_by: None,
            contested: false,
        })
        .collect()
}

/// Round-end control pass: sole presence inside the control radius takes
/// the marker and scores a point, mixed presence contests it, absence
/// leaves it neutral.
pub fn score_round(state: &mut GameState) {
    for i in 0..state.objectives.len() {
        let position = state.objectives[i].position;
        let mut present = [false, false];
        for unit in &state.units {
            if let Some(pos) = unit.position {
                if pos.distance(position) <= CONTROL_RADIUS {
                    present[unit.owner.index()] = true;
                }
            }
        }
        let marker = &mut state.objectives[i];
        match present {
            [true, false] => {
                marker.controlled_by = Some(Player::P0);
                marker.contested = false;
                state.objective_scores[0] += 1;
            }
            [false, true] => {
                marker.controlled_by = Some(Player::P1);
                marker.contested = false;
                state.objective_scores[1] += 1;
            }
            [true, true] => {
                marker.controlled_by = None;
                marker.contested = true;
            }
            [false, false] => {
                marker.controlled_by = None;
                marker.contested = false;
            }
        }
    }
}

/// Compare final scores once the round limit is reached.
pub fn final_outcome(scores: [u8; 2]) -> GameOutcome {
    match scores[0].cmp(&scores[1]) {
        std::cmp::Ordering::Greater => GameOutcome::Winner(Player::P0),
        std::cmp::Ordering::Less => GameOutcome::Winner(Player::P1),
        std::cmp::Ordering::Equal => GameOutcome::Draw,
    }
}
