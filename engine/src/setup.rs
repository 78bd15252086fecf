// ═══════════════════════════════════════════════════════════════════════
// Deploy setup — stamping live units from team templates, deployment
// zone rules, and automatic placement.
// ═══════════════════════════════════════════════════════════════════════

use crate::hex::HexCoord;
use crate::terrain;
use crate::types::{GameState, Player, Team, Unit};

/// Depth of each player's deployment band in rows, derived from board
/// size: roughly a third, never fewer than 2 or more than 4.
pub fn deploy_rows(size: i32) -> i32 {
    (size / 3).clamp(2, 4)
}

/// Is `r` inside the given player's deployment band? Player 0 deploys
/// in the top rows, player 1 in the bottom rows.
pub fn in_deploy_band(player: Player, r: i32, size: i32) -> bool {
    let rows = deploy_rows(size);
    match player {
        Player::P0 => r <= -size + rows - 1,
        Player::P1 => r >= size - rows + 1,
    }
}

/// Full deploy legality for one player and hex: deployable terrain, no
/// building, unoccupied, and inside that player's band.
pub fn can_deploy_for(state: &GameState, player: Player, coord: HexCoord) -> bool {
    let Some(hex) = state.hex_at(coord) else { return false };
    if !terrain::rules(hex.terrain).deploy_allowed || hex.has_building {
        return false;
    }
    if state.occupied(coord) {
        return false;
    }
    in_deploy_band(player, coord.r, state.size)
}

/// Stamp live units from a team template. Identity is assigned here,
/// once: `"{owner}-{template_id}"`. Nothing else ever rewrites ids.
pub fn instantiate_units(team: &Team, owner: Player) -> Vec<Unit> {
    team.units
        .iter()
        .map(|tpl| Unit {
            id: format!("{}-{}", owner.index(), tpl.id),
            name: tpl.name.clone(),
            owner,
            image: tpl.image.clone(),
            quality: tpl.quality,
            defense: tpl.defense,
            speed: tpl.speed,
            wounds: tpl.wounds,
            max_wounds: tpl.wounds,
            weapons: tpl.weapons.clone(),
            traits: tpl.traits.clone(),
            position: None,
            activated: false,
            has_moved: false,
            has_run: false,
            used_weapons: Vec::new(),
            has_attacked_in_melee: false,
            is_exhausted: false,
        })
        .collect()
}

/// Plan placements for every currently unplaced unit, or None if the
/// deployment bands cannot hold them all. The caller commits the plan
/// atomically, so a failed plan leaves the state untouched.
pub fn plan_auto_deploy(state: &GameState) -> Option<Vec<(String, HexCoord)>> {
    let mut taken: Vec<HexCoord> = state
        .units
        .iter()
        .filter_map(|u| u.position)
        .collect();
    let mut plan = Vec::new();

    for player in Player::BOTH {
        let rows = deploy_rows(state.size);
        // Player 0 fills from the top edge inward, player 1 from the
        // bottom edge inward.
        let band: Vec<i32> = match player {
            Player::P0 => (-state.size..-state.size + rows).collect(),
            Player::P1 => (state.size - rows + 1..=state.size).rev().collect(),
        };
        let unplaced: Vec<&Unit> = state
            .units
            .iter()
            .filter(|u| u.owner == player && u.position.is_none())
            .collect();

        for unit in unplaced {
            let mut spot = None;
            'rows: for &r in &band {
                for q in -state.size..=state.size {
                    let coord = HexCoord::new(q, r);
                    if !coord.in_radius(state.size) || taken.contains(&coord) {
                        continue;
                    }
                    if can_deploy_for(state, player, coord) {
                        spot = Some(coord);
                        break 'rows;
                    }
                }
            }
            let coord = spot?;
            taken.push(coord);
            plan.push((unit.id.clone(), coord));
        }
    }

    Some(plan)
}
