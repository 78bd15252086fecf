// ═══════════════════════════════════════════════════════════════════════
// Command surface — the turn/activation state machine.
//
// Architecture:
//   The engine is a pure state machine. It never does I/O and never
//   blocks: anywhere the table would wait on a human (dice review, the
//   counter-attack decision) the aggregate parks an explicit pending
//   value and a follow-up command resolves it.
//
// Flow:
//   team-select → deploy → playing → gameover
//   Inside playing, players alternate single-unit activations; a round
//   ends when no positioned unit remains unactivated, and the game ends
//   after ROUND_LIMIT rounds on objective score.
//
// Every mutating command returns Result and leaves the aggregate
// untouched when it rejects. The accept/reject rules themselves follow
// the tabletop rules; only the reporting is typed.
// ═══════════════════════════════════════════════════════════════════════

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat;
use crate::hex::HexCoord;
use crate::objectives;
use crate::pathfind;
use crate::setup;
use crate::terrain;
use crate::types::{
    CounterPrompt, DiceRoll, GameState, Hex, ObjectiveMarker, PendingAttack, Phase, Player, Team,
    Unit, Weapon, ROUND_LIMIT,
};

// ── Errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command not allowed in phase {0:?}")]
    IllegalPhase(Phase),
    #[error("unknown team: {0}")]
    UnknownTeam(String),
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("unknown weapon: {0}")]
    UnknownWeapon(String),
    #[error("unit does not belong to the acting player")]
    NotYourTurn,
    #[error("unit has already activated this round")]
    AlreadyActivated,
    #[error("another unit's activation is already committed")]
    ActivationInProgress,
    #[error("unit has already moved or fired this activation")]
    AlreadyMoved,
    #[error("destination is not reachable")]
    IllegalDestination,
    #[error("hex is not a legal deployment spot")]
    IllegalDeploy,
    #[error("target is not legal for this weapon")]
    IllegalTarget,
    #[error("weapon already used this activation: {0}")]
    WeaponAlreadyUsed(String),
    #[error("an attack is still waiting to be resolved")]
    AttackPending,
    #[error("no attack is waiting to be resolved")]
    NoPendingAttack,
    #[error("no counter-attack decision is pending")]
    NoCounterPending,
    #[error("setup is incomplete")]
    IncompleteSetup,
}

pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Enemy ids a unit can currently reach with its remaining weapons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidTargets {
    pub shootable: Vec<String>,
    pub meleeable: Vec<String>,
}

// ── Queries ────────────────────────────────────────────────────────────

impl GameState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn grid(&self) -> &[Hex] {
        &self.grid
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn dice_log(&self) -> &[DiceRoll] {
        &self.dice_log
    }

    pub fn objectives(&self) -> &[ObjectiveMarker] {
        &self.objectives
    }

    /// Running disables every ranged weapon for the activation.
    pub fn can_unit_shoot(&self, unit_id: &str) -> bool {
        self.unit(unit_id).map_or(false, |u| !u.has_run)
    }

    /// Weapons the unit may still use this activation.
    pub fn available_weapons(&self, unit_id: &str) -> Vec<&Weapon> {
        let Some(unit) = self.unit(unit_id) else { return Vec::new() };
        unit.weapons
            .iter()
            .filter(|w| !unit.used_weapons.contains(&w.name))
            .filter(|w| w.is_melee() || !unit.has_run)
            .collect()
    }

    pub fn valid_targets(&self, unit_id: &str) -> ValidTargets {
        let mut out = ValidTargets::default();
        let Some(unit) = self.unit(unit_id) else { return out };
        let Some(pos) = unit.position else { return out };
        let weapons = self.available_weapons(unit_id);
        let has_melee = weapons.iter().any(|w| w.is_melee());
        let max_range = weapons
            .iter()
            .filter(|w| !w.is_melee())
            .map(|w| w.range)
            .max()
            .unwrap_or(0);
        for enemy in self.units.iter().filter(|u| u.owner != unit.owner) {
            let Some(epos) = enemy.position else { continue };
            let dist = pos.distance(epos);
            if has_melee && dist == 1 {
                out.meleeable.push(enemy.id.clone());
            }
            if max_range > 0 && dist <= max_range {
                out.shootable.push(enemy.id.clone());
            }
        }
        out
    }

    /// Deploy legality for the acting player.
    pub fn can_deploy_on(&self, coord: HexCoord) -> bool {
        setup::can_deploy_for(self, self.current_player, coord)
    }

    /// Hexes the unit can move to, with their true movement cost.
    pub fn reachable(&self, unit_id: &str, is_run: bool) -> HashMap<(i32, i32), u32> {
        let Some(unit) = self.unit(unit_id) else { return HashMap::new() };
        let Some(start) = unit.position else { return HashMap::new() };
        let budget = if is_run { unit.speed * 2 } else { unit.speed };
        pathfind::reachable_costs(unit, &self.grid, &self.units, start, budget)
    }
}

// ── Commands ───────────────────────────────────────────────────────────

impl GameState {
    /// Replace the team catalogue, sorted by display name.
    pub fn load_teams(&mut self, mut teams: Vec<Team>) {
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        self.available_teams = teams;
    }

    pub fn select_team(&mut self, player: Player, team_id: &str) -> CommandResult {
        if self.phase != Phase::TeamSelect {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.team(team_id).is_none() {
            return Err(CommandError::UnknownTeam(team_id.to_string()));
        }
        self.selected_teams[player.index()] = Some(team_id.to_string());
        Ok(())
    }

    /// Generate a fresh board. Any placements made so far are cleared —
    /// units redeploy onto the new map.
    pub fn regenerate(&mut self, size: Option<i32>, seed: Option<u64>) -> CommandResult {
        if matches!(self.phase, Phase::Playing | Phase::GameOver) {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        let size = size.unwrap_or(self.size);
        let seed = match seed {
            Some(s) => s,
            None => self.next_seed(),
        };
        self.size = size;
        self.seed = seed;
        self.grid = terrain::generate_terrain(size, seed);
        for unit in &mut self.units {
            unit.position = None;
        }
        self.selected_unit_id = None;
        self.objectives.clear();
        Ok(())
    }

    /// Stamp both teams into live units and open the deploy phase.
    pub fn start_deploy(&mut self) -> CommandResult {
        if self.phase != Phase::TeamSelect {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        let [Some(id_a), Some(id_b)] = self.selected_teams.clone() else {
            return Err(CommandError::IncompleteSetup);
        };
        let team_a = self
            .team(&id_a)
            .ok_or_else(|| CommandError::UnknownTeam(id_a.clone()))?
            .clone();
        let team_b = self
            .team(&id_b)
            .ok_or_else(|| CommandError::UnknownTeam(id_b.clone()))?
            .clone();

        self.regenerate(None, None)?;
        let mut units = setup::instantiate_units(&team_a, Player::P0);
        units.extend(setup::instantiate_units(&team_b, Player::P1));
        self.units = units;

        self.phase = Phase::Deploy;
        self.current_player = Player::P0;
        self.round = 1;
        self.selected_unit_id = None;
        self.dice_log.clear();
        self.objective_scores = [0, 0];
        self.winner = None;
        self.pending_attack = None;
        self.pending_counter = None;
        Ok(())
    }

    pub fn place_unit(&mut self, unit_id: &str, coord: HexCoord) -> CommandResult {
        if self.phase != Phase::Deploy {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        let owner = self
            .unit(unit_id)
            .ok_or_else(|| CommandError::UnknownUnit(unit_id.to_string()))?
            .owner;
        if owner != self.current_player {
            return Err(CommandError::NotYourTurn);
        }
        if !setup::can_deploy_for(self, self.current_player, coord) {
            return Err(CommandError::IllegalDeploy);
        }
        if let Some(unit) = self.unit_mut(unit_id) {
            unit.position = Some(coord);
        }
        self.selected_unit_id = None;
        Ok(())
    }

    pub fn unplace_unit(&mut self, unit_id: &str) -> CommandResult {
        if self.phase != Phase::Deploy {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        let owner = self
            .unit(unit_id)
            .ok_or_else(|| CommandError::UnknownUnit(unit_id.to_string()))?
            .owner;
        if owner != self.current_player {
            return Err(CommandError::NotYourTurn);
        }
        if let Some(unit) = self.unit_mut(unit_id) {
            unit.position = None;
        }
        self.selected_unit_id = None;
        Ok(())
    }

    /// Hand deployment over to the other player.
    pub fn deploy_next(&mut self) -> CommandResult {
        if self.phase != Phase::Deploy {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        self.current_player = self.current_player.opponent();
        self.selected_unit_id = None;
        Ok(())
    }

    /// Place every remaining unit into its owner's band, or reject
    /// without touching anything if they cannot all fit.
    pub fn auto_deploy_units(&mut self) -> CommandResult {
        if self.phase != Phase::Deploy {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        let plan = setup::plan_auto_deploy(self).ok_or(CommandError::IncompleteSetup)?;
        for (id, coord) in plan {
            if let Some(unit) = self.unit_mut(&id) {
                unit.position = Some(coord);
            }
        }
        Ok(())
    }

    /// Every unit must be placed. Drops the objective markers and opens
    /// round 1 with player 0.
    pub fn start_game(&mut self) -> CommandResult {
        if self.phase != Phase::Deploy {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.units.iter().any(|u| u.position.is_none()) {
            return Err(CommandError::IncompleteSetup);
        }
        self.objectives = objectives::place_objectives(&self.grid, self.size, self.seed);
        for unit in &mut self.units {
            unit.reset_round();
        }
        self.phase = Phase::Playing;
        self.round = 1;
        self.current_player = Player::P0;
        self.selected_unit_id = None;
        Ok(())
    }

    /// Read-only activation eligibility, shared by select/move/attack:
    /// the unit is the acting player's, fresh this round, on the board,
    /// and no other unit has already committed its activation.
    fn check_activatable(&self, unit_id: &str) -> CommandResult {
        if let Some(selected) = self.selected_unit() {
            if selected.id != unit_id && selected.has_acted() {
                return Err(CommandError::ActivationInProgress);
            }
        }
        let unit = self
            .unit(unit_id)
            .ok_or_else(|| CommandError::UnknownUnit(unit_id.to_string()))?;
        if unit.owner != self.current_player {
            return Err(CommandError::NotYourTurn);
        }
        if unit.activated {
            return Err(CommandError::AlreadyActivated);
        }
        if unit.position.is_none() {
            return Err(CommandError::IllegalTarget);
        }
        Ok(())
    }

    /// Pick a unit to activate. Before the unit commits (moves or
    /// fires) the player may still change their mind; afterwards the
    /// activation is locked until `end_activation`.
    pub fn select_unit(&mut self, unit_id: &str) -> CommandResult {
        if self.phase != Phase::Playing {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.pending_attack.is_some() || self.pending_counter.is_some() {
            return Err(CommandError::AttackPending);
        }
        self.check_activatable(unit_id)?;
        self.selected_unit_id = Some(unit_id.to_string());
        Ok(())
    }

    /// One move per activation, and never after firing. Running doubles
    /// the budget and marks the unit as unable to shoot.
    pub fn move_unit(&mut self, unit_id: &str, dest: HexCoord, is_run: bool) -> CommandResult {
        if self.phase != Phase::Playing {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.pending_attack.is_some() || self.pending_counter.is_some() {
            return Err(CommandError::AttackPending);
        }
        self.check_activatable(unit_id)?;

        let (start, budget, acted) = {
            let unit = self
                .unit(unit_id)
                .ok_or_else(|| CommandError::UnknownUnit(unit_id.to_string()))?;
            let Some(start) = unit.position else {
                return Err(CommandError::IllegalDestination);
            };
            let budget = if is_run { unit.speed * 2 } else { unit.speed };
            (start, budget, unit.has_acted())
        };
        if acted {
            return Err(CommandError::AlreadyMoved);
        }
        if dest == start || self.hex_at(dest).is_none() || self.occupied(dest) {
            return Err(CommandError::IllegalDestination);
        }
        let reachable = {
            let unit = self
                .unit(unit_id)
                .ok_or_else(|| CommandError::UnknownUnit(unit_id.to_string()))?;
            pathfind::reachable_costs(unit, &self.grid, &self.units, start, budget)
        };
        if !reachable.contains_key(&dest.key()) {
            return Err(CommandError::IllegalDestination);
        }

        self.selected_unit_id = Some(unit_id.to_string());
        if let Some(unit) = self.unit_mut(unit_id) {
            unit.position = Some(dest);
            unit.has_moved = true;
            unit.has_run = is_run;
        }
        Ok(())
    }

    /// Declare an attack. Validation happens here; the dice flow is a
    /// continuation (`resolve_attack` or `execute_attack`) so a UI can
    /// pause between rolls.
    pub fn attack(&mut self, attacker_id: &str, target_id: &str, weapon_name: &str) -> CommandResult {
        if self.phase != Phase::Playing {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.pending_attack.is_some() || self.pending_counter.is_some() {
            return Err(CommandError::AttackPending);
        }
        self.check_activatable(attacker_id)?;

        let (attacker_pos, attacker_exhausted, attacker_ran, weapon, already_used) = {
            let attacker = self
                .unit(attacker_id)
                .ok_or_else(|| CommandError::UnknownUnit(attacker_id.to_string()))?;
            let weapon = attacker
                .weapon(weapon_name)
                .ok_or_else(|| CommandError::UnknownWeapon(weapon_name.to_string()))?
                .clone();
            let used = attacker.used_weapons.iter().any(|w| w.as_str() == weapon_name);
            (attacker.position, attacker.is_exhausted, attacker.has_run, weapon, used)
        };
        let Some(attacker_pos) = attacker_pos else {
            return Err(CommandError::IllegalTarget);
        };
        if already_used {
            return Err(CommandError::WeaponAlreadyUsed(weapon_name.to_string()));
        }

        let (target_pos, target_owner) = {
            let target = self
                .unit(target_id)
                .ok_or_else(|| CommandError::UnknownUnit(target_id.to_string()))?;
            (target.position, target.owner)
        };
        let Some(target_pos) = target_pos else {
            return Err(CommandError::IllegalTarget);
        };
        if target_owner == self.current_player {
            return Err(CommandError::IllegalTarget);
        }

        let distance = attacker_pos.distance(target_pos);
        if !combat::weapon_in_range(&weapon, distance) {
            return Err(CommandError::IllegalTarget);
        }
        if !weapon.is_melee() && attacker_ran {
            return Err(CommandError::IllegalTarget);
        }

        self.selected_unit_id = Some(attacker_id.to_string());
        self.pending_attack = Some(PendingAttack {
            attacker_id: attacker_id.to_string(),
            target_id: target_id.to_string(),
            weapon_name: weapon.name.clone(),
            is_counter: false,
            attacker_exhausted,
        });
        Ok(())
    }

    /// Engine-rolled resolution of the pending attack: roll hit dice,
    /// then saves, append both batches to the audit log, apply.
    pub fn resolve_attack(&mut self) -> CommandResult {
        let Some(pending) = self.pending_attack.clone() else {
            return Err(CommandError::NoPendingAttack);
        };
        let (quality, attacks, weapon_name, ap) = {
            let attacker = self
                .unit(&pending.attacker_id)
                .ok_or_else(|| CommandError::UnknownUnit(pending.attacker_id.clone()))?;
            let weapon = attacker
                .weapon(&pending.weapon_name)
                .ok_or_else(|| CommandError::UnknownWeapon(pending.weapon_name.clone()))?;
            (attacker.quality, weapon.attacks, weapon.name.clone(), weapon.ap)
        };
        let defense = self
            .unit(&pending.target_id)
            .ok_or_else(|| CommandError::UnknownUnit(pending.target_id.clone()))?
            .defense;

        let hit_rolls = self.roll_dice(attacks as usize);
        let hit_target = combat::hit_threshold(quality, pending.attacker_exhausted);
        let hits = combat::count_hits(&hit_rolls, quality, pending.attacker_exhausted);
        self.dice_log.push(DiceRoll {
            label: format!("Hit roll ({})", weapon_name),
            dice: hit_rolls,
            target: hit_target,
            success: hits,
        });

        let mut wounds = 0;
        if hits > 0 {
            let save_target = combat::save_target(defense, ap);
            let save_rolls = self.roll_dice(hits as usize);
            let failed = combat::count_failed_saves(&save_rolls, save_target);
            self.dice_log.push(DiceRoll {
                label: format!("Save roll (AP {})", ap),
                dice: save_rolls,
                target: save_target,
                success: hits - failed,
            });
            wounds = failed;
        }

        self.execute_attack(hits, wounds)
    }

    /// Externally-rolled continuation: apply a known outcome to the
    /// pending attack. Wounds beyond the hit count are ignored.
    pub fn execute_attack(&mut self, hits: u8, wounds: u8) -> CommandResult {
        let Some(pending) = self.pending_attack.take() else {
            return Err(CommandError::NoPendingAttack);
        };
        let wounds = wounds.min(hits);
        let is_melee = self
            .unit(&pending.attacker_id)
            .and_then(|a| a.weapon(&pending.weapon_name))
            .map_or(false, Weapon::is_melee);

        let mut target_survived = false;
        let mut target_has_melee = false;
        if let Some(target) = self.unit_mut(&pending.target_id) {
            target.wounds -= wounds as i32;
            target_survived = target.wounds > 0;
            target_has_melee = target.has_melee_weapon();
        }
        if !target_survived {
            self.units.retain(|u| u.id != pending.target_id);
            if self.selected_unit_id.as_deref() == Some(pending.target_id.as_str()) {
                self.selected_unit_id = None;
            }
        }

        if let Some(attacker) = self.unit_mut(&pending.attacker_id) {
            // A counter swing does not consume the weapon slot that the
            // counter-attacker will need in its own activation.
            if !pending.is_counter {
                attacker.used_weapons.push(pending.weapon_name.clone());
            }
            if is_melee {
                attacker.has_attacked_in_melee = true;
                attacker.is_exhausted = true;
            }
        }

        if is_melee && !pending.is_counter && target_survived && target_has_melee {
            self.pending_counter = Some(CounterPrompt {
                original_attacker: pending.attacker_id,
                counter_attacker: pending.target_id,
            });
        }
        Ok(())
    }

    /// The surviving defender strikes back with its first melee weapon.
    /// The reversed attack still needs its own resolve/execute step.
    pub fn accept_counter_attack(&mut self) -> CommandResult {
        let Some(prompt) = self.pending_counter.clone() else {
            return Err(CommandError::NoCounterPending);
        };
        let (weapon_name, exhausted) = {
            let counter_attacker = self
                .unit(&prompt.counter_attacker)
                .ok_or_else(|| CommandError::UnknownUnit(prompt.counter_attacker.clone()))?;
            let weapon = counter_attacker
                .weapons
                .iter()
                .find(|w| w.is_melee())
                .ok_or(CommandError::IllegalTarget)?;
            (weapon.name.clone(), counter_attacker.is_exhausted)
        };
        self.pending_counter = None;
        self.pending_attack = Some(PendingAttack {
            attacker_id: prompt.counter_attacker,
            target_id: prompt.original_attacker,
            weapon_name,
            is_counter: true,
            attacker_exhausted: exhausted,
        });
        Ok(())
    }

    pub fn decline_counter_attack(&mut self) -> CommandResult {
        if self.pending_counter.take().is_none() {
            return Err(CommandError::NoCounterPending);
        }
        Ok(())
    }

    /// Close the current activation and pick the next actor: the other
    /// player if they still have units to activate, else the same
    /// player, else the round boundary.
    pub fn end_activation(&mut self) -> CommandResult {
        if self.phase != Phase::Playing {
            return Err(CommandError::IllegalPhase(self.phase));
        }
        if self.pending_attack.is_some() || self.pending_counter.is_some() {
            return Err(CommandError::AttackPending);
        }
        if let Some(id) = self.selected_unit_id.take() {
            if let Some(unit) = self.unit_mut(&id) {
                unit.activated = true;
                unit.reset_activation();
            }
        }
        let other = self.current_player.opponent();
        if self.has_unactivated(other) {
            self.current_player = other;
        } else if !self.has_unactivated(self.current_player) {
            self.end_round();
        }
        Ok(())
    }

    /// Round boundary: score objectives, reset every unit, advance the
    /// round counter or end the game on the round limit.
    fn end_round(&mut self) {
        objectives::score_round(self);
        for unit in &mut self.units {
            unit.reset_round();
        }
        self.round += 1;
        self.selected_unit_id = None;
        if self.round > ROUND_LIMIT {
            self.phase = Phase::GameOver;
            self.winner = Some(objectives::final_outcome(self.objective_scores));
        } else {
            self.current_player = Player::P0;
        }
    }
}
