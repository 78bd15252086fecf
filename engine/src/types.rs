// ═══════════════════════════════════════════════════════════════════════
// Core types — units, weapons, teams, objectives, and the game aggregate
// ═══════════════════════════════════════════════════════════════════════

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;
use crate::terrain::Terrain;

/// Number of rounds before the game ends and scores are compared.
pub const ROUND_LIMIT: u8 = 4;

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    P0,
    P1,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::P0, Player::P1];

    pub fn opponent(self) -> Player {
        match self {
            Player::P0 => Player::P1,
            Player::P1 => Player::P0,
        }
    }

    /// Index into per-player arrays such as `objective_scores`.
    pub fn index(self) -> usize {
        match self {
            Player::P0 => 0,
            Player::P1 => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::P0 => write!(f, "Player 0"),
            Player::P1 => write!(f, "Player 1"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    TeamSelect,
    Deploy,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Melee,
    Ranged,
}

/// Outcome once the round limit is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

// ── Board ──────────────────────────────────────────────────────────────

/// One grid cell. Coordinates are fixed after generation; `terrain` and
/// `has_building` are only touched by the generation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
    pub terrain: Terrain,
    #[serde(default)]
    pub has_building: bool,
}

impl Hex {
    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

// ── Weapons & units ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    /// Number of hit dice rolled per attack.
    pub attacks: u8,
    /// Range in hexes; 0 for melee weapons.
    #[serde(default)]
    pub range: u32,
    /// Armor penetration, added to the target's save threshold.
    #[serde(default)]
    pub ap: i8,
}

impl Weapon {
    pub fn is_melee(&self) -> bool {
        self.kind == WeaponKind::Melee
    }
}

/// Blueprint for a unit inside a team document. No owner, no position —
/// live units are stamped from these at deploy setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub quality: u8,
    pub defense: u8,
    pub speed: u32,
    pub wounds: i32,
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub traits: Vec<String>,
}

/// A live unit on the battlefield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub owner: Player,
    pub image: String,
    /// Hit threshold: a hit die succeeds on `quality` or better.
    pub quality: u8,
    /// Save threshold before armor penetration is applied.
    pub defense: u8,
    /// Movement allowance in hexes per activation (doubled when running).
    pub speed: u32,
    pub wounds: i32,
    pub max_wounds: i32,
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub traits: Vec<String>,
    pub position: Option<HexCoord>,

    // Per-round activation state, reset at every round boundary.
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub has_moved: bool,
    #[serde(default)]
    pub has_run: bool,
    #[serde(default)]
    pub used_weapons: Vec<String>,
    #[serde(default)]
    pub has_attacked_in_melee: bool,
    #[serde(default)]
    pub is_exhausted: bool,
}

impl Unit {
    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.name == name)
    }

    pub fn has_melee_weapon(&self) -> bool {
        self.weapons.iter().any(Weapon::is_melee)
    }

    pub fn is_flying(&self) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case("flying"))
    }

    /// Has this unit committed to its current activation (moved or fired)?
    pub fn has_acted(&self) -> bool {
        self.has_moved || !self.used_weapons.is_empty()
    }

    /// Clear per-activation flags when the activation ends.
    pub fn reset_activation(&mut self) {
        self.has_moved = false;
        self.has_run = false;
        self.used_weapons.clear();
    }

    /// Full reset at the round boundary. Exhaustion and the melee marker
    /// are sticky for the round and only clear here.
    pub fn reset_round(&mut self) {
        self.reset_activation();
        self.activated = false;
        self.has_attacked_in_melee = false;
        self.is_exhausted = false;
    }
}

// ── Teams ──────────────────────────────────────────────────────────────

/// A read-only team template, consumed once at deploy setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub faction: String,
    pub units: Vec<UnitTemplate>,
}

// ── Objectives ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveMarker {
    pub id: u8,
    pub position: HexCoord,
    pub controlled_by: Option<Player>,
    pub contested: bool,
}

// ── Dice audit log ─────────────────────────────────────────────────────

/// One batch of dice, appended to the audit trail for every hit and save
/// roll so a UI can replay the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub label: String,
    pub dice: Vec<u8>,
    pub target: u8,
    pub success: u8,
}

// ── Pending combat continuations ───────────────────────────────────────

/// An attack that has been declared and validated but not yet resolved.
/// The dice flow pauses here until `resolve_attack` or `execute_attack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttack {
    pub attacker_id: String,
    pub target_id: String,
    pub weapon_name: String,
    pub is_counter: bool,
    /// Exhaustion snapshot at declaration time; the swing itself may
    /// exhaust the attacker, which must not affect its own hit rolls.
    pub attacker_exhausted: bool,
}

/// A surviving melee target may strike back; the decision belongs to the
/// defending player and arrives via accept/decline commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterPrompt {
    pub original_attacker: String,
    pub counter_attacker: String,
}

// ── Game state (aggregate root) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub size: i32,
    pub grid: Vec<Hex>,
    pub units: Vec<Unit>,
    pub current_player: Player,
    pub round: u8,
    pub selected_unit_id: Option<String>,
    pub dice_log: Vec<DiceRoll>,
    pub objectives: Vec<ObjectiveMarker>,
    pub objective_scores: [u8; 2],
    pub winner: Option<GameOutcome>,

    pub available_teams: Vec<Team>,
    pub selected_teams: [Option<String>; 2],

    pub pending_attack: Option<PendingAttack>,
    pub pending_counter: Option<CounterPrompt>,

    // Deterministic RNG: dice and derived seeds are drawn from
    // counter-indexed ChaCha8 streams keyed by `seed`.
    pub seed: u64,
    pub rng_counter: u64,
}

impl GameState {
    /// Fresh aggregate in team-select with an empty grid. Queries are
    /// valid immediately; the grid stays empty until `regenerate`.
    pub fn new(size: i32, seed: u64) -> GameState {
        GameState {
            phase: Phase::TeamSelect,
            size,
            grid: Vec::new(),
            units: Vec::new(),
            current_player: Player::P0,
            round: 1,
            selected_unit_id: None,
            dice_log: Vec::new(),
            objectives: Vec::new(),
            objective_scores: [0, 0],
            winner: None,
            available_teams: Vec::new(),
            selected_teams: [None, None],
            pending_attack: None,
            pending_counter: None,
            seed,
            rng_counter: 0,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn hex_at(&self, coord: HexCoord) -> Option<&Hex> {
        self.grid.iter().find(|h| h.q == coord.q && h.r == coord.r)
    }

    pub fn unit_at(&self, coord: HexCoord) -> Option<&Unit> {
        self.units.iter().find(|u| u.position == Some(coord))
    }

    pub fn occupied(&self, coord: HexCoord) -> bool {
        self.unit_at(coord).is_some()
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.available_teams.iter().find(|t| t.id == id)
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.selected_unit_id.as_deref().and_then(|id| self.unit(id))
    }

    /// Units of one player that are placed and still awaiting activation.
    pub fn has_unactivated(&self, player: Player) -> bool {
        self.units
            .iter()
            .any(|u| u.owner == player && !u.activated && u.position.is_some())
    }

    // ── Deterministic dice ─────────────────────────────────────────

    /// Roll `n` six-sided dice from the counter-indexed stream.
    pub fn roll_dice(&mut self, n: usize) -> Vec<u8> {
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed.wrapping_add(self.rng_counter.wrapping_mul(999_961)),
        );
        self.rng_counter += 1;
        (0..n).map(|_| rng.gen_range(1..=6u8)).collect()
    }

    /// Derive a fresh map seed from the same stream.
    pub fn next_seed(&mut self) -> u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed.wrapping_add(self.rng_counter.wrapping_mul(6_700_417)),
        );
        self.rng_counter += 1;
        rng.gen::<u64>()
    }
}

// ── Test fixtures ──────────────────────────────────────────────────────
