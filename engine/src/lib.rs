// ═══════════════════════════════════════════════════════════════════════
// skirmish-engine — headless rules engine for a two-player hex-grid
// tabletop skirmish game.
//
// The engine is a pure state machine: a UI (or the bundled runner)
// issues commands against the GameState aggregate and reads the
// resulting state back. No I/O, no globals; all randomness is drawn
// from seeded streams carried inside the aggregate, so a game is
// reproducible from its seed.
// ═══════════════════════════════════════════════════════════════════════

pub mod combat;
pub mod engine;
pub mod hex;
pub mod objectives;
pub mod pathfind;
pub mod setup;
pub mod terrain;
pub mod types;


pub use engine::{CommandError, CommandResult, ValidTargets};
pub use hex::HexCoord;
pub use terrain::Terrain;
pub use types::*;
