// ═══════════════════════════════════════════════════════════════════════
// Team documents — JSON catalogue loading plus built-in demo teams.
//
// On disk a catalogue is an index.json listing {id, name, faction,
// units_path} entries next to one Team document per entry. The engine
// only ever sees finished Team values.
// ═══════════════════════════════════════════════════════════════════════

use std::fs;
use std::path::Path;

use serde::Deserialize;
use skirmish_engine::{Team, UnitTemplate, Weapon, WeaponKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeamLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad team document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of the catalogue index. Identity lives in the team document
/// itself; the index is for discovery.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[allow(dead_code)]
    id: String,
    #[allow(dead_code)]
    name: String,
    #[serde(default)]
    #[allow(dead_code)]
    faction: String,
    units_path: String,
}

/// Load every team listed in `<dir>/index.json`.
pub fn load_teams(dir: &Path) -> Result<Vec<Team>, TeamLoadError> {
    let index: Vec<IndexEntry> =
        serde_json::from_str(&fs::read_to_string(dir.join("index.json"))?)?;
    let mut teams = Vec::new();
    for entry in index {
        let doc = fs::read_to_string(dir.join(&entry.units_path))?;
        teams.push(serde_json::from_str::<Team>(&doc)?);
    }
    Ok(teams)
}

// ── Built-in demo teams ────────────────────────────────────────────────

fn weapon(name: &str, kind: WeaponKind, attacks: u8, range: u32, ap: i8) -> Weapon {
    Weapon { name: name.into(), kind, attacks, range, ap }
}

fn unit(
    id: &str,
    name: &str,
    quality: u8,
    defense: u8,
    speed: u32,
    wounds: i32,
    weapons: Vec<Weapon>,
    traits: Vec<String>,
) -> UnitTemplate {
    UnitTemplate {
        id: id.into(),
        name: name.into(),
        image: String::new(),
        quality,
        defense,
        speed,
        wounds,
        weapons,
        traits,
    }
}

/// Two small demo squads so `play` works without any files on disk.
pub fn builtin_teams() -> Vec<Team> {
    vec![
        Team {
            id: "iron-wardens".into(),
            name: "Iron Wardens".into(),
            faction: "Order".into(),
            units: vec![
                unit(
                    "captain",
                    "Warden Captain",
                    3,
                    3,
                    3,
                    4,
                    vec![
                        weapon("Greatblade", WeaponKind::Melee, 3, 0, 2),
                        weapon("Pistol", WeaponKind::Ranged, 1, 3, 1),
                    ],
                    Vec::new(),
                ),
                unit(
                    "warden-1",
                    "Warden",
                    4,
                    4,
                    3,
                    3,
                    vec![
                        weapon("Sword", WeaponKind::Melee, 2, 0, 1),
                        weapon("Crossbow", WeaponKind::Ranged, 1, 6, 0),
                    ],
                    Vec::new(),
                ),
                unit(
                    "warden-2",
                    "Warden",
                    4,
                    4,
                    3,
                    3,
                    vec![
                        weapon("Sword", WeaponKind::Melee, 2, 0, 1),
                        weapon("Crossbow", WeaponKind::Ranged, 1, 6, 0),
                    ],
                    Vec::new(),
                ),
                unit(
                    "hawk",
                    "Messenger Hawk",
                    4,
                    5,
                    5,
                    2,
                    vec![weapon("Talons", WeaponKind::Melee, 2, 0, 0)],
                    vec!["flying".into()],
                ),
            ],
        },
        Team {
            id: "ashen-pact".into(),
            name: "Ashen Pact".into(),
            faction: "Ruin".into(),
            units: vec![
                unit(
                    "reaver",
                    "Pact Reaver",
                    3,
                    4,
                    3,
                    4,
                    vec![weapon("Scythe", WeaponKind::Melee, 3, 0, 1)],
                    Vec::new(),
                ),
                unit(
                    "archer-1",
                    "Ash Archer",
                    4,
                    4,
                    3,
                    3,
                    vec![
                        weapon("Knife", WeaponKind::Melee, 1, 0, 0),
                        weapon("Longbow", WeaponKind::Ranged, 1, 7, 0),
                    ],
                    Vec::new(),
                ),
                unit(
                    "archer-2",
                    "Ash Archer",
                    4,
                    4,
                    3,
                    3,
                    vec![
                        weapon("Knife", WeaponKind::Melee, 1, 0, 0),
                        weapon("Longbow", WeaponKind::Ranged, 1, 7, 0),
                    ],
                    Vec::new(),
                ),
                unit(
                    "wraith",
                    "Cinder Wraith",
                    4,
                    5,
                    4,
                    2,
                    vec![weapon("Claws", WeaponKind::Melee, 2, 0, 1)],
                    vec!["flying".into()],
                ),
            ],
        },
    ]
}
