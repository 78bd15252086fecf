// ═══════════════════════════════════════════════════════════════════════
// Runner — CLI entry point for headless playouts and map previews
// ═══════════════════════════════════════════════════════════════════════

mod teams;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_engine::{
    GameOutcome, GameState, HexCoord, Phase, Player, Terrain,
};

#[derive(Parser)]
#[command(name = "skirmish-runner", about = "Hex Skirmish Lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a full random game and print the result
    Play {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        /// Board radius in hexes
        #[arg(long, default_value_t = 9)]
        size: i32,
        /// Directory with index.json + team documents (built-in demo
        /// teams when omitted)
        #[arg(short, long)]
        teams_dir: Option<PathBuf>,
    },
    /// Generate a map and print it
    Map {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 9)]
        size: i32,
    },
    /// List the teams in a catalogue directory
    Teams {
        #[arg(short, long)]
        dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Play { seed, size, teams_dir } => cmd_play(seed, size, teams_dir),
        Commands::Map { seed, size } => cmd_map(seed, size),
        Commands::Teams { dir } => cmd_teams(&dir),
    }
}

// ── play ───────────────────────────────────────────────────────────────

fn cmd_play(seed: u64, size: i32, teams_dir: Option<PathBuf>) {
    println!("=== Hex Skirmish Lab ===\n");
    println!("Running single game: seed={}, size={}\n", seed, size);

    let teams = match teams_dir {
        Some(dir) => match teams::load_teams(&dir) {
            Ok(teams) => teams,
            Err(e) => {
                eprintln!("Failed to load teams: {}", e);
                return;
            }
        },
        None => teams::builtin_teams(),
    };
    if teams.len() < 2 {
        eprintln!("Need at least two teams, found {}", teams.len());
        return;
    }

    let mut state = GameState::new(size, seed);
    state.load_teams(teams);
    let first = state.available_teams[0].id.clone();
    let second = state.available_teams[1].id.clone();
    println!(
        "  {} vs {}",
        state.available_teams[0].name, state.available_teams[1].name
    );

    if let Err(e) = setup_game(&mut state, &first, &second) {
        eprintln!("Setup failed: {}", e);
        return;
    }
    println!(
        "  Board: {} hexes, {} objective markers\n",
        state.grid().len(),
        state.objectives().len()
    );

    run_random_playout(&mut state, seed);

    println!("\nGame finished!");
    println!("  Rounds played: {}", state.round().saturating_sub(1));
    println!(
        "  Objective score: {} - {}",
        state.objective_scores[0], state.objective_scores[1]
    );
    match state.winner {
        Some(GameOutcome::Winner(p)) => println!("  Winner: {}", p),
        Some(GameOutcome::Draw) => println!("  Winner: draw"),
        None => println!("  Winner: (game did not finish)"),
    }
    println!("  Dice batches rolled: {}", state.dice_log().len());
    println!("\n  Survivors:");
    for unit in state.units() {
        println!(
            "    [{}] {:20} {}/{} wounds",
            unit.owner,
            unit.name,
            unit.wounds,
            unit.max_wounds
        );
    }
}

fn setup_game(
    state: &mut GameState,
    team_a: &str,
    team_b: &str,
) -> Result<(), skirmish_engine::CommandError> {
    state.select_team(Player::P0, team_a)?;
    state.select_team(Player::P1, team_b)?;
    state.start_deploy()?;
    state.auto_deploy_units()?;
    state.start_game()?;
    Ok(())
}

/// Drive the game with seeded random decisions until it ends. The same
/// seed always replays the same game.
fn run_random_playout(state: &mut GameState, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xD1CE);
    let mut last_round = 0;
    let mut guard = 0;

    while state.phase() == Phase::Playing && guard < 100_000 {
        guard += 1;
        if state.round() != last_round {
            last_round = state.round();
            println!("--- Round {}", last_round);
        }

        let mut ids: Vec<String> = state
            .units()
            .iter()
            .filter(|u| {
                u.owner == state.current_player() && !u.activated && u.position.is_some()
            })
            .map(|u| u.id.clone())
            .collect();
        ids.sort();
        let Some(id) = ids.first().cloned() else {
            if let Err(e) = state.end_activation() {
                eprintln!("stuck: {}", e);
                return;
            }
            continue;
        };
        if let Err(e) = state.select_unit(&id) {
            eprintln!("stuck selecting {}: {}", id, e);
            return;
        }

        if rng.gen_bool(0.7) {
            let run = rng.gen_bool(0.3);
            if let Some(pos) = state.unit(&id).and_then(|u| u.position) {
                let mut keys: Vec<(i32, i32)> = state.reachable(&id, run).into_keys().collect();
                keys.sort();
                keys.retain(|&k| k != pos.key());
                if !keys.is_empty() {
                    let dest = keys[rng.gen_range(0..keys.len())];
                    let _ = state.move_unit(&id, HexCoord::new(dest.0, dest.1), run);
                }
            }
        }

        let targets = state.valid_targets(&id);
        let pick = if let Some(target) = targets.meleeable.first() {
            state
                .available_weapons(&id)
                .iter()
                .find(|w| w.is_melee())
                .map(|w| (target.clone(), w.name.clone()))
        } else if let Some(target) = targets.shootable.first() {
            state
                .available_weapons(&id)
                .iter()
                .find(|w| !w.is_melee())
                .map(|w| (target.clone(), w.name.clone()))
        } else {
            None
        };
        if let Some((target, weapon)) = pick {
            if state.attack(&id, &target, &weapon).is_ok() {
                report_attack(state, &id, &target, &weapon);
                if state.resolve_attack().is_ok() && state.pending_counter.is_some() {
                    if rng.gen_bool(0.5) {
                        let _ = state.accept_counter_attack();
                        let _ = state.resolve_attack();
                        println!("      counter-attack!");
                    } else {
                        let _ = state.decline_counter_attack();
                    }
                }
            }
        }

        if let Err(e) = state.end_activation() {
            eprintln!("stuck ending activation: {}", e);
            return;
        }
    }
}

fn report_attack(state: &GameState, attacker: &str, target: &str, weapon: &str) {
    let attacker_name = state.unit(attacker).map(|u| u.name.clone()).unwrap_or_default();
    let target_name = state.unit(target).map(|u| u.name.clone()).unwrap_or_default();
    println!("      {} -> {} ({})", attacker_name, target_name, weapon);
}

// ── map ────────────────────────────────────────────────────────────────

fn glyph(terrain: Terrain, has_building: bool) -> char {
    if has_building {
        return 'B';
    }
    match terrain {
        Terrain::Open => '.',
        Terrain::Road => '-',
        Terrain::Forest => 'F',
        Terrain::Ruin => 'u',
        Terrain::Swamp => 'm',
        Terrain::Water => 'w',
        Terrain::River => '~',
        Terrain::Lake => 'O',
        Terrain::Rock => '^',
        Terrain::Mountain => 'M',
    }
}

fn cmd_map(seed: u64, size: i32) {
    let mut state = GameState::new(size, seed);
    if let Err(e) = state.regenerate(Some(size), Some(seed)) {
        eprintln!("map generation failed: {}", e);
        return;
    }
    println!("Map: size={}, seed={} ({} hexes)\n", size, seed, state.grid().len());
    for r in -size..=size {
        // Indent rows so the axial grid reads as a hexagon.
        print!("{}", " ".repeat((r + size) as usize));
        for q in -size..=size {
            match state.hex_at(HexCoord::new(q, r)) {
                Some(hex) => print!("{} ", glyph(hex.terrain, hex.has_building)),
                None => print!("  "),
            }
        }
        println!();
    }
    println!("\n. open  - road  F forest  u ruin  m swamp");
    println!("w water  ~ river  O lake  ^ rock  M mountain  B building");
}

// ── teams ──────────────────────────────────────────────────────────────

fn cmd_teams(dir: &PathBuf) {
    match teams::load_teams(dir) {
        Ok(teams) => {
            println!("{:<16} {:<20} {:<10} {:>6}", "Id", "Name", "Faction", "Units");
            println!("{}", "-".repeat(56));
            for team in &teams {
                println!(
                    "{:<16} {:<20} {:<10} {:>6}",
                    team.id,
                    team.name,
                    team.faction,
                    team.units.len()
                );
            }
        }
        Err(e) => eprintln!("Failed to load teams: {}", e),
    }
}
