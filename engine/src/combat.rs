// ═══════════════════════════════════════════════════════════════════════
// Combat arithmetic — hit and save resolution as pure functions.
//
// The dice themselves come from the aggregate's seeded stream (or from
// an external roller via execute_attack); everything here is counting
// against thresholds, so it is directly testable with fixed dice.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::{Weapon, WeaponKind};

/// Exhausted units hit only on a natural 6, regardless of quality.
pub const EXHAUSTED_HIT_THRESHOLD: u8 = 6;

/// Threshold a hit die must reach.
pub fn hit_threshold(quality: u8, exhausted: bool) -> u8 {
    if exhausted {
        EXHAUSTED_HIT_THRESHOLD
    } else {
        quality
    }
}

/// Count hits among raw hit dice.
pub fn count_hits(rolls: &[u8], quality: u8, exhausted: bool) -> u8 {
    let threshold = hit_threshold(quality, exhausted);
    rolls.iter().filter(|&&d| d >= threshold).count() as u8
}

/// Save threshold: defense shifted by armor penetration, clamped to 2-6.
pub fn save_target(defense: u8, ap: i8) -> u8 {
    (defense as i32 + ap as i32).clamp(2, 6) as u8
}

/// A save die strictly below the target fails and inflicts one wound.
pub fn count_failed_saves(rolls: &[u8], target: u8) -> u8 {
    rolls.iter().filter(|&&d| d < target).count() as u8
}

/// Range legality for a weapon at the given hex distance. Melee demands
/// exact adjacency; ranged reaches up to its printed range.
pub fn weapon_in_range(weapon: &Weapon, distance: u32) -> bool {
    match weapon.kind {
        WeaponKind::Melee => distance == 1,
        WeaponKind::Ranged => distance <= weapon.range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeaponKind;

    #[test]
    fn hits_count_against_quality() {
        assert_eq!(count_hits(&[6, 6, 1, 1], 4, false), 2);
        assert_eq!(count_hits(&[4, 5], 4, false), 2);
        assert_eq!(count_hits(&[3, 3, 3], 4, false), 0);
    }

    #[test]
    fn exhausted_hits_only_on_six() {
        // Quality 3 would make 4 hits; exhaustion keeps only the sixes.
        assert_eq!(count_hits(&[6, 6, 1, 1], 3, true), 2);
        assert_eq!(count_hits(&[5, 5, 5], 2, true), 0);
    }

    #[test]
    fn save_target_is_clamped() {
        assert_eq!(save_target(4, 1), 5);
        assert_eq!(save_target(4, 0), 4);
        assert_eq!(save_target(6, 3), 6);
        assert_eq!(save_target(2, -4), 2);
    }

    #[test]
    fn failed_saves_are_strictly_below_target() {
        assert_eq!(count_failed_saves(&[2, 2, 6, 6], 4), 2);
        assert_eq!(count_failed_saves(&[3, 6], 5), 1);
        assert_eq!(count_failed_saves(&[4, 4], 4), 0);
    }

    #[test]
    fn melee_requires_adjacency() {
        let sword = Weapon {
            name: "Sword".into(),
            kind: WeaponKind::Melee,
            attacks: 2,
            range: 0,
            ap: 1,
        };
        assert!(weapon_in_range(&sword, 1));
        assert!(!weapon_in_range(&sword, 2));
        assert!(!weapon_in_range(&sword, 0));
    }

    #[test]
    fn ranged_respects_printed_range() {
        let bow = Weapon {
            name: "Bow".into(),
            kind: WeaponKind::Ranged,
            attacks: 1,
            range: 6,
            ap: 0,
        };
        assert!(weapon_in_range(&bow, 1));
        assert!(weapon_in_range(&bow, 6));
        assert!(!weapon_in_range(&bow, 7));
    }
}
