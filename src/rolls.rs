use serde::{Deserialize, Serialize};

use crate::util::scale_floor;

/// The attacker's maximum attack roll and the defender's maximum defence
/// roll. Hit chance is a pure function of this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollPair {
    pub attack: u64,
    pub defence: u64,
}

impl RollPair {
    /// Exact hit chance as a ratio, from the classic two-roll comparison:
    /// the attacker rolls `0..=attack`, the defender `0..=defence`, and the
    /// hit lands only if the attack roll is strictly higher.
    ///
    /// `attack >= defence`: `1 - (defence + 2) / (2 * (attack + 1))`,
    /// otherwise `attack / (2 * (defence + 1))`.
    pub fn hit_ratio(&self) -> (u64, u64) {
        if self.attack >= self.defence {
            let den = 2 * (self.attack + 1);
            (den - (self.defence + 2), den)
        } else {
            (self.attack, 2 * (self.defence + 1))
        }
    }

    /// Hit chance at the float boundary, clamped to `[0, 1]`.
    pub fn hit_chance(&self) -> f64 {
        let (num, den) = self.hit_ratio();
        (num as f64 / den as f64).clamp(0.0, 1.0)
    }
}

/// `floor(visible * prayer) + stance_bonus + 8`, the effective level used by
/// both roll and max-hit pipelines. The prayer factor truncates before the
/// stance bonus is added; reordering changes results.
pub fn effective_level(visible: u32, prayer: Option<(u64, u64)>, stance_bonus: u32) -> u64 {
    let mut level = u64::from(visible);
    if let Some((num, den)) = prayer {
        level = scale_floor(level, num, den);
    }
    level + u64::from(stance_bonus) + 8
}

/// `effective * (bonus + 64)`; equipment bonuses may be negative but the
/// multiplier never drops below zero.
pub fn attack_roll(effective: u64, bonus: i32) -> u64 {
    effective * u64::try_from(i64::from(bonus) + 64).unwrap_or(0)
}

/// `(level + 9) * (bonus + 64) + flat_armour` for the defending side.
pub fn defence_roll(level: u32, bonus: i32, flat_armour: u32) -> u64 {
    (u64::from(level) + 9) * u64::try_from(i64::from(bonus) + 64).unwrap_or(0)
        + u64::from(flat_armour)
}

/// `floor((effective * (strength_bonus + 64) + 320) / 640)`, the base max
/// hit before the multiplicative modifier stack.
pub fn base_max_hit(effective: u64, strength_bonus: i32) -> u64 {
    (effective * u64::try_from(i64::from(strength_bonus) + 64).unwrap_or(0) + 320) / 640
}
