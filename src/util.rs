use std::collections::BTreeMap;

/// One discrete time unit of the simulated game clock, in seconds.
pub const SECONDS_PER_TICK: f64 = 0.6;

/// Damage dealt through a matching overhead protection prayer is floored to
/// this fraction of the rolled value (player-vs-player only).
pub const PROTECTION_PRAYER_DAMAGE_REDUCTION: (u64, u64) = (3, 5);

pub type Damage = u32;
pub type Weight = num::BigUint;
pub type DistMap = BTreeMap<Damage, Weight>;
pub type Entry<'a> = std::collections::btree_map::Entry<'a, Damage, Weight>;

#[inline]
pub fn dist_map() -> DistMap {
    DistMap::new()
}

/// `floor(value * num / den)` on non-negative integers, the truncation used
/// at every step of the damage pipeline.
#[inline]
pub fn scale_floor(value: u64, num: u64, den: u64) -> u64 {
    debug_assert!(den > 0);
    value * num / den
}
