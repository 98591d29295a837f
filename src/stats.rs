use serde::{Deserialize, Serialize};

use crate::error::CalcResult;
use crate::model::{CalcOpts, Monster, Player};
use crate::outcome::{AttackCalc, DetailEntry};
use crate::util::{Damage, SECONDS_PER_TICK};

/// Scalar reductions over one attacker/defender pair, bundled with the
/// exported histogram. This is the payload of a basic/reverse computation
/// for one loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutStats {
    pub name: String,
    pub max_hit: Damage,
    pub hit_chance: f64,
    pub attack_roll: u64,
    pub defence_roll: u64,
    /// Unconditional mean damage per attack (misses included).
    pub expected_hit: f64,
    pub dps: f64,
    pub attack_speed_ticks: u32,
    /// `(damage, probability)` rows ready for charting, with the zero
    /// bucket dropped when `hit_dist_hide_misses` is set.
    pub hit_dist: Vec<(Damage, f64)>,
    pub details: Option<Vec<DetailEntry>>,
}

/// Runs the outcome builder for one pair and reduces the result to
/// scalars. The attack interval comes from the same mode-aware accessor
/// the distribution uses, so the timing of both paths always agrees.
pub fn loadout_stats(
    attacker: &Player,
    defender: &Monster,
    opts: CalcOpts,
) -> CalcResult<LoadoutStats> {
    let calc = AttackCalc::new(attacker, defender, opts)?;
    let outcome = calc.build()?;
    let speed_ticks = calc.attack_speed();
    let expected_hit = outcome.dist.expected_value();
    let dps = expected_hit / (f64::from(speed_ticks) * SECONDS_PER_TICK);

    Ok(LoadoutStats {
        name: attacker.name.clone(),
        max_hit: outcome.max_hit,
        hit_chance: outcome.rolls.hit_chance(),
        attack_roll: outcome.rolls.attack,
        defence_roll: outcome.rolls.defence,
        expected_hit,
        dps,
        attack_speed_ticks: speed_ticks,
        hit_dist: outcome.dist.histogram(opts.hit_dist_hide_misses).collect(),
        details: outcome.details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatStyle, DamageKind, Mode, Skills, Stance, Weapon};

    fn pair() -> (Player, Monster) {
        let p = Player::builder()
            .name("dps test")
            .skills(Skills {
                atk: 90,
                str: 90,
                def: 70,
                ranged: 70,
                magic: 70,
                hp: 99,
            })
            .offensive(crate::model::Offensive {
                stab: 60,
                str: 65,
                ..Default::default()
            })
            .style(CombatStyle {
                kind: DamageKind::Stab,
                stance: Stance::Accurate,
            })
            .weapon(
                Weapon::builder()
                    .name("spear")
                    .speed_ticks(5)
                    .pvp_speed_ticks(4)
                    .build(),
            )
            .build();
        let m = Monster::builder()
            .name("dummy")
            .skills(Skills {
                def: 80,
                hp: 150,
                ..Default::default()
            })
            .build();
        (p, m)
    }

    #[test]
    fn dps_is_expected_hit_over_interval() {
        let (p, m) = pair();
        let stats = loadout_stats(&p, &m, CalcOpts::default()).unwrap();
        let interval = f64::from(stats.attack_speed_ticks) * SECONDS_PER_TICK;
        assert!((stats.dps - stats.expected_hit / interval).abs() < 1e-12);
        assert!(stats.dps > 0.0);
    }

    #[test]
    fn hit_chance_stays_in_bounds() {
        let (p, m) = pair();
        let stats = loadout_stats(&p, &m, CalcOpts::default()).unwrap();
        assert!((0.0..=1.0).contains(&stats.hit_chance));
    }

    #[test]
    fn pvp_interval_override_reaches_dps() {
        let (p, m) = pair();
        let pvm = loadout_stats(&p, &m, CalcOpts::default()).unwrap();
        let pvp = loadout_stats(
            &p,
            &m,
            CalcOpts {
                mode: Mode::Pvp,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(pvm.attack_speed_ticks, 5);
        assert_eq!(pvp.attack_speed_ticks, 4);
        // same distribution, shorter interval, strictly higher dps
        assert!(pvp.dps > pvm.dps);
    }

    #[test]
    fn hidden_misses_drop_zero_bucket() {
        let (p, m) = pair();
        let opts = CalcOpts {
            hit_dist_hide_misses: true,
            ..Default::default()
        };
        let stats = loadout_stats(&p, &m, opts).unwrap();
        assert!(stats.hit_dist.iter().all(|(v, _)| *v != 0));
        let total: f64 = stats.hit_dist.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
