use std::time::Instant;

use hitsplat::prelude::*;

fn main() {
    let attacker = Player::builder()
        .name("attacker")
        .skills(Skills {
            atk: 99,
            str: 99,
            def: 99,
            ranged: 99,
            magic: 99,
            hp: 99,
        })
        .offensive(Offensive {
            slash: 82,
            str: 86,
            ..Default::default()
        })
        .prayers(vec![Prayer::Piety])
        .style(CombatStyle {
            kind: DamageKind::Slash,
            stance: Stance::Aggressive,
        })
        .weapon(Weapon::builder().name("whip").speed_ticks(4).build())
        .build();

    let mut defender = attacker.clone();
    defender.name = "defender".into();
    defender.overhead = Some(OverheadPrayer::ProtectMelee);

    let opts = CalcOpts {
        mode: Mode::Pvp,
        ..Default::default()
    };
    let target = defender.to_monster();
    let stats = loadout_stats(&attacker, &target, opts).unwrap();
    println!(
        "{}: max {} hit chance {:.4} dps {:.4}",
        stats.name, stats.max_hit, stats.hit_chance, stats.dps
    );

    let start = Instant::now();
    let calc = AttackCalc::new(&attacker, &target, opts).unwrap();
    let outcome = calc.build().unwrap();
    let ttk = time_to_kill(
        &outcome.dist,
        calc.attack_speed(),
        target.starting_hp(),
        &TtkConfig::default(),
    );
    println!(
        "mean ttk = {:.1} ticks ({:.1}s), residual {:.2e}, elapsed {}ms",
        ttk.mean_ticks(),
        ttk.mean_seconds(),
        ttk.residual(),
        start.elapsed().as_millis()
    );
}
