use hitsplat::prelude::*;

pub fn melee_player(name: &str) -> Player {
    Player::builder()
        .name(name)
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
        .build()
}

pub fn lesser_fiend() -> Monster {
    Monster::builder()
        .name("lesser fiend")
        .skills(Skills {
            atk: 70,
            str: 70,
            def: 90,
            ranged: 1,
            magic: 60,
            hp: 105,
        })
        .defensive(MonsterDefensive {
            stab: 20,
            slash: 40,
            crush: 30,
            ranged: 50,
            magic: 10,
            flat_armour: 0,
        })
        .build()
}
