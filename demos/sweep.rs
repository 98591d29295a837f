use hitsplat::prelude::*;

fn main() {
    let scimitar = Player::builder()
        .name("scimitar")
        .skills(Skills {
            atk: 85,
            str: 85,
            def: 80,
            ranged: 80,
            magic: 80,
            hp: 99,
        })
        .offensive(Offensive {
            slash: 66,
            str: 65,
            ..Default::default()
        })
        .style(CombatStyle {
            kind: DamageKind::Slash,
            stance: Stance::Aggressive,
        })
        .weapon(Weapon::builder().name("scimitar").speed_ticks(4).build())
        .build();

    let mut mace = scimitar.clone();
    mace.name = "mace".into();
    mace.style.kind = DamageKind::Crush;
    mace.offensive.crush = 60;
    mace.weapon = Weapon::builder().name("mace").speed_ticks(5).build();

    let target = Monster::builder()
        .name("target")
        .skills(Skills {
            atk: 1,
            str: 1,
            def: 120,
            ranged: 1,
            magic: 60,
            hp: 150,
        })
        .defensive(MonsterDefensive {
            stab: 40,
            slash: 60,
            crush: 20,
            ranged: 50,
            magic: 30,
            flat_armour: 0,
        })
        .build();

    let result = compare(
        &[scimitar, mace],
        &target,
        CalcOpts::default(),
        CompareAxes {
            x: XAxis::TargetDefenceLevel,
            y: YAxis::Dps,
        },
        &TtkConfig::default(),
    )
    .unwrap();

    println!("def\t{}", result.labels.join("\t"));
    for entry in &result.entries {
        let row: Vec<String> = entry
            .values
            .iter()
            .map(|v| v.map_or("-".into(), |y| format!("{y:.3}")))
            .collect();
        println!("{}\t{}", entry.x, row.join("\t"));
    }
    println!("domain max = {:.3}", result.domain_max);
}
