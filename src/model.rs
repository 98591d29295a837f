use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::util::{scale_floor, Damage};

/// Which rule overlays apply: monster targets, or player-vs-player with its
/// interval exceptions and overhead-prayer damage reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Pvm,
    Pvp,
}

/// Read-only flags threaded through every computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalcOpts {
    pub using_special_attack: bool,
    pub disable_monster_scaling: bool,
    pub mode: Mode,
    pub detailed_output: bool,
    pub hit_dist_hide_misses: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageKind {
    Stab,
    Slash,
    Crush,
    Ranged,
    Magic,
}

impl DamageKind {
    pub fn is_melee(self) -> bool {
        matches!(self, Self::Stab | Self::Slash | Self::Crush)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Accurate,
    Aggressive,
    Controlled,
    Defensive,
    Rapid,
    Longrange,
}

impl Stance {
    /// Invisible attack-level bonus of the stance.
    pub fn attack_bonus(self) -> u32 {
        match self {
            Self::Accurate => 3,
            Self::Controlled => 1,
            _ => 0,
        }
    }

    /// Invisible strength-level bonus of the stance.
    pub fn strength_bonus(self) -> u32 {
        match self {
            Self::Aggressive => 3,
            Self::Controlled => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStyle {
    pub kind: DamageKind,
    pub stance: Stance,
}

/// Offensive prayers and the overhead set, with their documented level
/// multipliers. Potion boosts are resolved upstream into flat [`Boosts`];
/// prayers multiply at the effective-level step, so they stay symbolic here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prayer {
    ClarityOfThought,
    ImprovedReflexes,
    IncredibleReflexes,
    BurstOfStrength,
    SuperhumanStrength,
    UltimateStrength,
    ThickSkin,
    RockSkin,
    SteelSkin,
    Chivalry,
    Piety,
    SharpEye,
    HawkEye,
    EagleEye,
    Rigour,
    MysticWill,
    MysticLore,
    MysticMight,
    Augury,
}

impl Prayer {
    /// Multiplier on the attack-style level for an attack of `kind`.
    pub fn attack_factor(self, kind: DamageKind) -> Option<(u64, u64)> {
        match (kind, self) {
            (k, Self::ClarityOfThought) if k.is_melee() => Some((21, 20)),
            (k, Self::ImprovedReflexes) if k.is_melee() => Some((11, 10)),
            (k, Self::IncredibleReflexes) if k.is_melee() => Some((23, 20)),
            (k, Self::Chivalry) if k.is_melee() => Some((23, 20)),
            (k, Self::Piety) if k.is_melee() => Some((6, 5)),
            (DamageKind::Ranged, Self::SharpEye) => Some((21, 20)),
            (DamageKind::Ranged, Self::HawkEye) => Some((11, 10)),
            (DamageKind::Ranged, Self::EagleEye) => Some((23, 20)),
            (DamageKind::Ranged, Self::Rigour) => Some((6, 5)),
            (DamageKind::Magic, Self::MysticWill) => Some((21, 20)),
            (DamageKind::Magic, Self::MysticLore) => Some((11, 10)),
            (DamageKind::Magic, Self::MysticMight) => Some((23, 20)),
            (DamageKind::Magic, Self::Augury) => Some((5, 4)),
            _ => None,
        }
    }

    /// Multiplier on the strength-style level for an attack of `kind`.
    pub fn strength_factor(self, kind: DamageKind) -> Option<(u64, u64)> {
        match (kind, self) {
            (k, Self::BurstOfStrength) if k.is_melee() => Some((21, 20)),
            (k, Self::SuperhumanStrength) if k.is_melee() => Some((11, 10)),
            (k, Self::UltimateStrength) if k.is_melee() => Some((23, 20)),
            (k, Self::Chivalry) if k.is_melee() => Some((59, 50)),
            (k, Self::Piety) if k.is_melee() => Some((123, 100)),
            (DamageKind::Ranged, Self::SharpEye) => Some((21, 20)),
            (DamageKind::Ranged, Self::HawkEye) => Some((11, 10)),
            (DamageKind::Ranged, Self::EagleEye) => Some((23, 20)),
            (DamageKind::Ranged, Self::Rigour) => Some((123, 100)),
            _ => None,
        }
    }

    /// Multiplier on the defence level while this prayer is up.
    pub fn defence_factor(self) -> Option<(u64, u64)> {
        match self {
            Self::ThickSkin => Some((21, 20)),
            Self::RockSkin => Some((11, 10)),
            Self::SteelSkin => Some((23, 20)),
            Self::Chivalry => Some((6, 5)),
            Self::Piety | Self::Rigour | Self::Augury => Some((5, 4)),
            _ => None,
        }
    }

    /// Multiplier on the magic level when defending against magic.
    pub fn magic_defence_factor(self) -> Option<(u64, u64)> {
        match self {
            Self::Augury => Some((5, 4)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverheadPrayer {
    ProtectMelee,
    ProtectMissiles,
    ProtectMagic,
}

impl OverheadPrayer {
    /// Whether this overhead matches an incoming attack's damage kind.
    pub fn protects_against(self, kind: DamageKind) -> bool {
        match self {
            Self::ProtectMelee => kind.is_melee(),
            Self::ProtectMissiles => kind == DamageKind::Ranged,
            Self::ProtectMagic => kind == DamageKind::Magic,
        }
    }
}

/// Monster tags that attribute-keyed equipment keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAttribute {
    Demon,
    Draconic,
    Undead,
    Kalphite,
    Golem,
    Vampyre,
}

/// Accuracy and damage multipliers granted against one target attribute
/// (demonbane and slayer-helmet class effects). Ratios floor at application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeModifier {
    pub attribute: TargetAttribute,
    pub accuracy: (u64, u64),
    pub damage: (u64, u64),
}

/// Alternate accuracy/damage profile used when `using_special_attack` is
/// set. `guaranteed` is a flat component dealt on top of every rolled hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct SpecialAttack {
    #[builder(default = (1, 1))]
    pub accuracy: (u64, u64),
    #[builder(default = (1, 1))]
    pub damage: (u64, u64),
    #[builder(default = 1)]
    pub hits: u8,
    #[builder(default = 0)]
    pub guaranteed: Damage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Weapon {
    #[builder(into)]
    pub name: String,
    pub speed_ticks: u32,
    /// Interval exception applied in PvP mode only (the blowpipe class).
    pub pvp_speed_ticks: Option<u32>,
    #[builder(default = 1)]
    pub hits: u8,
    pub special: Option<SpecialAttack>,
}

impl Weapon {
    /// The attack interval in ticks for the given mode. Every consumer of
    /// timing goes through here so the distribution and DPS paths cannot
    /// disagree.
    pub fn attack_speed(&self, mode: Mode) -> u32 {
        match (mode, self.pvp_speed_ticks) {
            (Mode::Pvp, Some(ticks)) => ticks,
            _ => self.speed_ticks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub atk: u32,
    pub str: u32,
    pub def: u32,
    pub ranged: u32,
    pub magic: u32,
    pub hp: u32,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            atk: 1,
            str: 1,
            def: 1,
            ranged: 1,
            magic: 1,
            hp: 10,
        }
    }
}

/// Additive level boosts already resolved from potions; may be negative
/// (drains). Applied before prayer factors, clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boosts {
    pub atk: i32,
    pub str: i32,
    pub def: i32,
    pub ranged: i32,
    pub magic: i32,
    pub hp: i32,
}

/// Equipment-derived offensive bonuses, pre-aggregated by the calling layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offensive {
    pub stab: i32,
    pub slash: i32,
    pub crush: i32,
    pub ranged: i32,
    pub magic: i32,
    pub str: i32,
    pub ranged_str: i32,
    /// Percent bonus to spell max hit.
    pub magic_damage_pct: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defensive {
    pub stab: i32,
    pub slash: i32,
    pub crush: i32,
    pub ranged: i32,
    pub magic: i32,
}

/// One side's fully resolved attack parameters. The engine borrows this for
/// the duration of a computation and never retains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Player {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub skills: Skills,
    #[builder(default)]
    pub boosts: Boosts,
    #[builder(default)]
    pub offensive: Offensive,
    #[builder(default)]
    pub defensive: Defensive,
    #[builder(default)]
    pub prayers: Vec<Prayer>,
    pub style: CombatStyle,
    pub weapon: Weapon,
    /// Base max hit of the bound spell; required for magic styles.
    pub spell_max_hit: Option<Damage>,
    #[builder(default)]
    pub attribute_modifiers: Vec<AttributeModifier>,
    pub overhead: Option<OverheadPrayer>,
}

impl Player {
    fn boosted(level: u32, boost: i32) -> u32 {
        (i64::from(level) + i64::from(boost)).max(0) as u32
    }

    pub fn visible_atk(&self) -> u32 {
        Self::boosted(self.skills.atk, self.boosts.atk)
    }

    pub fn visible_str(&self) -> u32 {
        Self::boosted(self.skills.str, self.boosts.str)
    }

    pub fn visible_def(&self) -> u32 {
        Self::boosted(self.skills.def, self.boosts.def)
    }

    pub fn visible_ranged(&self) -> u32 {
        Self::boosted(self.skills.ranged, self.boosts.ranged)
    }

    pub fn visible_magic(&self) -> u32 {
        Self::boosted(self.skills.magic, self.boosts.magic)
    }

    pub fn visible_hp(&self) -> u32 {
        Self::boosted(self.skills.hp, self.boosts.hp)
    }

    /// Strongest active prayer factor selected by `pick`, compared as
    /// ratios (the original keeps only the best of a family).
    fn best_factor<F>(&self, pick: F) -> Option<(u64, u64)>
    where
        F: Fn(Prayer) -> Option<(u64, u64)>,
    {
        self.prayers
            .iter()
            .filter_map(|p| pick(*p))
            .max_by(|a, b| (a.0 * b.1).cmp(&(b.0 * a.1)))
    }

    pub fn prayer_attack_factor(&self, kind: DamageKind) -> Option<(u64, u64)> {
        self.best_factor(|p| p.attack_factor(kind))
    }

    pub fn prayer_strength_factor(&self, kind: DamageKind) -> Option<(u64, u64)> {
        self.best_factor(|p| p.strength_factor(kind))
    }

    pub fn prayer_defence_factor(&self) -> Option<(u64, u64)> {
        self.best_factor(Prayer::defence_factor)
    }

    pub fn prayer_magic_defence_factor(&self) -> Option<(u64, u64)> {
        self.best_factor(Prayer::magic_defence_factor)
    }

    /// Bridges a player into the monster-shaped target the outcome builder
    /// consumes, for PvP and reverse computations. Prayer defence factors
    /// are floored into the levels here; equipment bonuses map across
    /// one-to-one.
    pub fn to_monster(&self) -> Monster {
        let mut def = self.visible_def();
        let mut magic = self.visible_magic();
        if let Some((n, d)) = self.prayer_defence_factor() {
            def = scale_floor(def.into(), n, d) as u32;
        }
        if let Some((n, d)) = self.prayer_magic_defence_factor() {
            magic = scale_floor(magic.into(), n, d) as u32;
        }
        Monster::builder()
            .name(self.name.clone())
            .skills(Skills {
                atk: self.visible_atk(),
                str: self.visible_str(),
                def,
                ranged: self.visible_ranged(),
                magic,
                hp: self.visible_hp(),
            })
            .defensive(MonsterDefensive {
                stab: self.defensive.stab,
                slash: self.defensive.slash,
                crush: self.defensive.crush,
                ranged: self.defensive.ranged,
                magic: self.defensive.magic,
                flat_armour: 0,
            })
            .maybe_overhead(self.overhead)
            .build()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDefensive {
    pub stab: i32,
    pub slash: i32,
    pub crush: i32,
    pub ranged: i32,
    pub magic: i32,
    /// Flat addition to the defence roll, independent of style.
    pub flat_armour: u32,
}

/// Caller-supplied overrides that scale the monster before any roll is
/// computed; skipped entirely under `disable_monster_scaling`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterInputs {
    /// Levels already drained from defence by prior attacks.
    pub defence_reduction: u32,
    /// Starting HP override for time-to-kill.
    pub current_hp: Option<Damage>,
}

/// The defending side, monster-shaped. Player defenders are bridged through
/// [`Player::to_monster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Monster {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub skills: Skills,
    #[builder(default)]
    pub defensive: MonsterDefensive,
    #[builder(default)]
    pub attributes: Vec<TargetAttribute>,
    /// Per-monster clamp on any single hit.
    pub damage_cap: Option<Damage>,
    #[builder(default)]
    pub inputs: MonsterInputs,
    /// Set when the target is a bridged player; monsters have none.
    pub overhead: Option<OverheadPrayer>,
}

impl Monster {
    pub fn has_attribute(&self, attribute: TargetAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Starting HP for time-to-kill, honouring the current-HP override.
    pub fn starting_hp(&self) -> Damage {
        self.inputs.current_hp.unwrap_or(self.skills.hp)
    }
}
