use serde::{Deserialize, Serialize};

use crate::dist::HitDist;
use crate::error::{CalcError, CalcResult};
use crate::model::{CalcOpts, DamageKind, Mode, Monster, Player, SpecialAttack};
use crate::rolls::{self, RollPair};
use crate::util::{scale_floor, Damage, PROTECTION_PRAYER_DAMAGE_REDUCTION};

/// One attack fully resolved: the per-attack damage distribution, the roll
/// pair behind it, and (when requested) a labelled breakdown of the
/// modifier stack.
#[derive(Debug, Clone)]
pub struct AttackOutcome {
    pub dist: HitDist,
    pub rolls: RollPair,
    pub max_hit: Damage,
    pub details: Option<Vec<DetailEntry>>,
}

/// Diagnostic step attached under `detailed_output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

fn detail(details: &mut Option<Vec<DetailEntry>>, label: &str, value: impl ToString) {
    if let Some(d) = details {
        d.push(DetailEntry {
            label: label.to_string(),
            value: value.to_string(),
        });
    }
}

/// Pure outcome builder over a borrowed attacker/defender pair. Never
/// retains its inputs and has no side effects; every getter recomputes
/// from the snapshots.
#[derive(Debug, Clone, Copy)]
pub struct AttackCalc<'a> {
    attacker: &'a Player,
    defender: &'a Monster,
    opts: CalcOpts,
}

impl<'a> AttackCalc<'a> {
    /// Validates that the combatant configuration can produce a damage
    /// type before any formula runs.
    pub fn new(attacker: &'a Player, defender: &'a Monster, opts: CalcOpts) -> CalcResult<Self> {
        if attacker.style.kind == DamageKind::Magic && attacker.spell_max_hit.is_none() {
            return Err(CalcError::UnsupportedConfiguration(format!(
                "{}: magic style with no bound spell",
                attacker.name
            )));
        }
        if opts.using_special_attack && attacker.weapon.special.is_none() {
            return Err(CalcError::UnsupportedConfiguration(format!(
                "{}: special attack requested but {} has none",
                attacker.name, attacker.weapon.name
            )));
        }
        Ok(Self {
            attacker,
            defender,
            opts,
        })
    }

    fn special(&self) -> Option<&SpecialAttack> {
        if self.opts.using_special_attack {
            self.attacker.weapon.special.as_ref()
        } else {
            None
        }
    }

    /// The attack interval in ticks, honouring PvP weapon exceptions.
    pub fn attack_speed(&self) -> u32 {
        self.attacker.weapon.attack_speed(self.opts.mode)
    }

    /// Maximum hit after the full modifier stack. Each step floors before
    /// the next one applies; the order is fixed by the documented game
    /// formulas and must not be rearranged.
    pub fn max_hit(&self) -> Damage {
        self.max_hit_with(&mut None)
    }

    fn max_hit_with(&self, details: &mut Option<Vec<DetailEntry>>) -> Damage {
        let kind = self.attacker.style.kind;
        let mut max = match kind {
            DamageKind::Stab | DamageKind::Slash | DamageKind::Crush => {
                let eff = rolls::effective_level(
                    self.attacker.visible_str(),
                    self.attacker.prayer_strength_factor(kind),
                    self.attacker.style.stance.strength_bonus(),
                );
                detail(details, "effective strength", eff);
                rolls::base_max_hit(eff, self.attacker.offensive.str)
            }
            DamageKind::Ranged => {
                let eff = rolls::effective_level(
                    self.attacker.visible_ranged(),
                    self.attacker.prayer_strength_factor(kind),
                    self.attacker.style.stance.strength_bonus(),
                );
                detail(details, "effective ranged strength", eff);
                rolls::base_max_hit(eff, self.attacker.offensive.ranged_str)
            }
            DamageKind::Magic => {
                // Validated at construction.
                let base = u64::from(self.attacker.spell_max_hit.unwrap_or(0));
                let pct = i64::from(self.attacker.offensive.magic_damage_pct);
                let scaled = u64::try_from(
                    i64::try_from(base).unwrap_or(0) * (100 + pct) / 100,
                )
                .unwrap_or(0);
                detail(details, "spell base max", base);
                scaled
            }
        };
        detail(details, "base max hit", max);

        for m in &self.attacker.attribute_modifiers {
            if self.defender.has_attribute(m.attribute) {
                max = scale_floor(max, m.damage.0, m.damage.1);
                detail(details, "attribute damage modifier", max);
            }
        }
        if let Some(special) = self.special() {
            max = scale_floor(max, special.damage.0, special.damage.1);
            detail(details, "special damage modifier", max);
        }
        max as Damage
    }

    /// The attacker's maximum attack roll, modifier stack floored per step.
    pub fn attack_roll(&self) -> u64 {
        let kind = self.attacker.style.kind;
        let (visible, bonus) = match kind {
            DamageKind::Stab => (self.attacker.visible_atk(), self.attacker.offensive.stab),
            DamageKind::Slash => (self.attacker.visible_atk(), self.attacker.offensive.slash),
            DamageKind::Crush => (self.attacker.visible_atk(), self.attacker.offensive.crush),
            DamageKind::Ranged => (
                self.attacker.visible_ranged(),
                self.attacker.offensive.ranged,
            ),
            DamageKind::Magic => (self.attacker.visible_magic(), self.attacker.offensive.magic),
        };
        let eff = rolls::effective_level(
            visible,
            self.attacker.prayer_attack_factor(kind),
            self.attacker.style.stance.attack_bonus(),
        );
        let mut roll = rolls::attack_roll(eff, bonus);
        for m in &self.attacker.attribute_modifiers {
            if self.defender.has_attribute(m.attribute) {
                roll = scale_floor(roll, m.accuracy.0, m.accuracy.1);
            }
        }
        if let Some(special) = self.special() {
            roll = scale_floor(roll, special.accuracy.0, special.accuracy.1);
        }
        roll
    }

    /// The defender's maximum defence roll. Monster scaling inputs apply
    /// first unless disabled; magic attacks roll against the magic level.
    pub fn defence_roll(&self) -> u64 {
        let kind = self.attacker.style.kind;
        let defensive = &self.defender.defensive;
        let (mut level, bonus) = match kind {
            DamageKind::Stab => (self.defender.skills.def, defensive.stab),
            DamageKind::Slash => (self.defender.skills.def, defensive.slash),
            DamageKind::Crush => (self.defender.skills.def, defensive.crush),
            DamageKind::Ranged => (self.defender.skills.def, defensive.ranged),
            DamageKind::Magic => (self.defender.skills.magic, defensive.magic),
        };
        if !self.opts.disable_monster_scaling && kind != DamageKind::Magic {
            level = level.saturating_sub(self.defender.inputs.defence_reduction);
        }
        rolls::defence_roll(level, bonus, defensive.flat_armour)
    }

    pub fn rolls(&self) -> RollPair {
        RollPair {
            attack: self.attack_roll(),
            defence: self.defence_roll(),
        }
    }

    pub fn hit_chance(&self) -> f64 {
        self.rolls().hit_chance()
    }

    /// Builds the full per-attack damage distribution: accuracy-gated
    /// uniform damage per hit, convolved across multi-hit weapons, capped
    /// by monster-specific limits, with the PvP overhead-prayer overlay
    /// applied last so it composes with every attack shape.
    pub fn build(&self) -> CalcResult<AttackOutcome> {
        let mut details = self.opts.detailed_output.then(Vec::new);
        let max_hit = self.max_hit_with(&mut details);
        let rolls = self.rolls();
        let (hit_num, hit_den) = rolls.hit_ratio();
        detail(&mut details, "attack roll", rolls.attack);
        detail(&mut details, "defence roll", rolls.defence);

        let per_hit = if hit_num == 0 {
            HitDist::never()
        } else {
            let landed = HitDist::linear(0, max_hit)?;
            HitDist::mixture(&[
                (landed, (hit_num, hit_den)),
                (HitDist::single(0), (hit_den - hit_num, hit_den)),
            ])
        };
        let per_hit = match self.defender.damage_cap {
            Some(cap) => per_hit.cap_max(cap),
            None => per_hit,
        };

        let hits = self.special().map_or(self.attacker.weapon.hits, |s| s.hits);
        let mut dist = match hits {
            0 | 1 => per_hit,
            n => {
                let parts: Vec<&HitDist> = std::iter::repeat(&per_hit)
                    .take(usize::from(n))
                    .collect();
                HitDist::combine_all(&parts)
            }
        };

        if let Some(special) = self.special() {
            if special.guaranteed > 0 {
                dist = dist.combine(&HitDist::single(special.guaranteed));
            }
        }

        if self.opts.mode == Mode::Pvp {
            if let Some(overhead) = self.defender.overhead {
                if overhead.protects_against(self.attacker.style.kind) {
                    let (num, den) = PROTECTION_PRAYER_DAMAGE_REDUCTION;
                    dist = dist.scale_damage(num, den);
                    detail(&mut details, "overhead reduction", format!("{num}/{den}"));
                }
            }
        }

        Ok(AttackOutcome {
            max_hit: dist.max(),
            dist,
            rolls,
            details,
        })
    }
}
