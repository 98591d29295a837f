use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CalcError, CalcResult};
use crate::model::{CalcOpts, Monster, Player};
use crate::outcome::AttackCalc;
use crate::stats::loadout_stats;
use crate::ttk::{time_to_kill, TtkConfig};

/// Number of sample points taken across an axis's natural range.
pub const SAMPLE_POINTS: u32 = 30;

/// The input dimension swept along the X axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XAxis {
    TargetDefenceLevel,
    TargetHp,
    AttackerAttackLevel,
    AttackerStrengthLevel,
}

impl XAxis {
    /// Natural inclusive range of the dimension: levels sweep the skill
    /// scale, target dimensions sweep up from zero to the snapshot value.
    fn range(self, monster: &Monster) -> (u32, u32) {
        match self {
            Self::TargetDefenceLevel => (0, monster.skills.def.max(1)),
            Self::TargetHp => (1, monster.skills.hp.max(1)),
            Self::AttackerAttackLevel | Self::AttackerStrengthLevel => (1, 99),
        }
    }

    fn apply(self, x: u32, attacker: &Player, monster: &Monster) -> (Player, Monster) {
        let mut p = attacker.clone();
        let mut m = monster.clone();
        match self {
            Self::TargetDefenceLevel => m.skills.def = x,
            Self::TargetHp => {
                m.skills.hp = x;
                m.inputs.current_hp = None;
            }
            Self::AttackerAttackLevel => p.skills.atk = x,
            Self::AttackerStrengthLevel => p.skills.str = x,
        }
        (p, m)
    }
}

/// The output figure plotted on the Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YAxis {
    Dps,
    ExpectedHit,
    TtkSeconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareAxes {
    pub x: XAxis,
    pub y: YAxis,
}

/// One sample point: the X value plus one Y value per loadout. A failed
/// sample for a loadout is an explicit gap, never interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareEntry {
    pub x: u32,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    /// Loadout names, in `values` order.
    pub labels: Vec<String>,
    pub entries: Vec<CompareEntry>,
    /// Largest Y value observed across all series, for axis sizing.
    pub domain_max: f64,
}

/// Sweeps the X dimension and re-runs the engine at every sample point for
/// every loadout. Each sample is an independent pure invocation.
pub fn compare(
    loadouts: &[Player],
    monster: &Monster,
    opts: CalcOpts,
    axes: CompareAxes,
    ttk_config: &TtkConfig,
) -> CalcResult<CompareResult> {
    if loadouts.is_empty() {
        return Err(CalcError::InvalidRequest("compare with no loadouts".into()));
    }
    let (lo, hi) = axes.x.range(monster);
    let step = ((hi - lo) / SAMPLE_POINTS).max(1);

    let mut entries = Vec::new();
    let mut domain_max = 0.0f64;
    let mut x = lo;
    loop {
        let mut values = Vec::with_capacity(loadouts.len());
        for attacker in loadouts {
            let (p, m) = axes.x.apply(x, attacker, monster);
            let y = sample_y(&p, &m, opts, axes.y, ttk_config);
            if let Some(y) = y {
                domain_max = domain_max.max(y);
            }
            values.push(y);
        }
        entries.push(CompareEntry { x, values });
        if x >= hi {
            break;
        }
        x = (x + step).min(hi);
    }
    trace!(samples = entries.len(), "compare sweep complete");

    Ok(CompareResult {
        labels: loadouts.iter().map(|p| p.name.clone()).collect(),
        entries,
        domain_max,
    })
}

fn sample_y(
    attacker: &Player,
    monster: &Monster,
    opts: CalcOpts,
    y: YAxis,
    ttk_config: &TtkConfig,
) -> Option<f64> {
    match y {
        YAxis::Dps => loadout_stats(attacker, monster, opts).ok().map(|s| s.dps),
        YAxis::ExpectedHit => loadout_stats(attacker, monster, opts)
            .ok()
            .map(|s| s.expected_hit),
        YAxis::TtkSeconds => {
            let calc = AttackCalc::new(attacker, monster, opts).ok()?;
            let outcome = calc.build().ok()?;
            let ttk = time_to_kill(
                &outcome.dist,
                calc.attack_speed(),
                monster.starting_hp(),
                ttk_config,
            );
            let mean = ttk.mean_seconds();
            mean.is_finite().then_some(mean)
        }
    }
}
