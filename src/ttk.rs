use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dist::HitDist;
use crate::util::{Damage, SECONDS_PER_TICK};

/// Convergence bounds for the iterative kill-time convolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
pub struct TtkConfig {
    /// Stop once cumulative kill probability reaches `1 - epsilon`.
    #[builder(default = 1e-9)]
    pub epsilon: f64,
    /// Hard cap on swings, bounding pathological low-accuracy setups.
    #[builder(default = 10_000)]
    pub max_hits: u32,
}

impl Default for TtkConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Probability distribution over "tick at which the target dies".
///
/// Entries are per-tick death probabilities in ascending tick order; any
/// mass not captured before the iteration cap stays in [`residual`]
/// (the open-ended "never observed to die" bucket) and is reported, never
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtkDist {
    entries: Vec<(u32, f64)>,
    residual: f64,
}

impl TtkDist {
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Restartable `(tick, death probability at exactly this tick)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Running "dead by tick N" sums for comparison charts.
    pub fn cumulative(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().scan(0.0, |acc, (tick, p)| {
            *acc += p;
            Some((*tick, *acc))
        })
    }

    /// Probability mass never observed to die within the iteration cap.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Probability-weighted mean tick count over the captured mass.
    pub fn mean_ticks(&self) -> f64 {
        let captured: f64 = self.entries.iter().map(|(_, p)| p).sum();
        if captured <= 0.0 {
            return f64::INFINITY;
        }
        self.entries
            .iter()
            .map(|(t, p)| f64::from(*t) * p)
            .sum::<f64>()
            / captured
    }

    pub fn mean_seconds(&self) -> f64 {
        self.mean_ticks() * SECONDS_PER_TICK
    }
}

/// Computes the full time-to-kill distribution for one per-hit damage
/// distribution against a target starting at `starting_hp`.
///
/// State is a dense remaining-HP probability vector (index = HP left,
/// index 0 = the dead absorbing state). Swing `n` lands at tick
/// `n * speed_ticks`; each swing convolves the state against the damage
/// pmf, clamping at zero, and the mass newly entering zero is emitted at
/// that tick. Per-swing cost is O(maxHP × damage buckets), which is why
/// this runs on the dispatcher's background path.
pub fn time_to_kill(
    per_hit: &HitDist,
    speed_ticks: u32,
    starting_hp: Damage,
    config: &TtkConfig,
) -> TtkDist {
    let hp = starting_hp as usize;
    if hp == 0 {
        return TtkDist {
            entries: vec![(0, 1.0)],
            residual: 0.0,
        };
    }
    // The attack that cannot deal damage never kills; all mass is residual.
    if per_hit.max() == 0 {
        return TtkDist {
            entries: Vec::new(),
            residual: 1.0,
        };
    }

    let pmf: Vec<(usize, f64)> = per_hit.histogram(false).map(|(v, p)| (v as usize, p)).collect();

    let mut state = vec![0.0f64; hp + 1];
    state[hp] = 1.0;
    let mut entries = Vec::new();
    let mut cumulative = 0.0;

    for swing in 1..=config.max_hits {
        let mut next = vec![0.0f64; hp + 1];
        for (remaining, mass) in state.iter().enumerate().skip(1) {
            if *mass == 0.0 {
                continue;
            }
            for (dmg, p) in &pmf {
                let left = remaining.saturating_sub(*dmg);
                next[left] += mass * p;
            }
        }
        let died = next[0];
        next[0] = 0.0;
        if died > 0.0 {
            cumulative += died;
            entries.push((swing * speed_ticks, died));
        }
        state = next;
        if cumulative >= 1.0 - config.epsilon {
            debug!(swings = swing, cumulative, "ttk converged");
            break;
        }
    }

    TtkDist {
        entries,
        residual: (1.0 - cumulative).max(0.0),
    }
}
