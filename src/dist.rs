use itertools::Itertools;
use num::integer::Integer;
use num::rational::Ratio;
use num::traits::{One, Zero};
use num::ToPrimitive;
use num::bigint::RandBigInt;
use rand::RngCore;

use crate::error::{CalcError, CalcResult};
use crate::util::{dist_map, scale_floor, Damage, DistMap, Entry, Weight};

/// An immutable probability mass function over integer damage values.
///
/// Weights are exact big-integer counts over a shared denominator, so
/// arbitrarily long chains of [`combine`](Self::combine) and
/// [`mixture`](Self::mixture) lose no probability mass; conversion to `f64`
/// happens only at the presentation boundary ([`histogram`](Self::histogram),
/// [`expected_value`](Self::expected_value)).
///
/// Outcomes are kept sorted by damage value. The denominator records the
/// intended total mass; for a distribution built from normalized parts the
/// counts sum to it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitDist {
    outcomes: Vec<(Damage, Weight)>,
    denom: Weight,
}

impl HitDist {
    /// A distribution concentrated on one value.
    pub fn single(value: Damage) -> Self {
        Self {
            outcomes: vec![(value, Weight::one())],
            denom: Weight::one(),
        }
    }

    /// Uniform over the inclusive range `[min, max]`.
    pub fn linear(min: Damage, max: Damage) -> CalcResult<Self> {
        if max < min {
            return Err(CalcError::InvalidRange { min, max });
        }
        Ok(Self {
            outcomes: (min..=max).map(|v| (v, Weight::one())).collect(),
            denom: Weight::from(max - min + 1),
        })
    }

    /// The attack that cannot land: all mass on zero damage.
    pub fn never() -> Self {
        Self::single(0)
    }

    pub fn outcomes(&self) -> &[(Damage, Weight)] {
        &self.outcomes
    }

    pub fn denom(&self) -> &Weight {
        &self.denom
    }

    /// Highest damage value carrying any weight.
    pub fn max(&self) -> Damage {
        self.outcomes.last().map_or(0, |(v, _)| *v)
    }

    /// Sum of all bucket weights. Equals the denominator for a normalized
    /// distribution.
    pub fn total_weight(&self) -> Weight {
        self.outcomes.iter().map(|(_, c)| c).sum()
    }

    /// Distribution of the sum of two independent hits (full convolution).
    pub fn combine(&self, other: &Self) -> Self {
        let mut outcomes = dist_map();
        for (v1, c1) in &self.outcomes {
            for (v2, c2) in &other.outcomes {
                match outcomes.entry(v1 + v2) {
                    Entry::Vacant(e) => {
                        e.insert(c1 * c2);
                    }
                    Entry::Occupied(mut e) => {
                        *e.get_mut() += c1 * c2;
                    }
                }
            }
        }
        Self::from_map(&self.denom * &other.denom, outcomes)
    }

    /// N-ary independent sum, one cartesian pass over every bucket tuple.
    pub fn combine_all(dists: &[&Self]) -> Self {
        if dists.is_empty() {
            return Self::never();
        }
        let mut outcomes = dist_map();
        for p in dists.iter().map(|d| &d.outcomes).multi_cartesian_product() {
            let mut value = 0;
            let mut count = Weight::one();
            for (v, c) in p {
                value += v;
                count *= c;
            }
            match outcomes.entry(value) {
                Entry::Vacant(e) => {
                    e.insert(count);
                }
                Entry::Occupied(mut e) => {
                    *e.get_mut() += count;
                }
            }
        }
        Self::from_map(
            dists.iter().fold(Weight::one(), |acc, d| acc * &d.denom),
            outcomes,
        )
    }

    /// Probability-weighted union. Weights are `(numerator, denominator)`
    /// ratios and need not be pre-normalized; the result carries the
    /// combined denominator, so mass is preserved exactly whenever the
    /// weights sum to one. A weight with a zero denominator is not a
    /// ratio; such components collapse the result to [`never`](Self::never).
    pub fn mixture(components: &[(Self, (u64, u64))]) -> Self {
        if components.is_empty() || components.iter().any(|(_, (_, wd))| *wd == 0) {
            return Self::never();
        }
        let common: Weight = components
            .iter()
            .map(|(d, (_, wd))| &d.denom * Weight::from(*wd))
            .product();
        let mut outcomes = dist_map();
        for (dist, (wn, wd)) in components {
            // Exact: `common` is divisible by every component denominator.
            let scale = &common / (&dist.denom * Weight::from(*wd)) * Weight::from(*wn);
            if scale.is_zero() {
                continue;
            }
            for (v, c) in &dist.outcomes {
                match outcomes.entry(*v) {
                    Entry::Vacant(e) => {
                        e.insert(c * &scale);
                    }
                    Entry::Occupied(mut e) => {
                        *e.get_mut() += c * &scale;
                    }
                }
            }
        }
        Self::from_map(common, outcomes)
    }

    /// Derives a new distribution by transforming every damage value,
    /// re-merging buckets that collide.
    pub fn map<F>(&self, op: F) -> Self
    where
        F: Fn(Damage) -> Damage,
    {
        let mut outcomes = dist_map();
        for (v, c) in &self.outcomes {
            match outcomes.entry(op(*v)) {
                Entry::Vacant(e) => {
                    e.insert(c.clone());
                }
                Entry::Occupied(mut e) => {
                    *e.get_mut() += c;
                }
            }
        }
        Self::from_map(self.denom.clone(), outcomes)
    }

    /// Floors every damage value to `v * num / den`. Truncation is floor,
    /// never round, matching integer game damage.
    pub fn scale_damage(&self, num: u64, den: u64) -> Self {
        self.map(|v| scale_floor(u64::from(v), num, den) as Damage)
    }

    /// Clamps every damage value to at most `cap`, merging the overflow
    /// into the cap bucket.
    pub fn cap_max(&self, cap: Damage) -> Self {
        if self.max() <= cap {
            return self.clone();
        }
        self.map(|v| v.min(cap))
    }

    /// Probability of rolling exactly `value`, at the float boundary.
    pub fn probability_at(&self, value: Damage) -> f64 {
        let total = self.total_weight();
        if total.is_zero() {
            return 0.0;
        }
        self.outcomes
            .iter()
            .find(|(v, _)| *v == value)
            .and_then(|(_, c)| Ratio::new(c.clone(), total).to_f64())
            .unwrap_or(0.0)
    }

    /// Probability-weighted mean damage.
    pub fn expected_value(&self) -> f64 {
        let total = self.total_weight();
        if total.is_zero() {
            return 0.0;
        }
        self.outcomes
            .iter()
            .map(|(v, c)| {
                f64::from(*v)
                    * Ratio::new(c.clone(), total.clone())
                        .to_f64()
                        .unwrap_or(0.0)
            })
            .sum()
    }

    /// Lazy, restartable `(damage, normalized probability)` sequence for
    /// charting. With `hide_zeros` the zero-damage bucket is dropped from
    /// both the numerator and the renormalization denominator.
    pub fn histogram(&self, hide_zeros: bool) -> Histogram<'_> {
        let total: Weight = self
            .outcomes
            .iter()
            .filter(|(v, _)| !(hide_zeros && *v == 0))
            .map(|(_, c)| c)
            .sum();
        Histogram {
            inner: self.outcomes.iter(),
            total,
            hide_zeros,
        }
    }

    /// Draws one damage value. Only used for Monte-Carlo cross-checks; the
    /// engine proper is deterministic.
    pub fn sample<G>(&self, rng: &mut G) -> Damage
    where
        G: RngCore,
    {
        let total = self.total_weight();
        debug_assert!(!total.is_zero());
        let roll = rng.gen_biguint_range(&Weight::zero(), &total);
        let mut pos = Weight::zero();
        for (v, c) in &self.outcomes {
            pos += c;
            if roll < pos {
                return *v;
            }
        }
        unreachable!()
    }

    fn from_map(denom: Weight, outcomes: DistMap) -> Self {
        Self::new(denom, outcomes.into_iter().collect())
    }

    fn new(denom: Weight, outcomes: Vec<(Damage, Weight)>) -> Self {
        Self { outcomes, denom }.reduced()
    }

    /// Divides all weights and the denominator by their gcd, keeping the
    /// integers small across long operation chains.
    fn reduced(mut self) -> Self {
        let mut g = self.denom.clone();
        for (_, c) in &self.outcomes {
            g = g.gcd(c);
            if g.is_one() {
                return self;
            }
        }
        if g.is_zero() {
            return self;
        }
        self.denom /= &g;
        for (_, c) in &mut self.outcomes {
            *c /= &g;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct Histogram<'a> {
    inner: std::slice::Iter<'a, (Damage, Weight)>,
    total: Weight,
    hide_zeros: bool,
}

impl Iterator for Histogram<'_> {
    type Item = (Damage, f64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (v, c) = self.inner.next()?;
            if self.hide_zeros && *v == 0 {
                continue;
            }
            let p = if self.total.is_zero() {
                0.0
            } else {
                Ratio::new(c.clone(), self.total.clone())
                    .to_f64()
                    .unwrap_or(0.0)
            };
            return Some((*v, p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass(d: &HitDist) -> f64 {
        d.histogram(false).map(|(_, p)| p).sum()
    }

    #[test]
    fn linear_rejects_inverted_range() {
        assert!(matches!(
            HitDist::linear(5, 2),
            Err(CalcError::InvalidRange { min: 5, max: 2 })
        ));
    }

    #[test]
    fn combine_is_exact_convolution() {
        let a = HitDist::linear(0, 1).unwrap();
        let b = HitDist::linear(0, 1).unwrap();
        let sum = a.combine(&b);
        assert_eq!(sum.max(), 2);
        assert!((sum.probability_at(1) - 0.5).abs() < 1e-12);
        assert!((mass(&sum) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn combine_all_matches_pairwise() {
        let d = HitDist::linear(0, 3).unwrap();
        let pairwise = d.combine(&d).combine(&d);
        let nary = HitDist::combine_all(&[&d, &d, &d]);
        assert_eq!(pairwise, nary);
    }

    #[test]
    fn mixture_preserves_mass() {
        let hit = HitDist::linear(0, 10).unwrap();
        let miss = HitDist::single(0);
        let gated = HitDist::mixture(&[(hit, (3, 10)), (miss, (7, 10))]);
        assert!((mass(&gated) - 1.0).abs() < 1e-9);
        // miss mass plus the uniform's own zero bucket
        let p0 = gated.probability_at(0);
        assert!((p0 - (0.7 + 0.3 / 11.0)).abs() < 1e-9);
    }

    #[test]
    fn mixture_with_zero_denominator_weight_never_lands() {
        let malformed = HitDist::mixture(&[
            (HitDist::linear(0, 10).unwrap(), (1, 2)),
            (HitDist::single(5), (1, 0)),
        ]);
        assert_eq!(malformed, HitDist::never());
        assert!((malformed.probability_at(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scale_damage_floors() {
        let d = HitDist::single(10).scale_damage(1, 3);
        assert_eq!(d.max(), 3);
        assert!((d.probability_at(3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scale_damage_remerges_buckets() {
        let d = HitDist::linear(0, 5).unwrap().scale_damage(1, 2);
        // 0,1 -> 0; 2,3 -> 1; 4,5 -> 2
        assert_eq!(d.outcomes().len(), 3);
        assert!((d.probability_at(1) - 2.0 / 6.0).abs() < 1e-12);
        assert!((mass(&d) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cap_max_merges_overflow() {
        let d = HitDist::linear(0, 9).unwrap().cap_max(4);
        assert_eq!(d.max(), 4);
        assert!((d.probability_at(4) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn histogram_hides_zero_bucket() {
        let gated = HitDist::mixture(&[
            (HitDist::linear(1, 2).unwrap(), (1, 2)),
            (HitDist::single(0), (1, 2)),
        ]);
        let shown: Vec<_> = gated.histogram(true).collect();
        assert_eq!(shown.len(), 2);
        let total: f64 = shown.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn histogram_is_restartable() {
        let d = HitDist::linear(0, 4).unwrap();
        let first: Vec<_> = d.histogram(false).collect();
        let second: Vec<_> = d.histogram(false).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn expected_value_of_uniform() {
        let d = HitDist::linear(0, 10).unwrap();
        assert!((d.expected_value() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn sample_agrees_with_expected_value() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let d = HitDist::linear(0, 20).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let n = 20_000;
        let mean: f64 =
            (0..n).map(|_| f64::from(d.sample(&mut rng))).sum::<f64>() / f64::from(n);
        assert!((mean - d.expected_value()).abs() < 0.2);
    }
}
