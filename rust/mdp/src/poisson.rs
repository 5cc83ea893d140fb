use crate::error::*;
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A count and a rate, the rate held by its bit pattern so the pair hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PmfKey {
    count: u64,
    rate: u64,
}

impl PmfKey {
    pub fn new(count: i64, rate: f64) -> Result<Self> {
        if count < 0 {
            return Err(Error::InvalidArgument(format!(
                "poisson count {count} is negative"
            )));
        }
        if !rate.is_finite() || rate < 0. {
            return Err(Error::InvalidArgument(format!(
                "poisson rate {rate} is not a finite non-negative number"
            )));
        }

        // -0.0 and 0.0 must share a slot.
        let rate = if rate == 0. { 0. } else { rate };
        Ok(Self {
            count: count as u64,
            rate: rate.to_bits(),
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate)
    }
}

/// Memoized Poisson probability mass. The same handful of counts and rates
/// recur across every model build.
#[derive(Debug, Clone, Default)]
pub struct PoissonCache {
    table: HashMap<PmfKey, f64>,
    tails: HashMap<PmfKey, f64>,
}

impl PoissonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `P(X = count)` for `X ~ Poisson(rate)`.
    pub fn pmf(&mut self, count: i64, rate: f64) -> Result<f64> {
        let key = PmfKey::new(count, rate)?;
        match self.table.entry(key) {
            Entry::Occupied(e) => Ok(*e.get()),
            Entry::Vacant(e) => Ok(*e.insert(mass(key)?)),
        }
    }

    /// `P(X >= count)` for `X ~ Poisson(rate)`.
    pub fn tail(&mut self, count: i64, rate: f64) -> Result<f64> {
        let key = PmfKey::new(count, rate)?;
        match self.tails.entry(key) {
            Entry::Occupied(e) => Ok(*e.get()),
            Entry::Vacant(e) => Ok(*e.insert(upper_tail(key)?)),
        }
    }

    /// Distinct point masses held.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn mass(key: PmfKey) -> Result<f64> {
    let rate = key.rate();
    if rate == 0. {
        return Ok(if key.count() == 0 { 1. } else { 0. });
    }

    let dist = Poisson::new(rate)
        .map_err(|e| Error::InvalidArgument(format!("poisson rate {rate}: {e}")))?;
    Ok(dist.pmf(key.count()))
}

fn upper_tail(key: PmfKey) -> Result<f64> {
    if key.count() == 0 {
        return Ok(1.);
    }
    let rate = key.rate();
    if rate == 0. {
        return Ok(0.);
    }

    let dist = Poisson::new(rate)
        .map_err(|e| Error::InvalidArgument(format!("poisson rate {rate}: {e}")))?;
    // sf(k) is P(X > k).
    Ok(dist.sf(key.count() - 1).clamp(0., 1.))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rstest::rstest;

    fn textbook(k: u32, lambda: f64) -> f64 {
        let factorial = (1..=k).map(f64::from).product::<f64>();
        (-lambda).exp() * lambda.powi(k as i32) / factorial
    }

    #[rstest]
    #[case(0, 3.)]
    #[case(1, 3.)]
    #[case(4, 4.)]
    #[case(7, 2.)]
    #[case(25, 4.)]
    fn matches_the_poisson_formula(#[case] k: u32, #[case] lambda: f64) {
        let mut cache = PoissonCache::new();

        assert_float_eq!(
            cache.pmf(k as i64, lambda).unwrap(),
            textbook(k, lambda),
            rmax <= 1e-12
        );
    }

    #[test]
    fn zero_rate_puts_all_mass_on_zero() {
        let mut cache = PoissonCache::new();

        assert_eq!(cache.pmf(0, 0.).unwrap(), 1.);
        assert_eq!(cache.pmf(3, 0.).unwrap(), 0.);
        assert_eq!(cache.pmf(0, -0.).unwrap(), 1.);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let mut cache = PoissonCache::new();
        for _ in 0..3 {
            for k in 0..10 {
                cache.pmf(k, 3.).unwrap();
                cache.pmf(k, 4.).unwrap();
            }
        }

        assert_eq!(cache.len(), 20);
    }

    #[rstest]
    #[case(0, 3.)]
    #[case(1, 3.)]
    #[case(5, 4.)]
    #[case(12, 2.)]
    fn tail_is_what_the_head_leaves(#[case] k: u32, #[case] lambda: f64) {
        let mut cache = PoissonCache::new();
        let head = (0..k).map(|i| textbook(i, lambda)).sum::<f64>();

        assert_float_eq!(cache.tail(k as i64, lambda).unwrap(), 1. - head, abs <= 1e-10);
    }

    #[test]
    fn zero_rate_has_no_tail() {
        let mut cache = PoissonCache::new();

        assert_eq!(cache.tail(0, 0.).unwrap(), 1.);
        assert_eq!(cache.tail(1, 0.).unwrap(), 0.);
        assert!(matches!(cache.tail(-1, 3.), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let mut cache = PoissonCache::new();

        assert!(matches!(cache.pmf(-1, 3.), Err(Error::InvalidArgument(_))));
        assert!(matches!(cache.pmf(2, -0.5), Err(Error::InvalidArgument(_))));
        assert!(matches!(cache.pmf(2, f64::NAN), Err(Error::InvalidArgument(_))));
        assert!(cache.is_empty());
    }
}
