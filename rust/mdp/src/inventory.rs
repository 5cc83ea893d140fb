//! Stock of a single location under Poisson requests and returns.
//!
//! Each period, `requests ~ Poisson(request_rate)` units are asked for and at
//! most the stock on hand is handed out at `price` each. Then
//! `returns ~ Poisson(return_rate)` units come back and the stock is clipped
//! to `capacity`. The stochastic part does not depend on any action, so the
//! `(P, R)` pair is built once per spec and shared.

use crate::{error::*, model::PROBABILITY_TOLERANCE, poisson::PoissonCache};
use ndarray::{Array1, Array2, ArrayView1};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventorySpec {
    pub request_rate: f64,
    pub return_rate: f64,
    pub capacity: usize,
    /// How far above `capacity` the stock may start a period.
    pub overflow: usize,
    pub price: f64,
}

impl InventorySpec {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be positive".to_string()));
        }
        if !self.price.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "price {} is not finite",
                self.price
            )));
        }
        Ok(())
    }

    fn key(&self) -> (u64, u64, usize, usize, u64) {
        (
            self.request_rate.to_bits(),
            self.return_rate.to_bits(),
            self.capacity,
            self.overflow,
            self.price.to_bits(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct InventoryModel {
    spec: InventorySpec,
    /// `transitions[[n, n']]`: stock `n` at the start ends the period at `n'`.
    transitions: Array2<f64>,
    /// `rewards[n]`: expected takings with `n` units on hand.
    rewards: Array1<f64>,
}

impl InventoryModel {
    pub fn build(cache: &mut PoissonCache, spec: &InventorySpec) -> Result<Self> {
        spec.validate()?;

        let rows = spec.capacity + spec.overflow + 1;
        let mut transitions = Array2::<f64>::zeros((rows, spec.capacity + 1));
        let mut rewards = Array1::<f64>::zeros(rows);

        for n in 0..rows {
            let mut rented = 0.;
            // `requests == n` carries every request count from `n` up.
            for requests in 0..=n {
                let p_request = if requests < n {
                    cache.pmf(requests as i64, spec.request_rate)?
                } else {
                    cache.tail(n as i64, spec.request_rate)?
                };
                rented += p_request * requests as f64;

                let left = n - requests;
                let room = spec.capacity.saturating_sub(left);
                for returns in 0..=room {
                    let p_return = if returns < room {
                        cache.pmf(returns as i64, spec.return_rate)?
                    } else {
                        cache.tail(room as i64, spec.return_rate)?
                    };
                    let next = (left + returns).min(spec.capacity);
                    transitions[[n, next]] += p_request * p_return;
                }
            }
            rewards[n] = spec.price * rented;
        }

        for (n, row) in transitions.rows().into_iter().enumerate() {
            let total = row.sum();
            if (total - 1.).abs() > PROBABILITY_TOLERANCE {
                return Err(Error::ModelInconsistency {
                    state: format!("{n} units"),
                    action: "rent and return".to_string(),
                    total,
                });
            }
        }

        debug!(
            request_rate = spec.request_rate,
            return_rate = spec.return_rate,
            rows,
            "built inventory model"
        );
        Ok(Self {
            spec: *spec,
            transitions,
            rewards,
        })
    }

    pub fn spec(&self) -> &InventorySpec {
        &self.spec
    }

    pub fn capacity(&self) -> usize {
        self.spec.capacity
    }

    /// Number of starting stock levels covered, `capacity + overflow + 1`.
    pub fn rows(&self) -> usize {
        self.rewards.len()
    }

    pub fn reward(&self, n: usize) -> Result<f64> {
        self.rewards.get(n).copied().ok_or_else(|| self.out_of_range(n))
    }

    pub fn probability(&self, n: usize, next: usize) -> Result<f64> {
        self.transitions
            .get([n, next])
            .copied()
            .ok_or_else(|| self.out_of_range(n.max(next)))
    }

    /// End-of-period distribution for `n` units at the start.
    pub fn row(&self, n: usize) -> Result<ArrayView1<'_, f64>> {
        if n >= self.rows() {
            return Err(self.out_of_range(n));
        }
        Ok(self.transitions.row(n))
    }

    fn out_of_range(&self, n: usize) -> Error {
        Error::InvalidArgument(format!(
            "stock {n} outside 0..{} of this inventory model",
            self.rows()
        ))
    }
}

/// Built models shared across environments with equal specs.
#[derive(Debug, Default)]
pub struct InventoryModels {
    cache: PoissonCache,
    models: HashMap<(u64, u64, usize, usize, u64), Rc<InventoryModel>>,
}

impl InventoryModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, spec: &InventorySpec) -> Result<Rc<InventoryModel>> {
        let key = spec.key();
        if let Some(model) = self.models.get(&key) {
            return Ok(Rc::clone(model));
        }
        let model = Rc::new(InventoryModel::build(&mut self.cache, spec)?);
        self.models.insert(key, Rc::clone(&model));
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
