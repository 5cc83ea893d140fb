//! Jack's car rental - Sutton & Barto 2018, example 4.2.

use super::Exercise;
use crate::error::ConfigError;
use itertools::iproduct;
use mdp::{
    check_discount, Error, InventoryModel, InventoryModels, InventorySpec, Mdp, Result, Transition,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Cars at the first and the second location.
pub type Lot = (usize, usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarRentalConfig {
    pub max_cars: usize,
    pub max_move: usize,
    pub rental_price: f64,
    pub move_cost: f64,
    pub request_rates: [f64; 2],
    pub return_rates: [f64; 2],
    pub gamma: f64,
}

impl Default for CarRentalConfig {
    fn default() -> Self {
        Self {
            max_cars: 20,
            max_move: 5,
            rental_price: 10.,
            move_cost: 2.,
            request_rates: [3., 4.],
            return_rates: [3., 2.],
            gamma: 0.9,
        }
    }
}

impl CarRentalConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_cars == 0 {
            return Err(ConfigError::Validation(
                "car_rental.max_cars must be > 0".into(),
            ));
        }
        if self.max_move > self.max_cars {
            return Err(ConfigError::Validation(
                "car_rental.max_move must be <= car_rental.max_cars".into(),
            ));
        }
        let mut rates = self.request_rates.iter().chain(&self.return_rates);
        if rates.any(|r| !(r.is_finite() && *r >= 0.)) {
            return Err(ConfigError::Validation(
                "car_rental rates must be finite and >= 0".into(),
            ));
        }
        if !(0. ..=1.).contains(&self.gamma) {
            return Err(ConfigError::Validation(
                "car_rental.gamma must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Each night `a` cars move from the first location to the second (negative
/// `a` moves them back) at `move_cost` per car. Requests and returns at each
/// location are independent Poisson counts.
#[derive(Debug, Clone)]
pub struct CarRental {
    config: CarRentalConfig,
    locations: [Rc<InventoryModel>; 2],
}

impl CarRental {
    pub fn new(config: CarRentalConfig) -> Result<Self> {
        Self::with_models(config, &mut InventoryModels::new())
    }

    /// Builds the per-location models through `models`, so rentals sharing a
    /// location spec share its tables.
    pub fn with_models(config: CarRentalConfig, models: &mut InventoryModels) -> Result<Self> {
        check_discount(config.gamma)?;
        if config.max_move > config.max_cars {
            return Err(Error::InvalidArgument(format!(
                "cannot move {} cars with room for {}",
                config.max_move, config.max_cars
            )));
        }

        let mut location = |i: usize| {
            models.get(&InventorySpec {
                request_rate: config.request_rates[i],
                return_rate: config.return_rates[i],
                capacity: config.max_cars,
                overflow: config.max_move,
                price: config.rental_price,
            })
        };
        let locations = [location(0)?, location(1)?];

        Ok(Self { config, locations })
    }

    pub fn config(&self) -> &CarRentalConfig {
        &self.config
    }

    pub fn location(&self, i: usize) -> Option<&InventoryModel> {
        self.locations.get(i).map(|m| &**m)
    }

    /// Morning lot after moving `a` cars overnight, and the rentals it is
    /// expected to earn. The morning lot may exceed `max_cars`.
    pub fn step(&self, s: &Lot, a: i32) -> Result<(Lot, f64)> {
        if !self.is_feasible(s, &a) {
            return Err(Error::infeasible(s, &a));
        }
        let moved = a.unsigned_abs() as usize;
        let morning = if a >= 0 {
            (s.0 - moved, s.1 + moved)
        } else {
            (s.0 + moved, s.1 - moved)
        };
        let reward = self.locations[0].reward(morning.0)? + self.locations[1].reward(morning.1)?;
        Ok((morning, reward))
    }
}

impl Mdp for CarRental {
    type State = Lot;
    type Action = i32;

    fn states(&self) -> Vec<Lot> {
        let n = self.config.max_cars;
        iproduct!(0..=n, 0..=n).collect()
    }

    fn actions(&self, s: &Lot) -> Vec<i32> {
        let max_move = self.config.max_move as i32;
        let lo = -(s.1 as i32).min(max_move);
        let hi = (s.0 as i32).min(max_move);
        (lo..=hi).collect()
    }

    fn is_feasible(&self, s: &Lot, a: &i32) -> bool {
        let moved = a.unsigned_abs() as usize;
        let source = if *a >= 0 { s.0 } else { s.1 };
        moved <= self.config.max_move && moved <= source
    }

    /// Caps the move by the cars at the source, then by `max_move`.
    fn clamp(&self, s: &Lot, a: &i32) -> Option<i32> {
        let max_move = self.config.max_move as i32;
        let a = (*a).min(s.0 as i32).max(-(s.1 as i32));
        Some(a.clamp(-max_move, max_move))
    }

    fn transitions(&self, s: &Lot, a: &i32) -> Result<Vec<Transition<Lot>>> {
        let (morning, reward) = self.step(s, *a)?;
        let first = self.locations[0].row(morning.0)?;
        let second = self.locations[1].row(morning.1)?;

        Ok(iproduct!(first.iter().enumerate(), second.iter().enumerate())
            .filter(|((_, p1), (_, p2))| **p1 > 0. && **p2 > 0.)
            .map(|((n1, p1), (n2, p2))| Transition {
                next_state: (n1, n2),
                probability: p1 * p2,
                reward,
            })
            .collect())
    }

    fn action_cost(&self, _s: &Lot, a: &i32) -> f64 {
        self.config.move_cost * a.unsigned_abs() as f64
    }

    fn is_terminal(&self, _s: &Lot) -> bool {
        false
    }

    fn gamma(&self) -> f64 {
        self.config.gamma
    }
}

impl Exercise for CarRental {
    const NAME: &'static str = "car rental";

    fn shape(&self) -> Vec<usize> {
        vec![self.config.max_cars + 1; 2]
    }
}
