#![allow(dead_code)]

use mdp::{Mdp, StateIndex, ValueTable};
use rand::prelude::*;
use rl::envs::{
    car_rental::{CarRental, CarRentalConfig},
    gridworld::{GridWorld, GridWorldConfig},
};
use std::rc::Rc;

pub fn grid(gamma: f64) -> Rc<GridWorld> {
    Rc::new(
        GridWorld::new(GridWorldConfig {
            gamma,
            ..Default::default()
        })
        .unwrap(),
    )
}

/// Eight cars, moves of up to three. Small enough to solve twice per test.
pub fn small_rental() -> Rc<CarRental> {
    Rc::new(
        CarRental::new(CarRentalConfig {
            max_cars: 8,
            max_move: 3,
            ..Default::default()
        })
        .unwrap(),
    )
}

/// Terminal states pinned, every other state drawn from `-range..range`.
pub fn random_values<M: Mdp>(mdp: &M, seed: u64, range: f64) -> ValueTable<M::State> {
    let rng = &mut StdRng::seed_from_u64(seed);
    let mut values = ValueTable::for_mdp(mdp, StateIndex::of(mdp).unwrap());
    for s in mdp.states() {
        if !mdp.is_terminal(&s) {
            values.set(&s, rng.gen_range(-range..range)).unwrap();
        }
    }
    values
}

pub fn is_non_increasing(xs: &[f64], slack: f64) -> bool {
    xs.windows(2).all(|w| w[1] <= w[0] + slack)
}
