extern crate float_eq;
extern crate mdp;
extern crate rl;

mod common;

use common::*;
use float_eq::*;
use mdp::*;
use rl::envs::gambler::{Gambler, GamblerConfig};
use std::rc::Rc;

fn gambler() -> Rc<Gambler> {
    Rc::new(Gambler::new(GamblerConfig::default()).unwrap())
}

fn solved_by_value_iteration() -> ValueIteration<Gambler> {
    let mut vi = ValueIteration::new(gambler(), Settings::default().with_theta(1e-12)).unwrap();
    vi.exec().unwrap();
    vi
}

#[test]
fn value_iteration_gives_winning_probabilities() {
    let vi = solved_by_value_iteration();
    let v = vi.values().values();

    assert_eq!(v[0], 0.);
    assert_eq!(v[100], 1.);
    assert_float_eq!(v[50], 0.4, abs <= 1e-8);
    assert_float_eq!(v[25], 0.16, abs <= 1e-8);
    assert_float_eq!(v[75], 0.64, abs <= 1e-8);
    assert!(v[50] > v[49]);
    assert!(v.windows(2).all(|w| w[1] >= w[0] - 1e-12));
}

#[test]
fn bold_play_at_the_halfway_mark() {
    let vi = solved_by_value_iteration();

    assert_eq!(vi.pi_star(&50).unwrap(), Some(50));
    assert_eq!(vi.pi_star(&0).unwrap(), None);
    assert_eq!(vi.pi_star(&100).unwrap(), None);
}

#[test]
fn policy_iteration_agrees_with_value_iteration() {
    let settings = Settings::default()
        .with_theta(1e-13)
        .with_tie_tolerance(1e-8);
    let mut pi = PolicyIteration::new(gambler(), settings).unwrap();
    let report = pi.exec().unwrap();
    let vi = solved_by_value_iteration();

    assert!(report.iterations < 50);
    assert!(pi.values().max_abs_diff(vi.values()).unwrap() < 1e-5);
    assert_eq!(pi.pi_star(&50).unwrap(), Some(50));
}

#[test]
fn goal_keeps_its_pinned_value_under_every_operator() {
    let gambler = gambler();
    let values = random_values(&*gambler, 1, 1.);
    let bellman = Bellman::default();

    assert_eq!(values.get(&100).unwrap(), 1.);
    for a in 1..=50 {
        assert_eq!(bellman.q_value(&*gambler, &values, &100, &a).unwrap(), 1.);
    }
    assert_eq!(bellman.optimality(&*gambler, &values, &0, 1e-9).unwrap().value, 0.);
}

#[test]
fn oversized_stakes_are_infeasible() {
    let gambler = gambler();
    let values = ValueTable::for_mdp(&*gambler, StateIndex::of(&*gambler).unwrap());

    let err = Bellman::default()
        .q_value(&*gambler, &values, &70, &31)
        .unwrap_err();
    assert!(matches!(err, Error::InfeasibleAction { .. }));
}
