use crate::error::*;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Probability mass of a `(state, action)` row may stray this far from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S> {
    pub next_state: S,
    pub probability: f64,
    pub reward: f64,
}

pub type Transitions<S, A> = HashMap<(S, A), Vec<Transition<S>>>;

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    type State: Copy + Eq + Hash + Debug;

    type Action: Copy + Eq + Ord + Hash + Debug;

    /// Every state, in a stable order. In-place sweeps visit states in this order.
    fn states(&self) -> Vec<Self::State>;

    /// Legal actions of `s`, empty for states that admit none.
    fn actions(&self, s: &Self::State) -> Vec<Self::Action>;

    fn is_feasible(&self, s: &Self::State, a: &Self::Action) -> bool {
        self.actions(s).contains(a)
    }

    /// Projects an out-of-range action into the feasible range of `s`.
    /// Environments that never clamp keep the default.
    fn clamp(&self, _s: &Self::State, _a: &Self::Action) -> Option<Self::Action> {
        None
    }

    fn transitions(
        &self,
        s: &Self::State,
        a: &Self::Action,
    ) -> Result<Vec<Transition<Self::State>>>;

    /// Deterministic cost paid for choosing `a`, whatever the outcome.
    fn action_cost(&self, _s: &Self::State, _a: &Self::Action) -> f64 {
        0.
    }

    fn is_terminal(&self, s: &Self::State) -> bool;

    /// Value pinned to a terminal state for the whole solve.
    fn terminal_value(&self, _s: &Self::State) -> f64 {
        0.
    }

    fn gamma(&self) -> f64;
}

pub fn check_discount(gamma: f64) -> Result<()> {
    if (0. ..=1.).contains(&gamma) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "discount {gamma} is outside [0, 1]"
        )))
    }
}

pub fn total_probability<S>(ts: &[Transition<S>]) -> f64 {
    ts.iter().map(|t| t.probability).sum()
}

/// An MDP given entirely by an explicit transition table. States without
/// outgoing rows are terminal.
#[derive(Debug, Clone)]
pub struct TabularMdp<S, A> {
    states: Vec<S>,
    actions: HashMap<S, Vec<A>>,
    transitions: Transitions<S, A>,
    terminal_values: HashMap<S, f64>,
    gamma: f64,
}

impl<S, A> TabularMdp<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Ord + Hash + Debug,
{
    pub fn new(states: Vec<S>, transitions: Transitions<S, A>, gamma: f64) -> Result<Self> {
        check_discount(gamma)?;

        let known = states.iter().copied().collect::<HashSet<_>>();
        if known.len() != states.len() {
            return Err(Error::InvalidArgument("duplicate states".to_string()));
        }

        let mut actions: HashMap<S, Vec<A>> = HashMap::new();
        for ((s, a), ts) in &transitions {
            if !known.contains(s) {
                return Err(Error::InvalidArgument(format!(
                    "transition out of unknown state {s:?}"
                )));
            }
            if let Some(t) = ts.iter().find(|t| !known.contains(&t.next_state)) {
                return Err(Error::InvalidArgument(format!(
                    "transition into unknown state {:?}",
                    t.next_state
                )));
            }
            let total = total_probability(ts);
            if (total - 1.).abs() > PROBABILITY_TOLERANCE {
                return Err(Error::inconsistent(s, a, total));
            }
            actions.entry(*s).or_default().push(*a);
        }
        actions.values_mut().for_each(|a| a.sort());

        Ok(Self {
            states,
            actions,
            transitions,
            terminal_values: HashMap::new(),
            gamma,
        })
    }

    pub fn with_terminal_value(mut self, s: S, value: f64) -> Result<Self> {
        if !self.states.contains(&s) || self.actions.contains_key(&s) {
            return Err(Error::InvalidArgument(format!(
                "{s:?} is not a terminal state"
            )));
        }
        self.terminal_values.insert(s, value);
        Ok(self)
    }
}

impl<S, A> Mdp for TabularMdp<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Ord + Hash + Debug,
{
    type State = S;
    type Action = A;

    fn states(&self) -> Vec<S> {
        self.states.clone()
    }

    fn actions(&self, s: &S) -> Vec<A> {
        self.actions.get(s).cloned().unwrap_or_default()
    }

    fn is_feasible(&self, s: &S, a: &A) -> bool {
        self.transitions.contains_key(&(*s, *a))
    }

    fn transitions(&self, s: &S, a: &A) -> Result<Vec<Transition<S>>> {
        self.transitions
            .get(&(*s, *a))
            .cloned()
            .ok_or_else(|| Error::infeasible(s, a))
    }

    fn is_terminal(&self, s: &S) -> bool {
        !self.actions.contains_key(s)
    }

    fn terminal_value(&self, s: &S) -> f64 {
        self.terminal_values.get(s).copied().unwrap_or_default()
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }
}
