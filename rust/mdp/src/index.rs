use crate::{error::*, model::Mdp};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Ordered state space shared by the value and policy tables of one solve.
#[derive(Debug, Clone)]
pub struct StateIndex<S> {
    states: Vec<S>,
    positions: HashMap<S, usize>,
}

impl<S: Copy + Eq + Hash + Debug> StateIndex<S> {
    pub fn new(states: Vec<S>) -> Result<Self> {
        if states.is_empty() {
            return Err(Error::InvalidArgument("empty state space".to_string()));
        }

        let mut positions = HashMap::with_capacity(states.len());
        for (i, s) in states.iter().enumerate() {
            if positions.insert(*s, i).is_some() {
                return Err(Error::InvalidArgument(format!("state {s:?} enumerated twice")));
            }
        }

        Ok(Self { states, positions })
    }

    pub fn of<M: Mdp<State = S>>(mdp: &M) -> Result<Rc<Self>> {
        Ok(Rc::new(Self::new(mdp.states())?))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn contains(&self, s: &S) -> bool {
        self.positions.contains_key(s)
    }

    pub fn position(&self, s: &S) -> Result<usize> {
        self.positions
            .get(s)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown state {s:?}")))
    }
}
