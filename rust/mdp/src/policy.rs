use crate::{
    error::*,
    index::StateIndex,
    model::{Mdp, PROBABILITY_TOLERANCE},
    snapshot::Snapshot,
};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Probability of taking each action in a state.
pub trait Policy<S, A> {
    fn distribution(&self, s: &S) -> Result<Vec<(A, f64)>>;
}

/// One action per state. States without legal actions map to `None`.
#[derive(Debug, Clone)]
pub struct DeterministicPolicy<S, A> {
    index: Rc<StateIndex<S>>,
    actions: Vec<Option<A>>,
}

impl<S, A> DeterministicPolicy<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Debug,
{
    pub fn new<F>(index: Rc<StateIndex<S>>, init: F) -> Self
    where
        F: FnMut(&S) -> Option<A>,
    {
        let actions = index.states().iter().map(init).collect();
        Self { index, actions }
    }

    pub fn from_actions(index: Rc<StateIndex<S>>, actions: Vec<Option<A>>) -> Result<Self> {
        if actions.len() != index.len() {
            return Err(Error::InvalidArgument(format!(
                "{} actions for {} states",
                actions.len(),
                index.len()
            )));
        }
        Ok(Self { index, actions })
    }

    /// Each non-terminal state starts on its smallest legal action.
    pub fn first_action<M>(mdp: &M, index: Rc<StateIndex<S>>) -> Self
    where
        M: Mdp<State = S, Action = A>,
        A: Ord,
    {
        Self::new(index, |s| {
            if mdp.is_terminal(s) {
                None
            } else {
                mdp.actions(s).into_iter().min()
            }
        })
    }

    pub fn index(&self) -> &Rc<StateIndex<S>> {
        &self.index
    }

    pub fn action(&self, s: &S) -> Result<Option<A>> {
        Ok(self.actions[self.index.position(s)?])
    }

    pub fn set(&mut self, s: &S, a: Option<A>) -> Result<()> {
        let i = self.index.position(s)?;
        self.actions[i] = a;
        Ok(())
    }

    /// Swaps in a whole new assignment and returns how many states changed.
    pub fn replace(&mut self, actions: Vec<Option<A>>) -> Result<usize> {
        if actions.len() != self.actions.len() {
            return Err(Error::InvalidArgument(format!(
                "{} actions for {} states",
                actions.len(),
                self.actions.len()
            )));
        }
        let changed = self
            .actions
            .iter()
            .zip(&actions)
            .filter(|(old, new)| old != new)
            .count();
        self.actions = actions;
        Ok(changed)
    }

    pub fn actions(&self) -> &[Option<A>] {
        &self.actions
    }

    pub fn iter(&self) -> impl Iterator<Item = (S, Option<A>)> + '_ {
        self.index
            .states()
            .iter()
            .copied()
            .zip(self.actions.iter().copied())
    }

    pub fn snapshot(&self, shape: &[usize]) -> Result<Snapshot<Option<A>>> {
        Snapshot::new(shape.to_vec(), self.actions.clone())
    }
}

impl<S, A> Policy<S, A> for DeterministicPolicy<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Debug,
{
    fn distribution(&self, s: &S) -> Result<Vec<(A, f64)>> {
        Ok(self.action(s)?.map(|a| (a, 1.)).into_iter().collect())
    }
}

/// A probability distribution over actions per state.
#[derive(Debug, Clone)]
pub struct StochasticPolicy<S, A> {
    index: Rc<StateIndex<S>>,
    rows: Vec<Vec<(A, f64)>>,
}

impl<S, A> StochasticPolicy<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Debug,
{
    /// Every non-empty row must sum to one.
    pub fn new(index: Rc<StateIndex<S>>, rows: Vec<Vec<(A, f64)>>) -> Result<Self> {
        if rows.len() != index.len() {
            return Err(Error::InvalidArgument(format!(
                "{} rows for {} states",
                rows.len(),
                index.len()
            )));
        }
        for (s, row) in index.states().iter().zip(&rows) {
            if row.iter().any(|(_, p)| !(0. ..=1.).contains(p)) {
                return Err(Error::InvalidArgument(format!(
                    "policy row of {s:?} holds a probability outside [0, 1]"
                )));
            }
            let total = row.iter().map(|(_, p)| p).sum::<f64>();
            if !row.is_empty() && (total - 1.).abs() > PROBABILITY_TOLERANCE {
                return Err(Error::InvalidArgument(format!(
                    "policy row of {s:?} sums to {total}"
                )));
            }
        }
        Ok(Self { index, rows })
    }

    /// Equal mass on every legal action; terminal states get empty rows.
    pub fn uniform<M>(mdp: &M, index: Rc<StateIndex<S>>) -> Result<Self>
    where
        M: Mdp<State = S, Action = A>,
    {
        let rows = index
            .states()
            .iter()
            .map(|s| {
                if mdp.is_terminal(s) {
                    return Ok(vec![]);
                }
                let actions = mdp.actions(s);
                if actions.is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "non-terminal state {s:?} has no legal actions"
                    )));
                }
                let p = 1. / actions.len() as f64;
                Ok(actions.into_iter().map(|a| (a, p)).collect())
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(index, rows)
    }

    pub fn index(&self) -> &Rc<StateIndex<S>> {
        &self.index
    }
}

impl<S, A> Policy<S, A> for StochasticPolicy<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Debug,
{
    fn distribution(&self, s: &S) -> Result<Vec<(A, f64)>> {
        Ok(self.rows[self.index.position(s)?].clone())
    }
}

impl<S, A> From<&DeterministicPolicy<S, A>> for StochasticPolicy<S, A>
where
    S: Copy + Eq + Hash + Debug,
    A: Copy + Eq + Debug,
{
    fn from(policy: &DeterministicPolicy<S, A>) -> Self {
        let rows = policy
            .actions
            .iter()
            .map(|a| a.map(|a| (a, 1.)).into_iter().collect())
            .collect();
        Self {
            index: Rc::clone(&policy.index),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TabularMdp, Transition, Transitions};

    fn stay(s: u8) -> Vec<Transition<u8>> {
        vec![Transition {
            next_state: s,
            probability: 1.,
            reward: 0.,
        }]
    }

    fn three_states() -> TabularMdp<u8, i8> {
        let transitions = Transitions::from([
            ((0, -1), stay(0)),
            ((0, 1), stay(1)),
            ((1, 2), stay(2)),
        ]);
        TabularMdp::new(vec![0, 1, 2], transitions, 1.).unwrap()
    }

    #[test]
    fn first_action_is_the_smallest_legal_one() {
        let mdp = three_states();
        let policy = DeterministicPolicy::first_action(&mdp, StateIndex::of(&mdp).unwrap());

        assert_eq!(policy.actions(), &[Some(-1), Some(2), None]);
        assert_eq!(policy.distribution(&0).unwrap(), vec![(-1, 1.)]);
        assert!(policy.distribution(&2).unwrap().is_empty());
    }

    #[test]
    fn replace_counts_changed_states() {
        let mdp = three_states();
        let mut policy = DeterministicPolicy::first_action(&mdp, StateIndex::of(&mdp).unwrap());

        assert_eq!(policy.replace(vec![Some(1), Some(2), None]).unwrap(), 1);
        assert_eq!(policy.replace(vec![Some(1), Some(2), None]).unwrap(), 0);
        assert!(policy.replace(vec![None]).is_err());
    }

    #[test]
    fn uniform_spreads_mass_over_legal_actions() {
        let mdp = three_states();
        let policy = StochasticPolicy::uniform(&mdp, StateIndex::of(&mdp).unwrap()).unwrap();

        assert_eq!(policy.distribution(&0).unwrap(), vec![(-1, 0.5), (1, 0.5)]);
        assert_eq!(policy.distribution(&1).unwrap(), vec![(2, 1.)]);
        assert!(policy.distribution(&2).unwrap().is_empty());
    }

    #[test]
    fn rows_must_be_distributions() {
        let index = Rc::new(StateIndex::new(vec![0u8, 1]).unwrap());

        assert!(StochasticPolicy::new(Rc::clone(&index), vec![vec![(0, 0.5)], vec![]]).is_err());
        assert!(StochasticPolicy::new(Rc::clone(&index), vec![vec![(0, 1.5), (1, -0.5)], vec![]]).is_err());
        assert!(StochasticPolicy::new(index, vec![vec![(0, 0.25), (1, 0.75)], vec![]]).is_ok());
    }

    #[test]
    fn deterministic_policies_are_degenerate_stochastic_ones() {
        let mdp = three_states();
        let policy = DeterministicPolicy::first_action(&mdp, StateIndex::of(&mdp).unwrap());
        let stochastic = StochasticPolicy::from(&policy);

        for s in 0..3 {
            assert_eq!(
                stochastic.distribution(&s).unwrap(),
                policy.distribution(&s).unwrap()
            );
        }
    }
}
