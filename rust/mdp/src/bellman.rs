use crate::{
    error::*,
    model::{total_probability, Mdp, PROBABILITY_TOLERANCE},
    policy::Policy,
    values::ValueTable,
};
use serde::{Deserialize, Serialize};

/// What to do with an action outside the feasible set of a state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionCheck {
    /// Fail with [`Error::InfeasibleAction`].
    #[default]
    Reject,
    /// Project the action with [`Mdp::clamp`] and evaluate the result.
    Clamp,
}

/// Outcome of the optimality operator in one state.
#[derive(Debug, Clone, PartialEq)]
pub struct Greedy<A> {
    pub value: f64,
    /// Maximisers within the tie tolerance, ascending. Empty for terminal states.
    pub ties: Vec<A>,
}

impl<A: Copy> Greedy<A> {
    pub fn best(&self) -> Option<A> {
        self.ties.first().copied()
    }
}

/// One-step lookahead over an [`Mdp`] and a [`ValueTable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Bellman {
    check: ActionCheck,
}

impl Bellman {
    pub fn new(check: ActionCheck) -> Self {
        Self { check }
    }

    pub fn check(&self) -> ActionCheck {
        self.check
    }

    /// The action that will actually be evaluated for `a` in `s`.
    pub fn admit<M: Mdp>(&self, mdp: &M, s: &M::State, a: &M::Action) -> Result<M::Action> {
        if mdp.is_feasible(s, a) {
            return Ok(*a);
        }
        match self.check {
            ActionCheck::Reject => Err(Error::infeasible(s, a)),
            ActionCheck::Clamp => mdp
                .clamp(s, a)
                .filter(|c| mdp.is_feasible(s, c))
                .ok_or_else(|| Error::infeasible(s, a)),
        }
    }

    /// `Q(s, a) = sum P(s'|s,a) (r + gamma V(s')) - cost(s, a)`.
    ///
    /// Terminal states return their own value whatever the action.
    pub fn q_value<M: Mdp>(
        &self,
        mdp: &M,
        values: &ValueTable<M::State>,
        s: &M::State,
        a: &M::Action,
    ) -> Result<f64> {
        if mdp.is_terminal(s) {
            return values.get(s);
        }

        let a = self.admit(mdp, s, a)?;
        let transitions = mdp.transitions(s, &a)?;
        let total = total_probability(&transitions);
        if (total - 1.).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::inconsistent(s, &a, total));
        }

        let gamma = mdp.gamma();
        let mut q = -mdp.action_cost(s, &a);
        for t in transitions.iter().filter(|t| t.probability > 0.) {
            q += t.probability * (t.reward + gamma * values.get(&t.next_state)?);
        }
        Ok(q)
    }

    /// Expected `Q` under the action distribution of `policy` in `s`.
    pub fn expectation<M, P>(
        &self,
        mdp: &M,
        values: &ValueTable<M::State>,
        policy: &P,
        s: &M::State,
    ) -> Result<f64>
    where
        M: Mdp,
        P: Policy<M::State, M::Action> + ?Sized,
    {
        if mdp.is_terminal(s) {
            return values.get(s);
        }

        let distribution = policy.distribution(s)?;
        if distribution.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "policy assigns no action to non-terminal state {s:?}"
            )));
        }

        let mut v = 0.;
        for (a, p) in distribution.iter().filter(|(_, p)| *p > 0.) {
            v += p * self.q_value(mdp, values, s, a)?;
        }
        Ok(v)
    }

    /// `max_a Q(s, a)` over the legal actions of `s`, with every action
    /// whose value lies within `tolerance` of the maximum.
    pub fn optimality<M: Mdp>(
        &self,
        mdp: &M,
        values: &ValueTable<M::State>,
        s: &M::State,
        tolerance: f64,
    ) -> Result<Greedy<M::Action>> {
        if mdp.is_terminal(s) {
            return Ok(Greedy {
                value: values.get(s)?,
                ties: vec![],
            });
        }

        let mut actions = mdp.actions(s);
        if actions.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "non-terminal state {s:?} has no legal actions"
            )));
        }
        actions.sort();

        let qs = actions
            .iter()
            .map(|a| self.q_value(mdp, values, s, a))
            .collect::<Result<Vec<_>>>()?;
        let value = qs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ties = actions
            .into_iter()
            .zip(qs)
            .filter(|(_, q)| *q >= value - tolerance)
            .map(|(a, _)| a)
            .collect();

        Ok(Greedy { value, ties })
    }
}
