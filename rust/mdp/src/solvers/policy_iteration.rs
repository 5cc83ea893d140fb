use super::{evaluation::Evaluation, improvement, Convergence, MdpSolver, Report, Settings};
use crate::{
    error::*, index::StateIndex, model::Mdp, policy::DeterministicPolicy, values::ValueTable,
};
use std::rc::Rc;
use tracing::{info, warn};

/// Alternates full policy evaluation with one greedy improvement step until
/// no state changes its action.
pub struct PolicyIteration<M: Mdp> {
    mdp: Rc<M>,
    settings: Settings,
    values: ValueTable<M::State>,
    policy: DeterministicPolicy<M::State, M::Action>,
}

impl<M: Mdp> PolicyIteration<M> {
    /// Starts from zero values and each state's smallest legal action.
    pub fn new(mdp: Rc<M>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let index = StateIndex::of(&*mdp)?;
        let values = ValueTable::for_mdp(&*mdp, Rc::clone(&index));
        let policy = DeterministicPolicy::first_action(&*mdp, index);
        Ok(Self {
            mdp,
            settings,
            values,
            policy,
        })
    }

    /// Replaces the initial policy. It must cover the same states in the
    /// same order.
    pub fn with_policy(mut self, policy: &DeterministicPolicy<M::State, M::Action>) -> Result<Self> {
        if policy.index().states() != self.values.index().states() {
            return Err(Error::InvalidArgument(
                "initial policy covers a different state space".to_string(),
            ));
        }
        self.policy.replace(policy.actions().to_vec())?;
        Ok(self)
    }

    pub fn mdp(&self) -> &Rc<M> {
        &self.mdp
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn values(&self) -> &ValueTable<M::State> {
        &self.values
    }

    pub fn policy(&self) -> &DeterministicPolicy<M::State, M::Action> {
        &self.policy
    }

    pub fn evaluate(&mut self) -> Result<Convergence> {
        Evaluation::new(&*self.mdp, &self.policy, &self.settings).run(&mut self.values)
    }

    /// One improvement step; returns the number of changed states.
    pub fn improve(&mut self) -> Result<usize> {
        improvement::improve(&*self.mdp, &self.values, &mut self.policy, &self.settings)
    }
}

impl<M: Mdp> MdpSolver<M> for PolicyIteration<M> {
    fn v_star(&self, s: &M::State) -> Result<f64> {
        self.values.get(s)
    }

    fn q_star(&self, s: &M::State, a: &M::Action) -> Result<f64> {
        self.settings
            .bellman()
            .q_value(&*self.mdp, &self.values, s, a)
    }

    fn pi_star(&self, s: &M::State) -> Result<Option<M::Action>> {
        self.policy.action(s)
    }

    fn exec(&mut self) -> Result<Report> {
        let mut report = Report::default();
        let mut changed = 0;
        for iteration in 1..=self.settings.max_iterations {
            if self.settings.cancelled() {
                return Err(Error::Cancelled {
                    stage: Stage::PolicyIteration,
                    steps: report.iterations,
                });
            }

            let convergence = self.evaluate()?;
            report.sweeps += convergence.sweeps;
            report.delta = convergence.last_delta();

            changed = self.improve()?;
            report.iterations = iteration;
            info!(
                iteration,
                sweeps = convergence.sweeps,
                changed,
                "policy iteration"
            );
            if changed == 0 {
                return Ok(report);
            }
        }

        warn!(
            iterations = report.iterations,
            changed, "policy iteration hit its iteration cap"
        );
        Err(Error::NotConverged {
            stage: Stage::PolicyIteration,
            steps: report.iterations,
            residual: changed as f64,
        })
    }
}
