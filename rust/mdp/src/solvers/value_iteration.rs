use super::{improvement, MdpSolver, Report, Settings};
use crate::{
    error::*, index::StateIndex, model::Mdp, policy::DeterministicPolicy, values::ValueTable,
};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Sweeps the optimality operator until `max |dV| < theta`. The greedy
/// policy is only extracted on demand.
pub struct ValueIteration<M: Mdp> {
    mdp: Rc<M>,
    settings: Settings,
    values: ValueTable<M::State>,
}

impl<M: Mdp> ValueIteration<M> {
    pub fn new(mdp: Rc<M>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let index = StateIndex::of(&*mdp)?;
        let values = ValueTable::for_mdp(&*mdp, index);
        Ok(Self {
            mdp,
            settings,
            values,
        })
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

    /// Seeds the sweep with an earlier table, e.g. one read from a snapshot.
    pub fn values_mut(&mut self) -> &mut ValueTable<M::State> {
        &mut self.values
    }

    pub fn policy(&self) -> Result<DeterministicPolicy<M::State, M::Action>> {
        improvement::greedy(&*self.mdp, &self.values, &self.settings)
    }
}

impl<M: Mdp> MdpSolver<M> for ValueIteration<M> {
    fn v_star(&self, s: &M::State) -> Result<f64> {
        self.values.get(s)
    }

    fn q_star(&self, s: &M::State, a: &M::Action) -> Result<f64> {
        self.settings
            .bellman()
            .q_value(&*self.mdp, &self.values, s, a)
    }

    fn pi_star(&self, s: &M::State) -> Result<Option<M::Action>> {
        let greedy = self.settings.bellman().optimality(
            &*self.mdp,
            &self.values,
            s,
            self.settings.tie_tolerance,
        )?;
        Ok(greedy.best())
    }

    fn exec(&mut self) -> Result<Report> {
        let bellman = self.settings.bellman();
        let tolerance = self.settings.tie_tolerance;
        let mdp = &*self.mdp;

        let mut report = Report::default();
        while report.sweeps < self.settings.max_sweeps {
            if self.settings.cancelled() {
                return Err(Error::Cancelled {
                    stage: Stage::ValueIteration,
                    steps: report.sweeps,
                });
            }

            let delta = self.settings.mode.sweep(&mut self.values, |s, v| {
                Ok(bellman.optimality(mdp, v, s, tolerance)?.value)
            })?;
            report.sweeps += 1;
            report.iterations = report.sweeps;
            report.delta = delta;
            debug!(sweep = report.sweeps, delta, "value iteration");

            if delta < self.settings.theta {
                info!(sweeps = report.sweeps, delta, "value iteration converged");
                return Ok(report);
            }
        }

        warn!(
            sweeps = report.sweeps,
            delta = report.delta,
            "value iteration hit its sweep cap"
        );
        Err(Error::NotConverged {
            stage: Stage::ValueIteration,
            steps: report.sweeps,
            residual: report.delta,
        })
    }
}
