use super::{Convergence, Settings};
use crate::{error::*, model::Mdp, policy::Policy, values::ValueTable};
use tracing::{debug, warn};

/// Iterative policy evaluation of a fixed policy.
pub struct Evaluation<'a, M, P: ?Sized> {
    mdp: &'a M,
    policy: &'a P,
    settings: &'a Settings,
}

impl<'a, M, P> Evaluation<'a, M, P>
where
    M: Mdp,
    P: Policy<M::State, M::Action> + ?Sized,
{
    pub fn new(mdp: &'a M, policy: &'a P, settings: &'a Settings) -> Self {
        Self {
            mdp,
            policy,
            settings,
        }
    }

    fn sweep(&self, values: &mut ValueTable<M::State>) -> Result<f64> {
        let bellman = self.settings.bellman();
        self.settings
            .mode
            .sweep(values, |s, v| bellman.expectation(self.mdp, v, self.policy, s))
    }

    fn cancelled(&self, report: &Convergence) -> Result<()> {
        if self.settings.cancelled() {
            return Err(Error::Cancelled {
                stage: Stage::Evaluation,
                steps: report.sweeps,
            });
        }
        Ok(())
    }

    /// Sweeps until `max |dV| < theta`, or fails with
    /// [`Error::NotConverged`] once `max_sweeps` is spent.
    pub fn run(&self, values: &mut ValueTable<M::State>) -> Result<Convergence> {
        self.settings.validate()?;

        let mut report = Convergence::default();
        while report.sweeps < self.settings.max_sweeps {
            self.cancelled(&report)?;
            let delta = self.sweep(values)?;
            report.record(delta);
            debug!(sweep = report.sweeps, delta, "policy evaluation");
            if delta < self.settings.theta {
                return Ok(report);
            }
        }

        warn!(
            sweeps = report.sweeps,
            delta = report.last_delta(),
            theta = self.settings.theta,
            "policy evaluation hit its sweep cap"
        );
        Err(Error::NotConverged {
            stage: Stage::Evaluation,
            steps: report.sweeps,
            residual: report.last_delta(),
        })
    }

    /// Exactly `k` sweeps, whatever the deltas.
    pub fn run_sweeps(&self, values: &mut ValueTable<M::State>, k: usize) -> Result<Convergence> {
        self.settings.validate()?;

        let mut report = Convergence::default();
        for _ in 0..k {
            self.cancelled(&report)?;
            let delta = self.sweep(values)?;
            report.record(delta);
            debug!(sweep = report.sweeps, delta, "policy evaluation");
        }
        Ok(report)
    }
}
