pub mod evaluation;
pub mod improvement;
pub mod policy_iteration;
pub mod value_iteration;

use crate::{
    bellman::{ActionCheck, Bellman},
    error::*,
    model::Mdp,
    values::UpdateMode,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Knobs shared by every loop of a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Sweeping stops once `max |dV|` falls below this.
    pub theta: f64,
    /// Safety cap on sweeps of one evaluation or of value iteration.
    pub max_sweeps: usize,
    /// Safety cap on evaluate/improve rounds of policy iteration.
    pub max_iterations: usize,
    pub mode: UpdateMode,
    /// Actions whose value lies this close to the best count as tied.
    pub tie_tolerance: f64,
    pub check: ActionCheck,
    /// Raised from elsewhere to stop a solve at the next sweep.
    #[serde(skip)]
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theta: 1e-3,
            max_sweeps: 100_000,
            max_iterations: 100,
            mode: UpdateMode::default(),
            tie_tolerance: 1e-9,
            check: ActionCheck::default(),
            cancel: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(self.theta.is_finite() && self.theta > 0.) {
            return Err(Error::InvalidArgument(format!(
                "theta {} must be a positive number",
                self.theta
            )));
        }
        if self.max_sweeps == 0 || self.max_iterations == 0 {
            return Err(Error::InvalidArgument(
                "sweep and iteration caps must be positive".to_string(),
            ));
        }
        if !(self.tie_tolerance.is_finite() && self.tie_tolerance >= 0.) {
            return Err(Error::InvalidArgument(format!(
                "tie tolerance {} must be a non-negative number",
                self.tie_tolerance
            )));
        }
        Ok(())
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_tie_tolerance(mut self, tie_tolerance: f64) -> Self {
        self.tie_tolerance = tie_tolerance;
        self
    }

    pub fn with_check(mut self, check: ActionCheck) -> Self {
        self.check = check;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn bellman(&self) -> Bellman {
        Bellman::new(self.check)
    }

    pub fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Sweeps run by one evaluation and the `max |dV|` of each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Convergence {
    pub sweeps: usize,
    pub deltas: Vec<f64>,
}

impl Convergence {
    pub(crate) fn record(&mut self, delta: f64) {
        self.sweeps += 1;
        self.deltas.push(delta);
    }

    pub fn last_delta(&self) -> f64 {
        self.deltas.last().copied().unwrap_or(f64::INFINITY)
    }
}

/// Summary of a finished solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Report {
    /// Outer iterations: improvement rounds for policy iteration, sweeps for
    /// value iteration.
    pub iterations: usize,
    /// Sweeps over the state space, all evaluations included.
    pub sweeps: usize,
    /// `max |dV|` of the last sweep.
    pub delta: f64,
}

pub trait MdpSolver<M: Mdp> {
    fn v_star(&self, s: &M::State) -> Result<f64>;

    fn q_star(&self, s: &M::State, a: &M::Action) -> Result<f64>;

    /// `None` for states that admit no action.
    fn pi_star(&self, s: &M::State) -> Result<Option<M::Action>>;

    fn exec(&mut self) -> Result<Report>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Settings::default().with_theta(0.))]
    #[case(Settings::default().with_theta(f64::NAN))]
    #[case(Settings::default().with_max_sweeps(0))]
    #[case(Settings::default().with_max_iterations(0))]
    #[case(Settings::default().with_tie_tolerance(-1.))]
    fn malformed_settings_are_rejected(#[case] settings: Settings) {
        assert!(matches!(settings.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn settings_read_from_partial_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"theta": 1e-6, "mode": "in-place", "check": "clamp"}"#).unwrap();

        assert_eq!(settings.theta, 1e-6);
        assert_eq!(settings.mode, UpdateMode::InPlace);
        assert_eq!(settings.check, ActionCheck::Clamp);
        assert_eq!(settings.max_sweeps, 100_000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let settings = Settings::default().with_cancel(Arc::clone(&flag));

        assert!(!settings.cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(settings.cancelled());
    }

    #[test]
    fn empty_convergence_has_no_delta() {
        assert_eq!(Convergence::default().last_delta(), f64::INFINITY);
    }
}
