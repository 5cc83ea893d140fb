//! Error types for the dynamic-programming engine.

use std::fmt::{self, Debug};
use thiserror::Error;

/// The loop that gave up or was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Evaluation,
    PolicyIteration,
    ValueIteration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Evaluation => write!(f, "policy evaluation"),
            Stage::PolicyIteration => write!(f, "policy iteration"),
            Stage::ValueIteration => write!(f, "value iteration"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("action {action} is infeasible in state {state}")]
    InfeasibleAction { state: String, action: String },

    /// `residual` is the last max |dV| for sweeping loops and the number of
    /// states whose action still changed for policy iteration.
    #[error("{stage} did not converge within {steps} steps (residual {residual:e})")]
    NotConverged {
        stage: Stage,
        steps: usize,
        residual: f64,
    },

    #[error("transition probabilities of state {state} under {action} sum to {total}")]
    ModelInconsistency {
        state: String,
        action: String,
        total: f64,
    },

    #[error("{stage} cancelled after {steps} steps")]
    Cancelled { stage: Stage, steps: usize },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn infeasible<S: Debug, A: Debug>(s: &S, a: &A) -> Self {
        Error::InfeasibleAction {
            state: format!("{s:?}"),
            action: format!("{a:?}"),
        }
    }

    pub fn inconsistent<S: Debug, A: Debug>(s: &S, a: &A, total: f64) -> Self {
        Error::ModelInconsistency {
            state: format!("{s:?}"),
            action: format!("{a:?}"),
            total,
        }
    }

    pub fn is_not_converged(&self) -> bool {
        matches!(self, Error::NotConverged { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
