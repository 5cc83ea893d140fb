//! Exact dynamic programming over finite Markov Decision Processes.
//!
//! Environments describe themselves through the [`Mdp`] trait. The engine
//! keeps a [`ValueTable`] and a [`DeterministicPolicy`] per solve and drives
//! them with policy evaluation, policy improvement, policy iteration or value
//! iteration.

pub mod bellman;
pub mod error;
pub mod index;
pub mod inventory;
pub mod model;
pub mod poisson;
pub mod policy;
pub mod snapshot;
pub mod solvers;
pub mod values;

pub use bellman::{ActionCheck, Bellman, Greedy};
pub use error::{Error, Result, Stage};
pub use index::StateIndex;
pub use inventory::{InventoryModel, InventoryModels, InventorySpec};
pub use model::{check_discount, Mdp, TabularMdp, Transition, Transitions, PROBABILITY_TOLERANCE};
pub use poisson::{PmfKey, PoissonCache};
pub use policy::{DeterministicPolicy, Policy, StochasticPolicy};
pub use snapshot::Snapshot;
pub use solvers::{
    evaluation::Evaluation,
    improvement::{greedy, improve},
    policy_iteration::PolicyIteration,
    value_iteration::ValueIteration,
    Convergence, MdpSolver, Report, Settings,
};
pub use values::{UpdateMode, ValueTable};
