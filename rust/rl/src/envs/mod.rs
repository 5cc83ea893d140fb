pub mod car_rental;
pub mod gambler;
pub mod gridworld;
pub mod simple_golf;

use mdp::{DeterministicPolicy, Mdp, Result, Settings};

/// An environment the command line knows how to solve and print.
pub trait Exercise: Mdp {
    const NAME: &'static str;

    /// Natural shape of the state space; `states()` runs over it row-major.
    fn shape(&self) -> Vec<usize>;

    /// Where policy iteration starts. `None` puts every state on its
    /// smallest legal action.
    fn initial_policy(
        &self,
        _settings: &Settings,
    ) -> Result<Option<DeterministicPolicy<Self::State, Self::Action>>> {
        Ok(None)
    }
}
