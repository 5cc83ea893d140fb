//! The chapter 4 exercises of Sutton & Barto as [`mdp::Mdp`] environments,
//! with the configuration, logging and rendering the `rl` binary needs.

pub mod cli;
pub mod config;
pub mod envs;
pub mod error;
pub mod logging;
pub mod render;
