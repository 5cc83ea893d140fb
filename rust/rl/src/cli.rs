use std::fmt::Display;
use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mdp::{
    greedy, DeterministicPolicy, Evaluation, Mdp, MdpSolver, PolicyIteration, Report, Settings,
    Snapshot, StateIndex, StochasticPolicy, UpdateMode, ValueIteration, ValueTable,
};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::envs::{car_rental::CarRental, gambler::Gambler, gridworld::GridWorld, Exercise};
use crate::render;

/// Solve the chapter 4 exercises of Sutton & Barto by dynamic programming.
#[derive(Parser, Debug)]
#[command(name = "rl", about = "Solve finite MDPs by dynamic programming")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "rl.toml")]
    pub config: PathBuf,

    /// Log every sweep
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write the value table and policy to this JSON file
    #[arg(long, global = true)]
    pub export: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Jack's car rental
    CarRental(SolveArgs),
    /// Gridworld with absorbing corners
    Gridworld(GridworldArgs),
    /// Gambler's problem
    Gambler(SolveArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Policy iteration
    Policy,
    /// Value iteration
    Value,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    #[arg(long, value_enum, default_value_t = Method::Policy)]
    pub method: Method,

    /// Sweep in place instead of into a second table
    #[arg(long)]
    pub in_place: bool,

    /// Override the convergence threshold
    #[arg(long)]
    pub theta: Option<f64>,
}

impl SolveArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if self.in_place {
            settings.mode = UpdateMode::InPlace;
        }
        if let Some(theta) = self.theta {
            settings.theta = theta;
        }
    }
}

#[derive(Args, Debug)]
pub struct GridworldArgs {
    #[command(flatten)]
    pub solve: SolveArgs,

    /// Only evaluate the uniform random policy for this many sweeps
    #[arg(long)]
    pub sweeps: Option<usize>,
}

/// Values and policy of a finished run.
#[derive(Debug, Clone)]
pub struct Solution<S, A> {
    pub values: ValueTable<S>,
    pub policy: DeterministicPolicy<S, A>,
    pub report: Report,
}

#[derive(Debug, Serialize)]
pub struct Export<A> {
    pub environment: &'static str,
    pub iterations: usize,
    pub sweeps: usize,
    pub delta: f64,
    pub values: Snapshot<f64>,
    pub policy: Snapshot<Option<A>>,
}

pub fn solve<M: Exercise>(
    mdp: Rc<M>,
    method: Method,
    settings: Settings,
) -> mdp::Result<Solution<M::State, M::Action>> {
    match method {
        Method::Policy => {
            let start = mdp.initial_policy(&settings)?;
            let mut solver = PolicyIteration::new(mdp, settings)?;
            if let Some(policy) = start {
                solver = solver.with_policy(&policy)?;
            }
            let report = solver.exec()?;
            Ok(Solution {
                values: solver.values().clone(),
                policy: solver.policy().clone(),
                report,
            })
        }
        Method::Value => {
            let mut solver = ValueIteration::new(mdp, settings)?;
            let report = solver.exec()?;
            Ok(Solution {
                values: solver.values().clone(),
                policy: solver.policy()?,
                report,
            })
        }
    }
}

/// `sweeps` sweeps of the uniform random policy from zero, with the greedy
/// policy of the resulting table.
pub fn evaluate_uniform<M: Mdp>(
    mdp: &M,
    settings: &Settings,
    sweeps: usize,
) -> mdp::Result<Solution<M::State, M::Action>> {
    let index = StateIndex::of(mdp)?;
    let random = StochasticPolicy::uniform(mdp, Rc::clone(&index))?;
    let mut values = ValueTable::for_mdp(mdp, index);

    let convergence = Evaluation::new(mdp, &random, settings).run_sweeps(&mut values, sweeps)?;
    let policy = greedy(mdp, &values, settings)?;
    Ok(Solution {
        values,
        policy,
        report: Report {
            iterations: 0,
            sweeps: convergence.sweeps,
            delta: convergence.last_delta(),
        },
    })
}

impl<S, A> Solution<S, A>
where
    S: Copy + Eq + std::hash::Hash + std::fmt::Debug,
    A: Copy + Eq + std::fmt::Debug,
{
    pub fn export(&self, environment: &'static str, shape: &[usize]) -> mdp::Result<Export<A>> {
        Ok(Export {
            environment,
            iterations: self.report.iterations,
            sweeps: self.report.sweeps,
            delta: self.report.delta,
            values: self.values.snapshot(shape)?,
            policy: self.policy.snapshot(shape)?,
        })
    }

    pub fn render(&self, environment: &str, shape: &[usize]) -> mdp::Result<String>
    where
        A: Display,
    {
        Ok(format!(
            "{environment}: {} iterations, {} sweeps, last delta {:.3e}\n\nvalues\n{}\n\npolicy\n{}",
            self.report.iterations,
            self.report.sweeps,
            self.report.delta,
            render::values(shape, self.values.values())?,
            render::policy(shape, self.policy.actions())?,
        ))
    }
}

/// Loads the configuration, runs the chosen command and returns what to print.
pub fn run(cli: &Cli) -> Result<String> {
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match &cli.command {
        Command::CarRental(args) => {
            args.apply(&mut config.solver);
            config.validate()?;
            let rental = Rc::new(CarRental::new(config.car_rental)?);
            let solution = solve(Rc::clone(&rental), args.method, config.solver)?;
            finish(cli, &*rental, &solution)
        }
        Command::Gridworld(args) => {
            args.solve.apply(&mut config.solver);
            config.validate()?;
            let grid = Rc::new(GridWorld::new(config.gridworld)?);
            let solution = match args.sweeps {
                Some(k) => evaluate_uniform(&*grid, &config.solver, k)?,
                None => solve(Rc::clone(&grid), args.solve.method, config.solver)?,
            };
            finish(cli, &*grid, &solution)
        }
        Command::Gambler(args) => {
            args.apply(&mut config.solver);
            config.validate()?;
            let gambler = Rc::new(Gambler::new(config.gambler)?);
            let solution = solve(Rc::clone(&gambler), args.method, config.solver)?;
            finish(cli, &*gambler, &solution)
        }
    }
}

fn finish<M>(cli: &Cli, mdp: &M, solution: &Solution<M::State, M::Action>) -> Result<String>
where
    M: Exercise,
    M::Action: Display + Serialize,
{
    let shape = mdp.shape();
    if let Some(path) = &cli.export {
        let export = solution.export(M::NAME, &shape)?;
        let file = File::create(path)
            .with_context(|| format!("creating export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &export)
            .with_context(|| format!("writing export file {}", path.display()))?;
        info!(path = %path.display(), "exported value table and policy");
    }
    Ok(solution.render(M::NAME, &shape)?)
}
