//! Small gridworld - Sutton & Barto 2018, example 4.1.

use super::Exercise;
use crate::error::ConfigError;
use itertools::iproduct;
use mdp::{
    check_discount, greedy, DeterministicPolicy, Error, Evaluation, Mdp, Result, Settings,
    StateIndex, StochasticPolicy, Transition, ValueTable,
};
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row and column, row 0 at the top.
pub type Cell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Move {
    North,
    South,
    West,
    East,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::North, Move::South, Move::West, Move::East];

    fn delta(self) -> (isize, isize) {
        match self {
            Move::North => (-1, 0),
            Move::South => (1, 0),
            Move::West => (0, -1),
            Move::East => (0, 1),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self {
            Move::North => "↑",
            Move::South => "↓",
            Move::West => "←",
            Move::East => "→",
        };
        f.pad(arrow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridWorldConfig {
    pub size: usize,
    pub cell_reward: f64,
    pub gamma: f64,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            size: 4,
            cell_reward: -1.,
            gamma: 1.,
        }
    }
}

impl GridWorldConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.size < 2 {
            return Err(ConfigError::Validation("gridworld.size must be >= 2".into()));
        }
        if !self.cell_reward.is_finite() {
            return Err(ConfigError::Validation(
                "gridworld.cell_reward must be finite".into(),
            ));
        }
        if !(0. ..=1.).contains(&self.gamma) {
            return Err(ConfigError::Validation(
                "gridworld.gamma must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Square grid with absorbing top-left and bottom-right corners. Every move
/// out of a non-terminal cell pays `cell_reward`; moves off the grid leave
/// the agent where it was.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridWorldConfig,
}

impl GridWorld {
    pub fn new(config: GridWorldConfig) -> Result<Self> {
        check_discount(config.gamma)?;
        if config.size < 2 {
            return Err(Error::InvalidArgument(format!(
                "a {0}x{0} grid has no room for two corners",
                config.size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    fn contains(&self, s: &Cell) -> bool {
        s.0 < self.config.size && s.1 < self.config.size
    }

    /// Where `m` leads from `s`.
    pub fn step(&self, s: &Cell, m: Move) -> Cell {
        let (dr, dc) = m.delta();
        match (s.0.checked_add_signed(dr), s.1.checked_add_signed(dc)) {
            (Some(r), Some(c)) if self.contains(&(r, c)) => (r, c),
            _ => *s,
        }
    }
}

impl Mdp for GridWorld {
    type State = Cell;
    type Action = Move;

    fn states(&self) -> Vec<Cell> {
        let n = self.config.size;
        iproduct!(0..n, 0..n).collect()
    }

    fn actions(&self, s: &Cell) -> Vec<Move> {
        if self.is_terminal(s) || !self.contains(s) {
            vec![]
        } else {
            Move::ALL.to_vec()
        }
    }

    fn is_feasible(&self, s: &Cell, _a: &Move) -> bool {
        self.contains(s) && !self.is_terminal(s)
    }

    fn transitions(&self, s: &Cell, a: &Move) -> Result<Vec<Transition<Cell>>> {
        if !self.is_feasible(s, a) {
            return Err(Error::infeasible(s, a));
        }
        Ok(vec![Transition {
            next_state: self.step(s, *a),
            probability: 1.,
            reward: self.config.cell_reward,
        }])
    }

    fn is_terminal(&self, s: &Cell) -> bool {
        let last = self.config.size - 1;
        *s == (0, 0) || *s == (last, last)
    }

    fn gamma(&self) -> f64 {
        self.config.gamma
    }
}

impl Exercise for GridWorld {
    const NAME: &'static str = "gridworld";

    fn shape(&self) -> Vec<usize> {
        vec![self.config.size; 2]
    }

    /// Greedy with respect to the random walk. Every greedy step lands on a
    /// cell worth more than the current one, so every cell reaches a corner
    /// even at `gamma = 1`, where walking into a wall would never end.
    fn initial_policy(&self, settings: &Settings) -> Result<Option<DeterministicPolicy<Cell, Move>>> {
        let index = StateIndex::of(self)?;
        let random = StochasticPolicy::uniform(self, Rc::clone(&index))?;
        let mut values = ValueTable::for_mdp(self, index);
        Evaluation::new(self, &random, settings).run(&mut values)?;
        Ok(Some(greedy(self, &values, settings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn grid() -> GridWorld {
        GridWorld::new(GridWorldConfig::default()).unwrap()
    }

    #[rstest]
    #[case((1, 1), Move::North, (0, 1))]
    #[case((1, 1), Move::South, (2, 1))]
    #[case((1, 1), Move::West, (1, 0))]
    #[case((1, 1), Move::East, (1, 2))]
    #[case((0, 2), Move::North, (0, 2))]
    #[case((3, 2), Move::South, (3, 2))]
    #[case((2, 0), Move::West, (2, 0))]
    #[case((1, 3), Move::East, (1, 3))]
    fn moves_off_the_grid_stay_put(#[case] s: Cell, #[case] m: Move, #[case] expected: Cell) {
        assert_eq!(grid().step(&s, m), expected);
    }

    #[test]
    fn corners_are_absorbing() {
        let grid = grid();

        assert!(grid.is_terminal(&(0, 0)));
        assert!(grid.is_terminal(&(3, 3)));
        assert!(!grid.is_terminal(&(0, 3)));
        assert!(grid.actions(&(3, 3)).is_empty());
        assert!(grid.transitions(&(0, 0), &Move::East).is_err());
        assert_eq!(grid.actions(&(1, 2)).len(), 4);
    }

    #[test]
    fn states_enumerate_row_major() {
        let states = grid().states();

        assert_eq!(states.len(), 16);
        assert_eq!(states[1], (0, 1));
        assert_eq!(states[4], (1, 0));
    }

    #[test]
    fn moves_print_as_arrows() {
        assert_eq!(format!("{:>2}", Move::West), " ←");
    }

    #[test]
    fn initial_policy_walks_every_cell_into_a_corner() {
        let grid = GridWorld::new(GridWorldConfig {
            gamma: 1.,
            ..Default::default()
        })
        .unwrap();
        let policy = grid.initial_policy(&Settings::default()).unwrap().unwrap();

        for start in grid.states() {
            let mut s = start;
            let mut steps = 0;
            while let Some(m) = policy.action(&s).unwrap() {
                s = grid.step(&s, m);
                steps += 1;
                assert!(steps <= 16, "{start:?} wanders");
            }
            assert!(grid.is_terminal(&s));
        }
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        let config = GridWorldConfig {
            size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(GridWorld::new(config).is_err());
    }
}
