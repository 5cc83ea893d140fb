//! Gambler's problem - Sutton & Barto 2018, example 4.3.

use super::Exercise;
use crate::error::ConfigError;
use mdp::{check_discount, Error, Mdp, Result, Transition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GamblerConfig {
    pub goal: u32,
    pub p_head: f64,
    pub gamma: f64,
}

impl Default for GamblerConfig {
    fn default() -> Self {
        Self {
            goal: 100,
            p_head: 0.4,
            gamma: 1.,
        }
    }
}

impl GamblerConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.goal < 2 {
            return Err(ConfigError::Validation("gambler.goal must be >= 2".into()));
        }
        if !(self.p_head > 0. && self.p_head < 1.) {
            return Err(ConfigError::Validation(
                "gambler.p_head must be in (0, 1)".into(),
            ));
        }
        if !(0. ..=1.).contains(&self.gamma) {
            return Err(ConfigError::Validation(
                "gambler.gamma must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Capital `s` in `0..=goal`; a stake wins itself with probability `p_head`
/// and is lost otherwise. Reaching `goal` is worth 1 and no reward is paid
/// along the way, so `V(s)` is the chance of reaching the goal.
#[derive(Debug, Clone)]
pub struct Gambler {
    config: GamblerConfig,
}

impl Gambler {
    pub fn new(config: GamblerConfig) -> Result<Self> {
        check_discount(config.gamma)?;
        if config.goal < 2 {
            return Err(Error::InvalidArgument(format!(
                "goal {} leaves nothing to bet",
                config.goal
            )));
        }
        if !(config.p_head > 0. && config.p_head < 1.) {
            return Err(Error::InvalidArgument(format!(
                "head probability {} is outside (0, 1)",
                config.p_head
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GamblerConfig {
        &self.config
    }

    pub fn goal(&self) -> u32 {
        self.config.goal
    }
}

impl Mdp for Gambler {
    type State = u32;
    type Action = u32;

    fn states(&self) -> Vec<u32> {
        (0..=self.config.goal).collect()
    }

    fn actions(&self, s: &u32) -> Vec<u32> {
        if self.is_terminal(s) || *s > self.config.goal {
            return vec![];
        }
        (1..=(*s).min(self.config.goal - s)).collect()
    }

    fn is_feasible(&self, s: &u32, a: &u32) -> bool {
        !self.is_terminal(s) && *s < self.config.goal && (1..=(*s).min(self.config.goal - s)).contains(a)
    }

    fn transitions(&self, s: &u32, a: &u32) -> Result<Vec<Transition<u32>>> {
        if !self.is_feasible(s, a) {
            return Err(Error::infeasible(s, a));
        }
        Ok(vec![
            Transition {
                next_state: s + a,
                probability: self.config.p_head,
                reward: 0.,
            },
            Transition {
                next_state: s - a,
                probability: 1. - self.config.p_head,
                reward: 0.,
            },
        ])
    }

    fn is_terminal(&self, s: &u32) -> bool {
        *s == 0 || *s == self.config.goal
    }

    fn terminal_value(&self, s: &u32) -> f64 {
        if *s == self.config.goal {
            1.
        } else {
            0.
        }
    }

    fn gamma(&self) -> f64 {
        self.config.gamma
    }
}

impl Exercise for Gambler {
    const NAME: &'static str = "gambler";

    fn shape(&self) -> Vec<usize> {
        vec![self.config.goal as usize + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gambler() -> Gambler {
        Gambler::new(GamblerConfig::default()).unwrap()
    }

    #[rstest]
    #[case(1, 1)]
    #[case(30, 30)]
    #[case(50, 50)]
    #[case(70, 30)]
    #[case(99, 1)]
    fn stakes_never_overshoot_the_goal(#[case] s: u32, #[case] largest: u32) {
        let stakes = gambler().actions(&s);

        assert_eq!(stakes.first(), Some(&1));
        assert_eq!(stakes.last(), Some(&largest));
    }

    #[test]
    fn ruin_and_goal_are_terminal() {
        let gambler = gambler();

        assert!(gambler.actions(&0).is_empty());
        assert!(gambler.actions(&100).is_empty());
        assert_eq!(gambler.terminal_value(&100), 1.);
        assert_eq!(gambler.terminal_value(&0), 0.);
        assert!(gambler.transitions(&100, &1).is_err());
        assert!(gambler.transitions(&60, &41).is_err());
    }

    #[test]
    fn a_coin_flip_moves_the_stake() {
        let ts = gambler().transitions(&40, &10).unwrap();

        assert_eq!(ts[0].next_state, 50);
        assert_eq!(ts[0].probability, 0.4);
        assert_eq!(ts[1].next_state, 30);
        assert_eq!(ts[1].probability, 0.6);
    }

    #[rstest]
    #[case(GamblerConfig { goal: 1, ..Default::default() })]
    #[case(GamblerConfig { p_head: 0., ..Default::default() })]
    #[case(GamblerConfig { p_head: 1., ..Default::default() })]
    #[case(GamblerConfig { gamma: -0.1, ..Default::default() })]
    fn bad_configs_are_rejected(#[case] config: GamblerConfig) {
        assert!(config.validate().is_err());
        assert!(Gambler::new(config).is_err());
    }
}
