use mdp::{Result, TabularMdp, Transition, Transitions};

/// Three positions: the tee (0), the fairway (1) and the cup (2). From the tee
/// one can only drive; from the fairway one can chip back or putt for 10.
///
/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
pub fn simple_golf(gamma: f64) -> Result<TabularMdp<u8, u8>> {
    let t = |next_state: u8, probability: f64, reward: f64| Transition {
        next_state,
        probability,
        reward,
    };
    let transitions = Transitions::from([
        ((0, 0), vec![t(1, 0.9, 0.), t(0, 0.1, 0.)]),
        ((1, 1), vec![t(0, 0.9, 0.), t(1, 0.1, 0.)]),
        ((1, 2), vec![t(2, 0.9, 10.), t(1, 0.1, 0.)]),
    ]);

    TabularMdp::new(vec![0, 1, 2], transitions, gamma)
}
