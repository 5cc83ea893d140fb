use super::Settings;
use crate::{error::*, model::Mdp, policy::DeterministicPolicy, values::ValueTable};
use std::rc::Rc;

/// One greedy improvement step against a fixed value table.
///
/// Every state is scanned before any action is replaced. A state keeps its
/// current action while that action is among the tied maximisers, otherwise
/// it takes the smallest of them. Returns the number of states whose action
/// changed; zero means the policy is stable.
pub fn improve<M: Mdp>(
    mdp: &M,
    values: &ValueTable<M::State>,
    policy: &mut DeterministicPolicy<M::State, M::Action>,
    settings: &Settings,
) -> Result<usize> {
    let bellman = settings.bellman();
    let next = policy
        .iter()
        .map(|(s, current)| {
            if mdp.is_terminal(&s) {
                return Ok(current);
            }
            let greedy = bellman.optimality(mdp, values, &s, settings.tie_tolerance)?;
            Ok(match current {
                Some(a) if greedy.ties.contains(&a) => Some(a),
                _ => greedy.best(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    policy.replace(next)
}

/// The argmax policy of `values`, smallest action on ties.
pub fn greedy<M: Mdp>(
    mdp: &M,
    values: &ValueTable<M::State>,
    settings: &Settings,
) -> Result<DeterministicPolicy<M::State, M::Action>> {
    let bellman = settings.bellman();
    let actions = values
        .index()
        .states()
        .iter()
        .map(|s| Ok(bellman.optimality(mdp, values, s, settings.tie_tolerance)?.best()))
        .collect::<Result<Vec<_>>>()?;

    DeterministicPolicy::from_actions(Rc::clone(values.index()), actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::StateIndex,
        model::{TabularMdp, Transition, Transitions},
    };

    fn to(next_state: u8, reward: f64) -> Vec<Transition<u8>> {
        vec![Transition {
            next_state,
            probability: 1.,
            reward,
        }]
    }

    /// From 0, actions 1 and 2 both reach the terminal state 1 paying 1;
    /// action 0 stays put for nothing.
    fn fork() -> TabularMdp<u8, u8> {
        let transitions = Transitions::from([
            ((0, 0), to(0, 0.)),
            ((0, 1), to(1, 1.)),
            ((0, 2), to(1, 1.)),
        ]);
        TabularMdp::new(vec![0, 1], transitions, 0.9).unwrap()
    }

    #[test]
    fn incumbent_survives_a_tie() {
        let mdp = fork();
        let index = StateIndex::of(&mdp).unwrap();
        let values = ValueTable::for_mdp(&mdp, Rc::clone(&index));
        let mut policy = DeterministicPolicy::from_actions(index, vec![Some(2), None]).unwrap();

        let changed = improve(&mdp, &values, &mut policy, &Settings::default()).unwrap();

        assert_eq!(changed, 0);
        assert_eq!(policy.action(&0).unwrap(), Some(2));
    }

    #[test]
    fn losing_incumbent_gives_way_to_the_smallest_maximiser() {
        let mdp = fork();
        let index = StateIndex::of(&mdp).unwrap();
        let values = ValueTable::for_mdp(&mdp, Rc::clone(&index));
        let mut policy = DeterministicPolicy::first_action(&mdp, index);
        let settings = Settings::default();

        assert_eq!(improve(&mdp, &values, &mut policy, &settings).unwrap(), 1);
        assert_eq!(policy.action(&0).unwrap(), Some(1));
        assert_eq!(policy.action(&1).unwrap(), None);

        // A second pass against the same table is a no-op.
        let before = policy.clone();
        assert_eq!(improve(&mdp, &values, &mut policy, &settings).unwrap(), 0);
        assert_eq!(policy.actions(), before.actions());
    }

    #[test]
    fn greedy_breaks_ties_towards_the_smallest_action() {
        let mdp = fork();
        let values = ValueTable::for_mdp(&mdp, StateIndex::of(&mdp).unwrap());
        let policy = greedy(&mdp, &values, &Settings::default()).unwrap();

        assert_eq!(policy.actions(), &[Some(1), None]);
    }
}
