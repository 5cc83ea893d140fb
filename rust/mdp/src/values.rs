use crate::{error::*, index::StateIndex, model::Mdp, snapshot::Snapshot};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// How one sweep writes its new values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    /// Every backup reads the previous sweep's table; the new table replaces
    /// it once the sweep is done. The result does not depend on state order.
    #[default]
    TwoArray,
    /// Backups write straight into the table, so a state sees the values
    /// already written for states before it in enumeration order.
    InPlace,
}

impl UpdateMode {
    /// Runs one sweep over the unpinned states of `table` and returns the
    /// largest absolute change.
    pub fn sweep<S, F>(self, table: &mut ValueTable<S>, mut backup: F) -> Result<f64>
    where
        S: Copy + Eq + Hash + Debug,
        F: FnMut(&S, &ValueTable<S>) -> Result<f64>,
    {
        let index = Rc::clone(&table.index);
        match self {
            UpdateMode::TwoArray => {
                let mut next = std::mem::take(&mut table.scratch);
                next.clear();
                for (i, s) in index.states().iter().enumerate() {
                    let v = if table.pinned[i] {
                        table.values[i]
                    } else {
                        backup(s, &*table)?
                    };
                    next.push(v);
                }
                let delta = max_abs_diff(&next, &table.values);
                table.scratch = std::mem::replace(&mut table.values, next);
                Ok(delta)
            }
            UpdateMode::InPlace => {
                let mut delta = 0f64;
                for (i, s) in index.states().iter().enumerate() {
                    if table.pinned[i] {
                        continue;
                    }
                    let v = backup(s, &*table)?;
                    delta = delta.max((v - table.values[i]).abs());
                    table.values[i] = v;
                }
                Ok(delta)
            }
        }
    }
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0., f64::max)
}

/// State values of one solve. Pinned states keep their value for good.
#[derive(Debug, Clone)]
pub struct ValueTable<S> {
    index: Rc<StateIndex<S>>,
    values: Vec<f64>,
    pinned: Vec<bool>,
    scratch: Vec<f64>,
}

impl<S: Copy + Eq + Hash + Debug> ValueTable<S> {
    pub fn new(index: Rc<StateIndex<S>>) -> Self {
        let n = index.len();
        Self {
            index,
            values: vec![0.; n],
            pinned: vec![false; n],
            scratch: Vec::with_capacity(n),
        }
    }

    /// Zero table with every terminal state of `mdp` pinned to its terminal value.
    pub fn for_mdp<M: Mdp<State = S>>(mdp: &M, index: Rc<StateIndex<S>>) -> Self {
        let mut table = Self::new(index);
        for (i, s) in table.index.states().iter().enumerate() {
            if mdp.is_terminal(s) {
                table.values[i] = mdp.terminal_value(s);
                table.pinned[i] = true;
            }
        }
        table
    }

    pub fn index(&self) -> &Rc<StateIndex<S>> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn pin(&mut self, s: &S, value: f64) -> Result<()> {
        let i = self.index.position(s)?;
        self.values[i] = value;
        self.pinned[i] = true;
        Ok(())
    }

    pub fn is_pinned(&self, s: &S) -> Result<bool> {
        Ok(self.pinned[self.index.position(s)?])
    }

    pub fn get(&self, s: &S) -> Result<f64> {
        Ok(self.values[self.index.position(s)?])
    }

    pub fn set(&mut self, s: &S, value: f64) -> Result<()> {
        let i = self.index.position(s)?;
        if self.pinned[i] {
            return Err(Error::InvalidArgument(format!("state {s:?} is pinned")));
        }
        self.values[i] = value;
        Ok(())
    }

    /// Values in enumeration order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (S, f64)> + '_ {
        self.index
            .states()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn max_abs_diff(&self, other: &Self) -> Result<f64> {
        if self.len() != other.len() {
            return Err(Error::InvalidArgument(format!(
                "tables over {} and {} states",
                self.len(),
                other.len()
            )));
        }
        Ok(max_abs_diff(&self.values, &other.values))
    }

    /// Row-major view over the natural shape of the state space.
    pub fn to_array(&self, shape: &[usize]) -> Result<ArrayD<f64>> {
        ArrayD::from_shape_vec(IxDyn(shape), self.values.clone())
            .map_err(|e| Error::InvalidArgument(format!("shape {shape:?}: {e}")))
    }

    pub fn snapshot(&self, shape: &[usize]) -> Result<Snapshot<f64>> {
        Snapshot::new(shape.to_vec(), self.values.clone())
    }

    /// Loads unpinned values from `snapshot`; pinned states keep theirs.
    pub fn restore(&mut self, snapshot: &Snapshot<f64>) -> Result<()> {
        if snapshot.values.len() != self.len() {
            return Err(Error::InvalidArgument(format!(
                "snapshot holds {} values for {} states",
                snapshot.values.len(),
                self.len()
            )));
        }
        for (i, v) in snapshot.values.iter().enumerate() {
            if !self.pinned[i] {
                self.values[i] = *v;
            }
        }
        Ok(())
    }
}
