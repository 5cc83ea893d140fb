use crate::error::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A table flattened row-major over the natural shape of its state space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub shape: Vec<usize>,
    pub values: Vec<T>,
}

impl<T> Snapshot<T> {
    pub fn new(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        let cells = shape.iter().product::<usize>();
        if cells != values.len() {
            return Err(Error::InvalidArgument(format!(
                "shape {shape:?} holds {cells} cells, got {} values",
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Serialize> Snapshot<T> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?).map_err(|source| Error::Io {
            operation: format!("write {}", path.display()),
            source,
        })
    }
}

impl<T: DeserializeOwned> Snapshot<T> {
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        Self::new(snapshot.shape, snapshot.values)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read {}", path.display()),
            source,
        })?;
        Self::from_json(&json)
    }
}
