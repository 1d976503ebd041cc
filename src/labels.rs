use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Name returned for indices missing from a sparse label mapping.
pub const UNKNOWN_CLASS: &str = "Unknown class";

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("class index {index} is out of range for {len} labels")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum LabelLoadError {
    #[error("could not read label file: {0}")]
    Io(#[from] std::io::Error),
    #[error("label file must be a JSON array of strings or an object of index -> name: {0}")]
    Json(#[from] serde_json::Error),
    #[error("label key {0:?} is not a class index")]
    InvalidKey(String),
    #[error("label file contains no labels")]
    Empty,
}

/// Maps a classifier output index to a human-readable class name.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelSet {
    /// Positional names, `labels[i]` is class `i`.
    Sequence(Vec<String>),
    /// Index -> name, indices without an entry resolve to [`UNKNOWN_CLASS`].
    Sparse(HashMap<usize, String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabels {
    Sequence(Vec<String>),
    Sparse(HashMap<String, String>),
}

impl LabelSet {
    pub fn resolve(&self, index: usize) -> Result<&str, LabelError> {
        match self {
            LabelSet::Sequence(labels) => labels
                .get(index)
                .map(String::as_str)
                .ok_or(LabelError::IndexOutOfRange {
                    index,
                    len: labels.len(),
                }),
            LabelSet::Sparse(labels) => Ok(labels
                .get(&index)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_CLASS)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LabelSet::Sequence(labels) => labels.len(),
            LabelSet::Sparse(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json(json: &str) -> Result<Self, LabelLoadError> {
        let raw: RawLabels = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelLoadError> {
        let reader = BufReader::new(File::open(path)?);
        let raw: RawLabels = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawLabels) -> Result<Self, LabelLoadError> {
        let labels = match raw {
            RawLabels::Sequence(labels) => Ok(LabelSet::Sequence(labels)),
            RawLabels::Sparse(entries) => entries
                .into_iter()
                .map(|(key, name)| {
                    key.trim()
                        .parse::<usize>()
                        .map(|index| (index, name))
                        .map_err(|_| LabelLoadError::InvalidKey(key))
                })
                .collect::<Result<HashMap<_, _>, _>>()
                .map(LabelSet::Sparse),
        }?;
        if labels.is_empty() {
            return Err(LabelLoadError::Empty);
        }
        Ok(labels)
    }
}
