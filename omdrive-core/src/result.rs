//! Parsed simulation results.

use std::path::PathBuf;

use linked_hash_map::LinkedHashMap;

use crate::error::{Error, Result};
use crate::util;
use crate::{Float, TIME_SIGNAL};

/// Named value series read back from a result file.
///
/// Signals keep the order the engine listed them in. The time axis is a
/// signal like any other, under the name the engine gives it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimResults {
    /// Model the results belong to
    pub model: String,
    /// Result file the values were read from
    pub file: PathBuf,
    signals: LinkedHashMap<String, Vec<Float>>,
}

impl SimResults {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(model: S, file: P) -> Self {
        Self {
            model: model.into(),
            file: file.into(),
            signals: LinkedHashMap::new(),
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, values: Vec<Float>) {
        self.signals.insert(name.into(), values);
    }

    /// Signal names in engine order.
    pub fn names(&self) -> Vec<&str> {
        self.signals.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Values of a single named signal.
    ///
    /// On a miss the error carries the closest known name, when there is
    /// one close enough.
    pub fn signal(&self, name: &str) -> Result<&[Float]> {
        if let Some(values) = self.signals.get(name) {
            return Ok(values);
        }
        let names = self.names();
        match util::get_similar(name, &names) {
            Some(similar) => Err(Error::NoSuchSignal(format!(
                "{} (did you mean: {}?)",
                name, similar
            ))),
            None => Err(Error::NoSuchSignal(name.to_string())),
        }
    }

    /// The time axis.
    pub fn time(&self) -> Result<&[Float]> {
        self.signal(TIME_SIGNAL)
    }

    /// Final value of a named signal.
    pub fn last(&self, name: &str) -> Result<Float> {
        let values = self.signal(name)?;
        values
            .last()
            .copied()
            .ok_or_else(|| Error::Other(format!("signal holds no values: {}", name)))
    }
}
