//! Per-model calibration of normalized model output
//!
//! Raw model output is stored standardized; each (model, variable) pair has a
//! `(mean, scale)` used to recover physical units with
//! `output = input * scale + mean`.
//!
//! The built-in table is an immutable process-wide value constructed on first
//! use. A replacement table can be loaded from JSON and injected through
//! [`crate::convert::ConvertOptions`].

use crate::errors::{NcConformError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// Affine de-normalization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub mean: f64,
    pub scale: f64,
}

impl CalibrationPair {
    /// The transform that leaves values unchanged
    pub const IDENTITY: Self = Self {
        mean: 0.0,
        scale: 1.0,
    };

    pub const fn new(mean: f64, scale: f64) -> Self {
        Self { mean, scale }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.mean
    }
}

/// What a lookup does when the table has no entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Missing entries are an error
    #[default]
    Strict,
    /// Missing entries fall back to [`CalibrationPair::IDENTITY`]
    IdentityDefault,
}

/// Mapping of calibration key -> variable short name -> (mean, scale)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationTable {
    entries: BTreeMap<String, BTreeMap<String, CalibrationPair>>,
}

/// (key, pr mean, pr scale, tasmax mean, tasmax scale)
const BUILTIN_ENTRIES: [(&str, f64, f64, f64, f64); 6] = [
    ("A1", 3.0094404220581055, 7.059685707092285, 287.3564147949219, 8.284003257751465),
    ("A2", 3.023773670196533, 7.377854824066162, 289.5425720214844, 8.576455116271973),
    ("S1", 3.1895868716998854, 9.934561096786277, 295.9818420410156, 6.739269256591797),
    ("S2", 3.197072799236965, 11.157043537049379, 298.7344055175781, 7.496180534362793),
    ("N1", 3.3502800487977384, 8.695985226126469, 287.85821533203125, 3.914102077484131),
    ("N2", 3.4224649266576477, 9.727775223067006, 289.825439453125, 4.607882022857666),
];

impl CalibrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the crate, built once per process
    pub fn builtin() -> &'static CalibrationTable {
        static BUILTIN: OnceLock<CalibrationTable> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut table = CalibrationTable::new();
            for (key, pr_mean, pr_scale, tas_mean, tas_scale) in BUILTIN_ENTRIES {
                table.insert(key, "pr", CalibrationPair::new(pr_mean, pr_scale));
                table.insert(key, "tasmax", CalibrationPair::new(tas_mean, tas_scale));
            }
            table
        })
    }

    /// Parse a table from JSON of the form `{"A1": {"pr": {"mean": .., "scale": ..}}}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, key: impl Into<String>, var: impl Into<String>, pair: CalibrationPair) {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(var.into(), pair);
    }

    pub fn get(&self, key: &str, var: &str) -> Option<CalibrationPair> {
        self.entries.get(key)?.get(var).copied()
    }

    /// Calibration keys present in the table
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up the pair for `(key, var)`, applying `policy` when it is missing
    pub fn lookup(&self, key: &str, var: &str, policy: LookupPolicy) -> Result<CalibrationPair> {
        match (self.get(key, var), policy) {
            (Some(pair), _) => Ok(pair),
            (None, LookupPolicy::IdentityDefault) => {
                warn!(key, var, "no calibration entry, using identity transform");
                Ok(CalibrationPair::IDENTITY)
            }
            (None, LookupPolicy::Strict) => Err(NcConformError::CalibrationNotFound {
                key: key.to_string(),
                var: var.to_string(),
            }),
        }
    }
}
