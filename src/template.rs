//! Template resolution: from a model code to a domain and calibration key
//!
//! The first character of a model code selects the geographic domain, which
//! in turn selects the template files the output grid is harmonized against.
//! A trailing non-digit marker (the "observed" variant, e.g. `S2o`) is
//! stripped to obtain the calibration key but plays no part in the domain.

use crate::errors::{NcConformError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the template files
pub const DEFAULT_TEMPLATES_DIR: &str = "./templates";

/// Geographic domain of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Alps,
    SouthAfrica,
    NewZealand,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Alps, Domain::SouthAfrica, Domain::NewZealand];

    /// Domain code used in template file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alps => "ALPS",
            Self::SouthAfrica => "SA",
            Self::NewZealand => "NZ",
        }
    }

    /// Model-code prefix that selects this domain
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Alps => 'A',
            Self::SouthAfrica => 'S',
            Self::NewZealand => 'N',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.prefix() == prefix)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical variables produced by the conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalVariable {
    Precipitation,
    MaxTemperature,
}

impl PhysicalVariable {
    pub const ALL: [PhysicalVariable; 2] = [
        PhysicalVariable::Precipitation,
        PhysicalVariable::MaxTemperature,
    ];

    /// Canonical short name, used for the output variable, the template file
    /// and the calibration table
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Precipitation => "pr",
            Self::MaxTemperature => "tasmax",
        }
    }

    /// Name of the variable in the source prediction group
    #[must_use]
    pub const fn default_source_name(self) -> &'static str {
        match self {
            Self::Precipitation => "precipitation",
            Self::MaxTemperature => "max_surface_temperature",
        }
    }
}

/// Result of resolving a model code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTarget {
    pub model: String,
    pub domain: Domain,
    pub calibration_key: String,
}

/// Resolve a model code such as `"A1"` or `"S2o"` to its domain and calibration key.
pub fn resolve(model_code: &str) -> Result<ModelTarget> {
    let first = model_code
        .chars()
        .next()
        .ok_or_else(|| NcConformError::InvalidModelCode(model_code.to_string()))?;

    let domain = Domain::from_prefix(first).ok_or_else(|| NcConformError::UnknownDomain {
        model: model_code.to_string(),
        prefix: first,
    })?;

    Ok(ModelTarget {
        model: model_code.to_string(),
        domain,
        calibration_key: calibration_key(model_code).to_string(),
    })
}

/// Strip a single trailing non-digit marker, keeping at least the domain prefix.
pub fn calibration_key(model_code: &str) -> &str {
    match model_code.char_indices().last() {
        Some((index, last)) if index > 0 && !last.is_ascii_digit() => &model_code[..index],
        _ => model_code,
    }
}

/// Locations of the template files of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    dir: PathBuf,
    domain: Domain,
}

impl TemplatePaths {
    pub fn new(dir: impl AsRef<Path>, domain: Domain) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            domain,
        }
    }

    /// `{dir}/{pr|tasmax}_{DOMAIN}.nc`
    pub fn path(&self, var: PhysicalVariable) -> PathBuf {
        self.dir
            .join(format!("{}_{}.nc", var.short_name(), self.domain.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_domains_from_prefix() {
        assert_eq!(resolve("A3").unwrap().domain, Domain::Alps);
        assert_eq!(resolve("S9").unwrap().domain, Domain::SouthAfrica);
        assert_eq!(resolve("N1").unwrap().domain, Domain::NewZealand);
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        match resolve("Q1") {
            Err(NcConformError::UnknownDomain { model, prefix }) => {
                assert_eq!(model, "Q1");
                assert_eq!(prefix, 'Q');
            }
            other => panic!("expected UnknownDomain, got {other:?}"),
        }
        assert!(matches!(resolve(""), Err(NcConformError::InvalidModelCode(_))));
    }

    #[test]
    fn observed_marker_is_stripped_from_key_only() {
        let observed = resolve("S2o").unwrap();
        let plain = resolve("S2").unwrap();
        assert_eq!(observed.calibration_key, "S2");
        assert_eq!(observed.calibration_key, plain.calibration_key);
        assert_eq!(observed.domain, plain.domain);
        assert_eq!(observed.model, "S2o");

        // Only one marker character goes, and a bare prefix is kept
        assert_eq!(calibration_key("A1oo"), "A1o");
        assert_eq!(calibration_key("N"), "N");
    }

    #[test]
    fn template_paths_follow_naming_convention() {
        let paths = TemplatePaths::new("./templates", Domain::SouthAfrica);
        assert_eq!(
            paths.path(PhysicalVariable::Precipitation),
            PathBuf::from("./templates/pr_SA.nc")
        );
        assert_eq!(
            paths.path(PhysicalVariable::MaxTemperature),
            PathBuf::from("./templates/tasmax_SA.nc")
        );
    }
}
