//! Defines command-line interface options using `clap` for the nc_conform binaries.

use crate::calibration::LookupPolicy;
use crate::convert::{ConvertOptions, EnsembleSelection};
use crate::template::{PhysicalVariable, DEFAULT_TEMPLATES_DIR};
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use std::path::PathBuf;

/// Convert ensemble model output to a domain's template grid
#[derive(Parser, Debug)]
#[command(
    name = "nc-conform",
    version,
    about = "Rescale model output to physical units on the template grid of its domain"
)]
pub struct ConvertArgs {
    /// Model code, e.g. A1 or S2o; the first letter selects the domain
    pub model: String,

    /// Source NetCDF file with a `prediction` group
    pub src: PathBuf,

    /// Output NetCDF file, overwritten if it exists
    pub out: PathBuf,

    /// Directory holding pr_{DOMAIN}.nc and tasmax_{DOMAIN}.nc
    #[arg(long, default_value = DEFAULT_TEMPLATES_DIR)]
    pub templates_dir: PathBuf,

    /// JSON calibration table replacing the built-in one
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Use mean 0, scale 1 for models missing from the calibration table
    #[arg(long, default_value_t = false)]
    pub identity_fallback: bool,

    /// Keep only the first N ensemble members (N >= 1)
    #[arg(long, value_name = "N", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub ensemble_limit: Option<usize>,

    /// Name of the precipitation variable in the source
    #[arg(long, default_value = PhysicalVariable::Precipitation.default_source_name())]
    pub pr_name: String,

    /// Name of the maximum temperature variable in the source
    #[arg(long, default_value = PhysicalVariable::MaxTemperature.default_source_name())]
    pub tasmax_name: String,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ConvertArgs {
    /// Conversion options without the calibration table, which is loaded separately
    pub fn options(&self) -> ConvertOptions {
        let policy = if self.identity_fallback {
            LookupPolicy::IdentityDefault
        } else {
            LookupPolicy::Strict
        };
        let ensemble = match self.ensemble_limit {
            Some(n) => EnsembleSelection::First(n),
            None => EnsembleSelection::All,
        };

        ConvertOptions::default()
            .with_templates_dir(&self.templates_dir)
            .with_lookup_policy(policy)
            .with_ensemble(ensemble)
            .with_source_names(&self.pr_name, &self.tasmax_name)
    }
}

/// Print the schema of a NetCDF file, all groups included
#[derive(Parser, Debug)]
#[command(name = "nc-schema", version)]
pub struct SchemaArgs {
    /// Input NetCDF file
    pub nc: PathBuf,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Add the time coordinate of one file to another
#[derive(Parser, Debug)]
#[command(name = "add-time-coords", version)]
pub struct TimeCopyArgs {
    /// NetCDF file with time coordinate
    pub with_time: PathBuf,

    /// NetCDF file without time coordinate
    pub without_time: PathBuf,

    /// Output NetCDF file
    pub out: PathBuf,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
