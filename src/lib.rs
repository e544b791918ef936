//! nc_conform: conform ensemble climate-model output to template grids
//!
//! Model runs write NetCDF files with a root group holding the grid and a
//! nested `prediction` group holding standardized ensemble output. This
//! crate turns such a file into one that matches a reference template for
//! the model's geographic domain: the grid variables come from the template,
//! precipitation and maximum temperature are rescaled into physical units
//! with a per-model calibration pair, and the ensemble axis becomes `member`.
//!
//! ## Module Organization
//!
//! - [`template`]: model code to domain and calibration key, template paths
//! - [`calibration`]: per-model `(mean, scale)` table and lookup policy
//! - [`grid`]: replacement of `lat`/`lon`/`x`/`y` with a template's versions
//! - [`normalize`]: rescaling, renaming and coordinate attachment of one variable
//! - [`convert`]: the end-to-end conversion and its options
//! - [`dataset`]: in-memory groups, variables and attributes
//! - [`netcdf_io`]: loading files into [`dataset::Dataset`] and writing them back
//! - [`metadata`]: schema inspection of NetCDF files
//! - [`timecopy`]: copying a time coordinate between files
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nc_conform::prelude::*;
//!
//! let options = ConvertOptions::default()
//!     .with_templates_dir("./templates")
//!     .with_ensemble(EnsembleSelection::First(5));
//! let report = nc_conform::convert::convert_with("A1", "run.nc", "A1_conformed.nc", &options)?;
//! println!("{} members on the {} grid", report.members, report.domain);
//!
//! nc_conform::metadata::print_schema("A1_conformed.nc")?;
//! # Ok::<(), nc_conform::errors::NcConformError>(())
//! ```

// Core modules
pub mod calibration;
pub mod convert;
pub mod dataset;
pub mod errors;
pub mod grid;
pub mod netcdf_io;
pub mod normalize;
pub mod template;

// Collaborators
pub mod metadata;
pub mod timecopy;

// Binary support
pub mod cli;
pub mod logging;

pub use convert::{convert, convert_with};
pub use errors::{NcConformError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::calibration::{CalibrationPair, CalibrationTable, LookupPolicy};
    pub use crate::convert::{ConversionReport, ConvertOptions, EnsembleSelection};
    pub use crate::dataset::{AttributeMap, Dataset, Variable};
    pub use crate::errors::{NcConformError, Result};
    pub use crate::netcdf_io::NetCDFWriter;
    pub use crate::normalize::CoordinateAttachment;
    pub use crate::template::{Domain, PhysicalVariable};
}
