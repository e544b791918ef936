//! Dataset assembly: the end-to-end conversion of one model output file
//!
//! ```text
//! model code ──resolve──> domain, calibration key
//!                              │
//!        pr_{DOMAIN}.nc, tasmax_{DOMAIN}.nc, source root + prediction group
//!                              │
//!   root ──harmonize(pr)──harmonize(tasmax)──> grid for coordinate attachment
//!   prediction ──select members──rename ensemble→member──normalize pr/tasmax
//!                              │
//!                   prediction group written to the output path
//! ```
//!
//! Every input is loaded whole and released before any transformation runs;
//! the output is produced only after all transforms have succeeded.

use crate::calibration::{CalibrationTable, LookupPolicy};
use crate::dataset::Dataset;
use crate::errors::{NcConformError, Result};
use crate::grid;
use crate::netcdf_io::{read_dataset, NetCDFWriter};
use crate::normalize::{normalize, CoordinateAttachment};
use crate::template::{
    self, Domain, ModelTarget, PhysicalVariable, TemplatePaths, DEFAULT_TEMPLATES_DIR,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the ensemble dimension in source prediction groups
pub const ENSEMBLE_DIM: &str = "ensemble";
/// Name the ensemble dimension takes in the output
pub const MEMBER_DIM: &str = "member";
/// Child group of the source file holding the model output
pub const PREDICTION_GROUP: &str = "prediction";

/// Which ensemble members are carried into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnsembleSelection {
    /// Every member, count preserved
    #[default]
    All,
    /// Only the first `n` members (fewer when the source has fewer)
    First(usize),
}

/// Knobs of a conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub templates_dir: PathBuf,
    /// Replacement for the built-in table
    pub calibration: Option<CalibrationTable>,
    pub lookup_policy: LookupPolicy,
    pub ensemble: EnsembleSelection,
    pub pr_name: String,
    pub tas_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            calibration: None,
            lookup_policy: LookupPolicy::default(),
            ensemble: EnsembleSelection::default(),
            pr_name: PhysicalVariable::Precipitation.default_source_name().to_string(),
            tas_name: PhysicalVariable::MaxTemperature
                .default_source_name()
                .to_string(),
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_calibration(mut self, table: CalibrationTable) -> Self {
        self.calibration = Some(table);
        self
    }

    #[must_use]
    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup_policy = policy;
        self
    }

    #[must_use]
    pub fn with_ensemble(mut self, selection: EnsembleSelection) -> Self {
        self.ensemble = selection;
        self
    }

    #[must_use]
    pub fn with_source_names(
        mut self,
        pr_name: impl Into<String>,
        tas_name: impl Into<String>,
    ) -> Self {
        self.pr_name = pr_name.into();
        self.tas_name = tas_name.into();
        self
    }

    /// The injected table, or the built-in one
    pub fn calibration_table(&self) -> &CalibrationTable {
        self.calibration
            .as_ref()
            .unwrap_or_else(|| CalibrationTable::builtin())
    }

    fn source_name(&self, var: PhysicalVariable) -> &str {
        match var {
            PhysicalVariable::Precipitation => &self.pr_name,
            PhysicalVariable::MaxTemperature => &self.tas_name,
        }
    }
}

/// The template datasets of one domain
#[derive(Debug, Clone)]
pub struct Templates {
    pub pr: Dataset,
    pub tasmax: Dataset,
}

impl Templates {
    /// Load `pr_{DOMAIN}.nc` and `tasmax_{DOMAIN}.nc` from `dir`
    pub fn load(dir: impl AsRef<Path>, domain: Domain) -> Result<Self> {
        let paths = TemplatePaths::new(dir, domain);
        let pr_path = paths.path(PhysicalVariable::Precipitation);
        let tasmax_path = paths.path(PhysicalVariable::MaxTemperature);
        debug!(pr = %pr_path.display(), tasmax = %tasmax_path.display(), "loading templates");

        Ok(Self {
            pr: read_dataset(pr_path)?,
            tasmax: read_dataset(tasmax_path)?,
        })
    }

    pub fn get(&self, var: PhysicalVariable) -> &Dataset {
        match var {
            PhysicalVariable::Precipitation => &self.pr,
            PhysicalVariable::MaxTemperature => &self.tasmax,
        }
    }
}

/// What a conversion did
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub model: String,
    pub domain: Domain,
    pub calibration_key: String,
    /// Size of the member dimension in the output
    pub members: usize,
    /// Coordinate decision per output variable, in output order
    pub attachments: Vec<(String, CoordinateAttachment)>,
}

/// Convert `src` for `model` into `out` with the default options.
pub fn convert(model: &str, src: impl AsRef<Path>, out: impl AsRef<Path>) -> Result<()> {
    convert_with(model, src, out, &ConvertOptions::default()).map(|_| ())
}

/// Convert `src` for `model` into `out`.
///
/// # Errors
///
/// Unknown model prefixes, missing templates, groups or variables, and
/// (under [`LookupPolicy::Strict`]) missing calibration entries all fail
/// before anything is written to `out`.
pub fn convert_with(
    model: &str,
    src: impl AsRef<Path>,
    out: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let target = template::resolve(model)?;
    info!(
        model,
        domain = %target.domain,
        calibration_key = %target.calibration_key,
        "resolved model"
    );

    let templates = Templates::load(&options.templates_dir, target.domain)?;
    let source = read_dataset(src.as_ref())?;

    let (prediction, report) = assemble(&target, &source, &templates, options)?;
    NetCDFWriter::new(out.as_ref()).write(&prediction)?;
    Ok(report)
}

/// Build the output prediction group from already loaded inputs.
pub fn assemble(
    target: &ModelTarget,
    source: &Dataset,
    templates: &Templates,
    options: &ConvertOptions,
) -> Result<(Dataset, ConversionReport)> {
    let mut root = source.without_groups();
    for var in PhysicalVariable::ALL {
        root = grid::harmonize(&root, templates.get(var))?;
    }

    let prediction = source
        .group(PREDICTION_GROUP)
        .ok_or_else(|| NcConformError::GroupNotFound {
            group: PREDICTION_GROUP.to_string(),
        })?;
    let mut out = match options.ensemble {
        EnsembleSelection::All => prediction.clone(),
        EnsembleSelection::First(n) => prediction.take_prefix(ENSEMBLE_DIM, n)?,
    };
    out.rename_dimension(ENSEMBLE_DIM, MEMBER_DIM)?;

    let table = options.calibration_table();
    let mut attachments = Vec::with_capacity(PhysicalVariable::ALL.len());
    for var in PhysicalVariable::ALL {
        let short = var.short_name();
        let src_name = options.source_name(var);
        let template = templates.get(var);

        let source_var = out
            .variable(src_name)
            .ok_or_else(|| NcConformError::VariableNotFound {
                group: out.name.clone(),
                var: src_name.to_string(),
            })?;
        let template_var =
            template
                .variable(short)
                .ok_or_else(|| NcConformError::VariableNotFound {
                    group: format!("{} template", short),
                    var: short.to_string(),
                })?;
        let pair = table.lookup(&target.calibration_key, short, options.lookup_policy)?;

        let normalized = normalize(source_var, short, template_var, &root, pair);
        info!(
            variable = short,
            source = src_name,
            mean = pair.mean,
            scale = pair.scale,
            coordinates = %normalized.attachment,
            "normalized variable"
        );
        attachments.push((short.to_string(), normalized.attachment));
        out.insert_variable(normalized.variable)?;
    }

    // A source name equal to an output name has just been replaced, not dropped
    for var in PhysicalVariable::ALL {
        let src_name = options.source_name(var);
        if PhysicalVariable::ALL
            .iter()
            .all(|v| v.short_name() != src_name)
        {
            out.drop_variable(src_name);
        }
    }

    let members = out.dimension(MEMBER_DIM).map_or(0, |d| d.len);
    let report = ConversionReport {
        model: target.model.clone(),
        domain: target.domain,
        calibration_key: target.calibration_key.clone(),
        members,
        attachments,
    };
    Ok((out, report))
}
