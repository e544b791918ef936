//! Variable normalization: rescale, rename, re-attribute, attach coordinates
//!
//! A source variable is mapped back to physical units with its calibration
//! pair, stored as 32-bit floats under its canonical name and given the
//! template variable's attributes, packing attributes excepted. Spatial
//! coordinates from the harmonized root group are attached when they fit; when they
//! do not, the variable is returned without them and the decision is
//! reported as [`CoordinateAttachment::Skipped`].

use crate::calibration::CalibrationPair;
use crate::dataset::{ArrayData, Dataset, Variable};
use indexmap::IndexMap;
use ndarray::ArrayD;
use std::fmt;

/// CF packing attributes; normalized data is stored unpacked
const PACKING_ATTRIBUTES: [&str; 2] = ["scale_factor", "add_offset"];

/// How spatial coordinates ended up on a normalized variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateAttachment {
    /// `lat`/`lon` dimensions were already a subset of the variable's
    Attached2D,
    /// 1-D `lat`/`lon` were mapped onto the `y`/`x` axes before attaching
    Attached1DRenamed,
    /// No compatible layout; the variable carries no spatial coordinates
    Skipped,
}

impl CoordinateAttachment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attached2D => "attached-2d",
            Self::Attached1DRenamed => "attached-1d-renamed",
            Self::Skipped => "skipped",
        }
    }

    pub const fn is_attached(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl fmt::Display for CoordinateAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized variable together with the coordinate decision taken for it
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub variable: Variable,
    pub attachment: CoordinateAttachment,
}

/// Rescale `source` into physical units and dress it like `template_var`.
///
/// `output = input * scale + mean`, cast to `f32`. The template's
/// `scale_factor`/`add_offset` are not carried over. Source values equal to a
/// `_FillValue`/`missing_value` attribute become NaN, and packed sources
/// (`scale_factor`/`add_offset`) are unpacked first.
pub fn normalize(
    source: &Variable,
    target_name: &str,
    template_var: &Variable,
    root: &Dataset,
    calibration: CalibrationPair,
) -> Normalized {
    let physical = decode(source).mapv(|v| calibration.apply(v) as f32);

    let mut attributes = template_var.attributes.clone();
    for name in PACKING_ATTRIBUTES {
        attributes.remove(name);
    }

    let mut variable = Variable {
        name: target_name.to_string(),
        dims: source.dims.clone(),
        data: ArrayData::F32(physical),
        attributes,
        coords: IndexMap::new(),
    };
    let attachment = attach_spatial_coords(&mut variable, root);

    Normalized {
        variable,
        attachment,
    }
}

/// Attach `lat`/`lon` from `root` to `var` when their layout allows it.
///
/// Never fails: an incompatible layout leaves `var` without coordinates.
pub fn attach_spatial_coords(var: &mut Variable, root: &Dataset) -> CoordinateAttachment {
    let (Some(lat), Some(lon)) = (root.variable("lat"), root.variable("lon")) else {
        return CoordinateAttachment::Skipped;
    };

    if lat.dims_within(var) && lon.dims_within(var) {
        var.attach_coord(detached(lat));
        var.attach_coord(detached(lon));

        // Index coordinates of the axes lat/lon live on travel with them
        for axis in lat.dims.iter().chain(&lon.dims) {
            if let Some(index) = root.variable(axis) {
                if root.is_coord(axis) && index.ndim() == 1 && index.dims_within(var) {
                    var.attach_coord(detached(index));
                }
            }
        }
        return CoordinateAttachment::Attached2D;
    }

    if lat.ndim() == 1 && lon.ndim() == 1 && var.has_dim("y") && var.has_dim("x") {
        let lat = onto_axis(lat, "y", var);
        let lon = onto_axis(lon, "x", var);
        if lat.dims_within(var) && lon.dims_within(var) {
            var.attach_coord(lat);
            var.attach_coord(lon);
            return CoordinateAttachment::Attached1DRenamed;
        }
    }

    CoordinateAttachment::Skipped
}

fn detached(var: &Variable) -> Variable {
    let mut var = var.clone();
    var.coords.clear();
    var
}

/// Copy of a 1-D coordinate, its dimension renamed to `axis` when the lengths agree
fn onto_axis(coord: &Variable, axis: &str, var: &Variable) -> Variable {
    let mut coord = detached(coord);
    if var.dim_len(axis) == Some(coord.data.len()) {
        let old = coord.dims[0].clone();
        coord.rename_dim(&old, axis);
    }
    coord
}

/// Source values in f64 with fill values masked and packing undone
fn decode(source: &Variable) -> ArrayD<f64> {
    let attrs = &source.attributes;
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .into_iter()
        .filter_map(|name| attrs.get_f64(name))
        .collect();
    let scale = attrs.get_f64("scale_factor").unwrap_or(1.0);
    let offset = attrs.get_f64("add_offset").unwrap_or(0.0);

    // Fill values are compared in the stored type, before unpacking
    let stored_fills: Vec<f64> = match source.data {
        ArrayData::F32(_) => fills.iter().map(|&f| f64::from(f as f32)).collect(),
        _ => fills,
    };

    source.data.to_f64().mapv(|v| {
        if stored_fills.contains(&v) {
            f64::NAN
        } else {
            v * scale + offset
        }
    })
}
