//! Grid harmonization against a template dataset
//!
//! The grid-identifying variables of a destination dataset are replaced with
//! the template's versions. Existing definitions are dropped first so the two
//! label sets never have to be reconciled.

use crate::dataset::Dataset;
use crate::errors::Result;
use tracing::debug;

/// Names of the grid-identifying variables
pub const GRID_VARIABLES: [&str; 4] = ["lat", "lon", "x", "y"];

/// Replace the grid variables of `destination` with those of `template`.
///
/// Variables outside [`GRID_VARIABLES`] and nested groups are carried over
/// untouched. Grid names missing from either side are skipped. Applying the
/// function twice gives the same result as applying it once.
///
/// # Errors
///
/// Fails only when a template grid variable disagrees with a dimension
/// length still used by the destination's other variables.
pub fn harmonize(destination: &Dataset, template: &Dataset) -> Result<Dataset> {
    let mut out = destination.clone();

    for name in GRID_VARIABLES {
        out.drop_variable(name);
    }

    for name in GRID_VARIABLES {
        if let Some(var) = template.variable(name) {
            let mut var = var.clone();
            var.coords.clear();
            out.insert_variable(var)?;
        }
    }

    let present: Vec<&str> = GRID_VARIABLES
        .into_iter()
        .filter(|name| out.contains(name))
        .collect();
    out.set_coords(&present);

    for name in GRID_VARIABLES {
        if let (Some(tpl_var), Some(var)) = (template.variable(name), out.variable_mut(name)) {
            var.attributes = tpl_var.attributes.clone();
        }
    }

    debug!(group = %out.name, replaced = ?present, "harmonized grid variables");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AttributeMap, Variable};
    use ndarray::{ArrayD, IxDyn};

    fn filled(name: &str, dims: &[&str], shape: &[usize], value: f64) -> Variable {
        Variable::new(name, dims, ArrayD::from_elem(IxDyn(shape), value)).unwrap()
    }

    fn destination() -> Dataset {
        let mut ds = Dataset::new("/");
        let mut lat = filled("lat", &["y", "x"], &[2, 3], -1.0);
        lat.attributes.insert("units", "degrees");
        lat.attributes.insert("comment", "source grid");
        ds.insert_variable(lat).unwrap();
        ds.insert_variable(filled("lon", &["y", "x"], &[2, 3], -2.0)).unwrap();
        ds.insert_variable(filled("orog", &["y", "x"], &[2, 3], 42.0)).unwrap();
        ds.set_coords(&["lat", "lon"]);
        ds.add_group(Dataset::new("prediction"));
        ds
    }

    fn template() -> Dataset {
        let mut ds = Dataset::new("/");
        let mut attrs = AttributeMap::new();
        attrs.insert("units", "degrees_north");
        attrs.insert("standard_name", "latitude");
        ds.insert_variable(filled("lat", &["y", "x"], &[2, 3], 45.0).with_attributes(attrs))
            .unwrap();
        ds.insert_variable(filled("lon", &["y", "x"], &[2, 3], 7.0)).unwrap();
        ds.insert_variable(filled("x", &["x"], &[3], 0.5)).unwrap();
        ds.insert_variable(filled("y", &["y"], &[2], 0.25)).unwrap();
        ds.insert_variable(filled("pr", &["y", "x"], &[2, 3], 0.0)).unwrap();
        ds
    }

    #[test]
    fn replaces_grid_variables_and_marks_coords() {
        let out = harmonize(&destination(), &template()).unwrap();

        for name in GRID_VARIABLES {
            assert_eq!(out.variable(name), template().variable(name), "{name}");
            assert!(out.is_coord(name), "{name} should be a coordinate");
        }
        let lat = out.variable("lat").unwrap();
        assert_eq!(lat.attributes.get_str("units"), Some("degrees_north"));
        assert!(!lat.attributes.contains("comment"));

        // Template data variables are not imported
        assert!(!out.contains("pr"));
    }

    #[test]
    fn leaves_other_content_untouched() {
        let before = destination();
        let out = harmonize(&before, &template()).unwrap();

        assert_eq!(out.variable("orog"), before.variable("orog"));
        assert!(!out.is_coord("orog"));
        assert_eq!(out.group("prediction"), before.group("prediction"));
    }

    #[test]
    fn is_idempotent() {
        let once = harmonize(&destination(), &template()).unwrap();
        let twice = harmonize(&once, &template()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_names_are_skipped() {
        let mut sparse = Dataset::new("/");
        sparse
            .insert_variable(filled("lat", &["lat"], &[4], 1.0))
            .unwrap();

        let out = harmonize(&destination(), &sparse).unwrap();
        assert_eq!(out.variable("lat").unwrap().shape(), &[4]);
        assert!(!out.contains("lon"));
        assert!(!out.contains("x"));
        assert!(out.contains("orog"));
    }
}
