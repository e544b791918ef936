//! Copy the time coordinate of one file onto another
//!
//! Used when a model run was written without time labels: the labels are
//! taken from a reference file with the same number of time steps.

use crate::dataset::Dataset;
use crate::errors::{NcConformError, Result};
use crate::netcdf_io::{read_dataset, NetCDFWriter};
use std::path::Path;
use tracing::info;

/// Name of the time dimension and of its coordinate variable
pub const TIME: &str = "time";

/// Write the root group of `without_time` to `out`, labelled with the time
/// coordinate of `with_time`.
pub fn add_time_coords(
    with_time: impl AsRef<Path>,
    without_time: impl AsRef<Path>,
    out: impl AsRef<Path>,
) -> Result<()> {
    let reference = read_dataset(with_time.as_ref())?;
    let target = read_dataset(without_time.as_ref())?;

    let labelled = copy_time_coordinate(&reference, &target)?;
    NetCDFWriter::new(out.as_ref()).write(&labelled)?;

    info!(
        from = %with_time.as_ref().display(),
        to = %out.as_ref().display(),
        "copied time coordinate"
    );
    Ok(())
}

/// `target`'s root content with `time` (values and attributes) from `reference`.
///
/// # Errors
///
/// Either dataset lacking a `time` dimension, `reference` lacking a `time`
/// variable, or the two `time` dimensions having different lengths.
pub fn copy_time_coordinate(reference: &Dataset, target: &Dataset) -> Result<Dataset> {
    let with_time = time_len(reference)?;
    let without_time = time_len(target)?;
    if with_time != without_time {
        return Err(NcConformError::TimeLengthMismatch {
            with_time,
            without_time,
        });
    }

    let time = reference
        .variable(TIME)
        .ok_or_else(|| NcConformError::VariableNotFound {
            group: reference.name.clone(),
            var: TIME.to_string(),
        })?;
    let mut time = time.clone();
    time.coords.clear();

    let mut out = target.without_groups();
    out.drop_variable(TIME);
    out.insert_variable(time)?;
    out.set_coords(&[TIME]);
    Ok(out)
}

fn time_len(dataset: &Dataset) -> Result<usize> {
    dataset
        .dimension(TIME)
        .map(|dim| dim.len)
        .ok_or_else(|| NcConformError::DimensionNotFound {
            var: dataset.name.clone(),
            dim: TIME.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ArrayData, Dimension, Variable};
    use ndarray::{ArrayD, IxDyn};

    fn series(name: &str, values: Vec<f64>) -> Variable {
        let len = values.len();
        Variable::new(name, &[TIME], ArrayD::from_shape_vec(IxDyn(&[len]), values).unwrap())
            .unwrap()
    }

    #[test]
    fn copies_values_and_attributes() {
        let mut reference = Dataset::new("/");
        let mut time = series(TIME, vec![0.0, 1.0, 2.0]);
        time.attributes.insert("units", "days since 2000-01-01");
        reference.insert_variable(time).unwrap();

        let mut target = Dataset::new("/");
        target.insert_variable(series("tasmax", vec![280.0, 281.0, 282.0])).unwrap();

        let out = copy_time_coordinate(&reference, &target).unwrap();
        let time = out.variable(TIME).unwrap();
        assert!(out.is_coord(TIME));
        assert_eq!(
            time.attributes.get_str("units"),
            Some("days since 2000-01-01")
        );
        match &time.data {
            ArrayData::F64(values) => assert_eq!(values.as_slice(), Some(&[0.0, 1.0, 2.0][..])),
            other => panic!("unexpected data {other:?}"),
        }
        assert_eq!(out.variable("tasmax"), target.variable("tasmax"));
    }

    #[test]
    fn length_mismatch_is_reported() {
        let mut reference = Dataset::new("/");
        reference.insert_variable(series(TIME, vec![0.0, 1.0])).unwrap();
        let mut target = Dataset::new("/");
        target.add_dimension(TIME, Dimension::unlimited(3));

        match copy_time_coordinate(&reference, &target) {
            Err(NcConformError::TimeLengthMismatch {
                with_time,
                without_time,
            }) => {
                assert_eq!(with_time, 2);
                assert_eq!(without_time, 3);
            }
            other => panic!("expected TimeLengthMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_time_dimension_is_an_error() {
        let reference = Dataset::new("/");
        let target = Dataset::new("/");
        assert!(matches!(
            copy_time_coordinate(&reference, &target),
            Err(NcConformError::DimensionNotFound { .. })
        ));
    }
}
