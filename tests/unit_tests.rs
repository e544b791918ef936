//! Unit tests for the nc_conform public API
//!
//! These exercise the pure building blocks without touching the filesystem;
//! file-based behaviour lives in `integration_test.rs`.

use nc_conform::{
    calibration::{CalibrationPair, CalibrationTable, LookupPolicy},
    dataset::{AttributeMap, Dataset, Variable},
    errors::NcConformError,
    grid::{harmonize, GRID_VARIABLES},
    normalize::{normalize, CoordinateAttachment},
    template::{resolve, Domain, PhysicalVariable, TemplatePaths},
};
use ndarray::{ArrayD, IxDyn};
use std::path::PathBuf;

fn filled(name: &str, dims: &[&str], shape: &[usize], value: f64) -> Variable {
    Variable::new(name, dims, ArrayD::from_elem(IxDyn(shape), value)).unwrap()
}

#[test]
fn test_error_types() {
    let netcdf_err = NcConformError::NetCDFError(netcdf::Error::NotFound("test".to_string()));
    assert!(format!("{}", netcdf_err).contains("NetCDF error"));

    let generic_err = NcConformError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");

    let domain_err = NcConformError::UnknownDomain {
        model: "Q1".to_string(),
        prefix: 'Q',
    };
    assert_eq!(
        format!("{}", domain_err),
        "Unknown domain prefix 'Q' in model code 'Q1'"
    );

    let time_err = NcConformError::TimeLengthMismatch {
        with_time: 4,
        without_time: 5,
    };
    assert!(format!("{}", time_err).contains("4 in the file with time"));

    let calib_err = NcConformError::CalibrationNotFound {
        key: "A9".to_string(),
        var: "pr".to_string(),
    };
    assert!(format!("{}", calib_err).contains("model 'A9' and variable 'pr'"));
}

#[test]
fn test_domain_resolution() {
    let expected = [("A3", "ALPS"), ("S9", "SA"), ("N1", "NZ")];
    for (model, domain) in expected {
        assert_eq!(resolve(model).unwrap().domain.as_str(), domain);
    }
    assert!(resolve("Q1").is_err());

    let paths = TemplatePaths::new("./templates", Domain::NewZealand);
    assert_eq!(
        paths.path(PhysicalVariable::MaxTemperature),
        PathBuf::from("./templates/tasmax_NZ.nc")
    );
}

#[test]
fn test_observed_variant_shares_calibration() {
    let table = CalibrationTable::builtin();
    let observed = resolve("S2o").unwrap();
    let plain = resolve("S2").unwrap();

    for var in PhysicalVariable::ALL {
        let a = table
            .lookup(&observed.calibration_key, var.short_name(), LookupPolicy::Strict)
            .unwrap();
        let b = table
            .lookup(&plain.calibration_key, var.short_name(), LookupPolicy::Strict)
            .unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_harmonize_preserves_non_grid_content() {
    let mut destination = Dataset::new("/");
    destination
        .insert_variable(filled("lat", &["y", "x"], &[2, 2], 0.0))
        .unwrap();
    destination
        .insert_variable(filled("orog", &["y", "x"], &[2, 2], 812.5))
        .unwrap();
    destination
        .insert_variable(filled("time", &["time"], &[3], 1.0))
        .unwrap();

    let mut template = Dataset::new("/");
    let mut attrs = AttributeMap::new();
    attrs.insert("units", "degrees_north");
    template
        .insert_variable(filled("lat", &["y", "x"], &[2, 2], 46.0).with_attributes(attrs))
        .unwrap();
    template
        .insert_variable(filled("lon", &["y", "x"], &[2, 2], 9.0))
        .unwrap();

    let once = harmonize(&destination, &template).unwrap();
    let twice = harmonize(&once, &template).unwrap();
    assert_eq!(once, twice);

    for name in ["orog", "time"] {
        assert_eq!(once.variable(name), destination.variable(name));
        assert!(!once.is_coord(name));
    }
    for name in GRID_VARIABLES {
        assert_eq!(once.contains(name), template.contains(name));
    }
}

#[test]
fn test_normalizer_with_injected_pair() {
    let source = filled("precipitation", &["member", "time", "y", "x"], &[2, 1, 2, 2], 0.5);
    let template_var = filled("pr", &["y", "x"], &[2, 2], 0.0);
    let mut root = Dataset::new("/");
    root.insert_variable(filled("lat", &["lat"], &[5], 0.0)).unwrap();
    root.insert_variable(filled("lon", &["lon"], &[2], 0.0)).unwrap();

    let out = normalize(
        &source,
        "pr",
        &template_var,
        &root,
        CalibrationPair::new(10.0, 4.0),
    );

    // lat cannot be mapped onto y, so nothing is attached
    assert_eq!(out.attachment, CoordinateAttachment::Skipped);
    assert!(out.variable.coords.is_empty());
    assert_eq!(out.variable.data.to_f64()[[1, 0, 1, 1]], 12.0);
}

#[test]
fn test_calibration_pair_identity() {
    let identity = CalibrationPair::IDENTITY;
    assert_eq!(identity.apply(42.0), 42.0);
    assert_eq!(CalibrationPair::new(1.0, 0.5).apply(4.0), 3.0);
}
