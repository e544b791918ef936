//! In-memory model of NetCDF groups
//!
//! A [`Dataset`] mirrors one NetCDF group: its dimensions, its variables,
//! which of those variables are coordinates, its global attributes, and any
//! child groups. Datasets are loaded whole by [`crate::netcdf_io`] and every
//! transformation in the pipeline produces a new value instead of touching
//! the files it came from.

pub mod array;
pub mod attributes;

pub use array::{ArrayData, DataType};
pub use attributes::AttributeMap;

use crate::errors::{NcConformError, Result};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Length and kind of a named dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub len: usize,
    pub unlimited: bool,
}

impl Dimension {
    pub const fn fixed(len: usize) -> Self {
        Self {
            len,
            unlimited: false,
        }
    }

    pub const fn unlimited(len: usize) -> Self {
        Self {
            len,
            unlimited: true,
        }
    }
}

/// A named N-D array with dimension names and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayData,
    pub attributes: AttributeMap,
    /// Coordinate variables attached to this variable for labelling
    pub coords: IndexMap<String, Variable>,
}

impl Variable {
    /// Create a variable, checking that there is one dimension name per axis
    pub fn new<N, D>(name: N, dims: &[D], data: impl Into<ArrayData>) -> Result<Self>
    where
        N: Into<String>,
        D: AsRef<str>,
    {
        let name = name.into();
        let data = data.into();
        if dims.len() != data.ndim() {
            return Err(NcConformError::Generic(format!(
                "Variable '{}' has {} dimension names for a {}-dimensional array",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            name,
            dims: dims.iter().map(|d| d.as_ref().to_string()).collect(),
            data,
            attributes: AttributeMap::new(),
            coords: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Length of the named dimension in this variable
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.shape()[axis])
    }

    /// Pairs of (dimension name, length)
    pub fn dim_sizes(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.dims
            .iter()
            .map(String::as_str)
            .zip(self.shape().iter().copied())
    }

    /// True when every dimension of `self` is a dimension of `other` with the same length.
    pub fn dims_within(&self, other: &Variable) -> bool {
        self.dim_sizes()
            .all(|(dim, len)| other.dim_len(dim) == Some(len))
    }

    /// Rename a dimension in this variable and in its attached coordinates
    pub fn rename_dim(&mut self, old: &str, new: &str) {
        for dim in self.dims.iter_mut().filter(|d| d.as_str() == old) {
            *dim = new.to_string();
        }
        for coord in self.coords.values_mut() {
            coord.rename_dim(old, new);
        }
    }

    /// Attach a coordinate variable, replacing any coordinate of the same name
    pub fn attach_coord(&mut self, coord: Variable) {
        self.coords.insert(coord.name.clone(), coord);
    }
}

/// One NetCDF group held in memory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub name: String,
    pub attributes: AttributeMap,
    dims: IndexMap<String, Dimension>,
    variables: IndexMap<String, Variable>,
    coord_names: IndexSet<String>,
    groups: IndexMap<String, Dataset>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // ---- dimensions -------------------------------------------------------

    pub fn dims(&self) -> &IndexMap<String, Dimension> {
        &self.dims
    }

    pub fn dimension(&self, name: &str) -> Option<Dimension> {
        self.dims.get(name).copied()
    }

    /// Declare a dimension, overwriting any previous declaration
    pub fn add_dimension(&mut self, name: impl Into<String>, dim: Dimension) {
        self.dims.insert(name.into(), dim);
    }

    /// Rename a dimension everywhere it appears.
    ///
    /// A variable carrying the old dimension's name is renamed as well, so an
    /// index coordinate follows its axis.
    pub fn rename_dimension(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self
            .dims
            .get_index_of(old)
            .ok_or_else(|| NcConformError::DimensionNotFound {
                var: self.name.clone(),
                dim: old.to_string(),
            })?;
        let dim = self.dims[index];
        self.dims.shift_remove(old);
        self.dims.shift_insert(index, new.to_string(), dim);

        for var in self.variables.values_mut() {
            var.rename_dim(old, new);
        }

        if let Some(index) = self.variables.get_index_of(old) {
            if let Some(mut var) = self.variables.shift_remove(old) {
                var.name = new.to_string();
                self.variables.shift_insert(index, new.to_string(), var);
            }
            if self.coord_names.shift_remove(old) {
                self.coord_names.insert(new.to_string());
            }
        }

        debug!(group = %self.name, old, new, "renamed dimension");
        Ok(())
    }

    /// New dataset keeping only the first `n` positions along `dim`
    pub fn take_prefix(&self, dim: &str, n: usize) -> Result<Dataset> {
        let current = self
            .dimension(dim)
            .ok_or_else(|| NcConformError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })?;

        let mut out = self.clone();
        out.dims.insert(
            dim.to_string(),
            Dimension {
                len: n.min(current.len),
                unlimited: current.unlimited,
            },
        );
        for var in out.variables.values_mut() {
            subset_variable(var, dim, n);
        }
        Ok(out)
    }

    // ---- variables --------------------------------------------------------

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Insert a variable, replacing any variable of the same name.
    ///
    /// Dimensions the dataset does not know yet are declared from the
    /// variable's shape; a known dimension with a different length is an error.
    pub fn insert_variable(&mut self, var: Variable) -> Result<()> {
        self.check_dims(&var)?;
        for coord in var.coords.values() {
            self.check_dims(coord)?;
        }

        for (dim, len) in var.dim_sizes() {
            if !self.dims.contains_key(dim) {
                self.dims.insert(dim.to_string(), Dimension::fixed(len));
            }
        }
        for coord in var.coords.values() {
            for (dim, len) in coord.dim_sizes() {
                if !self.dims.contains_key(dim) {
                    self.dims.insert(dim.to_string(), Dimension::fixed(len));
                }
            }
        }

        self.variables.insert(var.name.clone(), var);
        Ok(())
    }

    /// Remove a variable and its coordinate marking.
    ///
    /// Dimensions used by the removed variable and by nothing else are
    /// dropped with it.
    pub fn drop_variable(&mut self, name: &str) -> Option<Variable> {
        let var = self.variables.shift_remove(name)?;
        self.coord_names.shift_remove(name);

        for dim in &var.dims {
            if !self.dim_in_use(dim) {
                self.dims.shift_remove(dim.as_str());
            }
        }
        Some(var)
    }

    // ---- coordinates ------------------------------------------------------

    pub fn is_coord(&self, name: &str) -> bool {
        self.coord_names.contains(name)
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coord_names.iter().map(String::as_str)
    }

    /// Mark the named variables as coordinates; names not present are ignored
    pub fn set_coords<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if self.variables.contains_key(name) {
                self.coord_names.insert(name.to_string());
            }
        }
    }

    // ---- groups -----------------------------------------------------------

    pub fn groups(&self) -> impl Iterator<Item = &Dataset> {
        self.groups.values()
    }

    pub fn group(&self, name: &str) -> Option<&Dataset> {
        self.groups.get(name)
    }

    pub fn add_group(&mut self, group: Dataset) {
        self.groups.insert(group.name.clone(), group);
    }

    /// Copy of this group's own content, without child groups
    pub fn without_groups(&self) -> Dataset {
        Dataset {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            dims: self.dims.clone(),
            variables: self.variables.clone(),
            coord_names: self.coord_names.clone(),
            groups: IndexMap::new(),
        }
    }

    fn check_dims(&self, var: &Variable) -> Result<()> {
        for (dim, len) in var.dim_sizes() {
            if let Some(existing) = self.dims.get(dim) {
                if existing.len != len {
                    return Err(NcConformError::DimensionConflict {
                        dim: dim.to_string(),
                        var: var.name.clone(),
                        existing: existing.len,
                        requested: len,
                    });
                }
            }
        }
        Ok(())
    }

    fn dim_in_use(&self, dim: &str) -> bool {
        self.variables
            .values()
            .any(|v| v.has_dim(dim) || v.coords.values().any(|c| c.has_dim(dim)))
    }
}

fn subset_variable(var: &mut Variable, dim: &str, n: usize) {
    if let Some(axis) = var.axis_of(dim) {
        var.data = var.data.take_prefix(axis, n);
    }
    for coord in var.coords.values_mut() {
        subset_variable(coord, dim, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn var(name: &str, dims: &[&str], shape: &[usize]) -> Variable {
        let len = shape.iter().product();
        let data = ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|i| i as f32).collect())
            .unwrap();
        Variable::new(name, dims, data).unwrap()
    }

    #[test]
    fn rejects_dimension_name_count_mismatch() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 3]));
        assert!(Variable::new("bad", &["y"], data).is_err());
    }

    #[test]
    fn insert_declares_dims_and_rejects_conflicts() {
        let mut ds = Dataset::new("/");
        ds.insert_variable(var("orog", &["y", "x"], &[2, 3])).unwrap();
        assert_eq!(ds.dimension("y"), Some(Dimension::fixed(2)));
        assert_eq!(ds.dimension("x"), Some(Dimension::fixed(3)));

        let err = ds.insert_variable(var("mask", &["y", "x"], &[4, 3])).unwrap_err();
        assert!(matches!(err, NcConformError::DimensionConflict { ref dim, .. } if dim == "y"));
    }

    #[test]
    fn drop_prunes_unused_dims_only() {
        let mut ds = Dataset::new("/");
        ds.insert_variable(var("lat", &["lat"], &[4])).unwrap();
        ds.insert_variable(var("orog", &["y", "x"], &[2, 3])).unwrap();
        ds.insert_variable(var("x", &["x"], &[3])).unwrap();
        ds.set_coords(&["lat", "x"]);

        ds.drop_variable("lat");
        ds.drop_variable("x");
        assert!(ds.dimension("lat").is_none());
        assert_eq!(ds.dimension("x"), Some(Dimension::fixed(3)));
        assert!(!ds.is_coord("lat"));
        assert!(!ds.is_coord("x"));
    }

    #[test]
    fn rename_dimension_renames_index_coordinate() {
        let mut ds = Dataset::new("prediction");
        ds.add_dimension("ensemble", Dimension::fixed(4));
        ds.insert_variable(var("ensemble", &["ensemble"], &[4])).unwrap();
        ds.insert_variable(var("precipitation", &["ensemble", "y"], &[4, 2]))
            .unwrap();
        ds.set_coords(&["ensemble"]);

        ds.rename_dimension("ensemble", "member").unwrap();

        assert_eq!(ds.dimension("member"), Some(Dimension::fixed(4)));
        assert!(ds.dimension("ensemble").is_none());
        assert!(ds.contains("member"));
        assert!(ds.is_coord("member"));
        assert_eq!(ds.variable("precipitation").unwrap().dims, vec!["member", "y"]);
        assert!(ds.rename_dimension("ensemble", "member").is_err());
    }

    #[test]
    fn take_prefix_subsets_every_variable_on_the_axis() {
        let mut ds = Dataset::new("prediction");
        ds.insert_variable(var("precipitation", &["ensemble", "y"], &[10, 2]))
            .unwrap();
        ds.insert_variable(var("orog", &["y"], &[2])).unwrap();

        let first = ds.take_prefix("ensemble", 5).unwrap();
        assert_eq!(first.dimension("ensemble").unwrap().len, 5);
        assert_eq!(first.variable("precipitation").unwrap().shape(), &[5, 2]);
        assert_eq!(first.variable("orog"), ds.variable("orog"));
    }
}
