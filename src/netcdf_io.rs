//! NetCDF I/O: loading groups into memory and writing datasets back out
//!
//! Every file handle opened here lives only for the duration of a single
//! call and is closed when it goes out of scope, including on error paths.
//! Writes go to a `.partial` sibling first and are renamed over the target
//! once the whole dataset has been written, so a failed write never leaves
//! a half-written file at the output path.

use crate::dataset::array::with_array;
use crate::dataset::{ArrayData, AttributeMap, DataType, Dataset, Dimension, Variable};
use crate::errors::{NcConformError, Result};
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use netcdf::{AttributeValue, NcTypeDescriptor};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Attributes whose value must match the element type of their variable
const TYPED_FILL_ATTRIBUTES: [&str; 2] = ["_FillValue", "missing_value"];

/// Read access shared by the root of a file and its sub-groups
pub(crate) trait NcGroupReader {
    fn nc_dimensions(&self) -> Vec<netcdf::Dimension<'_>>;
    fn nc_variables(&self) -> Vec<netcdf::Variable<'_>>;
    fn nc_attributes(&self) -> Vec<netcdf::Attribute<'_>>;
    fn nc_groups(&self) -> Result<Vec<netcdf::Group<'_>>>;
}

impl NcGroupReader for netcdf::File {
    fn nc_dimensions(&self) -> Vec<netcdf::Dimension<'_>> {
        self.dimensions().collect()
    }

    fn nc_variables(&self) -> Vec<netcdf::Variable<'_>> {
        self.variables().collect()
    }

    fn nc_attributes(&self) -> Vec<netcdf::Attribute<'_>> {
        self.attributes().collect()
    }

    fn nc_groups(&self) -> Result<Vec<netcdf::Group<'_>>> {
        Ok(self.groups()?.collect())
    }
}

impl NcGroupReader for netcdf::Group<'_> {
    fn nc_dimensions(&self) -> Vec<netcdf::Dimension<'_>> {
        self.dimensions().collect()
    }

    fn nc_variables(&self) -> Vec<netcdf::Variable<'_>> {
        self.variables().collect()
    }

    fn nc_attributes(&self) -> Vec<netcdf::Attribute<'_>> {
        self.attributes().collect()
    }

    fn nc_groups(&self) -> Result<Vec<netcdf::Group<'_>>> {
        Ok(self.groups().collect())
    }
}

/// Load the root group of a file, with all of its sub-groups, into memory.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    debug!(path = %path.display(), "opened NetCDF file");
    load_group("/", &file)
}

/// Load a single named group (and its sub-groups) of a file into memory.
pub fn read_group(path: impl AsRef<Path>, group: &str) -> Result<Dataset> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let nc_group = file
        .group(group)?
        .ok_or_else(|| NcConformError::GroupNotFound {
            group: group.to_string(),
        })?;
    load_group(group, &nc_group)
}

fn load_group<G: NcGroupReader>(name: &str, group: &G) -> Result<Dataset> {
    let mut dataset = Dataset::new(name);
    dataset.attributes = load_attributes(group.nc_attributes())?;

    for dim in group.nc_dimensions() {
        dataset.add_dimension(
            dim.name(),
            Dimension {
                len: dim.len(),
                unlimited: dim.is_unlimited(),
            },
        );
    }

    let mut coord_names: IndexSet<String> = IndexSet::new();
    for nc_var in group.nc_variables() {
        // Dimensions defined in a parent group are visible here through the variable
        for dim in nc_var.dimensions() {
            if dataset.dimension(&dim.name()).is_none() {
                dataset.add_dimension(
                    dim.name(),
                    Dimension {
                        len: dim.len(),
                        unlimited: dim.is_unlimited(),
                    },
                );
            }
        }

        let Some(var) = load_variable(&nc_var)? else {
            continue;
        };

        if var.dims.len() == 1 && var.dims[0] == var.name {
            coord_names.insert(var.name.clone());
        }
        if let Some(listed) = var.attributes.get_str("coordinates") {
            coord_names.extend(listed.split_whitespace().map(str::to_string));
        }
        dataset.insert_variable(var)?;
    }
    let coord_names: Vec<String> = coord_names.into_iter().collect();
    dataset.set_coords(&coord_names);

    for child in group.nc_groups()? {
        let child_name = child.name();
        dataset.add_group(load_group(&child_name, &child)?);
    }

    debug!(
        group = name,
        variables = dataset.variables().count(),
        "loaded group"
    );
    Ok(dataset)
}

fn load_attributes(attributes: Vec<netcdf::Attribute<'_>>) -> Result<AttributeMap> {
    attributes
        .into_iter()
        .map(|attr| -> Result<(String, AttributeValue)> {
            Ok((attr.name().to_string(), attr.value()?))
        })
        .collect()
}

/// Load one variable; types the in-memory model cannot hold are skipped.
fn load_variable(nc_var: &netcdf::Variable<'_>) -> Result<Option<Variable>> {
    let name = nc_var.name();
    let dims: Vec<String> = nc_var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = nc_var.dimensions().iter().map(|d| d.len()).collect();

    let type_name = format!("{:?}", nc_var.vartype());
    let Some(dtype) = DataType::from_nc_type_name(&type_name) else {
        warn!(variable = %name, dtype = %type_name, "skipping variable with unsupported type");
        return Ok(None);
    };

    let data = match dtype {
        DataType::I8 => ArrayData::I8(read_array(nc_var, &shape)?),
        DataType::U8 => ArrayData::U8(read_array(nc_var, &shape)?),
        DataType::I16 => ArrayData::I16(read_array(nc_var, &shape)?),
        DataType::U16 => ArrayData::U16(read_array(nc_var, &shape)?),
        DataType::I32 => ArrayData::I32(read_array(nc_var, &shape)?),
        DataType::U32 => ArrayData::U32(read_array(nc_var, &shape)?),
        DataType::I64 => ArrayData::I64(read_array(nc_var, &shape)?),
        DataType::U64 => ArrayData::U64(read_array(nc_var, &shape)?),
        DataType::F32 => ArrayData::F32(read_array(nc_var, &shape)?),
        DataType::F64 => ArrayData::F64(read_array(nc_var, &shape)?),
    };

    Ok(Some(Variable {
        name,
        dims,
        data,
        attributes: load_attributes(nc_var.attributes().collect())?,
        coords: IndexMap::new(),
    }))
}

fn read_array<T: NcTypeDescriptor + Copy>(
    nc_var: &netcdf::Variable<'_>,
    shape: &[usize],
) -> Result<ArrayD<T>> {
    let values = nc_var.get_values::<T, _>(..)?;
    Ok(ArrayD::from_shape_vec(IxDyn(shape), values)?)
}

/// Write access shared by a new file's root and the groups created in it
trait NcGroupWriter {
    fn define_dimension(&mut self, name: &str, dim: Dimension) -> Result<()>;

    fn define_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()>;

    fn define_variable<T: NcTypeDescriptor + Copy>(
        &mut self,
        name: &str,
        dims: &[&str],
        attributes: &AttributeMap,
        values: ArrayViewD<'_, T>,
    ) -> Result<()>;

    fn define_group(&mut self, group: &Dataset) -> Result<()>;
}

macro_rules! impl_group_writer {
    ($target:ty) => {
        impl NcGroupWriter for $target {
            fn define_dimension(&mut self, name: &str, dim: Dimension) -> Result<()> {
                if dim.unlimited {
                    self.add_unlimited_dimension(name)?;
                } else {
                    self.add_dimension(name, dim.len)?;
                }
                Ok(())
            }

            fn define_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()> {
                self.add_attribute(name, value)?;
                Ok(())
            }

            fn define_variable<T: NcTypeDescriptor + Copy>(
                &mut self,
                name: &str,
                dims: &[&str],
                attributes: &AttributeMap,
                values: ArrayViewD<'_, T>,
            ) -> Result<()> {
                let mut var = self.add_variable::<T>(name, dims)?;
                for (attr_name, value) in attributes.iter() {
                    var.put_attribute(attr_name, value.clone())?;
                }
                // The array's shape grows unlimited dimensions that are still empty
                if !values.is_empty() {
                    var.put(values, ..)?;
                }
                Ok(())
            }

            fn define_group(&mut self, group: &Dataset) -> Result<()> {
                let mut child = self.add_group(&group.name)?;
                write_contents(&mut child, group)
            }
        }
    };
}

impl_group_writer!(netcdf::FileMut);
impl_group_writer!(netcdf::GroupMut<'_>);

/// Writes in-memory datasets to new NetCDF files
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
    history: Option<String>,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(output_path: &'a Path) -> Self {
        Self {
            output_path,
            history: None,
        }
    }

    /// Override the line appended to the `history` global attribute
    #[must_use]
    pub fn with_history(mut self, entry: impl Into<String>) -> Self {
        self.history = Some(entry.into());
        self
    }

    /// Write `dataset` as the root group of the output file, replacing any existing file.
    pub fn write(&self, dataset: &Dataset) -> Result<()> {
        let partial = partial_path(self.output_path);
        if partial.exists() {
            fs::remove_file(&partial)?;
        }

        if let Err(e) = self.write_to(&partial, dataset) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        fs::rename(&partial, self.output_path)?;
        info!(path = %self.output_path.display(), "wrote NetCDF file");
        Ok(())
    }

    fn write_to(&self, path: &Path, dataset: &Dataset) -> Result<()> {
        let mut file = netcdf::create(path)?;
        write_contents(&mut file, dataset)?;

        let entry = self.history.clone().unwrap_or_else(|| {
            format!("Created by nc_conform on {}", Utc::now().to_rfc3339())
        });
        let history = match dataset.attributes.get_str("history") {
            Some(previous) if !previous.is_empty() => format!("{previous}\n{entry}"),
            _ => entry,
        };
        file.add_attribute("history", history)?;
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_contents<W: NcGroupWriter>(sink: &mut W, dataset: &Dataset) -> Result<()> {
    for (name, dim) in dataset.dims() {
        sink.define_dimension(name, *dim)?;
    }
    for (name, value) in dataset.attributes.iter() {
        sink.define_attribute(name, value.clone())?;
    }

    for var in dataset.variables() {
        write_variable(sink, var)?;
    }

    // Coordinates attached to variables but not stored in the group itself
    let mut written: IndexSet<&str> = dataset.variable_names().collect();
    for var in dataset.variables() {
        for coord in var.coords.values() {
            if written.insert(coord.name.as_str()) {
                write_variable(sink, coord)?;
            }
        }
    }

    for group in dataset.groups() {
        sink.define_group(group)?;
    }
    Ok(())
}

fn write_variable<W: NcGroupWriter>(sink: &mut W, var: &Variable) -> Result<()> {
    let attributes = encode_attributes(var);
    let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
    let data = encode_fill(&var.data, attributes.get_f64("_FillValue"));

    with_array!(&*data, array => {
        let values = array.as_standard_layout();
        sink.define_variable(&var.name, &dims, &attributes, values.view())
    })
}

/// Attributes as they go to disk: fill values cast to the variable's type and
/// a CF `coordinates` attribute naming attached auxiliary coordinates.
fn encode_attributes(var: &Variable) -> AttributeMap {
    let mut attributes = var.attributes.clone();

    for name in TYPED_FILL_ATTRIBUTES {
        if let Some(value) = attributes.get_f64(name) {
            attributes.insert(name, typed_scalar(value, var.dtype()));
        }
    }

    if !attributes.contains("coordinates") {
        let auxiliary: Vec<&str> = var
            .coords
            .keys()
            .map(String::as_str)
            .filter(|name| !var.has_dim(name))
            .collect();
        if !auxiliary.is_empty() {
            attributes.insert("coordinates", auxiliary.join(" "));
        }
    }
    attributes
}

fn typed_scalar(value: f64, dtype: DataType) -> AttributeValue {
    match dtype {
        DataType::I8 => AttributeValue::Schar(value as i8),
        DataType::U8 => AttributeValue::Uchar(value as u8),
        DataType::I16 => AttributeValue::Short(value as i16),
        DataType::U16 => AttributeValue::Ushort(value as u16),
        DataType::I32 => AttributeValue::Int(value as i32),
        DataType::U32 => AttributeValue::Uint(value as u32),
        DataType::I64 => AttributeValue::Longlong(value as i64),
        DataType::U64 => AttributeValue::Ulonglong(value as u64),
        DataType::F32 => AttributeValue::Float(value as f32),
        DataType::F64 => AttributeValue::Double(value),
    }
}

/// Replace NaN with the declared fill value in floating-point data.
fn encode_fill(data: &ArrayData, fill: Option<f64>) -> Cow<'_, ArrayData> {
    match (data, fill) {
        (ArrayData::F32(array), Some(fill)) if array.iter().any(|v| v.is_nan()) => {
            let fill = fill as f32;
            Cow::Owned(ArrayData::F32(
                array.mapv(|v| if v.is_nan() { fill } else { v }),
            ))
        }
        (ArrayData::F64(array), Some(fill)) if array.iter().any(|v| v.is_nan()) => Cow::Owned(
            ArrayData::F64(array.mapv(|v| if v.is_nan() { fill } else { v })),
        ),
        _ => Cow::Borrowed(data),
    }
}
