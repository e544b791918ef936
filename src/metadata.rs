//! NetCDF schema inspection
//!
//! Reads the structure of a file without loading variable data: for every
//! group, recursively, its attributes, dimensions, and variables with their
//! dimension names, shape, element type and attributes.

use crate::dataset::{AttributeMap, DataType};
use crate::errors::Result;
use crate::netcdf_io::NcGroupReader;
use netcdf::AttributeValue;
use std::fmt::Write as _;
use std::path::Path;

/// Information about a dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Structured metadata for a NetCDF variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMetadata {
    pub name: String,
    /// Element type, numpy-style (`float32`, `int64`, ...) where it has one
    pub data_type: String,
    pub dimensions: Vec<DimensionInfo>,
    pub attributes: AttributeMap,
}

impl VariableMetadata {
    pub fn dim_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.length).collect()
    }

    pub fn total_elements(&self) -> usize {
        self.dimensions.iter().map(|d| d.length).product()
    }
}

/// Structure of one group and everything below it
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSchema {
    pub name: String,
    pub attributes: AttributeMap,
    /// Dimensions defined in this group (not those inherited from parents)
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableMetadata>,
    pub groups: Vec<GroupSchema>,
}

impl GroupSchema {
    pub fn variable(&self, name: &str) -> Option<&VariableMetadata> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupSchema> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Read the schema of the file at `path`.
pub fn inspect(path: impl AsRef<Path>) -> Result<GroupSchema> {
    let file = netcdf::open(path.as_ref())?;
    inspect_group("/", &file)
}

fn inspect_group<G: NcGroupReader>(name: &str, group: &G) -> Result<GroupSchema> {
    let attributes = read_attributes(group.nc_attributes())?;

    let dimensions = group.nc_dimensions().iter().map(dimension_info).collect();

    let mut variables = Vec::new();
    for var in group.nc_variables() {
        let type_name = format!("{:?}", var.vartype());
        let data_type = DataType::from_nc_type_name(&type_name)
            .map(|dtype| dtype.as_str().to_string())
            .unwrap_or_else(|| type_name.to_lowercase());

        variables.push(VariableMetadata {
            name: var.name(),
            data_type,
            dimensions: var.dimensions().iter().map(dimension_info).collect(),
            attributes: read_attributes(var.attributes().collect())?,
        });
    }

    let mut groups = Vec::new();
    for child in group.nc_groups()? {
        groups.push(inspect_group(&child.name(), &child)?);
    }

    Ok(GroupSchema {
        name: name.to_string(),
        attributes,
        dimensions,
        variables,
        groups,
    })
}

fn dimension_info(dim: &netcdf::Dimension<'_>) -> DimensionInfo {
    DimensionInfo {
        name: dim.name(),
        length: dim.len(),
        is_unlimited: dim.is_unlimited(),
    }
}

fn read_attributes(attributes: Vec<netcdf::Attribute<'_>>) -> Result<AttributeMap> {
    let mut map = AttributeMap::new();
    for attr in attributes {
        map.insert(attr.name(), attr.value()?);
    }
    Ok(map)
}

/// Prints the schema of the file at `path` to stdout.
pub fn print_schema(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let schema = inspect(path)?;

    println!("\n=== NetCDF schema: {} ===\n", path.display());
    print!("{}", render_schema(&schema));
    println!("\n=== End of schema ===\n");
    Ok(())
}

/// Render a schema as indented text, two spaces per level.
pub fn render_schema(schema: &GroupSchema) -> String {
    let mut out = String::new();
    render_group(&mut out, schema, 0);
    out
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn render_group(out: &mut String, group: &GroupSchema, level: usize) {
    let _ = writeln!(out, "{}Group: {}", indent(level), group.name);

    if !group.attributes.is_empty() {
        let _ = writeln!(out, "{}Attributes:", indent(level + 1));
        render_attributes(out, &group.attributes, level + 2);
    }

    if !group.dimensions.is_empty() {
        let _ = writeln!(out, "{}Dimensions:", indent(level + 1));
        for dim in &group.dimensions {
            let size = if dim.is_unlimited {
                "UNLIMITED".to_string()
            } else {
                dim.length.to_string()
            };
            let _ = writeln!(out, "{}- {}: {}", indent(level + 2), dim.name, size);
        }
    }

    if !group.variables.is_empty() {
        let _ = writeln!(out, "{}Variables:", indent(level + 1));
        for var in &group.variables {
            let _ = writeln!(out, "{}- {}", indent(level + 2), var.name);
            let names: Vec<String> = var.dim_names().iter().map(|n| format!("'{n}'")).collect();
            let shape: Vec<String> = var.shape().iter().map(usize::to_string).collect();
            let _ = writeln!(out, "{}dims: {}", indent(level + 3), tuple(&names));
            let _ = writeln!(out, "{}shape: {}", indent(level + 3), tuple(&shape));
            let _ = writeln!(out, "{}dtype: {}", indent(level + 3), var.data_type);
            if !var.attributes.is_empty() {
                let _ = writeln!(out, "{}attrs:", indent(level + 3));
                render_attributes(out, &var.attributes, level + 4);
            }
        }
    }

    for child in &group.groups {
        out.push('\n');
        render_group(out, child, level + 1);
    }
}

fn render_attributes(out: &mut String, attributes: &AttributeMap, level: usize) {
    for (name, value) in attributes.iter() {
        let _ = writeln!(
            out,
            "{}- {}: {}",
            indent(level),
            name,
            format_attribute_value(value)
        );
    }
}

/// `()`, `(a,)`, `(a, b)`
fn tuple(items: &[String]) -> String {
    match items {
        [] => "()".to_string(),
        [one] => format!("({one},)"),
        many => format!("({})", many.join(", ")),
    }
}

fn list<T: ToString>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(" "))
}

/// Human-readable rendering of an attribute value
pub fn format_attribute_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(ss) => format!("{ss:?}"),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Floats(fs) => list(fs),
        AttributeValue::Double(d) => d.to_string(),
        AttributeValue::Doubles(ds) => list(ds),
        AttributeValue::Schar(i) => i.to_string(),
        AttributeValue::Schars(is) => list(is),
        AttributeValue::Uchar(u) => u.to_string(),
        AttributeValue::Uchars(us) => list(us),
        AttributeValue::Short(s) => s.to_string(),
        AttributeValue::Shorts(ss) => list(ss),
        AttributeValue::Ushort(u) => u.to_string(),
        AttributeValue::Ushorts(us) => list(us),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Ints(is) => list(is),
        AttributeValue::Uint(u) => u.to_string(),
        AttributeValue::Uints(us) => list(us),
        AttributeValue::Longlong(i) => i.to_string(),
        AttributeValue::Longlongs(is) => list(is),
        AttributeValue::Ulonglong(u) => u.to_string(),
        AttributeValue::Ulonglongs(us) => list(us),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(name: &str, length: usize, is_unlimited: bool) -> DimensionInfo {
        DimensionInfo {
            name: name.to_string(),
            length,
            is_unlimited,
        }
    }

    fn sample() -> GroupSchema {
        let mut attrs = AttributeMap::new();
        attrs.insert("units", "K");
        attrs.insert("valid_range", AttributeValue::Floats(vec![200.0, 330.0]));

        let mut global = AttributeMap::new();
        global.insert("title", "demo");

        GroupSchema {
            name: "/".to_string(),
            attributes: global,
            dimensions: vec![dim("time", 3, true), dim("x", 4, false)],
            variables: vec![
                VariableMetadata {
                    name: "x".to_string(),
                    data_type: "float64".to_string(),
                    dimensions: vec![dim("x", 4, false)],
                    attributes: AttributeMap::new(),
                },
                VariableMetadata {
                    name: "tasmax".to_string(),
                    data_type: "float32".to_string(),
                    dimensions: vec![dim("time", 3, true), dim("x", 4, false)],
                    attributes: attrs,
                },
            ],
            groups: vec![GroupSchema {
                name: "prediction".to_string(),
                attributes: AttributeMap::new(),
                dimensions: vec![],
                variables: vec![],
                groups: vec![],
            }],
        }
    }

    #[test]
    fn renders_groups_recursively() {
        let text = render_schema(&sample());
        let expected = "\
Group: /
  Attributes:
    - title: demo
  Dimensions:
    - time: UNLIMITED
    - x: 4
  Variables:
    - x
      dims: ('x',)
      shape: (4,)
      dtype: float64
    - tasmax
      dims: ('time', 'x')
      shape: (3, 4)
      dtype: float32
      attrs:
        - units: K
        - valid_range: [200 330]

  Group: prediction
";
        assert_eq!(text, expected);
    }

    #[test]
    fn scalar_variables_have_empty_tuples() {
        assert_eq!(tuple(&[]), "()");
        assert_eq!(format_attribute_value(&AttributeValue::Int(-3)), "-3");
    }

    #[test]
    fn lookup_helpers() {
        let schema = sample();
        let tasmax = schema.variable("tasmax").unwrap();
        assert_eq!(tasmax.dim_names(), vec!["time", "x"]);
        assert_eq!(tasmax.total_elements(), 12);
        assert!(schema.group("prediction").is_some());
        assert!(schema.group("missing").is_none());
    }
}
