//! Ordered attribute maps for datasets and variables

use indexmap::IndexMap;
use netcdf::AttributeValue;

/// Insertion-ordered mapping from attribute name to value.
///
/// Copying attributes between variables always replaces the whole map;
/// two maps are never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap(IndexMap<String, AttributeValue>);

impl AttributeMap {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Insert or overwrite an attribute, returning the previous value
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Option<AttributeValue>
    where
        N: Into<String>,
        V: Into<AttributeValue>,
    {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Remove an attribute, keeping the order of the remaining entries
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.0.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric attribute widened to f64, if the attribute holds a single number
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            AttributeValue::Double(v) => Some(*v),
            AttributeValue::Float(v) => Some(f64::from(*v)),
            AttributeValue::Int(v) => Some(f64::from(*v)),
            AttributeValue::Uint(v) => Some(f64::from(*v)),
            AttributeValue::Short(v) => Some(f64::from(*v)),
            AttributeValue::Ushort(v) => Some(f64::from(*v)),
            AttributeValue::Schar(v) => Some(f64::from(*v)),
            AttributeValue::Uchar(v) => Some(f64::from(*v)),
            AttributeValue::Longlong(v) => Some(*v as f64),
            AttributeValue::Ulonglong(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String attribute, if present and textual
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            AttributeValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = indexmap::map::Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_after_remove() {
        let mut attrs = AttributeMap::new();
        attrs.insert("units", "K");
        attrs.insert("long_name", "temperature");
        attrs.insert("_FillValue", 1.0e20f32);
        attrs.remove("long_name");

        let names: Vec<&str> = attrs.names().collect();
        assert_eq!(names, vec!["units", "_FillValue"]);
    }

    #[test]
    fn numeric_and_string_accessors() {
        let mut attrs = AttributeMap::new();
        attrs.insert("scale_factor", 0.5f32);
        attrs.insert("units", "mm/day");

        assert_eq!(attrs.get_f64("scale_factor"), Some(0.5));
        assert_eq!(attrs.get_str("units"), Some("mm/day"));
        assert_eq!(attrs.get_f64("units"), None);
        assert_eq!(attrs.get_str("missing"), None);
    }
}
