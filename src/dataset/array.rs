//! Typed N-dimensional array storage
//!
//! Variables keep the element type they were read with so that data which
//! passes through the pipeline untouched is written back bit-identical.

use ndarray::{ArrayD, Axis, Slice};

/// Element types supported by the in-memory model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl DataType {
    /// Conventional (numpy-style) name of the element type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// Classify a NetCDF variable type from its debug rendering.
    ///
    /// Accepts both the sized names (`Float(F32)`, `Int(I16)`) and the
    /// classic type names (`Double`, `Short`).
    pub fn from_nc_type_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let sized = [
            ("f64", Self::F64),
            ("f32", Self::F32),
            ("u64", Self::U64),
            ("i64", Self::I64),
            ("u32", Self::U32),
            ("i32", Self::I32),
            ("u16", Self::U16),
            ("i16", Self::I16),
            ("u8", Self::U8),
            ("i8", Self::I8),
        ];
        if let Some((_, dtype)) = sized.iter().find(|(token, _)| name.contains(token)) {
            return Some(*dtype);
        }

        // Order matters: longer names first so "ushort" is not taken for "short"
        let classic = [
            ("double", Self::F64),
            ("float", Self::F32),
            ("ulonglong", Self::U64),
            ("longlong", Self::I64),
            ("uint64", Self::U64),
            ("int64", Self::I64),
            ("ushort", Self::U16),
            ("short", Self::I16),
            ("uint", Self::U32),
            ("int", Self::I32),
            ("uchar", Self::U8),
            ("ubyte", Self::U8),
            ("schar", Self::I8),
            ("byte", Self::I8),
        ];
        classic
            .iter()
            .find(|(token, _)| name.contains(token))
            .map(|(_, dtype)| *dtype)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Array payload of a variable, tagged with its element type
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    I8(ArrayD<i8>),
    U8(ArrayD<u8>),
    I16(ArrayD<i16>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    U32(ArrayD<u32>),
    I64(ArrayD<i64>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Run `$body` against whichever typed array `$data` holds.
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::I8($arr) => $body,
            ArrayData::U8($arr) => $body,
            ArrayData::I16($arr) => $body,
            ArrayData::U16($arr) => $body,
            ArrayData::I32($arr) => $body,
            ArrayData::U32($arr) => $body,
            ArrayData::I64($arr) => $body,
            ArrayData::U64($arr) => $body,
            ArrayData::F32($arr) => $body,
            ArrayData::F64($arr) => $body,
        }
    };
}

/// Like `with_array!`, re-wrapping the result in the same variant.
macro_rules! map_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::I8($arr) => ArrayData::I8($body),
            ArrayData::U8($arr) => ArrayData::U8($body),
            ArrayData::I16($arr) => ArrayData::I16($body),
            ArrayData::U16($arr) => ArrayData::U16($body),
            ArrayData::I32($arr) => ArrayData::I32($body),
            ArrayData::U32($arr) => ArrayData::U32($body),
            ArrayData::I64($arr) => ArrayData::I64($body),
            ArrayData::U64($arr) => ArrayData::U64($body),
            ArrayData::F32($arr) => ArrayData::F32($body),
            ArrayData::F64($arr) => ArrayData::F64($body),
        }
    };
}

pub(crate) use with_array;

impl ArrayData {
    #[must_use]
    pub fn dtype(&self) -> DataType {
        match self {
            Self::I8(_) => DataType::I8,
            Self::U8(_) => DataType::U8,
            Self::I16(_) => DataType::I16,
            Self::U16(_) => DataType::U16,
            Self::I32(_) => DataType::I32,
            Self::U32(_) => DataType::U32,
            Self::I64(_) => DataType::I64,
            Self::U64(_) => DataType::U64,
            Self::F32(_) => DataType::F32,
            Self::F64(_) => DataType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        with_array!(self, a => a.ndim())
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element-wise widening copy used for arithmetic
    pub fn to_f64(&self) -> ArrayD<f64> {
        with_array!(self, a => a.mapv(|v| v as f64))
    }

    /// Keep only the first `n` entries along `axis` (clamped to the axis length)
    pub fn take_prefix(&self, axis: usize, n: usize) -> ArrayData {
        let end = n.min(self.shape()[axis]);
        map_array!(self, a => a.slice_axis(Axis(axis), Slice::from(0..end)).to_owned())
    }
}

macro_rules! impl_from_array {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$t>> for ArrayData {
                fn from(array: ArrayD<$t>) -> Self {
                    ArrayData::$variant(array)
                }
            }
        )*
    };
}

impl_from_array!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn classifies_nc_type_names() {
        assert_eq!(DataType::from_nc_type_name("Float(F32)"), Some(DataType::F32));
        assert_eq!(DataType::from_nc_type_name("Float(F64)"), Some(DataType::F64));
        assert_eq!(DataType::from_nc_type_name("Int(U16)"), Some(DataType::U16));
        assert_eq!(DataType::from_nc_type_name("Int(I8)"), Some(DataType::I8));
        assert_eq!(DataType::from_nc_type_name("Basic(Double)"), Some(DataType::F64));
        assert_eq!(DataType::from_nc_type_name("Basic(Ushort)"), Some(DataType::U16));
        assert_eq!(DataType::from_nc_type_name("Basic(Short)"), Some(DataType::I16));
        assert_eq!(DataType::from_nc_type_name("String"), None);
    }

    #[test]
    fn take_prefix_clamps_to_axis_length() {
        let data: ArrayData = ArrayD::from_shape_vec(IxDyn(&[3, 2]), vec![1i32, 2, 3, 4, 5, 6])
            .unwrap()
            .into();

        let first_two = data.take_prefix(0, 2);
        assert_eq!(first_two.shape(), &[2, 2]);
        assert_eq!(first_two.dtype(), DataType::I32);

        let all = data.take_prefix(0, 10);
        assert_eq!(all, data);
    }
}
