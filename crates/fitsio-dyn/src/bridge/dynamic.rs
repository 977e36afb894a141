//! Host-side generic arrays: an element type tag, a shape and a payload.

use std::fmt;

use crate::convert::Element;

use super::errors::{Error, Result};

/// Element type of a dynamic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicType {
    Int8,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
}

impl DynamicType {
    pub fn name(self) -> &'static str {
        match self {
            DynamicType::Int8 => "Int8",
            DynamicType::Byte => "UChar",
            DynamicType::Int16 => "Int16",
            DynamicType::UInt16 => "UInt16",
            DynamicType::Int32 => "Int32",
            DynamicType::UInt32 => "UInt32",
            DynamicType::Int64 => "Int64",
            DynamicType::UInt64 => "UInt64",
            DynamicType::Float32 => "Float32",
            DynamicType::Float64 => "Float64",
            DynamicType::String => "String",
        }
    }
}

impl fmt::Display for DynamicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The element type of a [`DynamicArray`]: plain values, or per-row arrays
/// of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar(DynamicType),
    ArrayOf(DynamicType),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Scalar(t) => write!(f, "{t}"),
            ElementType::ArrayOf(t) => write!(f, "Array_Type[{t}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int8(Vec<i8>),
    Byte(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<String>),
    /// One independently shaped array per row.
    Nested {
        element: DynamicType,
        rows: Vec<DynamicArray>,
    },
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int8(v) => v.len(),
            ArrayData::Byte(v) => v.len(),
            ArrayData::Int16(v) => v.len(),
            ArrayData::UInt16(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
            ArrayData::UInt32(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::UInt64(v) => v.len(),
            ArrayData::Float32(v) => v.len(),
            ArrayData::Float64(v) => v.len(),
            ArrayData::String(v) => v.len(),
            ArrayData::Nested { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        let scalar = match self {
            ArrayData::Int8(_) => DynamicType::Int8,
            ArrayData::Byte(_) => DynamicType::Byte,
            ArrayData::Int16(_) => DynamicType::Int16,
            ArrayData::UInt16(_) => DynamicType::UInt16,
            ArrayData::Int32(_) => DynamicType::Int32,
            ArrayData::UInt32(_) => DynamicType::UInt32,
            ArrayData::Int64(_) => DynamicType::Int64,
            ArrayData::UInt64(_) => DynamicType::UInt64,
            ArrayData::Float32(_) => DynamicType::Float32,
            ArrayData::Float64(_) => DynamicType::Float64,
            ArrayData::String(_) => DynamicType::String,
            ArrayData::Nested { element, .. } => return ElementType::ArrayOf(*element),
        };
        ElementType::Scalar(scalar)
    }
}

/// Numeric host types that can back a [`DynamicArray`].
pub trait DynamicElement: Element {
    const TYPE: DynamicType;
    fn wrap(values: Vec<Self>) -> ArrayData;
    fn slice(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! dynamic_element {
    ($($t:ty => $variant:ident),*) => {$(
        impl DynamicElement for $t {
            const TYPE: DynamicType = DynamicType::$variant;

            fn wrap(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn slice(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

dynamic_element!(
    i8 => Int8,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64
);

/// Run `$body` with `$T` bound to the host type of a numeric
/// [`DynamicType`]; `String` takes the fallback arm.
macro_rules! for_numeric_type {
    ($ty:expr, $T:ident => $body:expr, String => $fallback:expr) => {
        match $ty {
            $crate::bridge::dynamic::DynamicType::Int8 => {
                type $T = i8;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Byte => {
                type $T = u8;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Int16 => {
                type $T = i16;
                $body
            }
            $crate::bridge::dynamic::DynamicType::UInt16 => {
                type $T = u16;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Int32 => {
                type $T = i32;
                $body
            }
            $crate::bridge::dynamic::DynamicType::UInt32 => {
                type $T = u32;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::bridge::dynamic::DynamicType::UInt64 => {
                type $T = u64;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Float32 => {
                type $T = f32;
                $body
            }
            $crate::bridge::dynamic::DynamicType::Float64 => {
                type $T = f64;
                $body
            }
            $crate::bridge::dynamic::DynamicType::String => $fallback,
        }
    };
}

pub(crate) use for_numeric_type;

/// A generic, self-describing array.
///
/// For plain data the shape's product equals the element count. For string
/// and nested data the shape is `[rows]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl DynamicArray {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::TypeMismatch(format!(
                "shape {shape:?} does not hold {} elements",
                data.len()
            )));
        }
        Ok(DynamicArray { shape, data })
    }

    /// A one-dimensional array.
    pub fn from_vec<T: DynamicElement>(values: Vec<T>) -> Self {
        DynamicArray {
            shape: vec![values.len()],
            data: T::wrap(values),
        }
    }

    pub fn from_shape_vec<T: DynamicElement>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        DynamicArray::new(shape, T::wrap(values))
    }

    pub fn strings(values: Vec<String>) -> Self {
        DynamicArray {
            shape: vec![values.len()],
            data: ArrayData::String(values),
        }
    }

    pub fn nested(element: DynamicType, rows: Vec<DynamicArray>) -> Self {
        DynamicArray {
            shape: vec![rows.len()],
            data: ArrayData::Nested { element, rows },
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    /// The payload as a typed slice, if `T` is the element type.
    pub fn as_slice<T: DynamicElement>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self.data {
            ArrayData::String(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn rows(&self) -> Option<&[DynamicArray]> {
        match self.data {
            ArrayData::Nested { ref rows, .. } => Some(rows),
            _ => None,
        }
    }
}
