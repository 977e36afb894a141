//! Mapping between on-disk storage types and dynamic element types, and
//! logical-type inference for scaled integer columns.

use crate::bintable::{BinaryColumnType, ColumnLayout};
use crate::convert::Scaling;

use super::dynamic::DynamicType;
use super::errors::{Error, Result};

/// Storage class of a column or image as the bridge sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Logical,
    BitVector,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    Float32,
    Float64,
    FixedString,
    Complex,
    DoubleComplex,
}

impl StorageType {
    pub fn name(self) -> &'static str {
        match self {
            StorageType::Logical => "logical",
            StorageType::BitVector => "bit",
            StorageType::Byte => "byte",
            StorageType::Int16 => "short",
            StorageType::UInt16 => "unsigned short",
            StorageType::Int32 => "long",
            StorageType::UInt32 => "unsigned long",
            StorageType::Int64 => "long long",
            StorageType::Float32 => "float",
            StorageType::Float64 => "double",
            StorageType::FixedString => "string",
            StorageType::Complex => "complex",
            StorageType::DoubleComplex => "double complex",
        }
    }
}

impl From<BinaryColumnType> for StorageType {
    fn from(ty: BinaryColumnType) -> Self {
        match ty {
            BinaryColumnType::Logical => StorageType::Logical,
            BinaryColumnType::Bit => StorageType::BitVector,
            BinaryColumnType::Byte => StorageType::Byte,
            BinaryColumnType::Short => StorageType::Int16,
            BinaryColumnType::Int => StorageType::Int32,
            BinaryColumnType::Long => StorageType::Int64,
            BinaryColumnType::Float => StorageType::Float32,
            BinaryColumnType::Double => StorageType::Float64,
            BinaryColumnType::ComplexFloat => StorageType::Complex,
            BinaryColumnType::ComplexDouble => StorageType::DoubleComplex,
            BinaryColumnType::Ascii => StorageType::FixedString,
        }
    }
}

/// A column's storage type together with whether it is stored as
/// variable-length arrays in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    pub storage: StorageType,
    pub variable: bool,
}

/// Declared and effective types of one table column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// 1-based column number.
    pub col: usize,
    pub declared: ColumnType,
    /// Element count per row; bits for bit columns, 1 for variable-length columns.
    pub repeat: usize,
    /// Bytes per element.
    pub width: usize,
    /// Declared type refined by [`infer_effective_type`].
    pub effective: ColumnType,
    pub scaling: Scaling,
}

impl ColumnDescriptor {
    pub fn from_layout(col: usize, layout: &ColumnLayout) -> Self {
        let declared = ColumnType {
            storage: layout.datatype.into(),
            variable: layout.is_variable(),
        };
        ColumnDescriptor {
            col,
            declared,
            repeat: layout.repeat,
            width: layout.width,
            effective: ColumnType {
                storage: infer_effective_type(declared.storage, layout.scaling),
                variable: declared.variable,
            },
            scaling: layout.scaling,
        }
    }
}

/// Map a storage type to the dynamic element type it is read as, and the
/// repeat count to use on the dynamic side.
///
/// The variable-length flag plays no part. Bit vectors of 8, 16 or 32 bits
/// become a single byte, short or unsigned long per row.
pub fn map_storage_to_dynamic(column: ColumnType, repeat: usize) -> Result<(DynamicType, usize)> {
    let element = match column.storage {
        StorageType::BitVector => {
            let element = match repeat {
                8 => DynamicType::Byte,
                16 => DynamicType::Int16,
                32 => DynamicType::UInt32,
                other => return Err(Error::UnsupportedBitWidth(other)),
            };
            return Ok((element, 1));
        }
        StorageType::Logical | StorageType::Byte => DynamicType::Byte,
        StorageType::Int16 => DynamicType::Int16,
        StorageType::UInt16 => DynamicType::UInt16,
        StorageType::Int32 => DynamicType::Int32,
        StorageType::UInt32 => DynamicType::UInt32,
        StorageType::Int64 => DynamicType::Int64,
        StorageType::Float32 => DynamicType::Float32,
        StorageType::Float64 => DynamicType::Float64,
        StorageType::FixedString => DynamicType::String,
        StorageType::Complex | StorageType::DoubleComplex => {
            return Err(Error::UnsupportedStorageType(column.storage.name().to_string()))
        }
    };
    Ok((element, repeat))
}

/// Storage type used to carry a dynamic element type into a column or image.
///
/// `Int8` widens to `Int16`; `UInt64` has no storage type.
pub fn map_dynamic_to_storage(ty: DynamicType) -> Result<StorageType> {
    match ty {
        DynamicType::Byte => Ok(StorageType::Byte),
        DynamicType::Int8 | DynamicType::Int16 => Ok(StorageType::Int16),
        DynamicType::UInt16 => Ok(StorageType::UInt16),
        DynamicType::Int32 => Ok(StorageType::Int32),
        DynamicType::UInt32 => Ok(StorageType::UInt32),
        DynamicType::Int64 => Ok(StorageType::Int64),
        DynamicType::Float32 => Ok(StorageType::Float32),
        DynamicType::Float64 => Ok(StorageType::Float64),
        DynamicType::String => Ok(StorageType::FixedString),
        DynamicType::UInt64 => Err(Error::UnsupportedElementType(ty.name().to_string())),
    }
}

/// Refine a declared 16- or 32-bit integer type to the narrowest type that
/// holds every physical value `zero + scale * stored`.
///
/// The 32-bit checks test only the lower end of the range.
pub fn infer_effective_type(declared: StorageType, scaling: Scaling) -> StorageType {
    let (native_min, native_max) = match declared {
        StorageType::Int16 => (-32768.0, 32767.0),
        StorageType::Int32 => (-2147483648.0, 2147483647.0),
        other => return other,
    };

    let mut min_val = scaling.zero + scaling.scale * native_min;
    let mut max_val = scaling.zero + scaling.scale * native_max;
    if min_val > max_val {
        std::mem::swap(&mut min_val, &mut max_val);
    }

    if min_val >= -32768.0 && max_val <= 32767.0 {
        StorageType::Int16
    } else if min_val >= 0.0 && max_val <= 65535.0 {
        StorageType::UInt16
    } else if (-2147483648.0..=2147483648.0).contains(&min_val) {
        StorageType::Int32
    } else if (0.0..=4294967295.0).contains(&min_val) {
        StorageType::UInt32
    } else {
        StorageType::Float64
    }
}
