//! Dynamically typed access to tables, images and keywords.
//!
//! Every operation takes a [`FileHandle`] and moves data as
//! [`DynamicArray`] values whose element type is decided at run time from
//! the stored column or image type.

pub mod bitcol;
pub mod columns;
pub mod dynamic;
pub mod errors;
pub mod handle;
pub mod images;
pub mod keywords;
pub mod typemap;

#[cfg(feature = "array")]
pub mod ndarray_compat;

pub use columns::{column_descriptor, read_column, write_column};
pub use dynamic::{ArrayData, DynamicArray, DynamicElement, DynamicType, ElementType};
pub use errors::{Error, Result, BRIDGE_STATUS};
pub use handle::{FileHandle, OpenMode};
pub use images::{read_image, write_image, MAX_RANK};
pub use keywords::{
    delete_key, error_status_text, key_type, modify_name, num_keys, read_key_double, read_key_integer,
    read_key_string, read_keyword, read_record, write_comment, write_date, write_history, write_keyword,
    write_logical_keyword, KeywordType, KeywordValue,
};
pub use typemap::{infer_effective_type, map_dynamic_to_storage, map_storage_to_dynamic, ColumnDescriptor, ColumnType, StorageType};

/// Version string of the bridge.
pub const VERSION: &str = "0.1.0";

/// Numeric interface version; bumped when the operations change shape.
pub const MODULE_VERSION: i32 = 100;
