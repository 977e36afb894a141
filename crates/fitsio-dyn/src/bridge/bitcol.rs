//! Bit-vector columns of 8, 16 or 32 bits, moved as whole host integers.
//!
//! On disk the bits are packed MSB first, which for a full-width column is
//! the big-endian image of the integer. Writes go through a temporary
//! reinterpretation of the column as a byte array.

use std::ops::{Deref, DerefMut};

use bytemuck::{cast_slice, pod_collect_to_vec};

use crate::bintable::{BinTable, BinaryColumnType};
use crate::endian::{be_to_native_in_place, native_to_be, ByteOrder};

use super::dynamic::{DynamicArray, DynamicElement, DynamicType};
use super::errors::{Error, Result};
use super::typemap::{map_storage_to_dynamic, ColumnType, StorageType};

/// Restores a column's declared type, repeat and width when dropped.
struct LayoutOverride<'a> {
    table: &'a mut BinTable,
    col: usize,
    saved: (BinaryColumnType, usize, usize),
}

impl<'a> LayoutOverride<'a> {
    /// View column `col` as `bytes_per_row` plain bytes per row.
    fn as_bytes(table: &'a mut BinTable, col: usize, bytes_per_row: usize) -> Result<Self> {
        let layout = table.column_mut(col)?;
        let saved = (layout.datatype, layout.repeat, layout.width);
        layout.datatype = BinaryColumnType::Byte;
        layout.repeat = bytes_per_row;
        layout.width = 1;
        Ok(LayoutOverride { table, col, saved })
    }
}

impl Deref for LayoutOverride<'_> {
    type Target = BinTable;

    fn deref(&self) -> &BinTable {
        self.table
    }
}

impl DerefMut for LayoutOverride<'_> {
    fn deref_mut(&mut self) -> &mut BinTable {
        self.table
    }
}

impl Drop for LayoutOverride<'_> {
    fn drop(&mut self) {
        if let Ok(layout) = self.table.column_mut(self.col) {
            (layout.datatype, layout.repeat, layout.width) = self.saved;
        }
    }
}

fn check_element_size(size: usize) -> Result<()> {
    match size {
        1 | 2 | 4 => Ok(()),
        other => Err(Error::UnsupportedBitWidth(8 * other)),
    }
}

/// Big-endian bytes of native words; a copy when the host is big-endian.
pub fn pack_words(native: &[u8], element_size: usize, host: ByteOrder) -> Result<Vec<u8>> {
    check_element_size(element_size)?;
    Ok(native_to_be(native, element_size, host))
}

/// Turn big-endian words into native order in place.
pub fn unpack_words(buf: &mut [u8], element_size: usize, host: ByteOrder) -> Result<()> {
    check_element_size(element_size)?;
    be_to_native_in_place(buf, element_size, host);
    Ok(())
}

/// Write one integer per row into a bit column whose width equals the
/// integer's width in bits.
pub fn write_bit_column<T: DynamicElement>(
    table: &mut BinTable,
    col: usize,
    first_row: usize,
    first_elem: usize,
    values: &[T],
) -> Result<()> {
    write_bit_column_as(table, col, first_row, first_elem, values, ByteOrder::host())
}

pub(crate) fn write_bit_column_as<T: DynamicElement>(
    table: &mut BinTable,
    col: usize,
    first_row: usize,
    first_elem: usize,
    values: &[T],
    host: ByteOrder,
) -> Result<()> {
    if matches!(T::TYPE, DynamicType::Float32 | DynamicType::Float64) {
        return Err(Error::UnsupportedElementType(T::TYPE.name().to_string()));
    }
    let element_size = std::mem::size_of::<T>();
    let repeat = table.column(col)?.repeat;
    if 8 * element_size != repeat {
        return Err(Error::BitWidthMismatch {
            repeat,
            element_bits: 8 * element_size,
        });
    }
    let bytes = pack_words(cast_slice(values), element_size, host)?;

    tracing::trace!(col, first_row, rows = values.len(), element_size, "writing bit column");
    let mut table = LayoutOverride::as_bytes(table, col, element_size)?;
    table.write_col::<u8>(col, first_row, first_elem, &bytes)?;
    Ok(())
}

/// Read `num_rows` rows of an 8, 16 or 32 bit column, one integer per row.
pub fn read_bit_column(table: &BinTable, col: usize, first_row: usize, num_rows: usize) -> Result<DynamicArray> {
    read_bit_column_as(table, col, first_row, num_rows, ByteOrder::host())
}

pub(crate) fn read_bit_column_as(
    table: &BinTable,
    col: usize,
    first_row: usize,
    num_rows: usize,
    host: ByteOrder,
) -> Result<DynamicArray> {
    let layout = table.column(col)?;
    let column = ColumnType {
        storage: StorageType::BitVector,
        variable: false,
    };
    let (element, _) = map_storage_to_dynamic(column, layout.repeat)?;
    let element_size = layout.repeat / 8;

    let mut bytes = table.read_cells(col, first_row, num_rows)?;
    unpack_words(&mut bytes, element_size, host)?;

    Ok(match element {
        DynamicType::Int16 => DynamicArray::from_vec(pod_collect_to_vec::<u8, i16>(&bytes)),
        DynamicType::UInt32 => DynamicArray::from_vec(pod_collect_to_vec::<u8, u32>(&bytes)),
        _ => DynamicArray::from_vec(bytes),
    })
}
