//! Row-range reads and writes of binary table columns as dynamic arrays.

use crate::bintable::BinTable;

use super::bitcol::{read_bit_column, write_bit_column};
use super::dynamic::{for_numeric_type, ArrayData, DynamicArray, DynamicElement, DynamicType, ElementType};
use super::errors::{Error, Result};
use super::handle::FileHandle;
use super::typemap::{map_dynamic_to_storage, map_storage_to_dynamic, ColumnDescriptor, StorageType};

/// Declared and effective types of column `col` in the current table.
pub fn column_descriptor(handle: &FileHandle, col: usize) -> Result<ColumnDescriptor> {
    let table = handle.file()?.table()?;
    Ok(ColumnDescriptor::from_layout(col, table.column(col)?))
}

/// Read `num_rows` rows of column `col` starting at `first_row`.
///
/// A request running past the last row is cut short. Fixed-width numeric
/// columns come back as `[rows]` or `[rows, repeat]`; string, bit and
/// variable-length columns as one element per row.
pub fn read_column(handle: &FileHandle, col: usize, first_row: usize, num_rows: usize) -> Result<DynamicArray> {
    let table = handle.file()?.table()?;
    if num_rows == 0 {
        return Err(Error::OutOfRange("row count"));
    }
    if col == 0 || col > table.num_cols() {
        return Err(Error::OutOfRange("column number"));
    }
    let nrows = table.num_rows();
    if first_row == 0 || first_row > nrows {
        return Err(Error::OutOfRange("first row"));
    }
    let num_rows = num_rows.min(nrows - first_row + 1);

    let desc = ColumnDescriptor::from_layout(col, table.column(col)?);
    tracing::trace!(col, first_row, num_rows, storage = desc.effective.storage.name(), "reading column");

    if desc.declared.storage == StorageType::FixedString {
        let strings = (first_row..first_row + num_rows)
            .map(|row| table.read_string(col, row))
            .collect::<crate::Result<Vec<_>>>()?;
        return Ok(DynamicArray::strings(strings));
    }
    if desc.declared.variable {
        return read_variable_rows(table, &desc, first_row, num_rows);
    }
    if desc.declared.storage == StorageType::BitVector {
        return read_bit_column(table, col, first_row, num_rows);
    }

    let (element, repeat) = map_storage_to_dynamic(desc.effective, desc.repeat)?;
    let shape = if repeat == 1 { vec![num_rows] } else { vec![num_rows, repeat] };
    for_numeric_type!(
        element,
        T => {
            let values = table.read_col::<T>(col, first_row, 1, num_rows * repeat)?;
            DynamicArray::from_shape_vec(shape, values)
        },
        String => Err(Error::TypeMismatch(format!("column {col} holds strings")))
    )
}

fn read_variable_rows(
    table: &BinTable,
    desc: &ColumnDescriptor,
    first_row: usize,
    num_rows: usize,
) -> Result<DynamicArray> {
    let (element, _) = map_storage_to_dynamic(desc.effective, 1)?;
    let mut rows = Vec::with_capacity(num_rows);
    for row in first_row..first_row + num_rows {
        let array = for_numeric_type!(
            element,
            T => DynamicArray::from_vec(table.read_var::<T>(desc.col, row)?),
            String => return Err(Error::TypeMismatch(format!("column {} holds strings", desc.col)))
        );
        rows.push(array);
    }
    Ok(DynamicArray::nested(element, rows))
}

/// Write `array` into column `col` starting at (`first_row`, `first_elem`).
///
/// The transfer type follows the array's element type. Strings fill one row
/// each and nested arrays replace one variable-length row each. Bit columns
/// take one integer per row whose width matches the column.
pub fn write_column(
    handle: &mut FileHandle,
    col: usize,
    first_row: usize,
    first_elem: usize,
    array: &DynamicArray,
) -> Result<()> {
    let table = handle.file_mut()?.table_mut()?;
    let declared: StorageType = table.column(col)?.datatype.into();
    tracing::trace!(col, first_row, first_elem, len = array.len(), element = %array.element_type(), "writing column");

    match array.data() {
        ArrayData::String(values) => {
            for (row, value) in (first_row..).zip(values) {
                table.write_string(col, row, value)?;
            }
            Ok(())
        }
        ArrayData::Nested { rows, .. } => {
            for (row, values) in (first_row..).zip(rows) {
                write_variable_row(table, col, row, values)?;
            }
            Ok(())
        }
        data => {
            let ElementType::Scalar(element) = data.element_type() else {
                return Err(Error::TypeMismatch(String::from("nested payload")));
            };
            map_dynamic_to_storage(element)?;
            if let ArrayData::Int8(values) = data {
                if declared == StorageType::BitVector {
                    return write_bit_column(table, col, first_row, first_elem, values);
                }
                let wide: Vec<i16> = values.iter().copied().map(i16::from).collect();
                return write_numeric(table, declared, col, first_row, first_elem, &wide);
            }
            for_numeric_type!(
                element,
                T => write_numeric(table, declared, col, first_row, first_elem, slice_of::<T>(array)?),
                String => Err(Error::TypeMismatch(String::from("string payload")))
            )
        }
    }
}

fn slice_of<T: DynamicElement>(array: &DynamicArray) -> Result<&[T]> {
    array
        .as_slice::<T>()
        .ok_or_else(|| Error::TypeMismatch(format!("expected {} elements, found {}", T::TYPE, array.element_type())))
}

fn write_numeric<T: DynamicElement>(
    table: &mut BinTable,
    declared: StorageType,
    col: usize,
    first_row: usize,
    first_elem: usize,
    values: &[T],
) -> Result<()> {
    if declared == StorageType::BitVector {
        return write_bit_column(table, col, first_row, first_elem, values);
    }
    Ok(table.write_col(col, first_row, first_elem, values)?)
}

fn write_variable_row(table: &mut BinTable, col: usize, row: usize, values: &DynamicArray) -> Result<()> {
    let ElementType::Scalar(element) = values.element_type() else {
        return Err(Error::TypeMismatch(String::from("variable-length rows must be flat")));
    };
    if element == DynamicType::Int8 {
        let wide: Vec<i16> = slice_of::<i8>(values)?.iter().copied().map(i16::from).collect();
        return Ok(table.write_var(col, row, &wide)?);
    }
    map_dynamic_to_storage(element)?;
    for_numeric_type!(
        element,
        T => Ok(table.write_var(col, row, slice_of::<T>(values)?)?),
        String => {
            let text = values.as_strings().and_then(|s| s.first()).map_or("", String::as_str);
            Ok(table.write_string(col, row, text)?)
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bintable::ColumnDef;
    use crate::bridge::handle::OpenMode;
    use crate::value::Value;

    fn table_file(nrows: usize, columns: &[ColumnDef]) -> (tempfile::TempDir, FileHandle) {
        let dir = tempfile::tempdir().unwrap();
        let mut h = FileHandle::open(dir.path().join("cols.fits"), OpenMode::CreateTruncating).unwrap();
        h.create_binary_table(nrows, columns, None).unwrap();
        (dir, h)
    }

    #[test]
    fn bounds_are_checked() {
        let (_dir, h) = table_file(5, &[ColumnDef::new("a", "1J")]);
        assert!(matches!(read_column(&h, 0, 1, 1), Err(Error::OutOfRange(_))));
        assert!(matches!(read_column(&h, 2, 1, 1), Err(Error::OutOfRange(_))));
        assert!(matches!(read_column(&h, 1, 6, 1), Err(Error::OutOfRange(_))));
        assert!(matches!(read_column(&h, 1, 0, 1), Err(Error::OutOfRange(_))));
        assert!(matches!(read_column(&h, 1, 1, 0), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn overlong_request_is_clamped() {
        let (_dir, mut h) = table_file(5, &[ColumnDef::new("a", "1J")]);
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![10i32, 20, 30, 40, 50])).unwrap();
        let a = read_column(&h, 1, 4, 100).unwrap();
        assert_eq!(a.shape(), &[2]);
        assert_eq!(a.as_slice::<i32>().unwrap(), &[40, 50]);
    }

    #[test]
    fn repeat_gives_two_dimensions() {
        let (_dir, mut h) = table_file(2, &[ColumnDef::new("v", "3D")]);
        let values = DynamicArray::from_shape_vec(vec![2, 3], vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        write_column(&mut h, 1, 1, 1, &values).unwrap();
        let a = read_column(&h, 1, 1, 2).unwrap();
        assert_eq!(a, values);
    }

    #[test]
    fn strings_one_per_row() {
        let (_dir, mut h) = table_file(3, &[ColumnDef::new("name", "8A")]);
        let names = DynamicArray::strings(vec!["vega".into(), "".into(), "betelgeuse".into()]);
        write_column(&mut h, 1, 1, 1, &names).unwrap();
        let a = read_column(&h, 1, 1, 3).unwrap();
        assert_eq!(a.shape(), &[3]);
        assert_eq!(a.as_strings().unwrap(), &["vega", "", "betelgeu"]);
    }

    #[test]
    fn variable_rows_keep_their_lengths() {
        let (_dir, mut h) = table_file(3, &[ColumnDef::new("spectrum", "1PE")]);
        let rows = vec![
            DynamicArray::from_vec(vec![1.0f32, 2.0, 3.0]),
            DynamicArray::from_vec(Vec::<f32>::new()),
            DynamicArray::from_vec((0..7).map(|i| i as f32 * 0.5).collect()),
        ];
        write_column(&mut h, 1, 1, 1, &DynamicArray::nested(DynamicType::Float32, rows.clone())).unwrap();

        let a = read_column(&h, 1, 1, 3).unwrap();
        assert_eq!(a.element_type(), ElementType::ArrayOf(DynamicType::Float32));
        let read = a.rows().unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[1].shape(), &[0]);
        assert_eq!(read, &rows[..]);
    }

    #[test]
    fn scaled_short_reads_unsigned() {
        let (_dir, mut h) = table_file(2, &[ColumnDef::new("u", "1I")]);
        h.file_mut()
            .unwrap()
            .edit_header(|hdr| hdr.update("TZERO1", Value::Float(32768.0), None))
            .unwrap();
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![0u16, 65535])).unwrap();
        let a = read_column(&h, 1, 1, 2).unwrap();
        assert_eq!(a.as_slice::<u16>().unwrap(), &[0, 65535]);
        assert_eq!(column_descriptor(&h, 1).unwrap().effective.storage, StorageType::UInt16);
    }

    #[test]
    fn doubled_short_reads_wider() {
        let (_dir, mut h) = table_file(1, &[ColumnDef::new("s", "1I")]);
        h.file_mut()
            .unwrap()
            .edit_header(|hdr| hdr.update("TSCAL1", Value::Float(2.0), None))
            .unwrap();
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![40000i32])).unwrap();
        let a = read_column(&h, 1, 1, 1).unwrap();
        assert_eq!(a.as_slice::<i32>().unwrap(), &[40000]);
    }

    #[test]
    fn int8_is_widened() {
        let (_dir, mut h) = table_file(2, &[ColumnDef::new("s", "1I")]);
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![-5i8, 7])).unwrap();
        assert_eq!(read_column(&h, 1, 1, 2).unwrap().as_slice::<i16>().unwrap(), &[-5, 7]);
    }

    #[test]
    fn uint64_is_rejected() {
        let (_dir, mut h) = table_file(1, &[ColumnDef::new("k", "1K")]);
        assert!(matches!(
            write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![1u64])),
            Err(Error::UnsupportedElementType(_))
        ));
    }

    #[test]
    fn bit_columns_go_through_the_codec() {
        let (_dir, mut h) = table_file(3, &[ColumnDef::new("flags", "16X")]);
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![1i16, -1, 0x0100])).unwrap();
        let a = read_column(&h, 1, 1, 3).unwrap();
        assert_eq!(a.as_slice::<i16>().unwrap(), &[1, -1, 0x0100]);
        assert!(matches!(
            write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![1u8])),
            Err(Error::BitWidthMismatch { repeat: 16, element_bits: 8 })
        ));
    }

    #[test]
    fn signed_bytes_fill_eight_bit_columns() {
        let (_dir, mut h) = table_file(2, &[ColumnDef::new("mask", "8X")]);
        write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![-1i8, 5])).unwrap();
        let a = read_column(&h, 1, 1, 2).unwrap();
        assert_eq!(a.as_slice::<u8>().unwrap(), &[0xff, 5]);
    }

    #[test]
    fn closed_handle_is_invalid() {
        let (_dir, mut h) = table_file(1, &[ColumnDef::new("a", "1J")]);
        h.close().unwrap();
        assert!(matches!(read_column(&h, 1, 1, 1), Err(Error::InvalidHandle)));
        assert!(matches!(
            write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![1i32])),
            Err(Error::InvalidHandle)
        ));
    }
}
