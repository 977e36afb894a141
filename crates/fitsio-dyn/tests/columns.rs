//! Column reads and writes through the bridge against files on disk.

use fitsio_dyn::bintable::ColumnDef;
use fitsio_dyn::bridge::{
    column_descriptor, read_column, write_column, write_keyword, DynamicArray, DynamicType, ElementType, Error,
    FileHandle, KeywordValue, OpenMode, StorageType,
};

fn create_table(path: &std::path::Path, nrows: usize, columns: &[ColumnDef]) -> FileHandle {
    let mut h = FileHandle::open(path, OpenMode::CreateTruncating).unwrap();
    h.create_binary_table(nrows, columns, Some("DATA")).unwrap();
    h
}

fn reopen(path: &std::path::Path) -> FileHandle {
    let mut h = FileHandle::open(path, OpenMode::ReadOnly).unwrap();
    h.move_to_hdu(2).unwrap();
    h
}

#[test]
fn column_and_row_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let h = create_table(&dir.path().join("b.fits"), 10, &[ColumnDef::new("a", "1E"), ColumnDef::new("b", "2J")]);
    assert!(matches!(read_column(&h, 0, 1, 1), Err(Error::OutOfRange(_))));
    assert!(matches!(read_column(&h, 3, 1, 1), Err(Error::OutOfRange(_))));
    assert!(matches!(read_column(&h, 1, 11, 1), Err(Error::OutOfRange(_))));

    let clamped = read_column(&h, 2, 8, 50).unwrap();
    assert_eq!(clamped.shape(), &[3, 2]);
    assert_eq!(clamped.len(), 6);
}

#[test]
fn variable_length_rows_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("var.fits");
    let rows = vec![
        DynamicArray::from_vec(vec![1i32, -2, 3]),
        DynamicArray::from_vec(Vec::<i32>::new()),
        DynamicArray::from_vec(vec![10i32, 20, 30, 40, 50, 60, 70]),
    ];
    let mut h = create_table(&path, 3, &[ColumnDef::new("counts", "1PJ")]);
    write_column(&mut h, 1, 1, 1, &DynamicArray::nested(DynamicType::Int32, rows.clone())).unwrap();
    h.close().unwrap();

    let h = reopen(&path);
    assert_eq!(fitsio_dyn::bridge::read_key_string(&h, "TFORM1").unwrap(), "1PJ(7)");
    let read = read_column(&h, 1, 1, 3).unwrap();
    assert_eq!(read.element_type(), ElementType::ArrayOf(DynamicType::Int32));
    let lengths: Vec<usize> = read.rows().unwrap().iter().map(DynamicArray::len).collect();
    assert_eq!(lengths, vec![3, 0, 7]);
    assert_eq!(read.rows().unwrap(), &rows[..]);
}

#[test]
fn strings_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("str.fits");
    let mut h = create_table(&path, 2, &[ColumnDef::new("target", "10A")]);
    write_column(&mut h, 1, 1, 1, &DynamicArray::strings(vec!["NGC 1300".into(), "M 101".into()])).unwrap();
    h.close().unwrap();

    let h = reopen(&path);
    let read = read_column(&h, 1, 1, 2).unwrap();
    assert_eq!(read.as_strings().unwrap(), &["NGC 1300", "M 101"]);
}

#[test]
fn scaling_follows_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scaled.fits");
    let mut h = create_table(&path, 3, &[ColumnDef::new("plain", "1I"), ColumnDef::new("doubled", "1I")]);
    write_keyword(&mut h, "TSCAL2", &KeywordValue::Float(2.0), None).unwrap();
    write_keyword(&mut h, "TZERO2", &KeywordValue::Float(0.0), None).unwrap();
    write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![-1i16, 0, 1])).unwrap();
    write_column(&mut h, 2, 1, 1, &DynamicArray::from_vec(vec![-65536i32, 0, 65534])).unwrap();
    h.close().unwrap();

    let h = reopen(&path);
    assert_eq!(column_descriptor(&h, 1).unwrap().effective.storage, StorageType::Int16);
    assert_eq!(column_descriptor(&h, 2).unwrap().effective.storage, StorageType::Int32);
    assert_eq!(read_column(&h, 1, 1, 3).unwrap().as_slice::<i16>().unwrap(), &[-1, 0, 1]);
    assert_eq!(read_column(&h, 2, 1, 3).unwrap().as_slice::<i32>().unwrap(), &[-65536, 0, 65534]);
}

#[test]
fn bit_column_of_1024_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bits.fits");
    let mut h = create_table(&path, 1024, &[ColumnDef::new("x32", "32X"), ColumnDef::new("x8", "8X")]);
    let words: Vec<u32> = (1..=1024).collect();
    write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(words)).unwrap();
    write_column(&mut h, 2, 1, 1, &DynamicArray::from_vec((1..=1024).map(|r| r as u8).collect::<Vec<u8>>())).unwrap();
    h.close().unwrap();

    let h = reopen(&path);
    let x32 = read_column(&h, 1, 500, 1).unwrap();
    assert_eq!(x32.as_slice::<u32>().unwrap(), &[500]);
    let x8 = read_column(&h, 2, 1, 1024).unwrap();
    assert_eq!(x8.as_slice::<u8>().unwrap()[299], (300 % 256) as u8);
}

#[test]
fn read_only_file_rejects_column_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.fits");
    create_table(&path, 1, &[ColumnDef::new("a", "1D")]).close().unwrap();

    let mut h = reopen(&path);
    let e = write_column(&mut h, 1, 1, 1, &DynamicArray::from_vec(vec![1.0f64])).unwrap_err();
    assert_eq!(e.status(), fitsio_dyn::status::READONLY_FILE);
}
