//! File handle lifetime.

use fitsio_dyn::bridge::{read_image, write_image, DynamicArray, Error, FileHandle, OpenMode};

#[test]
fn close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = FileHandle::open(dir.path().join("c.fits"), OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![1u8])).unwrap();
    h.close().unwrap();
    h.close().unwrap();
    assert!(matches!(read_image(&h), Err(Error::InvalidHandle)));
    assert!(matches!(h.num_hdus(), Err(Error::InvalidHandle)));
}

#[test]
fn dropping_the_handle_writes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drop.fits");
    {
        let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
        write_image(&mut h, &DynamicArray::from_vec(vec![3i16, 1, 4, 1, 5])).unwrap();
    }
    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(read_image(&h).unwrap().as_slice::<i16>().unwrap(), &[3, 1, 4, 1, 5]);
}

#[test]
fn create_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.fits");
    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![1.0f64, 2.0])).unwrap();
    h.close().unwrap();

    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![9u8])).unwrap();
    h.close().unwrap();

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(h.num_hdus().unwrap(), 1);
    assert_eq!(read_image(&h).unwrap().as_slice::<u8>().unwrap(), &[9]);
}

#[test]
fn delete_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("del.fits");
    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![0u8; 4])).unwrap();
    h.delete().unwrap();
    assert!(!path.exists());
    assert!(matches!(h.current_hdu_number(), Err(Error::InvalidHandle)));
}

#[test]
fn read_write_mode_updates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rw.fits");
    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![1i32])).unwrap();
    h.close().unwrap();

    let mut h = FileHandle::open(&path, OpenMode::ReadWrite).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![2i32])).unwrap();
    h.close().unwrap();

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(h.num_hdus().unwrap(), 2);
}
