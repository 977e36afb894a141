//! Keyword access through the bridge, across a flush and reopen.

use fitsio_dyn::bridge::{
    key_type, read_keyword, write_image, write_keyword, write_logical_keyword, DynamicArray, FileHandle,
    KeywordType, KeywordValue, OpenMode,
};

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.fits");
    let long = "The quick brown fox jumps over the lazy dog; ".repeat(5) + "done";

    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![0u8; 8])).unwrap();
    write_keyword(&mut h, "OBSERVER", &KeywordValue::String("E. Hubble".into()), Some("who")).unwrap();
    write_keyword(&mut h, "NOTES", &KeywordValue::String(long.clone()), None).unwrap();
    write_keyword(&mut h, "EXPOSURE", &KeywordValue::Float(1.25e3), None).unwrap();
    write_keyword(&mut h, "NCOMBINE", &KeywordValue::Integer(-12), None).unwrap();
    write_keyword(&mut h, "PENDING", &KeywordValue::Null, Some("filled in later")).unwrap();
    write_logical_keyword(&mut h, "CALIB", false, None).unwrap();
    h.close().unwrap();

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(
        read_keyword(&h, "OBSERVER", None).unwrap(),
        (KeywordValue::String("E. Hubble".into()), Some(String::from("who")))
    );
    assert_eq!(read_keyword(&h, "NOTES", None).unwrap().0, KeywordValue::String(long));
    assert_eq!(read_keyword(&h, "EXPOSURE", None).unwrap().0, KeywordValue::Float(1250.0));
    assert_eq!(read_keyword(&h, "NCOMBINE", None).unwrap().0, KeywordValue::Integer(-12));
    assert_eq!(read_keyword(&h, "CALIB", None).unwrap().0, KeywordValue::Integer(0));
    assert_eq!(key_type(&h, "NOTES").unwrap(), KeywordType::String);

    let e = read_keyword(&h, "PENDING", None).unwrap_err();
    assert_eq!(e.status(), fitsio_dyn::status::VALUE_UNDEFINED);
    let e = read_keyword(&h, "MISSING", None).unwrap_err();
    assert_eq!(e.status(), fitsio_dyn::status::KEY_NO_EXIST);
}

#[test]
fn complex_cards_read_as_complex() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cplx.fits");
    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(vec![0u8])).unwrap();
    h.close().unwrap();

    // Complex values can only be written through the format layer.
    let mut f = fitsio_dyn::fitsfile::FitsFile::open(&path, fitsio_dyn::fitsfile::IoMode::ReadWrite).unwrap();
    f.edit_header(|hdr| hdr.update("IMPED", fitsio_dyn::value::Value::ComplexFloat(50.0, -0.5), None))
        .unwrap();
    f.close().unwrap();

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(key_type(&h, "IMPED").unwrap(), KeywordType::Complex);
    assert_eq!(read_keyword(&h, "IMPED", None).unwrap().0, KeywordValue::Complex(50.0, -0.5));
}
