//! Images and columns written through the bridge, flushed to disk and read
//! back from a fresh handle.

use fitsio_dyn::bridge::{
    read_image, write_image, DynamicArray, DynamicElement, DynamicType, ElementType, FileHandle, OpenMode,
};

fn shapes() -> [Vec<usize>; 3] {
    [vec![7], vec![3, 5], vec![2, 3, 4]]
}

fn round_trip_images<T, F>(make: F)
where
    T: DynamicElement,
    F: Fn(usize) -> T,
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("images.fits");
    let arrays: Vec<DynamicArray> = shapes()
        .into_iter()
        .map(|shape| {
            let n = shape.iter().product();
            DynamicArray::from_shape_vec(shape, (0..n).map(&make).collect()).unwrap()
        })
        .collect();

    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    for a in &arrays {
        write_image(&mut h, a).unwrap();
    }
    h.close().unwrap();

    let mut h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(h.num_hdus().unwrap(), arrays.len());
    for (i, expected) in arrays.iter().enumerate() {
        h.move_to_hdu(i + 1).unwrap();
        let read = read_image(&h).unwrap();
        assert_eq!(read.shape(), expected.shape());
        assert_eq!(read.element_type(), ElementType::Scalar(T::TYPE));
        assert_eq!(read.as_slice::<T>().unwrap(), expected.as_slice::<T>().unwrap());
    }
}

#[test]
fn byte_images() {
    round_trip_images(|i| (i * 37 % 256) as u8);
}

#[test]
fn short_images() {
    round_trip_images(|i| (i as i16 - 12) * 1000);
}

#[test]
fn int_images() {
    round_trip_images(|i| (i as i32 - 5) * 100_000_007);
}

#[test]
fn float_images() {
    round_trip_images(|i| i as f32 * -0.125 + f32::EPSILON);
}

#[test]
fn double_images() {
    round_trip_images(|i| (i as f64).sqrt() * 1e-300);
}

#[test]
fn float_bits_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nan.fits");
    let values = vec![f32::NAN, f32::INFINITY, -0.0, f32::MIN_POSITIVE];

    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_vec(values.clone())).unwrap();
    drop(h);

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    let read = read_image(&h).unwrap();
    let bits: Vec<u32> = read.as_slice::<f32>().unwrap().iter().map(|v| v.to_bits()).collect();
    let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, expected);
}

#[test]
fn image_header_matches_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("axes.fits");
    let mut h = FileHandle::open(&path, OpenMode::CreateTruncating).unwrap();
    write_image(&mut h, &DynamicArray::from_shape_vec(vec![4, 9], vec![0u16; 36]).unwrap()).unwrap();
    h.close().unwrap();

    let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(fitsio_dyn::bridge::read_key_integer(&h, "NAXIS1").unwrap(), 9);
    assert_eq!(fitsio_dyn::bridge::read_key_integer(&h, "NAXIS2").unwrap(), 4);
    assert_eq!(fitsio_dyn::bridge::read_key_integer(&h, "BITPIX").unwrap(), 16);
    let read = read_image(&h).unwrap();
    assert_eq!(read.element_type(), ElementType::Scalar(DynamicType::UInt16));
    assert_eq!(read.shape(), &[4, 9]);
}
