//! Whole-image transfers between the current image HDU and dynamic arrays.
//!
//! Stored axis order (NAXIS1 fastest) is the reverse of array order, so the
//! shape of a read image is `[NAXISn, ..., NAXIS1]` and a written array's
//! last dimension becomes NAXIS1.

use crate::convert::Scaling;
use crate::value::Value;

use super::dynamic::{for_numeric_type, ArrayData, DynamicArray, DynamicElement, DynamicType, ElementType};
use super::errors::{Error, Result};
use super::handle::FileHandle;

/// Highest image rank read or written.
pub const MAX_RANK: usize = 7;

/// Element type an image is read as.
///
/// The conventional unsigned offsets (BZERO of 2^15 or 2^31, and -128 for
/// signed bytes) select the matching integer type. Any other scaling of an
/// integer image reads as `Float64`.
pub fn image_element_type(bitpix: i64, scaling: Scaling) -> DynamicType {
    let offset = |zero: f64| scaling.scale == 1.0 && scaling.zero == zero;
    let scaled = !scaling.is_identity();
    match bitpix {
        8 if offset(-128.0) => DynamicType::Int8,
        16 if offset(32768.0) => DynamicType::UInt16,
        32 if offset(2147483648.0) => DynamicType::UInt32,
        8 | 16 | 32 | 64 if scaled => DynamicType::Float64,
        8 => DynamicType::Byte,
        16 => DynamicType::Int16,
        32 => DynamicType::Int32,
        64 => DynamicType::Int64,
        -64 => DynamicType::Float64,
        _ => DynamicType::Float32,
    }
}

/// BITPIX and BZERO used to store an element type.
fn storage_for(element: DynamicType) -> Result<(i64, Option<f64>)> {
    Ok(match element {
        DynamicType::Byte => (8, None),
        DynamicType::Int8 | DynamicType::Int16 => (16, None),
        DynamicType::UInt16 => (16, Some(32768.0)),
        DynamicType::Int32 => (32, None),
        DynamicType::UInt32 => (32, Some(2147483648.0)),
        DynamicType::Int64 => (64, None),
        DynamicType::Float32 => (-32, None),
        DynamicType::Float64 => (-64, None),
        DynamicType::String => return Err(crate::Error::BadDataType("string image").into()),
        DynamicType::UInt64 => return Err(Error::UnsupportedElementType(element.name().to_string())),
    })
}

/// Read every pixel of the current image HDU.
pub fn read_image(handle: &FileHandle) -> Result<DynamicArray> {
    let image = handle.file()?.image()?;
    let naxes = image.naxes();
    if naxes.len() > MAX_RANK {
        return Err(Error::UnsupportedRank(naxes.len()));
    }
    let shape: Vec<usize> = if naxes.is_empty() {
        vec![0]
    } else {
        naxes.iter().rev().copied().collect()
    };
    let element = image_element_type(image.bitpix(), image.scaling());
    let n = image.num_pixels();
    tracing::trace!(bitpix = image.bitpix(), ?shape, %element, "reading image");

    for_numeric_type!(
        element,
        T => {
            let pixels = if n == 0 { Vec::new() } else { image.read_pixels::<T>(1, n)? };
            DynamicArray::from_shape_vec(shape, pixels)
        },
        String => Err(Error::TypeMismatch(String::from("string image")))
    )
}

/// Append a new image HDU shaped like `array` and fill it.
pub fn write_image(handle: &mut FileHandle, array: &DynamicArray) -> Result<()> {
    let rank = array.shape().len();
    if rank == 0 || rank > MAX_RANK {
        return Err(Error::UnsupportedRank(rank));
    }
    let element = match array.element_type() {
        ElementType::Scalar(t) => t,
        nested @ ElementType::ArrayOf(_) => return Err(Error::UnsupportedElementType(nested.to_string())),
    };
    let (bitpix, bzero) = storage_for(element)?;
    let naxes: Vec<usize> = array.shape().iter().rev().copied().collect();

    let file = handle.file_mut()?;
    file.create_image(bitpix, &naxes)?;
    if let Some(zero) = bzero {
        file.edit_header(|h| {
            h.update("BSCALE", Value::Float(1.0), Some("default scaling factor"))?;
            h.update("BZERO", Value::Float(zero), Some("offset data range to that of unsigned"))
        })?;
    }
    tracing::trace!(bitpix, ?naxes, %element, "writing image");

    let image = file.image_mut()?;
    if let ArrayData::Int8(values) = array.data() {
        let wide: Vec<i16> = values.iter().copied().map(i16::from).collect();
        return Ok(image.write_pixels(1, &wide)?);
    }
    for_numeric_type!(
        element,
        T => Ok(image.write_pixels(1, pixels_of::<T>(array)?)?),
        String => Err(Error::TypeMismatch(String::from("string image")))
    )
}

fn pixels_of<T: DynamicElement>(array: &DynamicArray) -> Result<&[T]> {
    array
        .as_slice::<T>()
        .ok_or_else(|| Error::TypeMismatch(format!("expected {} pixels", T::TYPE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::handle::OpenMode;

    fn new_file() -> (tempfile::TempDir, FileHandle) {
        let dir = tempfile::tempdir().unwrap();
        let h = FileHandle::open(dir.path().join("img.fits"), OpenMode::CreateTruncating).unwrap();
        (dir, h)
    }

    #[test]
    fn element_types_by_bitpix() {
        let id = Scaling::IDENTITY;
        assert_eq!(image_element_type(8, id), DynamicType::Byte);
        assert_eq!(image_element_type(16, id), DynamicType::Int16);
        assert_eq!(image_element_type(32, id), DynamicType::Int32);
        assert_eq!(image_element_type(-32, id), DynamicType::Float32);
        assert_eq!(image_element_type(-64, id), DynamicType::Float64);
        assert_eq!(image_element_type(16, Scaling { scale: 1.0, zero: 32768.0 }), DynamicType::UInt16);
        assert_eq!(image_element_type(16, Scaling { scale: 0.5, zero: 0.0 }), DynamicType::Float64);
        assert_eq!(image_element_type(-32, Scaling { scale: 0.5, zero: 0.0 }), DynamicType::Float32);
    }

    #[test]
    fn axes_are_reversed() {
        let (_dir, mut h) = new_file();
        let array = DynamicArray::from_shape_vec(vec![2, 3], (0..6).map(|i| i as f32).collect()).unwrap();
        write_image(&mut h, &array).unwrap();
        let naxes = h.file().unwrap().image().unwrap().naxes().to_vec();
        assert_eq!(naxes, vec![3, 2]);
        assert_eq!(read_image(&h).unwrap(), array);
    }

    #[test]
    fn second_write_appends_extension() {
        let (_dir, mut h) = new_file();
        write_image(&mut h, &DynamicArray::from_vec(vec![1u8, 2, 3])).unwrap();
        write_image(&mut h, &DynamicArray::from_vec(vec![1.5f64])).unwrap();
        assert_eq!(h.num_hdus().unwrap(), 2);
        assert_eq!(h.current_hdu_number().unwrap(), 2);
        assert!(h.file().unwrap().header().unwrap().contains("XTENSION"));
        h.move_to_hdu(1).unwrap();
        assert_eq!(read_image(&h).unwrap().as_slice::<u8>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn unsigned_types_use_offsets() {
        let (_dir, mut h) = new_file();
        let a16 = DynamicArray::from_vec(vec![0u16, 40000, 65535]);
        write_image(&mut h, &a16).unwrap();
        assert_eq!(h.file().unwrap().header().unwrap().float("BZERO").unwrap(), 32768.0);
        assert_eq!(read_image(&h).unwrap(), a16);

        let a32 = DynamicArray::from_vec(vec![0u32, 3_000_000_000, u32::MAX]);
        write_image(&mut h, &a32).unwrap();
        assert_eq!(read_image(&h).unwrap(), a32);
    }

    #[test]
    fn int8_widens_to_short() {
        let (_dir, mut h) = new_file();
        write_image(&mut h, &DynamicArray::from_vec(vec![-3i8, 4])).unwrap();
        assert_eq!(h.file().unwrap().image().unwrap().bitpix(), 16);
        assert_eq!(read_image(&h).unwrap().as_slice::<i16>().unwrap(), &[-3, 4]);
    }

    #[test]
    fn rejected_inputs() {
        let (_dir, mut h) = new_file();
        let deep = DynamicArray::from_shape_vec(vec![1; 8], vec![0u8]).unwrap();
        assert!(matches!(write_image(&mut h, &deep), Err(Error::UnsupportedRank(8))));
        assert!(matches!(
            write_image(&mut h, &DynamicArray::from_vec(vec![1u64])),
            Err(Error::UnsupportedElementType(_))
        ));
        let e = write_image(&mut h, &DynamicArray::strings(vec!["a".into()])).unwrap_err();
        assert_eq!(e.status(), crate::status::BAD_DATATYPE);
        assert_eq!(h.num_hdus().unwrap(), 0);
    }

    #[test]
    fn deep_stored_image_is_rejected() {
        let (_dir, mut h) = new_file();
        h.create_image(8, &[1; 8]).unwrap();
        assert!(matches!(read_image(&h), Err(Error::UnsupportedRank(8))));
    }

    #[test]
    fn empty_primary_reads_as_empty() {
        let (_dir, mut h) = new_file();
        h.create_image(8, &[]).unwrap();
        let a = read_image(&h).unwrap();
        assert_eq!(a.shape(), &[0]);
        assert!(a.is_empty());
    }
}
