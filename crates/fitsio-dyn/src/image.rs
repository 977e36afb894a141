//! Image pixel storage for primary arrays and IMAGE extensions.
//!
//! Pixels are kept as their big-endian on-disk bytes and converted on each
//! transfer. BSCALE/BZERO calibration is applied on the way in and out.

use bytemuck::{cast_slice, cast_slice_mut, pod_collect_to_vec};

use crate::bintable::BinaryColumnType;
use crate::convert::{read_element, write_element, Element, Scaling};
use crate::endian::{be_to_native_in_place, native_to_be, ByteOrder};
use crate::error::{Error, Result};
use crate::header::{Card, Header};
use crate::value::Value;

/// Maximum NAXIS the format allows.
pub const MAX_NAXIS: usize = 999;

/// Stored pixel type for a BITPIX value.
pub fn bitpix_storage(bitpix: i64) -> Result<BinaryColumnType> {
    match bitpix {
        8 => Ok(BinaryColumnType::Byte),
        16 => Ok(BinaryColumnType::Short),
        32 => Ok(BinaryColumnType::Int),
        64 => Ok(BinaryColumnType::Long),
        -32 => Ok(BinaryColumnType::Float),
        -64 => Ok(BinaryColumnType::Double),
        other => Err(Error::InvalidBitpix(other)),
    }
}

fn scaling_keyword(header: &Header, name: &str, default: f64) -> Result<f64> {
    match header.float(name) {
        Ok(v) => Ok(v),
        Err(Error::MissingKeyword(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

pub(crate) fn image_scaling(header: &Header) -> Result<Scaling> {
    Ok(Scaling {
        scale: scaling_keyword(header, "BSCALE", 1.0)?,
        zero: scaling_keyword(header, "BZERO", 0.0)?,
    })
}

/// Axis lengths in format order (NAXIS1 first).
pub fn read_naxes(header: &Header) -> Result<Vec<usize>> {
    let naxis = header.integer("NAXIS")?;
    if !(0..=MAX_NAXIS as i64).contains(&naxis) {
        return Err(Error::InvalidNaxis(naxis));
    }
    (1..=naxis as usize)
        .map(|i| {
            let len = header.integer(&format!("NAXIS{i}"))?;
            usize::try_from(len).map_err(|_| Error::BadDimension(i))
        })
        .collect()
}

fn pixel_count(naxes: &[usize]) -> Option<usize> {
    if naxes.is_empty() {
        Some(0)
    } else {
        naxes.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

/// The pixel array of an image HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    bitpix: i64,
    naxes: Vec<usize>,
    scaling: Scaling,
    pixels: Vec<u8>,
}

impl Image {
    pub fn from_header(header: &Header, data: &[u8]) -> Result<Self> {
        let bitpix = header.integer("BITPIX")?;
        let width = bitpix_storage(bitpix)?.byte_size();
        let naxes = read_naxes(header)?;
        let len = pixel_count(&naxes)
            .and_then(|n| n.checked_mul(width))
            .ok_or(Error::InvalidHeader("image size overflows"))?;
        let pixels = data.get(..len).ok_or(Error::UnexpectedEof)?.to_vec();
        Ok(Image {
            bitpix,
            naxes,
            scaling: image_scaling(header)?,
            pixels,
        })
    }

    /// A zero-filled image and the header cards describing it.
    ///
    /// `naxes` is in format order. A primary header carries SIMPLE/EXTEND,
    /// an extension header XTENSION/PCOUNT/GCOUNT.
    pub fn create(bitpix: i64, naxes: &[usize], primary: bool) -> Result<(Self, Header)> {
        let width = bitpix_storage(bitpix)?.byte_size();
        if naxes.len() > MAX_NAXIS {
            return Err(Error::InvalidNaxis(naxes.len() as i64));
        }
        let len = pixel_count(naxes)
            .and_then(|n| n.checked_mul(width))
            .ok_or(Error::InvalidHeader("image size overflows"))?;
        let image = Image {
            bitpix,
            naxes: naxes.to_vec(),
            scaling: Scaling::IDENTITY,
            pixels: vec![0u8; len],
        };
        Ok((image, build_image_header(bitpix, naxes, primary)?))
    }

    pub fn bitpix(&self) -> i64 {
        self.bitpix
    }

    pub fn naxes(&self) -> &[usize] {
        &self.naxes
    }

    pub fn num_pixels(&self) -> usize {
        self.pixels.len() / (self.bitpix.unsigned_abs() as usize / 8)
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub(crate) fn refresh_scaling(&mut self, header: &Header) -> Result<()> {
        self.scaling = image_scaling(header)?;
        Ok(())
    }

    fn storage(&self) -> BinaryColumnType {
        // BITPIX was validated on construction.
        bitpix_storage(self.bitpix).unwrap_or(BinaryColumnType::Byte)
    }

    fn byte_range(&self, first: usize, n: usize) -> Result<std::ops::Range<usize>> {
        if first == 0 {
            return Err(Error::BadPixelNumber(first));
        }
        let last = first - 1 + n;
        if last > self.num_pixels() {
            return Err(Error::BadPixelNumber(last));
        }
        let width = self.storage().byte_size();
        Ok((first - 1) * width..last * width)
    }

    fn is_direct<T: Element>(&self) -> bool {
        T::STORAGE == Some(self.storage()) && self.scaling.is_identity()
    }

    /// Read `n` pixels starting at 1-based pixel `first`, in storage order.
    pub fn read_pixels<T: Element>(&self, first: usize, n: usize) -> Result<Vec<T>> {
        let range = self.byte_range(first, n)?;
        let raw = &self.pixels[range];
        let ty = self.storage();

        if self.is_direct::<T>() {
            let mut out: Vec<T> = pod_collect_to_vec(raw);
            be_to_native_in_place(cast_slice_mut(&mut out), ty.byte_size(), ByteOrder::host());
            return Ok(out);
        }
        raw.chunks_exact(ty.byte_size())
            .map(|bytes| read_element(ty, self.scaling, bytes))
            .collect()
    }

    /// Overwrite pixels starting at 1-based pixel `first`.
    pub fn write_pixels<T: Element>(&mut self, first: usize, values: &[T]) -> Result<()> {
        let range = self.byte_range(first, values.len())?;
        let ty = self.storage();

        if self.is_direct::<T>() {
            let be = native_to_be(cast_slice(values), ty.byte_size(), ByteOrder::host());
            self.pixels[range].copy_from_slice(&be);
            return Ok(());
        }
        let scaling = self.scaling;
        for (value, out) in values
            .iter()
            .zip(self.pixels[range].chunks_exact_mut(ty.byte_size()))
        {
            write_element(ty, scaling, *value, out)?;
        }
        Ok(())
    }

    /// The unpadded data segment.
    pub fn data_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Header cards for an image HDU.
pub fn build_image_header(bitpix: i64, naxes: &[usize], primary: bool) -> Result<Header> {
    let mut header = Header::from_cards(Vec::new());
    if primary {
        header.push(Card::new("SIMPLE", Value::Logical(true), Some("conforms to FITS standard"))?);
    } else {
        header.push(Card::new("XTENSION", Value::String(String::from("IMAGE")), Some("image extension"))?);
    }
    header.push(Card::new("BITPIX", Value::Integer(bitpix), Some("number of bits per data pixel"))?);
    header.push(Card::new("NAXIS", Value::Integer(naxes.len() as i64), Some("number of data axes"))?);
    for (i, &len) in naxes.iter().enumerate() {
        header.push(Card::new(
            &format!("NAXIS{}", i + 1),
            Value::Integer(len as i64),
            Some(&format!("length of data axis {}", i + 1)),
        )?);
    }
    if primary {
        header.push(Card::new("EXTEND", Value::Logical(true), Some("FITS dataset may contain extensions"))?);
    } else {
        header.push(Card::new("PCOUNT", Value::Integer(0), Some("required keyword; must = 0"))?);
        header.push(Card::new("GCOUNT", Value::Integer(1), Some("required keyword; must = 1"))?);
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitpix_mapping() {
        assert_eq!(bitpix_storage(16).unwrap(), BinaryColumnType::Short);
        assert_eq!(bitpix_storage(-64).unwrap(), BinaryColumnType::Double);
        assert!(matches!(bitpix_storage(24), Err(Error::InvalidBitpix(24))));
    }

    #[test]
    fn huge_dimensions_are_rejected() {
        assert!(matches!(Image::create(16, &[usize::MAX, 2], false), Err(Error::InvalidHeader(_))));
        let (_, mut h) = Image::create(8, &[2, 2], true).unwrap();
        h.update("NAXIS1", crate::value::Value::Integer(i64::MAX), None).unwrap();
        h.update("NAXIS2", crate::value::Value::Integer(i64::MAX), None).unwrap();
        assert!(matches!(Image::from_header(&h, &[0u8; 4]), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn create_primary_header() {
        let (img, h) = Image::create(16, &[4, 3], true).unwrap();
        assert_eq!(img.num_pixels(), 12);
        assert_eq!(img.data_bytes().len(), 24);
        assert_eq!(h.cards()[0].keyword_str(), "SIMPLE");
        assert_eq!(h.integer("NAXIS2").unwrap(), 3);
        assert!(h.contains("EXTEND"));
    }

    #[test]
    fn create_extension_header() {
        let (_, h) = Image::create(-32, &[10], false).unwrap();
        assert_eq!(h.long_string("XTENSION").unwrap().0, "IMAGE");
        assert_eq!(h.integer("GCOUNT").unwrap(), 1);
    }

    #[test]
    fn direct_round_trip() {
        let (mut img, _) = Image::create(32, &[5], true).unwrap();
        img.write_pixels::<i32>(1, &[1, -2, 3, -4, 5]).unwrap();
        assert_eq!(&img.data_bytes()[4..8], &(-2i32).to_be_bytes());
        assert_eq!(img.read_pixels::<i32>(2, 3).unwrap(), vec![-2, 3, -4]);
    }

    #[test]
    fn converted_read() {
        let (mut img, _) = Image::create(16, &[3], true).unwrap();
        img.write_pixels::<i16>(1, &[10, 20, 30]).unwrap();
        assert_eq!(img.read_pixels::<f64>(1, 3).unwrap(), vec![10.0, 20.0, 30.0]);
        assert!(matches!(img.read_pixels::<u8>(1, 1), Ok(v) if v == vec![10]));
    }

    #[test]
    fn scaled_pixels() {
        let (_, mut h) = Image::create(16, &[2], true).unwrap();
        h.update("BZERO", Value::Float(32768.0), None).unwrap();
        let mut img = Image::from_header(&h, &[0u8; 4]).unwrap();
        img.write_pixels::<u16>(1, &[0, 65535]).unwrap();
        assert_eq!(&img.data_bytes()[..2], &i16::MIN.to_be_bytes());
        assert_eq!(img.read_pixels::<u16>(1, 2).unwrap(), vec![0, 65535]);
    }

    #[test]
    fn pixel_range_checked() {
        let (img, _) = Image::create(8, &[2, 2], true).unwrap();
        assert!(matches!(img.read_pixels::<u8>(0, 1), Err(Error::BadPixelNumber(0))));
        assert!(matches!(img.read_pixels::<u8>(2, 4), Err(Error::BadPixelNumber(5))));
        assert_eq!(img.read_pixels::<u8>(1, 4).unwrap().len(), 4);
    }

    #[test]
    fn empty_primary() {
        let (img, h) = Image::create(8, &[], true).unwrap();
        assert_eq!(img.num_pixels(), 0);
        assert_eq!(h.integer("NAXIS").unwrap(), 0);
        assert!(Image::from_header(&h, &[]).is_ok());
    }
}
