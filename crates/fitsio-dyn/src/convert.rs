//! Element conversion between on-disk storage and host numeric types.
//!
//! Every transfer goes through [`Raw`]: a stored element is decoded to an
//! integer or float, scaled to its physical value, then narrowed to the
//! requested host type with an overflow check. Writes run the same steps in
//! reverse.

use crate::bintable::BinaryColumnType;
use crate::error::{Error, Result};

/// Linear scaling `physical = zero + scale * stored` (TSCALn/TZEROn, BSCALE/BZERO).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub scale: f64,
    pub zero: f64,
}

impl Scaling {
    pub const IDENTITY: Scaling = Scaling {
        scale: 1.0,
        zero: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.zero == 0.0
    }

    fn to_physical(self, raw: Raw) -> Raw {
        if self.is_identity() {
            return raw;
        }
        Raw::Float(self.zero + self.scale * raw.as_f64())
    }

    fn to_stored(self, raw: Raw) -> Result<Raw> {
        if self.is_identity() {
            return Ok(raw);
        }
        if self.scale == 0.0 {
            return Err(Error::ZeroScale);
        }
        Ok(Raw::Float((raw.as_f64() - self.zero) / self.scale))
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::IDENTITY
    }
}

/// A decoded element, before narrowing to a host type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Raw {
    Int(i64),
    Float(f64),
}

impl Raw {
    fn as_f64(self) -> f64 {
        match self {
            Raw::Int(i) => i as f64,
            Raw::Float(f) => f,
        }
    }
}

/// Host element types a column or image can be transferred as.
pub trait Element: bytemuck::Pod + Default + PartialEq + std::fmt::Debug {
    /// `None` if `v` is not representable.
    fn from_int(v: i64) -> Option<Self>;
    /// Integer types round to nearest; `None` if out of range or NaN.
    fn from_float(v: f64) -> Option<Self>;
    fn to_raw(self) -> Raw;
    /// The stored type whose big-endian bytes are this type's bytes.
    const STORAGE: Option<BinaryColumnType>;
}

macro_rules! int_element {
    ($($t:ty => $storage:expr),*) => {$(
        impl Element for $t {
            const STORAGE: Option<BinaryColumnType> = $storage;

            fn from_int(v: i64) -> Option<Self> {
                <$t>::try_from(v).ok()
            }

            fn from_float(v: f64) -> Option<Self> {
                let r = v.round();
                if r.is_nan() || r < <$t>::MIN as f64 || r > <$t>::MAX as f64 {
                    return None;
                }
                Some(r as $t)
            }

            fn to_raw(self) -> Raw {
                match i64::try_from(self) {
                    Ok(i) => Raw::Int(i),
                    Err(_) => Raw::Float(self as f64),
                }
            }
        }
    )*};
}

int_element!(
    i8 => None,
    u8 => Some(BinaryColumnType::Byte),
    i16 => Some(BinaryColumnType::Short),
    u16 => None,
    i32 => Some(BinaryColumnType::Int),
    u32 => None,
    i64 => Some(BinaryColumnType::Long),
    u64 => None
);

macro_rules! float_element {
    ($($t:ty => $storage:expr),*) => {$(
        impl Element for $t {
            const STORAGE: Option<BinaryColumnType> = $storage;

            fn from_int(v: i64) -> Option<Self> {
                Some(v as $t)
            }

            fn from_float(v: f64) -> Option<Self> {
                Some(v as $t)
            }

            fn to_raw(self) -> Raw {
                Raw::Float(self as f64)
            }
        }
    )*};
}

float_element!(f32 => Some(BinaryColumnType::Float), f64 => Some(BinaryColumnType::Double));

/// Decode one stored element of type `ty` from its big-endian bytes.
pub fn decode(ty: BinaryColumnType, bytes: &[u8]) -> Result<Raw> {
    let take = |n: usize| -> Result<&[u8]> { bytes.get(..n).ok_or(Error::UnexpectedEof) };
    let raw = match ty {
        BinaryColumnType::Logical => Raw::Int(i64::from(take(1)?[0] == b'T')),
        BinaryColumnType::Byte => Raw::Int(i64::from(take(1)?[0])),
        BinaryColumnType::Short => Raw::Int(i64::from(i16::from_be_bytes(array(take(2)?)))),
        BinaryColumnType::Int => Raw::Int(i64::from(i32::from_be_bytes(array(take(4)?)))),
        BinaryColumnType::Long => Raw::Int(i64::from_be_bytes(array(take(8)?))),
        BinaryColumnType::Float => Raw::Float(f64::from(f32::from_be_bytes(array(take(4)?)))),
        BinaryColumnType::Double => Raw::Float(f64::from_be_bytes(array(take(8)?))),
        BinaryColumnType::Bit
        | BinaryColumnType::Ascii
        | BinaryColumnType::ComplexFloat
        | BinaryColumnType::ComplexDouble => return Err(Error::BadDataType(ty.name())),
    };
    Ok(raw)
}

/// Encode one element into `out` as stored type `ty`, big-endian.
pub fn encode(ty: BinaryColumnType, raw: Raw, out: &mut [u8]) -> Result<()> {
    let width = ty.byte_size();
    let out = out.get_mut(..width).ok_or(Error::UnexpectedEof)?;
    match ty {
        BinaryColumnType::Logical => {
            out[0] = if raw.as_f64() != 0.0 { b'T' } else { b'F' };
        }
        BinaryColumnType::Byte => out[0] = narrow::<u8>(raw)?,
        BinaryColumnType::Short => out.copy_from_slice(&narrow::<i16>(raw)?.to_be_bytes()),
        BinaryColumnType::Int => out.copy_from_slice(&narrow::<i32>(raw)?.to_be_bytes()),
        BinaryColumnType::Long => out.copy_from_slice(&narrow::<i64>(raw)?.to_be_bytes()),
        BinaryColumnType::Float => out.copy_from_slice(&(raw.as_f64() as f32).to_be_bytes()),
        BinaryColumnType::Double => out.copy_from_slice(&raw.as_f64().to_be_bytes()),
        BinaryColumnType::Bit
        | BinaryColumnType::Ascii
        | BinaryColumnType::ComplexFloat
        | BinaryColumnType::ComplexDouble => return Err(Error::BadDataType(ty.name())),
    }
    Ok(())
}

/// Narrow a raw value to a host element type.
pub fn narrow<T: Element>(raw: Raw) -> Result<T> {
    match raw {
        Raw::Int(i) => T::from_int(i),
        Raw::Float(f) => T::from_float(f),
    }
    .ok_or(Error::NumericOverflow)
}

/// Decode, scale and narrow one stored element.
pub fn read_element<T: Element>(ty: BinaryColumnType, scaling: Scaling, bytes: &[u8]) -> Result<T> {
    let raw = decode(ty, bytes)?;
    let raw = if ty == BinaryColumnType::Logical {
        raw
    } else {
        scaling.to_physical(raw)
    };
    narrow(raw)
}

/// Unscale and encode one host element.
pub fn write_element<T: Element>(
    ty: BinaryColumnType,
    scaling: Scaling,
    value: T,
    out: &mut [u8],
) -> Result<()> {
    let raw = value.to_raw();
    let raw = if ty == BinaryColumnType::Logical {
        raw
    } else {
        scaling.to_stored(raw)?
    };
    encode(ty, raw, out)
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut a = [0u8; N];
    a.copy_from_slice(&bytes[..N]);
    a
}
