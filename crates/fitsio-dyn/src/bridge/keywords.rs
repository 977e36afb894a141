//! Generic keyword access on the current HDU's header.
//!
//! Reads pick a value type from the card's own text unless the caller asks
//! for one; writes accept a null, string, integer or floating value.

use chrono::{DateTime, Utc};

use crate::header::Header;
use crate::status::status_text;
use crate::value::{classify_value_text, value_text, Value, ValueClass};

use super::errors::{Error, Result};
use super::handle::FileHandle;

/// A keyword value on the dynamic side.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    /// A keyword with an empty value field.
    Null,
    Logical(bool),
    Integer(i64),
    Float(f64),
    Complex(f64, f64),
    String(String),
}

impl KeywordValue {
    fn type_name(&self) -> &'static str {
        match self {
            KeywordValue::Null => "null",
            KeywordValue::Logical(_) => "logical",
            KeywordValue::Integer(_) => "integer",
            KeywordValue::Float(_) => "float",
            KeywordValue::Complex(..) => "complex",
            KeywordValue::String(_) => "string",
        }
    }
}

/// The type a keyword value is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    String,
    /// Integers and logicals (as 0/1).
    Integer,
    Double,
    Complex,
}

impl From<ValueClass> for KeywordType {
    fn from(class: ValueClass) -> Self {
        match class {
            ValueClass::Character => KeywordType::String,
            ValueClass::Logical | ValueClass::Integer => KeywordType::Integer,
            ValueClass::Floating => KeywordType::Double,
            ValueClass::Complex => KeywordType::Complex,
        }
    }
}

fn header(handle: &FileHandle) -> Result<&Header> {
    Ok(handle.file()?.header()?)
}

fn edit<R>(handle: &mut FileHandle, f: impl FnOnce(&mut Header) -> crate::Result<R>) -> Result<R> {
    Ok(handle.file_mut()?.edit_header(f)?)
}

/// Classify a keyword by the text of its value field.
pub fn key_type(handle: &FileHandle, name: &str) -> Result<KeywordType> {
    let raw = header(handle)?.raw_card(name)?;
    let class = classify_value_text(value_text(&raw[10..]))
        .ok_or_else(|| crate::Error::UndefinedValue(name.to_string()))?;
    Ok(class.into())
}

/// Read a keyword's value and comment.
///
/// Without `expected` the type comes from [`key_type`]. Strings follow
/// `CONTINUE` cards.
pub fn read_keyword(
    handle: &FileHandle,
    name: &str,
    expected: Option<KeywordType>,
) -> Result<(KeywordValue, Option<String>)> {
    let ty = match expected {
        Some(ty) => ty,
        None => key_type(handle, name)?,
    };
    let header = header(handle)?;
    let value = match ty {
        KeywordType::String => {
            let (text, comment) = header.long_string(name)?;
            return Ok((KeywordValue::String(text), comment));
        }
        KeywordType::Integer => KeywordValue::Integer(integer_value(header, name)?),
        KeywordType::Double => KeywordValue::Float(header.float(name)?),
        KeywordType::Complex => match *header.value(name)? {
            Value::ComplexFloat(re, im) => KeywordValue::Complex(re, im),
            Value::ComplexInt(re, im) => KeywordValue::Complex(re as f64, im as f64),
            _ => KeywordValue::Complex(header.float(name)?, 0.0),
        },
    };
    Ok((value, header.card(name)?.comment.clone()))
}

/// Integer value of a keyword; floating values are truncated.
fn integer_value(header: &Header, name: &str) -> Result<i64> {
    match *header.value(name)? {
        Value::Float(f) => {
            let t = f.trunc();
            if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                Ok(t as i64)
            } else {
                Err(crate::Error::NumericOverflow.into())
            }
        }
        _ => Ok(header.integer(name)?),
    }
}

pub fn read_key_integer(handle: &FileHandle, name: &str) -> Result<i64> {
    integer_value(header(handle)?, name)
}

pub fn read_key_double(handle: &FileHandle, name: &str) -> Result<f64> {
    Ok(header(handle)?.float(name)?)
}

/// A string keyword, long-string continuations included.
pub fn read_key_string(handle: &FileHandle, name: &str) -> Result<String> {
    Ok(header(handle)?.long_string(name)?.0)
}

/// Create or update a keyword. Logical and complex values are refused;
/// logicals go through [`write_logical_keyword`].
pub fn write_keyword(handle: &mut FileHandle, name: &str, value: &KeywordValue, comment: Option<&str>) -> Result<()> {
    let value = match value {
        KeywordValue::String(s) => return edit(handle, |h| h.update_long_string(name, s, comment)),
        KeywordValue::Null => Value::Undefined,
        KeywordValue::Integer(n) => Value::Integer(*n),
        KeywordValue::Float(f) => Value::Float(*f),
        other @ (KeywordValue::Logical(_) | KeywordValue::Complex(..)) => {
            return Err(Error::UnsupportedKeywordType(other.type_name()))
        }
    };
    edit(handle, |h| h.update(name, value, comment))
}

pub fn write_logical_keyword(handle: &mut FileHandle, name: &str, value: bool, comment: Option<&str>) -> Result<()> {
    edit(handle, |h| h.update(name, Value::Logical(value), comment))
}

/// Number of header records, END excluded.
pub fn num_keys(handle: &FileHandle) -> Result<usize> {
    Ok(header(handle)?.len())
}

/// The `n`th header record (1-based) as card text, trailing blanks removed.
pub fn read_record(handle: &FileHandle, n: usize) -> Result<String> {
    let raw = header(handle)?.record(n)?;
    Ok(String::from_utf8_lossy(&raw).trim_end().to_string())
}

/// Rename keyword `old` to `new`, keeping its value and comment.
pub fn modify_name(handle: &mut FileHandle, old: &str, new: &str) -> Result<()> {
    edit(handle, |h| h.rename(old, new))
}

/// Set DATE to the current UTC time.
pub fn write_date(handle: &mut FileHandle) -> Result<()> {
    let stamp = date_stamp(Utc::now());
    edit(handle, |h| {
        h.update("DATE", Value::String(stamp), Some("file creation date (YYYY-MM-DDThh:mm:ss UT)"))
    })
}

fn date_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn delete_key(handle: &mut FileHandle, name: &str) -> Result<()> {
    edit(handle, |h| h.delete(name))
}

pub fn write_comment(handle: &mut FileHandle, text: &str) -> Result<()> {
    edit(handle, |h| h.append_commentary("COMMENT", text))
}

pub fn write_history(handle: &mut FileHandle, text: &str) -> Result<()> {
    edit(handle, |h| h.append_commentary("HISTORY", text))
}

/// Short description of a format status code.
pub fn error_status_text(status: i32) -> &'static str {
    status_text(status)
}
