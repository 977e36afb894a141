use std::str;

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
    /// FITS complex integer `(real, imaginary)`.
    ComplexInt(i64, i64),
    /// FITS complex float `(real, imaginary)`.
    ComplexFloat(f64, f64),
    /// A value indicator followed by a blank value field.
    Undefined,
}

/// The type marker a value field carries in its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Quoted string (`C`).
    Character,
    /// `T` or `F` (`L`).
    Logical,
    /// Integer literal (`I`).
    Integer,
    /// Literal containing a decimal point or exponent (`F`).
    Floating,
    /// Parenthesized pair (`X`).
    Complex,
}

impl ValueClass {
    /// The single-letter code used by FITS tools for this class.
    pub fn code(self) -> char {
        match self {
            ValueClass::Character => 'C',
            ValueClass::Logical => 'L',
            ValueClass::Integer => 'I',
            ValueClass::Floating => 'F',
            ValueClass::Complex => 'X',
        }
    }
}

/// Classify raw value text by its leading character.
///
/// Returns `None` for blank text (an undefined value).
pub fn classify_value_text(text: &str) -> Option<ValueClass> {
    let text = text.trim();
    let first = text.bytes().next()?;
    let class = match first {
        b'\'' => ValueClass::Character,
        b'T' | b'F' => ValueClass::Logical,
        b'(' => ValueClass::Complex,
        _ if text.bytes().any(|b| matches!(b, b'.' | b'E' | b'e' | b'D' | b'd')) => {
            ValueClass::Floating
        }
        _ => ValueClass::Integer,
    };
    Some(class)
}

/// Return the raw value text of a 70-byte value field, without the comment.
///
/// For strings the quotes are included, as they carry the type marker.
pub fn value_text(field: &[u8]) -> &str {
    let start = field.iter().position(|&b| b != b' ').unwrap_or(field.len());
    let field = &field[start..];
    if field.first() == Some(&b'\'') {
        let end = closing_quote(field).map(|i| i + 1).unwrap_or(field.len());
        return str::from_utf8(&field[..end]).unwrap_or("");
    }
    let (val_part, _) = split_comment(field);
    str::from_utf8(val_part).map(str::trim).unwrap_or("")
}

/// Index of the closing quote of a string that starts at `field[0]`.
fn closing_quote(field: &[u8]) -> Option<usize> {
    let mut i = 1;
    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Split a value field at the comment separator.
///
/// Accepts ` /` without a trailing space, as files written by IDL do, and a
/// separator at the very start of an already trimmed field.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    let Some(i) = (0..field.len()).find(|&i| field[i] == b'/' && (i == 0 || field[i - 1] == b' '))
    else {
        return (field, None);
    };
    let mut comment_start = i + 1;
    if field.get(comment_start) == Some(&b' ') {
        comment_start += 1;
    }
    let comment = str::from_utf8(&field[comment_start..])
        .ok()
        .map(str::trim_end)
        .filter(|s| !s.is_empty());
    (&field[..i], comment)
}

/// Parse a quoted string value; doubled quotes are a literal quote.
fn parse_string(field: &[u8]) -> Option<(Value, Option<&str>)> {
    if field.first() != Some(&b'\'') {
        return None;
    }
    let end = closing_quote(field);
    let body = &field[1..end.unwrap_or(field.len())];

    let mut value = String::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        value.push(body[i] as char);
        i += if body[i] == b'\'' { 2 } else { 1 };
    }

    let remainder = match end {
        Some(e) => &field[e + 1..],
        None => &[],
    };
    let (_, comment) = split_comment(remainder);
    Some((Value::String(value.trim_end().to_string()), comment))
}

fn parse_complex(text: &str) -> Option<Value> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (left, right) = inner.split_once(',')?;
    let (left, right) = (left.trim(), right.trim());

    if !left.contains('.') && !right.contains('.') {
        if let (Ok(re), Ok(im)) = (left.parse::<i64>(), right.parse::<i64>()) {
            return Some(Value::ComplexInt(re, im));
        }
    }
    Some(Value::ComplexFloat(
        parse_float_str(left)?,
        parse_float_str(right)?,
    ))
}

/// Parse a float string, handling FITS `D` exponent notation.
pub(crate) fn parse_float_str(s: &str) -> Option<f64> {
    let normalized = s.trim().replace(['D', 'd'], "E");
    normalized.parse::<f64>().ok()
}

/// Parse a FITS header value from the 70-byte value portion of a card.
///
/// Returns `None` when the field holds no value at all.
pub fn parse_value(value_bytes: &[u8]) -> Option<(Value, Option<&str>)> {
    let start = value_bytes.iter().position(|&b| b != b' ')?;
    let value_bytes = &value_bytes[start..];

    if value_bytes[0] == b'\'' {
        return parse_string(value_bytes);
    }

    let (val_part, comment) = split_comment(value_bytes);
    let val_text = str::from_utf8(val_part).ok()?.trim();
    if val_text.is_empty() {
        return None;
    }

    let value = match classify_value_text(val_text)? {
        ValueClass::Logical => match val_text {
            "T" => Value::Logical(true),
            "F" => Value::Logical(false),
            _ => return None,
        },
        ValueClass::Complex => parse_complex(val_text)?,
        ValueClass::Integer => Value::Integer(val_text.parse::<i64>().ok()?),
        ValueClass::Floating => Value::Float(parse_float_str(val_text)?),
        ValueClass::Character => return None,
    };
    Some((value, comment))
}

/// Serialize a [`Value`] into a 70-byte field (card bytes 10..80).
///
/// Numbers and logicals are right-justified to card column 30; strings
/// start at the first byte with a quote.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(n.to_string().as_bytes(), &mut buf[..20]);
        }
        Value::Float(f) => {
            right_justify(format_float(*f, 20).as_bytes(), &mut buf[..20]);
        }
        Value::String(s) => {
            write_string(s, &mut buf);
        }
        Value::ComplexInt(re, im) => {
            let s = format!("({re}, {im})");
            right_justify(s.as_bytes(), &mut buf[..30]);
        }
        Value::ComplexFloat(re, im) => {
            let s = format!("({}, {})", format_float(*re, 20), format_float(*im, 20));
            right_justify(s.as_bytes(), &mut buf[..50]);
        }
        Value::Undefined => {}
    }

    buf
}

fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest.fill(b' ');
    dest[start..].copy_from_slice(&src[..len]);
}

fn format_float(f: f64, max_len: usize) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let mut precision = 15usize;
    loop {
        let s = format!("{f:.precision$E}");
        if s.len() <= max_len || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

/// Length of `s` once quotes are doubled.
pub(crate) fn escaped_len(s: &str) -> usize {
    s.len() + s.bytes().filter(|&b| b == b'\'').count()
}

fn write_string(s: &str, buf: &mut [u8; 70]) {
    buf[0] = b'\'';
    let mut pos = 1;

    for ch in s.bytes() {
        let needed = if ch == b'\'' { 2 } else { 1 };
        if pos + needed > 69 {
            break;
        }
        buf[pos] = ch;
        if ch == b'\'' {
            buf[pos + 1] = b'\'';
        }
        pos += needed;
    }

    // Strings are padded to at least 8 characters between the quotes.
    pos = pos.max(9);
    buf[pos] = b'\'';
}
