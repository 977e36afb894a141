//! Header-data units: splitting a FITS byte stream into HDUs and back.

use crate::bintable::{delete_column_keywords, insert_column_keywords, BinTable, ColumnDef};
use crate::block::{append_data_blocks, padded_byte_len, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::header::{header_byte_len, parse_header_blocks, Header};
use crate::image::{bitpix_storage, read_naxes, Image};
use crate::value::Value;

/// The kind of data an HDU carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduKind {
    /// Primary array or IMAGE extension.
    Image,
    /// ASCII TABLE extension.
    AsciiTable,
    /// BINTABLE extension.
    BinaryTable,
    /// Random groups or an unrecognised extension, kept as raw bytes.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HduData {
    Image(Image),
    BinaryTable(BinTable),
    Raw { kind: HduKind, bytes: Vec<u8> },
}

/// One header-data unit held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Hdu {
    header: Header,
    data: HduData,
}

fn string_keyword(header: &Header, name: &str) -> Option<String> {
    match header.value(name) {
        Ok(Value::String(s)) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn is_random_groups(header: &Header, naxes: &[usize]) -> bool {
    naxes.first() == Some(&0) && matches!(header.value("GROUPS"), Ok(Value::Logical(true)))
}

/// Data segment length in bytes, excluding block padding.
fn data_byte_len(header: &Header, is_primary: bool) -> Result<usize> {
    let bitpix = header.integer("BITPIX")?;
    let naxes = read_naxes(header)?;
    if naxes.is_empty() {
        return Ok(0);
    }
    let bytes_per_value = (bitpix.unsigned_abs() / 8) as usize;
    let overflow = || Error::InvalidHeader("data size overflow");

    let (pcount, gcount, pixels) = if is_primary && is_random_groups(header, &naxes) {
        let product = naxes[1..]
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(overflow)?;
        (
            header.integer("PCOUNT")? as usize,
            header.integer("GCOUNT")? as usize,
            product,
        )
    } else {
        let pixels = naxes
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(overflow)?;
        if is_primary {
            (0, 1, pixels)
        } else {
            let pcount = header.integer("PCOUNT").unwrap_or(0) as usize;
            let gcount = header.integer("GCOUNT").unwrap_or(1).max(1) as usize;
            (pcount, gcount, pixels)
        }
    };

    pixels
        .checked_add(pcount)
        .and_then(|n| n.checked_mul(bytes_per_value))
        .and_then(|n| n.checked_mul(gcount))
        .ok_or_else(overflow)
}

fn classify(header: &Header, is_primary: bool) -> Result<HduKind> {
    if is_primary {
        let naxes = read_naxes(header)?;
        return Ok(if is_random_groups(header, &naxes) {
            HduKind::Other
        } else {
            HduKind::Image
        });
    }
    match string_keyword(header, "XTENSION").as_deref() {
        Some("IMAGE") => Ok(HduKind::Image),
        Some("TABLE") => Ok(HduKind::AsciiTable),
        Some("BINTABLE") | Some("A3DTABLE") => Ok(HduKind::BinaryTable),
        Some(_) => Ok(HduKind::Other),
        None => Err(Error::InvalidHeader("extension without XTENSION")),
    }
}

impl Hdu {
    pub(crate) fn new(header: Header, data: HduData) -> Self {
        Hdu { header, data }
    }

    /// Build an HDU from its parsed header and unpadded data segment.
    pub fn from_parts(header: Header, data: &[u8], is_primary: bool) -> Result<Self> {
        let kind = classify(&header, is_primary)?;
        let data = match kind {
            HduKind::Image => {
                bitpix_storage(header.integer("BITPIX")?)?;
                HduData::Image(Image::from_header(&header, data)?)
            }
            HduKind::BinaryTable => HduData::BinaryTable(BinTable::from_header(&header, data)?),
            kind => HduData::Raw {
                kind,
                bytes: data.to_vec(),
            },
        };
        Ok(Hdu { header, data })
    }

    pub fn kind(&self) -> HduKind {
        match self.data {
            HduData::Image(_) => HduKind::Image,
            HduData::BinaryTable(_) => HduKind::BinaryTable,
            HduData::Raw { kind, .. } => kind,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Edit the header, then re-derive the data scaling from it.
    pub fn edit_header<R>(&mut self, f: impl FnOnce(&mut Header) -> Result<R>) -> Result<R> {
        let out = f(&mut self.header)?;
        match self.data {
            HduData::Image(ref mut image) => image.refresh_scaling(&self.header)?,
            HduData::BinaryTable(ref mut table) => table.refresh_scaling(&self.header)?,
            HduData::Raw { .. } => {}
        }
        Ok(out)
    }

    /// Insert table columns before `col`, renumbering the keywords of the
    /// columns that move.
    pub fn insert_columns(&mut self, col: usize, defs: &[ColumnDef]) -> Result<()> {
        let HduData::BinaryTable(ref mut table) = self.data else {
            return Err(Error::NotBinaryTable);
        };
        table.insert_columns(col, defs)?;
        insert_column_keywords(&mut self.header, col, defs)?;
        table.sync_header(&mut self.header)
    }

    /// Remove table column `col` and its keywords.
    pub fn delete_column(&mut self, col: usize) -> Result<()> {
        let HduData::BinaryTable(ref mut table) = self.data else {
            return Err(Error::NotBinaryTable);
        };
        table.delete_column(col)?;
        delete_column_keywords(&mut self.header, col)?;
        table.sync_header(&mut self.header)
    }

    pub fn data(&self) -> &HduData {
        &self.data
    }

    pub fn table(&self) -> Result<&BinTable> {
        match self.data {
            HduData::BinaryTable(ref t) => Ok(t),
            _ => Err(Error::NotBinaryTable),
        }
    }

    pub fn table_mut(&mut self) -> Result<&mut BinTable> {
        match self.data {
            HduData::BinaryTable(ref mut t) => Ok(t),
            _ => Err(Error::NotBinaryTable),
        }
    }

    pub fn image(&self) -> Result<&Image> {
        match self.data {
            HduData::Image(ref i) => Ok(i),
            _ => Err(Error::NotImage),
        }
    }

    pub fn image_mut(&mut self) -> Result<&mut Image> {
        match self.data {
            HduData::Image(ref mut i) => Ok(i),
            _ => Err(Error::NotImage),
        }
    }

    /// Serialize header and padded data, updating size keywords first.
    pub fn write_to(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if let HduData::BinaryTable(ref table) = self.data {
            table.sync_header(&mut self.header)?;
        }
        out.extend_from_slice(&self.header.to_bytes());
        match self.data {
            HduData::Image(ref image) => append_data_blocks(out, image.data_bytes()),
            HduData::BinaryTable(ref table) => append_data_blocks(out, &table.data_bytes()),
            HduData::Raw { ref bytes, .. } => append_data_blocks(out, bytes),
        }
        Ok(())
    }
}

/// Split a FITS byte stream into HDUs.
///
/// Trailing bytes that do not form a valid header after the first HDU are
/// ignored; missing padding after the last data segment is tolerated.
pub fn parse_fits(data: &[u8]) -> Result<Vec<Hdu>> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut hdus = Vec::new();
    let mut offset = 0;
    while data.len() - offset >= BLOCK_SIZE {
        let remaining = &data[offset..];
        let is_primary = hdus.is_empty();

        let parsed = header_byte_len(remaining).and_then(|header_len| {
            let header = Header::from_cards(parse_header_blocks(&remaining[..header_len])?);
            Ok((header_len, header))
        });
        let (header_len, header) = match parsed {
            Ok(p) => p,
            Err(e) if is_primary => return Err(e),
            Err(e) => {
                tracing::debug!(offset, error = %e, "ignoring trailing bytes");
                break;
            }
        };
        if is_primary && header.cards().first().map(|c| c.keyword_str()) != Some("SIMPLE") {
            return Err(Error::InvalidHeader("first HDU must be primary"));
        }

        let data_len = data_byte_len(&header, is_primary)?;
        let data_start = offset + header_len;
        let segment = data
            .get(data_start..data_start + data_len)
            .ok_or(Error::UnexpectedEof)?;
        hdus.push(Hdu::from_parts(header, segment, is_primary)?);
        tracing::trace!(hdu = hdus.len(), data_start, data_len, "parsed HDU");

        offset = data_start + padded_byte_len(data_len);
        if offset >= data.len() {
            break;
        }
    }
    Ok(hdus)
}
