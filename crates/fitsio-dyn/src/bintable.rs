//! FITS binary table extension: column layout and element transfer.
//!
//! Rows are held contiguously (`NAXIS1 * NAXIS2` bytes) with the
//! variable-length heap kept separately and appended at serialization.

use crate::convert::{read_element, write_element, Element, Scaling};
use crate::error::{Error, Result};
use crate::header::{make_keyword, Card, Header};
use crate::value::Value;

/// The data type of a column in a FITS binary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryColumnType {
    /// L -- logical, stored as a single byte (T/F/0).
    Logical,
    /// X -- bit array.
    Bit,
    /// B -- unsigned byte.
    Byte,
    /// I -- 16-bit signed integer.
    Short,
    /// J -- 32-bit signed integer.
    Int,
    /// K -- 64-bit signed integer.
    Long,
    /// E -- 32-bit IEEE float.
    Float,
    /// D -- 64-bit IEEE float.
    Double,
    /// C -- complex: pair of 32-bit IEEE floats.
    ComplexFloat,
    /// M -- complex: pair of 64-bit IEEE floats.
    ComplexDouble,
    /// A -- ASCII character.
    Ascii,
}

impl BinaryColumnType {
    /// Bytes per element. Bit columns pack eight elements per byte and
    /// report 1 here.
    pub fn byte_size(self) -> usize {
        match self {
            BinaryColumnType::Logical
            | BinaryColumnType::Bit
            | BinaryColumnType::Byte
            | BinaryColumnType::Ascii => 1,
            BinaryColumnType::Short => 2,
            BinaryColumnType::Int | BinaryColumnType::Float => 4,
            BinaryColumnType::Long | BinaryColumnType::Double | BinaryColumnType::ComplexFloat => 8,
            BinaryColumnType::ComplexDouble => 16,
        }
    }

    pub fn code(self) -> char {
        match self {
            BinaryColumnType::Logical => 'L',
            BinaryColumnType::Bit => 'X',
            BinaryColumnType::Byte => 'B',
            BinaryColumnType::Short => 'I',
            BinaryColumnType::Int => 'J',
            BinaryColumnType::Long => 'K',
            BinaryColumnType::Float => 'E',
            BinaryColumnType::Double => 'D',
            BinaryColumnType::ComplexFloat => 'C',
            BinaryColumnType::ComplexDouble => 'M',
            BinaryColumnType::Ascii => 'A',
        }
    }

    fn from_code(c: u8) -> Option<Self> {
        Some(match c {
            b'L' => BinaryColumnType::Logical,
            b'X' => BinaryColumnType::Bit,
            b'B' => BinaryColumnType::Byte,
            b'I' => BinaryColumnType::Short,
            b'J' => BinaryColumnType::Int,
            b'K' => BinaryColumnType::Long,
            b'E' => BinaryColumnType::Float,
            b'D' => BinaryColumnType::Double,
            b'C' => BinaryColumnType::ComplexFloat,
            b'M' => BinaryColumnType::ComplexDouble,
            b'A' => BinaryColumnType::Ascii,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            BinaryColumnType::Logical => "logical",
            BinaryColumnType::Bit => "bit",
            BinaryColumnType::Byte => "byte",
            BinaryColumnType::Short => "short",
            BinaryColumnType::Int => "int",
            BinaryColumnType::Long => "long",
            BinaryColumnType::Float => "float",
            BinaryColumnType::Double => "double",
            BinaryColumnType::ComplexFloat => "complex",
            BinaryColumnType::ComplexDouble => "double complex",
            BinaryColumnType::Ascii => "string",
        }
    }
}

/// Variable-length array descriptor flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// P -- 32-bit count and heap offset.
    P,
    /// Q -- 64-bit count and heap offset.
    Q,
}

impl DescriptorKind {
    pub fn byte_size(self) -> usize {
        match self {
            DescriptorKind::P => 8,
            DescriptorKind::Q => 16,
        }
    }
}

/// A parsed TFORMn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tform {
    pub repeat: usize,
    pub datatype: BinaryColumnType,
    pub descriptor: Option<DescriptorKind>,
    /// The `(max)` suffix of a variable-length TFORM.
    pub max_len: usize,
}

impl Tform {
    /// Bytes this column occupies in each row.
    pub fn cell_width(&self) -> usize {
        match (self.descriptor, self.datatype) {
            (Some(d), _) => d.byte_size(),
            (None, BinaryColumnType::Bit) => self.repeat.div_ceil(8),
            (None, ty) => self.repeat * ty.byte_size(),
        }
    }

    /// The TFORMn text, with the current maximum for variable-length columns.
    pub fn render(&self) -> String {
        match self.descriptor {
            Some(d) => {
                let p = if d == DescriptorKind::P { 'P' } else { 'Q' };
                format!("1{p}{}({})", self.datatype.code(), self.max_len)
            }
            None => format!("{}{}", self.repeat, self.datatype.code()),
        }
    }
}

/// Parse a TFORMn value like "1J", "10E", "20A", "20A5", "1024X", "1PB(200)", "QJ".
pub fn parse_tform(s: &str) -> Result<Tform> {
    let bad = || Error::InvalidTform(s.to_string());
    let t = s.trim();

    let (body, max_len) = match t.find('(') {
        Some(p) => {
            let inner = t[p + 1..].strip_suffix(')').ok_or_else(bad)?;
            (&t[..p], inner.trim().parse::<usize>().map_err(|_| bad())?)
        }
        None => (t, 0),
    };

    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    let repeat = if digits == 0 {
        1
    } else {
        body[..digits].parse::<usize>().map_err(|_| bad())?
    };
    let mut rest = body[digits..].bytes();

    let mut code = rest.next().ok_or_else(bad)?;
    let descriptor = match code {
        b'P' => Some(DescriptorKind::P),
        b'Q' => Some(DescriptorKind::Q),
        _ => None,
    };
    if descriptor.is_some() {
        code = rest.next().ok_or_else(bad)?;
    }
    let datatype = BinaryColumnType::from_code(code).ok_or_else(bad)?;

    // Only the rAw string form may carry trailing characters.
    let tail: Vec<u8> = rest.collect();
    let tail_ok = tail.is_empty()
        || (datatype == BinaryColumnType::Ascii && tail.iter().all(u8::is_ascii_digit));
    if !tail_ok {
        return Err(bad());
    }

    Ok(Tform {
        repeat: if descriptor.is_some() { 1 } else { repeat },
        datatype,
        descriptor,
        max_len,
    })
}

/// Definition of a column for a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub tform: String,
    pub unit: Option<String>,
}

impl ColumnDef {
    pub fn new(name: &str, tform: &str) -> Self {
        ColumnDef {
            name: name.to_string(),
            tform: tform.to_string(),
            unit: None,
        }
    }
}

/// The in-memory layout record of one column.
///
/// `datatype`, `repeat` and `width` govern how element numbers map to
/// bytes. They start out as declared by TFORMn but may be reinterpreted for
/// the duration of a raw transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub datatype: BinaryColumnType,
    pub repeat: usize,
    /// Bytes per element.
    pub width: usize,
    /// Byte offset of the column within a row.
    pub offset: usize,
    pub descriptor: Option<DescriptorKind>,
    pub scaling: Scaling,
    tform: Tform,
}

impl ColumnLayout {
    fn new(tform: Tform, offset: usize) -> Self {
        ColumnLayout {
            name: None,
            unit: None,
            datatype: tform.datatype,
            repeat: tform.repeat,
            width: tform.datatype.byte_size(),
            offset,
            descriptor: tform.descriptor,
            scaling: Scaling::IDENTITY,
            tform,
        }
    }

    /// The TFORM the column was declared with.
    pub fn tform(&self) -> &Tform {
        &self.tform
    }

    pub fn is_variable(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn cell_width(&self) -> usize {
        self.tform.cell_width()
    }
}

/// A binary table's column layout, fixed-width rows and heap.
#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    naxis1: usize,
    nrows: usize,
    columns: Vec<ColumnLayout>,
    rows: Vec<u8>,
    heap: Vec<u8>,
}

fn indexed(prefix: &str, n: usize) -> String {
    format!("{prefix}{n}")
}

fn optional_string(header: &Header, name: &str) -> Option<String> {
    match header.value(name) {
        Ok(Value::String(s)) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Read a scale or offset keyword; only absence falls back to the default.
fn scaling_keyword(header: &Header, name: &str, default: f64) -> Result<f64> {
    match header.float(name) {
        Ok(v) => Ok(v),
        Err(Error::MissingKeyword(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

pub(crate) fn column_scaling(header: &Header, col: usize) -> Result<Scaling> {
    Ok(Scaling {
        scale: scaling_keyword(header, &indexed("TSCAL", col), 1.0)?,
        zero: scaling_keyword(header, &indexed("TZERO", col), 0.0)?,
    })
}

/// A non-negative size keyword.
fn header_size(header: &Header, name: &str) -> Result<usize> {
    usize::try_from(header.integer(name)?).map_err(|_| Error::InvalidValue(name.to_string()))
}

impl BinTable {
    /// Build the table from its header and data segment (rows then heap).
    pub fn from_header(header: &Header, data: &[u8]) -> Result<Self> {
        let naxis1 = header_size(header, "NAXIS1")?;
        let nrows = header_size(header, "NAXIS2")?;
        let tfields = header_size(header, "TFIELDS")?;

        let mut columns = Vec::with_capacity(tfields);
        let mut offset = 0;
        for n in 1..=tfields {
            let tform = match header.value(&indexed("TFORM", n))? {
                Value::String(s) => parse_tform(s)?,
                _ => return Err(Error::InvalidValue(indexed("TFORM", n))),
            };
            let mut layout = ColumnLayout::new(tform, offset);
            layout.name = optional_string(header, &indexed("TTYPE", n));
            layout.unit = optional_string(header, &indexed("TUNIT", n));
            layout.scaling = column_scaling(header, n)?;
            offset += layout.cell_width();
            columns.push(layout);
        }
        if offset != naxis1 {
            return Err(Error::InvalidHeader("column widths do not add up to NAXIS1"));
        }

        let table_len = naxis1
            .checked_mul(nrows)
            .ok_or(Error::InvalidHeader("table size overflows"))?;
        if data.len() < table_len {
            return Err(Error::UnexpectedEof);
        }
        let heap_start = match header.integer("THEAP") {
            Ok(t) => usize::try_from(t).map_err(|_| Error::InvalidValue(String::from("THEAP")))?,
            Err(Error::MissingKeyword(_)) => table_len,
            Err(e) => return Err(e),
        };

        Ok(BinTable {
            naxis1,
            nrows,
            columns,
            rows: data[..table_len].to_vec(),
            heap: data.get(heap_start..).unwrap_or(&[]).to_vec(),
        })
    }

    /// Create an empty-valued table and the header cards describing it.
    pub fn create(nrows: usize, defs: &[ColumnDef], extname: Option<&str>) -> Result<(Self, Header)> {
        let mut columns = Vec::with_capacity(defs.len());
        let mut offset = 0;
        for def in defs {
            let mut layout = ColumnLayout::new(parse_tform(&def.tform)?, offset);
            layout.name = Some(def.name.clone());
            layout.unit = def.unit.clone();
            offset += layout.cell_width();
            columns.push(layout);
        }

        let table = BinTable {
            naxis1: offset,
            nrows,
            columns,
            rows: vec![0u8; offset * nrows],
            heap: Vec::new(),
        };
        let header = build_binary_table_header(&table, extname)?;
        Ok((table, header))
    }

    pub fn num_rows(&self) -> usize {
        self.nrows
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row_width(&self) -> usize {
        self.naxis1
    }

    pub fn columns(&self) -> &[ColumnLayout] {
        &self.columns
    }

    /// Layout record of 1-based column `col`.
    pub fn column(&self, col: usize) -> Result<&ColumnLayout> {
        col.checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or(Error::BadColumnNumber(col))
    }

    pub fn column_mut(&mut self, col: usize) -> Result<&mut ColumnLayout> {
        col.checked_sub(1)
            .and_then(|i| self.columns.get_mut(i))
            .ok_or(Error::BadColumnNumber(col))
    }

    /// 1-based number of the column whose TTYPE matches `name`, ignoring case.
    pub fn column_number(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .map(|i| i + 1)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub(crate) fn refresh_scaling(&mut self, header: &Header) -> Result<()> {
        for (i, layout) in self.columns.iter_mut().enumerate() {
            layout.scaling = column_scaling(header, i + 1)?;
        }
        Ok(())
    }

    fn check_read_row(&self, row: usize) -> Result<()> {
        if row == 0 || row > self.nrows {
            return Err(Error::BadRowNumber(row));
        }
        Ok(())
    }

    /// Grow the table so that `last_row` exists.
    fn ensure_rows(&mut self, last_row: usize) {
        if last_row > self.nrows {
            self.rows.resize(last_row * self.naxis1, 0);
            self.nrows = last_row;
        }
    }

    fn cell_start(&self, layout: &ColumnLayout, row0: usize) -> usize {
        row0 * self.naxis1 + layout.offset
    }

    /// Row/element pairs (both 0-based) covered by a transfer.
    fn span(
        layout: &ColumnLayout,
        firstrow: usize,
        firstelem: usize,
        n: usize,
    ) -> Result<impl Iterator<Item = (usize, usize)>> {
        if firstrow == 0 {
            return Err(Error::BadRowNumber(firstrow));
        }
        if firstelem == 0 || firstelem > layout.repeat {
            return Err(Error::BadElementNumber(firstelem));
        }
        let repeat = layout.repeat;
        let start = (firstrow - 1) * repeat + (firstelem - 1);
        Ok((start..start + n).map(move |e| (e / repeat, e % repeat)))
    }

    fn last_row(layout: &ColumnLayout, firstrow: usize, firstelem: usize, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((firstrow - 1) * layout.repeat + firstelem - 1 + n - 1) / layout.repeat + 1
    }

    fn fixed_layout(&self, col: usize) -> Result<ColumnLayout> {
        let layout = self.column(col)?;
        if layout.is_variable() {
            return Err(Error::BadDataType("variable-length column needs a row transfer"));
        }
        Ok(layout.clone())
    }

    /// Read `n` elements starting at (`firstrow`, `firstelem`), flowing
    /// across row boundaries by the layout's repeat count.
    ///
    /// Bit columns yield one element (0 or 1) per bit.
    pub fn read_col<T: Element>(&self, col: usize, firstrow: usize, firstelem: usize, n: usize) -> Result<Vec<T>> {
        let layout = self.fixed_layout(col)?;
        if n > 0 {
            self.check_read_row(Self::last_row(&layout, firstrow.max(1), firstelem.max(1), n))?;
        }
        let mut out = Vec::with_capacity(n);
        for (row0, elem) in Self::span(&layout, firstrow, firstelem, n)? {
            let cell = self.cell_start(&layout, row0);
            let value = if layout.datatype == BinaryColumnType::Bit {
                let byte = self.rows[cell + elem / 8];
                T::from_int(i64::from((byte >> (7 - elem % 8)) & 1)).ok_or(Error::NumericOverflow)?
            } else {
                let at = cell + elem * layout.width;
                read_element(layout.datatype, layout.scaling, &self.rows[at..at + layout.width])?
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Write elements starting at (`firstrow`, `firstelem`); the table grows
    /// when the transfer runs past the last row.
    pub fn write_col<T: Element>(&mut self, col: usize, firstrow: usize, firstelem: usize, values: &[T]) -> Result<()> {
        let layout = self.fixed_layout(col)?;
        let span = Self::span(&layout, firstrow, firstelem, values.len())?;
        self.ensure_rows(Self::last_row(&layout, firstrow, firstelem, values.len()));

        for ((row0, elem), value) in span.zip(values.iter().copied()) {
            let cell = row0 * self.naxis1 + layout.offset;
            if layout.datatype == BinaryColumnType::Bit {
                let mask = 0x80u8 >> (elem % 8);
                let byte = &mut self.rows[cell + elem / 8];
                if value != T::default() {
                    *byte |= mask;
                } else {
                    *byte &= !mask;
                }
            } else {
                let at = cell + elem * layout.width;
                write_element(layout.datatype, layout.scaling, value, &mut self.rows[at..at + layout.width])?;
            }
        }
        Ok(())
    }

    /// Raw cell bytes of `nrows` consecutive rows, concatenated.
    pub fn read_cells(&self, col: usize, firstrow: usize, nrows: usize) -> Result<Vec<u8>> {
        let layout = self.column(col)?;
        self.check_read_row(firstrow)?;
        if nrows > 0 {
            self.check_read_row(firstrow + nrows - 1)?;
        }
        let width = layout.cell_width();
        let mut out = Vec::with_capacity(width * nrows);
        for row0 in firstrow - 1..firstrow - 1 + nrows {
            let cell = self.cell_start(layout, row0);
            out.extend_from_slice(&self.rows[cell..cell + width]);
        }
        Ok(out)
    }

    // ── Variable-length arrays ──

    /// Element count and heap offset stored in a row's descriptor.
    pub fn read_descriptor(&self, col: usize, row: usize) -> Result<(usize, usize)> {
        let layout = self.column(col)?;
        let kind = layout.descriptor.ok_or(Error::NotVariableLength(col))?;
        self.check_read_row(row)?;
        let cell = &self.rows[self.cell_start(layout, row - 1)..];
        let (count, offset) = match kind {
            DescriptorKind::P => (
                i64::from(i32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]])),
                i64::from(i32::from_be_bytes([cell[4], cell[5], cell[6], cell[7]])),
            ),
            DescriptorKind::Q => {
                let mut c = [0u8; 8];
                let mut o = [0u8; 8];
                c.copy_from_slice(&cell[..8]);
                o.copy_from_slice(&cell[8..16]);
                (i64::from_be_bytes(c), i64::from_be_bytes(o))
            }
        };
        if count < 0 || offset < 0 {
            return Err(Error::InvalidHeader("negative variable-length descriptor"));
        }
        Ok((count as usize, offset as usize))
    }

    fn heap_slice(&self, layout: &ColumnLayout, count: usize, offset: usize) -> Result<&[u8]> {
        let end = count
            .checked_mul(layout.width)
            .and_then(|len| len.checked_add(offset))
            .ok_or(Error::UnexpectedEof)?;
        self.heap.get(offset..end).ok_or(Error::UnexpectedEof)
    }

    /// All elements of one row of a variable-length column.
    pub fn read_var<T: Element>(&self, col: usize, row: usize) -> Result<Vec<T>> {
        let (count, offset) = self.read_descriptor(col, row)?;
        let layout = self.column(col)?;
        if matches!(layout.datatype, BinaryColumnType::Bit | BinaryColumnType::Ascii) {
            return Err(Error::BadDataType(layout.datatype.name()));
        }
        self.heap_slice(layout, count, offset)?
            .chunks_exact(layout.width)
            .map(|bytes| read_element(layout.datatype, layout.scaling, bytes))
            .collect()
    }

    /// Replace one row of a variable-length column; the new array is
    /// appended to the heap.
    pub fn write_var<T: Element>(&mut self, col: usize, row: usize, values: &[T]) -> Result<()> {
        let layout = self.column(col)?.clone();
        layout.descriptor.ok_or(Error::NotVariableLength(col))?;
        if matches!(layout.datatype, BinaryColumnType::Bit | BinaryColumnType::Ascii) {
            return Err(Error::BadDataType(layout.datatype.name()));
        }
        let mut bytes = vec![0u8; values.len() * layout.width];
        for (value, out) in values.iter().zip(bytes.chunks_exact_mut(layout.width)) {
            write_element(layout.datatype, layout.scaling, *value, out)?;
        }
        self.append_var_bytes(col, row, values.len(), &bytes)
    }

    fn append_var_bytes(&mut self, col: usize, row: usize, count: usize, bytes: &[u8]) -> Result<()> {
        if row == 0 {
            return Err(Error::BadRowNumber(row));
        }
        self.ensure_rows(row);
        let offset = self.heap.len();
        self.heap.extend_from_slice(bytes);

        let layout = self.column_mut(col)?;
        layout.tform.max_len = layout.tform.max_len.max(count);
        let kind = layout.descriptor.ok_or(Error::NotVariableLength(col))?;
        let at = (row - 1) * self.naxis1 + self.columns[col - 1].offset;
        match kind {
            DescriptorKind::P => {
                let c = i32::try_from(count).map_err(|_| Error::NumericOverflow)?;
                let o = i32::try_from(offset).map_err(|_| Error::NumericOverflow)?;
                self.rows[at..at + 4].copy_from_slice(&c.to_be_bytes());
                self.rows[at + 4..at + 8].copy_from_slice(&o.to_be_bytes());
            }
            DescriptorKind::Q => {
                self.rows[at..at + 8].copy_from_slice(&(count as i64).to_be_bytes());
                self.rows[at + 8..at + 16].copy_from_slice(&(offset as i64).to_be_bytes());
            }
        }
        Ok(())
    }

    // ── Strings ──

    /// The string stored in one row; trailing blanks and NULs are dropped.
    pub fn read_string(&self, col: usize, row: usize) -> Result<String> {
        let layout = self.column(col)?;
        if layout.datatype != BinaryColumnType::Ascii {
            return Err(Error::BadDataType(layout.datatype.name()));
        }
        self.check_read_row(row)?;
        let bytes = if layout.is_variable() {
            let (count, offset) = self.read_descriptor(col, row)?;
            self.heap_slice(layout, count, offset)?
        } else {
            let cell = self.cell_start(layout, row - 1);
            &self.rows[cell..cell + layout.repeat]
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).trim_end().to_string())
    }

    /// Store a string in one row, blank-padded or truncated to the cell width.
    pub fn write_string(&mut self, col: usize, row: usize, value: &str) -> Result<()> {
        let layout = self.column(col)?;
        if layout.datatype != BinaryColumnType::Ascii {
            return Err(Error::BadDataType(layout.datatype.name()));
        }
        if layout.is_variable() {
            return self.append_var_bytes(col, row, value.len(), value.as_bytes());
        }
        if row == 0 {
            return Err(Error::BadRowNumber(row));
        }
        let (offset, width) = (layout.offset, layout.repeat);
        self.ensure_rows(row);
        let cell = (row - 1) * self.naxis1 + offset;
        let dest = &mut self.rows[cell..cell + width];
        dest.fill(b' ');
        let n = value.len().min(width);
        dest[..n].copy_from_slice(&value.as_bytes()[..n]);
        Ok(())
    }

    // ── Row editing ──

    /// Insert `n` zeroed rows after row `after` (0 inserts at the top).
    pub fn insert_rows(&mut self, after: usize, n: usize) -> Result<()> {
        if after > self.nrows {
            return Err(Error::BadRowNumber(after));
        }
        let at = after * self.naxis1;
        self.rows
            .splice(at..at, std::iter::repeat(0u8).take(n * self.naxis1));
        self.nrows += n;
        Ok(())
    }

    /// Delete `n` rows starting at 1-based row `first`.
    ///
    /// Heap space referenced by deleted rows is not reclaimed.
    pub fn delete_rows(&mut self, first: usize, n: usize) -> Result<()> {
        if first == 0 || first > self.nrows {
            return Err(Error::BadRowNumber(first));
        }
        if first - 1 + n > self.nrows {
            return Err(Error::BadRowNumber(first + n - 1));
        }
        let start = (first - 1) * self.naxis1;
        self.rows.drain(start..start + n * self.naxis1);
        self.nrows -= n;
        Ok(())
    }

    // ── Column editing ──

    /// Insert zero-filled columns before 1-based column `col`.
    ///
    /// `col == num_cols() + 1` appends after the last column.
    pub fn insert_columns(&mut self, col: usize, defs: &[ColumnDef]) -> Result<()> {
        if col == 0 || col > self.columns.len() + 1 {
            return Err(Error::BadColumnNumber(col));
        }
        if self.columns.len() + defs.len() > MAX_COLUMNS {
            return Err(Error::BadColumnNumber(self.columns.len() + defs.len()));
        }
        let mut added = Vec::with_capacity(defs.len());
        for def in defs {
            let mut layout = ColumnLayout::new(parse_tform(&def.tform)?, 0);
            layout.name = Some(def.name.clone());
            layout.unit = def.unit.clone();
            added.push(layout);
        }
        let at = self.columns.get(col - 1).map_or(self.naxis1, |c| c.offset);
        let width = added.iter().map(ColumnLayout::cell_width).sum();
        self.rows = self.spliced_rows(at, 0, width);
        self.columns.splice(col - 1..col - 1, added);
        self.relayout();
        Ok(())
    }

    /// Remove column `col`. Its heap data is not reclaimed.
    pub fn delete_column(&mut self, col: usize) -> Result<()> {
        let layout = self.column(col)?;
        let (at, width) = (layout.offset, layout.cell_width());
        self.rows = self.spliced_rows(at, width, 0);
        self.columns.remove(col - 1);
        self.relayout();
        Ok(())
    }

    /// Every row with `removed` bytes at `at` replaced by `added` zero bytes.
    fn spliced_rows(&self, at: usize, removed: usize, added: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.naxis1 - removed + added) * self.nrows);
        for r in 0..self.nrows {
            let row = &self.rows[r * self.naxis1..(r + 1) * self.naxis1];
            out.extend_from_slice(&row[..at]);
            out.resize(out.len() + added, 0);
            out.extend_from_slice(&row[at + removed..]);
        }
        out
    }

    fn relayout(&mut self) {
        let mut offset = 0;
        for layout in &mut self.columns {
            layout.offset = offset;
            offset += layout.cell_width();
        }
        self.naxis1 = offset;
    }

    // ── Serialization ──

    /// Bring NAXIS1, NAXIS2, TFIELDS, PCOUNT and variable-length TFORMs in
    /// line with the data.
    pub fn sync_header(&self, header: &mut Header) -> Result<()> {
        header.update("NAXIS1", Value::Integer(self.naxis1 as i64), None)?;
        header.update("NAXIS2", Value::Integer(self.nrows as i64), None)?;
        header.update("TFIELDS", Value::Integer(self.columns.len() as i64), None)?;
        header.update("PCOUNT", Value::Integer(self.heap.len() as i64), None)?;
        if header.contains("THEAP") {
            header.update("THEAP", Value::Integer(self.rows.len() as i64), None)?;
        }
        for (i, layout) in self.columns.iter().enumerate() {
            if layout.is_variable() {
                header.update(&indexed("TFORM", i + 1), Value::String(layout.tform.render()), None)?;
            }
        }
        Ok(())
    }

    /// The unpadded data segment: rows followed by the heap.
    pub fn data_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rows.len() + self.heap.len());
        out.extend_from_slice(&self.rows);
        out.extend_from_slice(&self.heap);
        out
    }
}

/// Highest column number an indexed keyword can carry.
const MAX_COLUMNS: usize = 999;

/// Indexed keywords that describe a single column.
const COLUMN_KEYWORDS: [&str; 9] = ["TTYPE", "TFORM", "TUNIT", "TSCAL", "TZERO", "TNULL", "TDISP", "TDIM", "TCOMM"];

/// Prefix and column number of an indexed column keyword such as `TFORM12`.
fn column_keyword(card: &Card) -> Option<(&'static str, usize)> {
    let name = card.keyword_str();
    COLUMN_KEYWORDS.iter().find_map(|&prefix| {
        let digits = name.strip_prefix(prefix)?;
        if digits.starts_with('0') {
            return None;
        }
        Some((prefix, digits.parse().ok()?))
    })
}

fn column_keyword_index(card: &Card) -> Option<usize> {
    column_keyword(card).map(|(_, n)| n)
}

/// Renumber column keywords for columns `col..` by `shift`.
fn shift_column_keywords(header: &mut Header, col: usize, shift: isize) -> Result<()> {
    for card in header.cards_mut() {
        let Some((prefix, n)) = column_keyword(card) else {
            continue;
        };
        if n < col {
            continue;
        }
        let renumbered = n.checked_add_signed(shift).ok_or(Error::BadColumnNumber(n))?;
        card.keyword = make_keyword(&indexed(prefix, renumbered))?;
    }
    Ok(())
}

/// Header side of [`BinTable::insert_columns`]: shift the keywords of
/// columns at and after `col`, then describe the new ones in their place.
pub(crate) fn insert_column_keywords(header: &mut Header, col: usize, defs: &[ColumnDef]) -> Result<()> {
    shift_column_keywords(header, col, defs.len() as isize)?;

    let cards = header.cards();
    let after_previous = cards
        .iter()
        .rposition(|c| column_keyword_index(c).is_some_and(|n| n < col))
        .map(|i| i + 1 + cards[i + 1..].iter().take_while(|c| c.is_continue()).count());
    let mut idx = match after_previous {
        Some(i) => i,
        None => header.position("TFIELDS")? + 1,
    };
    for (n, def) in (col..).zip(defs) {
        let mut new_cards = vec![
            Card::new(&indexed("TTYPE", n), Value::String(def.name.clone()), None)?,
            Card::new(&indexed("TFORM", n), Value::String(parse_tform(&def.tform)?.render()), None)?,
        ];
        if let Some(ref unit) = def.unit {
            new_cards.push(Card::new(&indexed("TUNIT", n), Value::String(unit.clone()), None)?);
        }
        for card in new_cards {
            header.insert(idx, card);
            idx += 1;
        }
    }
    Ok(())
}

/// Header side of [`BinTable::delete_column`]: drop the keywords of `col`
/// and renumber the columns after it.
pub(crate) fn delete_column_keywords(header: &mut Header, col: usize) -> Result<()> {
    let names: Vec<String> = header
        .cards()
        .iter()
        .filter(|c| c.value.is_some() && column_keyword_index(c) == Some(col))
        .map(|c| c.keyword_str().to_string())
        .collect();
    for name in names {
        header.delete(&name)?;
    }
    shift_column_keywords(header, col + 1, -1)
}

/// Header cards describing a binary table extension.
fn build_binary_table_header(table: &BinTable, extname: Option<&str>) -> Result<Header> {
    let mut header = Header::from_cards(vec![
        Card::new("XTENSION", Value::String(String::from("BINTABLE")), Some("binary table extension"))?,
        Card::new("BITPIX", Value::Integer(8), Some("8-bit bytes"))?,
        Card::new("NAXIS", Value::Integer(2), Some("2-dimensional binary table"))?,
        Card::new("NAXIS1", Value::Integer(table.naxis1 as i64), Some("width of table in bytes"))?,
        Card::new("NAXIS2", Value::Integer(table.nrows as i64), Some("number of rows in table"))?,
        Card::new("PCOUNT", Value::Integer(0), Some("size of special data area"))?,
        Card::new("GCOUNT", Value::Integer(1), Some("one data group (required keyword)"))?,
        Card::new("TFIELDS", Value::Integer(table.columns.len() as i64), Some("number of fields in each row"))?,
    ]);

    for (i, col) in table.columns.iter().enumerate() {
        let n = i + 1;
        if let Some(ref name) = col.name {
            header.push(Card::new(&indexed("TTYPE", n), Value::String(name.clone()), None)?);
        }
        header.push(Card::new(&indexed("TFORM", n), Value::String(col.tform.render()), None)?);
        if let Some(ref unit) = col.unit {
            header.push(Card::new(&indexed("TUNIT", n), Value::String(unit.clone()), None)?);
        }
    }

    if let Some(name) = extname {
        header.push(Card::new("EXTNAME", Value::String(name.to_string()), Some("name of this binary table extension"))?);
    }
    Ok(header)
}
