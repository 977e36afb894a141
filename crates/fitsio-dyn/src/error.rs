use crate::status;

/// All errors that can occur during FITS I/O operations.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block.
    InvalidHeader(&'static str),
    /// Premature end of data while reading.
    UnexpectedEof,
    /// Unrecognized BITPIX value.
    InvalidBitpix(i64),
    /// NAXIS outside the range the format allows.
    InvalidNaxis(i64),
    /// Malformed keyword name in a header card.
    InvalidKeyword,
    /// Unknown or unsupported XTENSION type.
    UnsupportedExtension(String),
    /// A header value could not be converted to the requested type.
    InvalidValue(String),
    /// A keyword was not found in the header.
    MissingKeyword(String),
    /// The keyword exists but its value field is blank.
    UndefinedValue(String),
    /// Header record number past the last card.
    RecordOutOfBounds(usize),
    /// Unparseable TFORMn value.
    InvalidTform(String),
    /// HDU number outside `1..=num_hdus`.
    BadHduNumber(usize),
    /// The current HDU is not a binary table.
    NotBinaryTable,
    /// The current HDU is not an image.
    NotImage,
    /// Column number outside `1..=tfields`.
    BadColumnNumber(usize),
    /// No column has the requested TTYPEn name.
    ColumnNotFound(String),
    /// Row number outside the table.
    BadRowNumber(usize),
    /// Element number outside the column's repeat.
    BadElementNumber(usize),
    /// Descriptor access on a fixed-width column.
    NotVariableLength(usize),
    /// Axis count or axis lengths not acceptable.
    BadDimension(usize),
    /// Pixel range runs past the end of the image.
    BadPixelNumber(usize),
    /// TSCALn or BSCALE of zero.
    ZeroScale,
    /// A transfer between incompatible storage and host types.
    BadDataType(&'static str),
    /// A value does not fit the destination type.
    NumericOverflow,
    /// Write attempted on a file opened read-only.
    ReadOnly,
    /// An I/O error from the standard library.
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The numeric status code reported for this error.
    pub fn status(&self) -> i32 {
        match self {
            Error::InvalidHeader(_) => status::NO_END,
            Error::UnexpectedEof => status::END_OF_FILE,
            Error::InvalidBitpix(_) => status::BAD_BITPIX,
            Error::InvalidNaxis(_) => status::BAD_NAXIS,
            Error::InvalidKeyword => status::BAD_KEYCHAR,
            Error::UnsupportedExtension(_) => status::UNKNOWN_EXT,
            Error::InvalidValue(_) => status::BAD_C2D,
            Error::MissingKeyword(_) => status::KEY_NO_EXIST,
            Error::UndefinedValue(_) => status::VALUE_UNDEFINED,
            Error::RecordOutOfBounds(_) => status::KEY_OUT_BOUNDS,
            Error::InvalidTform(_) => status::BAD_TFORM,
            Error::BadHduNumber(_) => status::BAD_HDU_NUM,
            Error::NotBinaryTable => status::NOT_BTABLE,
            Error::NotImage => status::NOT_IMAGE,
            Error::BadColumnNumber(_) => status::BAD_COL_NUM,
            Error::ColumnNotFound(_) => status::COL_NOT_FOUND,
            Error::BadRowNumber(_) => status::BAD_ROW_NUM,
            Error::BadElementNumber(_) => status::BAD_ELEM_NUM,
            Error::NotVariableLength(_) => status::NOT_VARI_LEN,
            Error::BadDimension(_) => status::BAD_DIMEN,
            Error::BadPixelNumber(_) => status::BAD_PIX_NUM,
            Error::ZeroScale => status::ZERO_SCALE,
            Error::BadDataType(_) => status::BAD_DATATYPE,
            Error::NumericOverflow => status::NUM_OVERFLOW,
            Error::ReadOnly => status::READONLY_FILE,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => status::FILE_NOT_OPENED,
            Error::Io(_) => status::READ_ERROR,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidHeader(msg) => write!(f, "invalid FITS header: {msg}"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::InvalidBitpix(v) => write!(f, "invalid BITPIX value: {v}"),
            Error::InvalidNaxis(v) => write!(f, "invalid NAXIS value: {v}"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::UnsupportedExtension(x) => write!(f, "unsupported XTENSION type: {x}"),
            Error::InvalidValue(kw) => write!(f, "invalid value for keyword {kw}"),
            Error::MissingKeyword(kw) => write!(f, "missing keyword: {kw}"),
            Error::UndefinedValue(kw) => write!(f, "keyword {kw} has an undefined value"),
            Error::RecordOutOfBounds(n) => write!(f, "header record {n} is out of bounds"),
            Error::InvalidTform(t) => write!(f, "invalid TFORM value: {t}"),
            Error::BadHduNumber(n) => write!(f, "no HDU number {n}"),
            Error::NotBinaryTable => write!(f, "current HDU is not a binary table"),
            Error::NotImage => write!(f, "current HDU is not an image"),
            Error::BadColumnNumber(n) => write!(f, "bad column number {n}"),
            Error::ColumnNotFound(name) => write!(f, "no column named {name}"),
            Error::BadRowNumber(n) => write!(f, "bad row number {n}"),
            Error::BadElementNumber(n) => write!(f, "bad element number {n}"),
            Error::NotVariableLength(n) => write!(f, "column {n} is not variable length"),
            Error::BadDimension(n) => write!(f, "bad image dimension {n}"),
            Error::BadPixelNumber(n) => write!(f, "pixel range ends past pixel {n}"),
            Error::ZeroScale => write!(f, "scale factor of zero"),
            Error::BadDataType(what) => write!(f, "unsupported data type conversion: {what}"),
            Error::NumericOverflow => write!(f, "numeric overflow during type conversion"),
            Error::ReadOnly => write!(f, "file is opened read-only"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
