use crate::status::status_text;

/// Status reported for failures raised by the bridge itself rather than the
/// format layer.
pub const BRIDGE_STATUS: i32 = -1;

/// Errors surfaced by the dynamic-type bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation on a closed handle.
    #[error("file handle is closed")]
    InvalidHandle,

    /// Row, column or argument outside its valid range.
    #[error("{0} out of range")]
    OutOfRange(&'static str),

    /// Array element type incompatible with the target.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Column storage type with no dynamic counterpart.
    #[error("unsupported storage type: {0}")]
    UnsupportedStorageType(String),

    /// Bit column whose width is not 8, 16 or 32.
    #[error("unsupported bit width: {0}")]
    UnsupportedBitWidth(usize),

    /// Image rank of zero or above the supported maximum.
    #[error("unsupported image rank {0}")]
    UnsupportedRank(usize),

    /// Dynamic element type that cannot be stored.
    #[error("unsupported element type: {0}")]
    UnsupportedElementType(String),

    /// Bit column width differs from the element width.
    #[error("bit column holds {repeat} bits but elements are {element_bits} bits wide")]
    BitWidthMismatch { repeat: usize, element_bits: usize },

    /// An existing file could not be replaced.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Keyword value kind the generic write does not accept.
    #[error("unsupported keyword value type: {0}")]
    UnsupportedKeywordType(&'static str),

    /// Failure reported by the format layer, with its status code.
    #[error("{message}")]
    FormatError { status: i32, message: String },
}

impl Error {
    /// Numeric status: the format-layer code for [`Error::FormatError`],
    /// [`BRIDGE_STATUS`] otherwise.
    pub fn status(&self) -> i32 {
        match self {
            Error::FormatError { status, .. } => *status,
            _ => BRIDGE_STATUS,
        }
    }
}

impl From<crate::Error> for Error {
    fn from(e: crate::Error) -> Self {
        let status = e.status();
        Error::FormatError {
            status,
            message: format!("{}: {e}", status_text(status)),
        }
    }
}

/// Convenience result type for the bridge.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_carries_status_text() {
        let e: Error = crate::Error::BadColumnNumber(7).into();
        assert_eq!(e.status(), crate::status::BAD_COL_NUM);
        assert_eq!(
            e.to_string(),
            "column number < 1 or > tfields: bad column number 7"
        );
    }

    #[test]
    fn bridge_errors_use_bridge_status() {
        assert_eq!(Error::InvalidHandle.status(), BRIDGE_STATUS);
        assert_eq!(Error::OutOfRange("row number").to_string(), "row number out of range");
    }

    #[test]
    fn bit_width_mismatch_message() {
        let e = Error::BitWidthMismatch { repeat: 12, element_bits: 16 };
        assert_eq!(e.to_string(), "bit column holds 12 bits but elements are 16 bits wide");
    }
}
