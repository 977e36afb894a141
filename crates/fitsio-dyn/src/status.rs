//! Numeric status codes and their short descriptions.
//!
//! The numbering follows the classic FITS library convention so that codes
//! reported by this crate can be compared against other tools' diagnostics.

pub const OK: i32 = 0;
pub const FILE_NOT_OPENED: i32 = 104;
pub const FILE_NOT_CREATED: i32 = 105;
pub const WRITE_ERROR: i32 = 106;
pub const END_OF_FILE: i32 = 107;
pub const READ_ERROR: i32 = 108;
pub const FILE_NOT_CLOSED: i32 = 110;
pub const READONLY_FILE: i32 = 112;
pub const BAD_FILEPTR: i32 = 114;
pub const KEY_NO_EXIST: i32 = 202;
pub const KEY_OUT_BOUNDS: i32 = 203;
pub const VALUE_UNDEFINED: i32 = 204;
pub const NO_QUOTE: i32 = 205;
pub const BAD_KEYCHAR: i32 = 207;
pub const NO_END: i32 = 210;
pub const BAD_BITPIX: i32 = 211;
pub const BAD_NAXIS: i32 = 212;
pub const BAD_NAXES: i32 = 213;
pub const COL_NOT_FOUND: i32 = 219;
pub const NO_XTENSION: i32 = 225;
pub const NOT_BTABLE: i32 = 227;
pub const NOT_IMAGE: i32 = 233;
pub const NOT_TABLE: i32 = 235;
pub const UNKNOWN_EXT: i32 = 251;
pub const BAD_TFORM: i32 = 261;
pub const BAD_HDU_NUM: i32 = 301;
pub const BAD_COL_NUM: i32 = 302;
pub const BAD_ROW_NUM: i32 = 307;
pub const BAD_ELEM_NUM: i32 = 308;
pub const NOT_VARI_LEN: i32 = 317;
pub const BAD_DIMEN: i32 = 320;
pub const BAD_PIX_NUM: i32 = 321;
pub const ZERO_SCALE: i32 = 322;
pub const BAD_C2I: i32 = 407;
pub const BAD_C2D: i32 = 409;
pub const BAD_DATATYPE: i32 = 410;
pub const NUM_OVERFLOW: i32 = 412;

const STATUS_TEXT: &[(i32, &str)] = &[
    (OK, "OK - no error"),
    (FILE_NOT_OPENED, "could not open the named file"),
    (FILE_NOT_CREATED, "couldn't create the named file"),
    (WRITE_ERROR, "error writing to FITS file"),
    (END_OF_FILE, "tried to move past end of file"),
    (READ_ERROR, "error reading from FITS file"),
    (FILE_NOT_CLOSED, "could not close the file"),
    (READONLY_FILE, "cannot write to readonly file"),
    (BAD_FILEPTR, "invalid fitsfile pointer"),
    (KEY_NO_EXIST, "keyword not found in header"),
    (KEY_OUT_BOUNDS, "keyword record number is out of bounds"),
    (VALUE_UNDEFINED, "keyword value field is blank"),
    (NO_QUOTE, "string is missing the closing quote"),
    (BAD_KEYCHAR, "illegal character in keyword name or card"),
    (NO_END, "couldn't find END keyword"),
    (BAD_BITPIX, "illegal BITPIX keyword value"),
    (BAD_NAXIS, "illegal NAXIS keyword value"),
    (BAD_NAXES, "illegal NAXISn keyword value"),
    (COL_NOT_FOUND, "column name not found"),
    (NO_XTENSION, "XTENSION keyword not found"),
    (NOT_BTABLE, "CHDU is not a binary table extension"),
    (NOT_IMAGE, "CHDU is not an IMAGE extension"),
    (NOT_TABLE, "CHDU is not a table"),
    (UNKNOWN_EXT, "unrecognizable FITS extension type"),
    (BAD_TFORM, "illegal TFORM format code"),
    (BAD_HDU_NUM, "HDU number < 1 or > MAXHDU"),
    (BAD_COL_NUM, "column number < 1 or > tfields"),
    (BAD_ROW_NUM, "bad first row number"),
    (BAD_ELEM_NUM, "bad first element number"),
    (NOT_VARI_LEN, "this is not a variable length column"),
    (BAD_DIMEN, "illegal number of dimensions in array"),
    (BAD_PIX_NUM, "first pixel number greater than last pixel"),
    (ZERO_SCALE, "illegal BSCALE or TSCALn keyword = 0"),
    (BAD_C2I, "bad formatted string to int conversion"),
    (BAD_C2D, "bad formatted string to double conversion"),
    (BAD_DATATYPE, "illegal datatype code value"),
    (NUM_OVERFLOW, "numerical overflow during type conversion"),
];

/// Return the short description of a status code.
///
/// Unknown codes yield `"unknown error status"`.
pub fn status_text(status: i32) -> &'static str {
    STATUS_TEXT
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, text)| *text)
        .unwrap_or("unknown error status")
}
