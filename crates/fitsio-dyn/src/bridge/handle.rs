//! Ownership of an open file and the table/HDU helpers that need nothing
//! beyond it.

use std::path::Path;
use std::str::FromStr;

use crate::bintable::ColumnDef;
use crate::fitsfile::{FitsFile, IoMode};
use crate::hdu::HduKind;

use super::errors::{Error, Result};

/// How [`FileHandle::open`] acquires the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
    /// Remove any existing file, then create a new empty one.
    CreateTruncating,
}

impl FromStr for OpenMode {
    type Err = Error;

    /// Accepts the single-letter modes `r`, `w` and `c`.
    fn from_str(s: &str) -> Result<Self> {
        match s.chars().next() {
            Some('r') => Ok(OpenMode::ReadOnly),
            Some('w') => Ok(OpenMode::ReadWrite),
            Some('c') => Ok(OpenMode::CreateTruncating),
            _ => Err(Error::OutOfRange("open mode")),
        }
    }
}

/// Sole owner of an open FITS file.
///
/// Closing is idempotent; every other operation on a closed handle fails
/// with [`Error::InvalidHandle`]. Dropping the handle closes it.
#[derive(Debug)]
pub struct FileHandle {
    file: Option<FitsFile>,
}

impl FileHandle {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            OpenMode::ReadOnly => FitsFile::open(path, IoMode::ReadOnly)?,
            OpenMode::ReadWrite => FitsFile::open(path, IoMode::ReadWrite)?,
            OpenMode::CreateTruncating => {
                if let Err(e) = std::fs::remove_file(path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(Error::PermissionDenied(format!(
                            "unable to create a new version of {}: {e}",
                            path.display()
                        )));
                    }
                }
                FitsFile::create(path)?
            }
        };
        Ok(FileHandle { file: Some(file) })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub(crate) fn file(&self) -> Result<&FitsFile> {
        self.file.as_ref().ok_or(Error::InvalidHandle)
    }

    pub(crate) fn file_mut(&mut self) -> Result<&mut FitsFile> {
        self.file.as_mut().ok_or(Error::InvalidHandle)
    }

    /// Flush and release the file. Closing a closed handle succeeds.
    pub fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(file) => {
                let path = file.path().to_path_buf();
                file.close()?;
                tracing::debug!(path = %path.display(), "closed file handle");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Release the file and remove it from disk.
    pub fn delete(&mut self) -> Result<()> {
        match self.file.take() {
            Some(file) => Ok(file.delete()?),
            None => Ok(()),
        }
    }

    // ── HDU navigation ──

    pub fn num_hdus(&self) -> Result<usize> {
        Ok(self.file()?.num_hdus())
    }

    /// Make HDU `n` (1-based) current and return its kind.
    pub fn move_to_hdu(&mut self, n: usize) -> Result<HduKind> {
        Ok(self.file_mut()?.move_to_hdu(n)?)
    }

    pub fn current_hdu_number(&self) -> Result<usize> {
        Ok(self.file()?.current_hdu_number())
    }

    pub fn hdu_type(&self) -> Result<HduKind> {
        Ok(self.file()?.hdu_type()?)
    }

    // ── Table helpers ──

    pub fn num_rows(&self) -> Result<usize> {
        Ok(self.file()?.table()?.num_rows())
    }

    pub fn num_cols(&self) -> Result<usize> {
        Ok(self.file()?.table()?.num_cols())
    }

    /// Number of the column named `name`, ignoring case.
    pub fn column_number(&self, name: &str) -> Result<usize> {
        Ok(self.file()?.table()?.column_number(name)?)
    }

    pub fn create_binary_table(&mut self, nrows: usize, columns: &[ColumnDef], extname: Option<&str>) -> Result<()> {
        Ok(self.file_mut()?.create_binary_table(nrows, columns, extname)?)
    }

    /// Append a zero-filled image; `naxes` is in format order (NAXIS1 first).
    pub fn create_image(&mut self, bitpix: i64, naxes: &[usize]) -> Result<()> {
        Ok(self.file_mut()?.create_image(bitpix, naxes)?)
    }

    /// Insert `num` blank rows after row `first`.
    pub fn insert_rows(&mut self, first: i64, num: i64) -> Result<()> {
        let (first, num) = positive_rows(first, num)?;
        Ok(self.file_mut()?.table_mut()?.insert_rows(first, num)?)
    }

    /// Delete `num` rows starting at row `first`.
    pub fn delete_rows(&mut self, first: i64, num: i64) -> Result<()> {
        let (first, num) = positive_rows(first, num)?;
        Ok(self.file_mut()?.table_mut()?.delete_rows(first, num)?)
    }

    /// Insert blank columns before column `col`; one past the last column
    /// appends.
    pub fn insert_cols(&mut self, col: i64, columns: &[ColumnDef]) -> Result<()> {
        if col <= 0 {
            return Err(Error::OutOfRange("column number"));
        }
        Ok(self.file_mut()?.insert_columns(col as usize, columns)?)
    }

    pub fn delete_col(&mut self, col: i64) -> Result<()> {
        if col <= 0 {
            return Err(Error::OutOfRange("column number"));
        }
        Ok(self.file_mut()?.delete_column(col as usize)?)
    }
}

fn positive_rows(first: i64, num: i64) -> Result<(usize, usize)> {
    if first <= 0 || num < 0 {
        return Err(Error::OutOfRange("first row and row count"));
    }
    Ok((first as usize, num as usize))
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "closing dropped file handle failed");
        }
    }
}
