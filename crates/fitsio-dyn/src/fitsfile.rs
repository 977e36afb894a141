//! An open FITS file: the parsed HDU list, a current-HDU cursor and the
//! path it is flushed back to.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::bintable::{BinTable, ColumnDef};
use crate::error::{Error, Result};
use crate::hdu::{parse_fits, Hdu, HduData, HduKind};
use crate::header::Header;
use crate::image::Image;

/// Whether a file is opened for reading or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    ReadOnly,
    ReadWrite,
}

/// An in-memory representation of an open FITS file.
#[derive(Debug)]
pub struct FitsFile {
    path: PathBuf,
    mode: IoMode,
    hdus: Vec<Hdu>,
    current: usize,
    modified: bool,
}

impl FitsFile {
    /// Open and parse an existing file.
    pub fn open<P: AsRef<Path>>(path: P, mode: IoMode) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let hdus = parse_fits(&data)?;
        tracing::debug!(path = %path.as_ref().display(), hdus = hdus.len(), ?mode, "opened FITS file");
        Ok(FitsFile {
            path: path.as_ref().to_path_buf(),
            mode,
            hdus,
            current: 0,
            modified: false,
        })
    }

    /// Create a new, empty file. Fails if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "created FITS file");
        Ok(FitsFile {
            path: path.as_ref().to_path_buf(),
            mode: IoMode::ReadWrite,
            hdus: Vec::new(),
            current: 0,
            modified: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> IoMode {
        self.mode
    }

    pub fn num_hdus(&self) -> usize {
        self.hdus.len()
    }

    /// 1-based number of the current HDU; 0 when the file has none.
    pub fn current_hdu_number(&self) -> usize {
        if self.hdus.is_empty() {
            0
        } else {
            self.current + 1
        }
    }

    pub fn move_to_hdu(&mut self, n: usize) -> Result<HduKind> {
        if n == 0 || n > self.hdus.len() {
            return Err(Error::BadHduNumber(n));
        }
        self.current = n - 1;
        Ok(self.hdus[self.current].kind())
    }

    pub fn hdu_type(&self) -> Result<HduKind> {
        Ok(self.current()?.kind())
    }

    pub fn current(&self) -> Result<&Hdu> {
        self.hdus.get(self.current).ok_or(Error::BadHduNumber(1))
    }

    fn current_mut(&mut self) -> Result<&mut Hdu> {
        self.check_writable()?;
        self.modified = true;
        self.hdus.get_mut(self.current).ok_or(Error::BadHduNumber(1))
    }

    fn check_writable(&self) -> Result<()> {
        match self.mode {
            IoMode::ReadWrite => Ok(()),
            IoMode::ReadOnly => Err(Error::ReadOnly),
        }
    }

    pub fn header(&self) -> Result<&Header> {
        Ok(self.current()?.header())
    }

    /// Edit the current header; column and image scaling follow the edit.
    pub fn edit_header<R>(&mut self, f: impl FnOnce(&mut Header) -> Result<R>) -> Result<R> {
        self.current_mut()?.edit_header(f)
    }

    pub fn table(&self) -> Result<&BinTable> {
        self.current()?.table()
    }

    pub fn table_mut(&mut self) -> Result<&mut BinTable> {
        self.current_mut()?.table_mut()
    }

    pub fn image(&self) -> Result<&Image> {
        self.current()?.image()
    }

    pub fn image_mut(&mut self) -> Result<&mut Image> {
        self.current_mut()?.image_mut()
    }

    fn append(&mut self, hdu: Hdu) {
        self.hdus.push(hdu);
        self.current = self.hdus.len() - 1;
        self.modified = true;
    }

    /// Append an image HDU and make it current.
    ///
    /// The image becomes the primary array when the file is empty, otherwise
    /// an IMAGE extension. `naxes` is in format order.
    pub fn create_image(&mut self, bitpix: i64, naxes: &[usize]) -> Result<()> {
        self.check_writable()?;
        let primary = self.hdus.is_empty();
        let (image, header) = Image::create(bitpix, naxes, primary)?;
        self.append(Hdu::new(header, HduData::Image(image)));
        tracing::debug!(hdu = self.hdus.len(), bitpix, ?naxes, "created image HDU");
        Ok(())
    }

    /// Append a binary table extension and make it current. An empty primary
    /// array is written first when the file has no HDUs.
    pub fn create_binary_table(&mut self, nrows: usize, columns: &[ColumnDef], extname: Option<&str>) -> Result<()> {
        self.check_writable()?;
        if self.hdus.is_empty() {
            self.create_image(8, &[])?;
        }
        let (table, header) = BinTable::create(nrows, columns, extname)?;
        self.append(Hdu::new(header, HduData::BinaryTable(table)));
        tracing::debug!(hdu = self.hdus.len(), nrows, ncols = columns.len(), "created binary table HDU");
        Ok(())
    }

    /// Insert columns before column `col` of the current table.
    pub fn insert_columns(&mut self, col: usize, defs: &[ColumnDef]) -> Result<()> {
        self.current_mut()?.insert_columns(col, defs)
    }

    pub fn delete_column(&mut self, col: usize) -> Result<()> {
        self.current_mut()?.delete_column(col)
    }

    /// Write every HDU back to disk. A no-op on read-only or unmodified files.
    pub fn flush(&mut self) -> Result<()> {
        if self.mode == IoMode::ReadOnly || !self.modified {
            return Ok(());
        }
        let mut out = Vec::new();
        for hdu in &mut self.hdus {
            hdu.write_to(&mut out)?;
        }
        std::fs::write(&self.path, &out)?;
        self.modified = false;
        tracing::debug!(path = %self.path.display(), bytes = out.len(), "flushed FITS file");
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    /// Release the file and remove it from disk.
    pub fn delete(mut self) -> Result<()> {
        self.modified = false;
        std::fs::remove_file(&self.path)?;
        tracing::debug!(path = %self.path.display(), "deleted FITS file");
        Ok(())
    }
}

impl Drop for FitsFile {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "flush on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.fits");
        FitsFile::create(&path).unwrap().close().unwrap();
        assert!(matches!(FitsFile::create(&path), Err(Error::Io(_))));
    }

    #[test]
    fn empty_file_has_no_current_hdu() {
        let dir = tempfile::tempdir().unwrap();
        let f = FitsFile::create(dir.path().join("e.fits")).unwrap();
        assert_eq!(f.num_hdus(), 0);
        assert_eq!(f.current_hdu_number(), 0);
        assert!(matches!(f.header(), Err(Error::BadHduNumber(1))));
    }

    #[test]
    fn table_gets_primary_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.fits");
        let mut f = FitsFile::create(&path).unwrap();
        f.create_binary_table(0, &[ColumnDef::new("n", "1I")], Some("ROWS")).unwrap();
        assert_eq!(f.num_hdus(), 2);
        assert_eq!(f.current_hdu_number(), 2);
        f.table_mut().unwrap().write_col::<i16>(1, 1, 1, &[3, 1, 4]).unwrap();
        f.close().unwrap();

        let mut f = FitsFile::open(&path, IoMode::ReadOnly).unwrap();
        assert_eq!(f.move_to_hdu(2).unwrap(), HduKind::BinaryTable);
        assert_eq!(f.table().unwrap().read_col::<i16>(1, 1, 1, 3).unwrap(), vec![3, 1, 4]);
        assert!(matches!(f.table_mut(), Err(Error::ReadOnly)));
        assert!(matches!(f.move_to_hdu(3), Err(Error::BadHduNumber(3))));
    }

    #[test]
    fn drop_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.fits");
        {
            let mut f = FitsFile::create(&path).unwrap();
            f.create_image(-32, &[4]).unwrap();
            f.image_mut().unwrap().write_pixels::<f32>(1, &[1.5, 2.5, 3.5, 4.5]).unwrap();
        }
        let f = FitsFile::open(&path, IoMode::ReadOnly).unwrap();
        assert_eq!(f.image().unwrap().read_pixels::<f32>(1, 4).unwrap(), vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.fits");
        let mut f = FitsFile::create(&path).unwrap();
        f.create_image(8, &[]).unwrap();
        f.delete().unwrap();
        assert!(!path.exists());
    }
}
