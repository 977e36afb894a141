//! Writes a binary table of bit-valued columns one bit at a time, as a
//! reference file for the whole-word bit column codec.
//!
//! Column `xn` is an `nX` bit vector whose value in row `r` holds the low
//! `n` bits of `r`, most significant bit first.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use fitsio_dyn::bintable::ColumnDef;
use fitsio_dyn::fitsfile::FitsFile;

#[derive(Parser)]
#[command(about = "Create a FITS table of bit-valued test columns.")]
struct Args {
    /// Output file; an existing file is replaced.
    #[arg(default_value = "test_bit-valued_columns.fits")]
    path: PathBuf,

    /// Number of columns, x1 through xN.
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..=64))]
    cols: u32,

    #[arg(long, default_value_t = 1024)]
    rows: usize,
}

fn build(path: &Path, ncols: u32, nrows: usize) -> fitsio_dyn::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let defs: Vec<ColumnDef> = (1..=ncols)
        .map(|n| ColumnDef::new(&format!("x{n}"), &format!("{n}X")))
        .collect();

    let mut file = FitsFile::create(path)?;
    file.create_binary_table(nrows, &defs, Some("BIT-VALUES"))?;
    let table = file.table_mut()?;
    for col in 1..=ncols {
        for row in 1..=nrows {
            for bit in 1..=col {
                if (row as u64) & (1u64 << (col - bit)) != 0 {
                    table.write_col::<u8>(col as usize, row, bit as usize, &[1])?;
                }
            }
        }
    }
    file.close()
}

fn main() {
    let args = Args::parse();
    if let Err(e) = build(&args.path, args.cols, args.rows) {
        eprintln!("Error writing '{}': {}", args.path.display(), e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsio_dyn::bridge::{read_column, FileHandle, OpenMode};

    #[test]
    fn codec_reads_bitwise_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bits.fits");
        build(&path, 32, 1024).unwrap();

        let mut h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
        h.move_to_hdu(2).unwrap();
        assert_eq!(h.num_cols().unwrap(), 32);

        let x32 = read_column(&h, 32, 1, 1024).unwrap();
        assert_eq!(x32.as_slice::<u32>().unwrap()[499], 500);
        let x16 = read_column(&h, 16, 1000, 1).unwrap();
        assert_eq!(x16.as_slice::<i16>().unwrap(), &[1000]);
        let x8 = read_column(&h, 8, 300, 1).unwrap();
        assert_eq!(x8.as_slice::<u8>().unwrap(), &[(300 & 0xff) as u8]);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bits.fits");
        std::fs::write(&path, b"stale").unwrap();
        build(&path, 4, 8).unwrap();
        let h = FileHandle::open(&path, OpenMode::ReadOnly).unwrap();
        assert_eq!(h.num_hdus().unwrap(), 2);
    }
}
