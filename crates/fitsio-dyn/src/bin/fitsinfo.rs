use std::path::PathBuf;
use std::process;

use clap::Parser;
use fitsio_dyn::bintable::BinTable;
use fitsio_dyn::bridge::images::image_element_type;
use fitsio_dyn::bridge::typemap::{map_storage_to_dynamic, ColumnDescriptor};
use fitsio_dyn::fitsfile::{FitsFile, IoMode};
use fitsio_dyn::hdu::HduKind;
use fitsio_dyn::header::Header;
use fitsio_dyn::image::Image;
use fitsio_dyn::value::Value;

#[derive(Parser)]
#[command(about = "Print the HDUs of a FITS file with the dynamic type of every image and column.")]
struct Args {
    /// FITS file to inspect.
    path: PathBuf,

    /// Also list every header card.
    #[arg(short, long)]
    verbose: bool,
}

fn ext_label(header: &Header) -> String {
    match header.value("EXTNAME") {
        Ok(Value::String(name)) => format!(" (EXTNAME: {})", name.trim()),
        _ => String::new(),
    }
}

fn format_image(out: &mut String, image: &Image) {
    out.push_str(&format!("  BITPIX: {}\n", image.bitpix()));
    out.push_str(&format!("  NAXIS: {}\n", image.naxes().len()));
    if !image.naxes().is_empty() {
        out.push_str(&format!("  Dimensions: {:?}\n", image.naxes()));
    }
    out.push_str(&format!(
        "  Reads as: {}\n",
        image_element_type(image.bitpix(), image.scaling())
    ));
}

fn format_table(out: &mut String, table: &BinTable) {
    out.push_str(&format!("  Columns: {}\n", table.num_cols()));
    out.push_str(&format!("  Rows: {}\n", table.num_rows()));
    out.push_str(&format!("  Row width: {} bytes\n", table.row_width()));
    for (i, layout) in table.columns().iter().enumerate() {
        let desc = ColumnDescriptor::from_layout(i + 1, layout);
        let dynamic = match map_storage_to_dynamic(desc.effective, desc.repeat) {
            Ok((ty, 1)) if desc.declared.variable => format!("Array_Type[{ty}]"),
            Ok((ty, 1)) => ty.to_string(),
            Ok((ty, repeat)) => format!("{ty}[{repeat}]"),
            Err(e) => format!("unreadable: {e}"),
        };
        out.push_str(&format!(
            "  {:>3} {:<16} {:<10} {:<16} {}\n",
            i + 1,
            layout.name.as_deref().unwrap_or(""),
            layout.tform().render(),
            desc.effective.storage.name(),
            dynamic
        ));
    }
}

fn format_cards(out: &mut String, header: &Header) {
    out.push_str("  Header cards:\n");
    for card in header.cards() {
        let kw = card.keyword_str();
        match (&card.value, &card.comment) {
            (Some(val), Some(comment)) => out.push_str(&format!("    {kw} = {val:?} / {comment}\n")),
            (Some(val), None) => out.push_str(&format!("    {kw} = {val:?}\n")),
            (None, Some(comment)) => out.push_str(&format!("    {kw} {comment}\n")),
            (None, None) => {}
        }
    }
}

fn format_file(file: &mut FitsFile, verbose: bool) -> Result<String, String> {
    let mut out = String::new();
    for n in 1..=file.num_hdus() {
        if n > 1 {
            out.push('\n');
        }
        let kind = file.move_to_hdu(n).map_err(|e| e.to_string())?;
        let header = file.header().map_err(|e| e.to_string())?;
        let label = ext_label(header);
        match kind {
            HduKind::Image => {
                let what = if n == 1 { "Primary" } else { "IMAGE extension" };
                out.push_str(&format!("HDU {}: {what}{label}\n", n - 1));
                format_image(&mut out, file.image().map_err(|e| e.to_string())?);
            }
            HduKind::BinaryTable => {
                out.push_str(&format!("HDU {}: BINTABLE extension{label}\n", n - 1));
                format_table(&mut out, file.table().map_err(|e| e.to_string())?);
            }
            HduKind::AsciiTable => out.push_str(&format!("HDU {}: TABLE extension{label}\n", n - 1)),
            HduKind::Other => out.push_str(&format!("HDU {}: other{label}\n", n - 1)),
        }
        if verbose {
            format_cards(&mut out, file.header().map_err(|e| e.to_string())?);
        }
    }
    Ok(out)
}

fn run(args: &Args) -> Result<String, String> {
    let mut file = FitsFile::open(&args.path, IoMode::ReadOnly)
        .map_err(|e| format!("Error reading '{}': {}", args.path.display(), e))?;
    format_file(&mut file, args.verbose)
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(output) => print!("{output}"),
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsio_dyn::bintable::ColumnDef;

    fn sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("info.fits");
        let mut f = FitsFile::create(&path).unwrap();
        f.create_image(16, &[10, 20]).unwrap();
        f.create_binary_table(
            3,
            &[
                ColumnDef::new("FLUX", "1E"),
                ColumnDef::new("FLAGS", "32X"),
                ColumnDef::new("SPECTRUM", "1PD(4)"),
                ColumnDef::new("NAME", "12A"),
                ColumnDef::new("BAD", "12X"),
            ],
            Some("EVENTS"),
        )
        .unwrap();
        f.close().unwrap();
        path
    }

    #[test]
    fn lists_hdus_and_column_types() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args { path: sample(&dir), verbose: false };
        let out = run(&args).unwrap();
        assert!(out.contains("HDU 0: Primary"));
        assert!(out.contains("Dimensions: [10, 20]"));
        assert!(out.contains("Reads as: Int16"));
        assert!(out.contains("HDU 1: BINTABLE extension (EXTNAME: EVENTS)"));
        assert!(out.contains("Rows: 3"));
        assert!(out.contains("Float32"));
        assert!(out.contains("UInt32"));
        assert!(out.contains("Array_Type[Float64]"));
        assert!(out.contains("String[12]"));
        assert!(out.contains("unreadable: unsupported bit width: 12"));
    }

    #[test]
    fn verbose_lists_cards() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args { path: sample(&dir), verbose: true };
        let out = run(&args).unwrap();
        assert!(out.contains("Header cards:"));
        assert!(out.contains("TTYPE1 = String(\"FLUX\")"));
    }

    #[test]
    fn missing_file_reports_path() {
        let args = Args { path: PathBuf::from("/nonexistent/x.fits"), verbose: false };
        let err = run(&args).unwrap_err();
        assert!(err.contains("/nonexistent/x.fits"));
    }
}
