//! Pure-Rust FITS tables, images and headers with a dynamically typed
//! bridge on top.
//!
//! The flat modules are the format layer: cards and headers, binary table
//! and image data, and an in-memory [`fitsfile::FitsFile`]. The [`bridge`]
//! module moves whole columns, images and keywords as run-time typed values.

pub mod bintable;
pub mod block;
pub mod bridge;
pub mod convert;
pub mod endian;
pub mod error;
pub mod fitsfile;
pub mod hdu;
pub mod header;
pub mod image;
pub mod status;
pub mod value;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use error::{Error, Result};
