//! Host byte-order detection and in-place byte swapping.
//!
//! FITS data is always big-endian on disk. Most transfers decode elements
//! with `from_be_bytes`, but bit columns move raw native words and need to
//! know the host order at run time.

/// Byte order of a multi-byte word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Detect the byte order of the running host.
    pub fn host() -> Self {
        let marker: u16 = 0x0102;
        if marker.to_ne_bytes()[0] == 0x01 {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub fn is_big(self) -> bool {
        self == ByteOrder::Big
    }
}

/// Reverse the bytes of every `width`-byte word in `buf`.
///
/// A trailing partial word is left untouched.
pub fn swap_words(buf: &mut [u8], width: usize) {
    if width < 2 {
        return;
    }
    for word in buf.chunks_exact_mut(width) {
        word.reverse();
    }
}

/// Copy native-order words into big-endian order.
pub fn native_to_be(buf: &[u8], width: usize, host: ByteOrder) -> Vec<u8> {
    let mut out = buf.to_vec();
    if !host.is_big() {
        swap_words(&mut out, width);
    }
    out
}

/// Convert big-endian words to native order in place.
pub fn be_to_native_in_place(buf: &mut [u8], width: usize, host: ByteOrder) {
    if !host.is_big() {
        swap_words(buf, width);
    }
}
