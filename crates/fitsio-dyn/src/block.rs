/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Padding byte used for data blocks (zero).
pub const DATA_PAD_BYTE: u8 = 0x00;

/// Returns the number of FITS blocks required to hold `num_bytes` bytes.
pub const fn blocks_needed(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE)
}

/// Returns the total byte length (in whole blocks) required to hold `num_bytes`.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    blocks_needed(num_bytes) * BLOCK_SIZE
}

/// Append `src` to `out` and pad `out` with zeros up to the next block boundary.
///
/// `out` is expected to already end on a block boundary.
pub fn append_data_blocks(out: &mut Vec<u8>, src: &[u8]) {
    out.extend_from_slice(src);
    let target = padded_byte_len(out.len());
    out.resize(target, DATA_PAD_BYTE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_needed_edges() {
        assert_eq!(blocks_needed(0), 0);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE + 1), 2);
    }

    #[test]
    fn padded_len_is_block_multiple() {
        assert_eq!(padded_byte_len(0), 0);
        assert_eq!(padded_byte_len(100), BLOCK_SIZE);
        assert_eq!(padded_byte_len(5761), 3 * BLOCK_SIZE);
    }

    #[test]
    fn append_pads_with_zeros() {
        let mut out = vec![b' '; BLOCK_SIZE];
        append_data_blocks(&mut out, &[1, 2, 3]);
        assert_eq!(out.len(), 2 * BLOCK_SIZE);
        assert_eq!(&out[BLOCK_SIZE..BLOCK_SIZE + 3], &[1, 2, 3]);
        assert!(out[BLOCK_SIZE + 3..].iter().all(|&b| b == DATA_PAD_BYTE));
    }

    #[test]
    fn append_empty_adds_nothing() {
        let mut out = vec![b' '; BLOCK_SIZE];
        append_data_blocks(&mut out, &[]);
        assert_eq!(out.len(), BLOCK_SIZE);
    }

    #[test]
    fn cards_per_block() {
        assert_eq!(CARDS_PER_BLOCK, 36);
    }
}
