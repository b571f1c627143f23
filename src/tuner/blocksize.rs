//! Automatic blocksize selection.
//!
//! When a trial carries `blocksize == 0` the tuner derives one from the
//! chunk size, the element width and the compression level. The rule starts
//! from the L1 data-cache size, widens for ratio-oriented codecs and higher
//! levels, and keeps the result a multiple of the typesize.

use crate::config::{KB, L1_CACHE_SIZE};

/// Derive a concrete blocksize.
///
/// `ratio_oriented` selects the wider base used for ratio-oriented codecs.
pub fn auto_blocksize(
    sourcesize: usize,
    typesize: usize,
    clevel: i32,
    ratio_oriented: bool,
) -> usize {
    // Degenerate tiny source: a single 1-byte block.
    if sourcesize < typesize {
        return 1;
    }

    let mut blocksize = L1_CACHE_SIZE;
    if ratio_oriented {
        blocksize *= 2;
    }

    blocksize = match clevel {
        0 => blocksize / 4,
        1 => blocksize / 2,
        2 => blocksize,
        3 => blocksize * 2,
        4 | 5 => blocksize * 4,
        6..=8 => blocksize * 8,
        9 => blocksize * if ratio_oriented { 16 } else { 8 },
        _ => blocksize,
    };

    if clevel > 0 {
        blocksize = blocksize.min(64 * KB);
        blocksize *= typesize;
        blocksize = blocksize.max(64 * KB);
    }

    blocksize = blocksize.min(sourcesize);
    if blocksize > typesize {
        blocksize -= blocksize % typesize;
    }
    blocksize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_source_gets_unit_block() {
        assert_eq!(auto_blocksize(3, 8, 5, false), 1);
    }

    #[test]
    fn result_is_multiple_of_typesize() {
        for typesize in [1usize, 2, 3, 4, 8, 16] {
            for clevel in 0..=9 {
                let bs = auto_blocksize(10 * 1024 * 1024, typesize, clevel, false);
                assert!(bs > 0);
                assert_eq!(bs % typesize, 0, "typesize {typesize} clevel {clevel}");
            }
        }
    }

    #[test]
    fn result_never_exceeds_sourcesize() {
        let bs = auto_blocksize(40 * KB, 4, 9, true);
        assert!(bs <= 40 * KB);
    }

    #[test]
    fn higher_levels_get_bigger_blocks() {
        let src = 64 * 1024 * 1024;
        let low = auto_blocksize(src, 4, 1, false);
        let high = auto_blocksize(src, 4, 8, false);
        assert!(high >= low);
    }

    #[test]
    fn ratio_oriented_codecs_get_wider_blocks_at_level_nine() {
        let src = 64 * 1024 * 1024;
        let plain = auto_blocksize(src, 1, 9, false);
        let ratio = auto_blocksize(src, 1, 9, true);
        assert!(ratio >= plain);
    }

    #[test]
    fn compressed_levels_floor_at_64k() {
        // clevel > 0 floors the block at 64 KiB even for typesize 1.
        let bs = auto_blocksize(64 * 1024 * 1024, 1, 1, false);
        assert!(bs >= 64 * KB);
    }

    #[test]
    fn memcpy_level_uses_quarter_cache() {
        // clevel 0 skips the typesize scaling entirely.
        let bs = auto_blocksize(64 * 1024 * 1024, 4, 0, false);
        assert_eq!(bs, L1_CACHE_SIZE / 4);
    }
}
