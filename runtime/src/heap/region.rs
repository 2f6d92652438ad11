use crate::error::RuntimeError;
use crate::rt::field::WidthClass;
use std::sync::atomic::{AtomicU64, Ordering};

const WORD: usize = size_of::<u64>();

/// Contiguous, zero-initialised storage addressed by byte offset.
///
/// Backed by 64-bit atomic words so every 4- and 8-byte access is a single indivisible touch:
/// a 64-bit store is never observable as two halves, and a 32-bit store replaces only its half
/// of the containing word. Byte order inside a word is little-endian, so offset `n + 4` is the
/// high half of the word that starts at `n`.
#[derive(Debug)]
pub struct Region {
    words: Box<[AtomicU64]>,
    size: usize,
}

impl Region {
    pub fn new(size: usize) -> Self {
        let words = (0..size.div_ceil(WORD)).map(|_| AtomicU64::new(0)).collect();
        Self { words, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn check(&self, offset: usize, width: WidthClass) -> Result<(), RuntimeError> {
        let misaligned = offset % width.alignment() != 0;
        let out_of_bounds = offset
            .checked_add(width.byte_size())
            .is_none_or(|end| end > self.size);
        if misaligned || out_of_bounds {
            return Err(RuntimeError::Alignment {
                offset,
                width,
                region_size: self.size,
            });
        }
        Ok(())
    }

    fn high_half(offset: usize) -> bool {
        offset % WORD != 0
    }

    pub fn read_word32(&self, offset: usize) -> Result<u32, RuntimeError> {
        self.check(offset, WidthClass::Word32)?;
        let word = self.words[offset / WORD].load(Ordering::Acquire);
        if Self::high_half(offset) {
            Ok((word >> 32) as u32)
        } else {
            Ok(word as u32)
        }
    }

    pub fn write_word32(&self, offset: usize, value: u32) -> Result<(), RuntimeError> {
        self.check(offset, WidthClass::Word32)?;
        let (mask, bits) = if Self::high_half(offset) {
            (0x0000_0000_FFFF_FFFF_u64, (value as u64) << 32)
        } else {
            (0xFFFF_FFFF_0000_0000_u64, value as u64)
        };
        // neighbour half may be written concurrently, so splice with a CAS loop; the closure
        // always returns `Some`, so the update cannot fail
        self.words[offset / WORD]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| Some((w & mask) | bits))
            .ok();
        Ok(())
    }

    pub fn read_word64(&self, offset: usize) -> Result<u64, RuntimeError> {
        self.check(offset, WidthClass::Word64)?;
        Ok(self.words[offset / WORD].load(Ordering::Acquire))
    }

    pub fn write_word64(&self, offset: usize, value: u64) -> Result<(), RuntimeError> {
        self.check(offset, WidthClass::Word64)?;
        self.words[offset / WORD].store(value, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_region_reads_zero() {
        let region = Region::new(16);
        assert_eq!(region.read_word64(0).unwrap(), 0);
        assert_eq!(region.read_word32(12).unwrap(), 0);
    }

    #[test]
    fn word32_halves_are_independent() {
        let region = Region::new(8);
        region.write_word32(0, 0xAAAA_AAAA).unwrap();
        region.write_word32(4, 0x5555_5555).unwrap();

        assert_eq!(region.read_word32(0).unwrap(), 0xAAAA_AAAA);
        assert_eq!(region.read_word32(4).unwrap(), 0x5555_5555);
        assert_eq!(region.read_word64(0).unwrap(), 0x5555_5555_AAAA_AAAA);
    }

    #[test]
    fn word64_keeps_all_bits() {
        let region = Region::new(8);
        region.write_word64(0, 4_294_967_300).unwrap();
        assert_eq!(region.read_word64(0).unwrap(), 4_294_967_300);
        assert_eq!(region.read_word32(0).unwrap(), 4);
        assert_eq!(region.read_word32(4).unwrap(), 1);
    }

    #[rstest]
    #[case(2, WidthClass::Word32)]
    #[case(8, WidthClass::Word32)]
    #[case(4, WidthClass::Word64)]
    #[case(8, WidthClass::Word64)]
    #[case(usize::MAX - 3, WidthClass::Word32)]
    fn bad_offsets_are_rejected_without_writing(#[case] offset: usize, #[case] width: WidthClass) {
        let region = Region::new(8);
        region.write_word64(0, u64::MAX).unwrap();

        let err = match width {
            WidthClass::Word32 => region.write_word32(offset, 0).unwrap_err(),
            WidthClass::Word64 => region.write_word64(offset, 0).unwrap_err(),
        };

        assert_eq!(
            err,
            RuntimeError::Alignment {
                offset,
                width,
                region_size: 8,
            }
        );
        assert_eq!(region.read_word64(0).unwrap(), u64::MAX);
    }

    #[test]
    fn tail_word32_of_odd_sized_region() {
        let region = Region::new(12);
        region.write_word32(8, 7).unwrap();
        assert_eq!(region.read_word32(8).unwrap(), 7);
        assert!(region.read_word64(8).is_err());
    }

    #[test]
    fn word64_writes_never_tear() {
        let region = Region::new(8);
        std::thread::scope(|s| {
            for pattern in [0u64, u64::MAX] {
                let region = &region;
                s.spawn(move || {
                    for _ in 0..10_000 {
                        region.write_word64(0, pattern).unwrap();
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..10_000 {
                    let v = region.read_word64(0).unwrap();
                    assert!(v == 0 || v == u64::MAX);
                }
            });
        });
    }

    #[test]
    fn concurrent_word32_halves_do_not_clobber() {
        let region = Region::new(8);
        std::thread::scope(|s| {
            for (offset, value) in [(0usize, 0x1111_1111u32), (4, 0x2222_2222)] {
                let region = &region;
                s.spawn(move || {
                    for _ in 0..10_000 {
                        region.write_word32(offset, value).unwrap();
                    }
                });
            }
        });
        assert_eq!(region.read_word64(0).unwrap(), 0x2222_2222_1111_1111);
    }
}
