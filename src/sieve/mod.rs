//! Segmented sieve of Eratosthenes.
//!
//! The engine walks an interval in fixed-size segments so memory stays
//! bounded by the sieve size, whatever the interval length:
//!
//! 1. [`PreSieve`](crate::presieve::PreSieve) initializes the segment, which
//!    removes the multiples of 7..=19.
//! 2. Sieving primes whose square is <= the segment's upper bound are added on
//!    demand, pulled from a [`PrimeGenerator`] that is itself a smaller
//!    segmented sieve.
//! 3. Every active sieving prime crosses off its multiples using the modulo 30
//!    wheel and remembers where to resume in the next segment.
//! 4. The finished segment is handed to a [`SegmentConsumer`].

pub mod eratosthenes;
pub mod generator;
pub mod segmented;

pub use eratosthenes::Eratosthenes;
pub use generator::{bootstrap_primes, PrimeGenerator};
pub use segmented::{SegmentConsumer, SegmentedSieve};

use crate::wheel::{self, NUMBERS_PER_BYTE};

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SieveState {
    /// Constructed, no segment produced yet.
    Idle,
    /// At least one segment produced, more to come.
    Sieving,
    /// The whole interval has been delivered.
    Done,
    /// A consumer stopped the run early.
    Cancelled,
}

/// How a run ended. Cancellation is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SieveOutcome {
    Done,
    Cancelled,
}

/// A finished segment: a byte-packed bitset whose set bits are primes.
///
/// `bytes.len()` is always a multiple of 8 for segments produced by the
/// engine; trailing padding bytes are zero. The slice borrows the engine's
/// buffer and must not outlive the call that received it.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub bytes: &'a [u8],
    /// Base of byte 0, a multiple of 30.
    pub low: u64,
}

/// Position of a bit inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPosition {
    pub byte: usize,
    pub bit: u32,
}

impl<'a> Segment<'a> {
    pub fn new(bytes: &'a [u8], low: u64) -> Self {
        Self { bytes, low }
    }

    /// Integers covered by this segment.
    #[inline]
    pub fn span(&self) -> u64 {
        NUMBERS_PER_BYTE * self.bytes.len() as u64
    }

    /// Integers of `[start, stop]` covered by this segment, whose bytes span
    /// `low + 2 ..= low + span + 1`.
    pub fn numbers_within(&self, start: u64, stop: u64) -> u64 {
        let first = self.low.saturating_add(2).max(start);
        let last = self.low.saturating_add(self.span() + 1).min(stop);
        if first > last {
            0
        } else {
            last - first + 1
        }
    }

    /// Primes of this segment in ascending order.
    pub fn primes(&self) -> SegmentPrimes<'a> {
        SegmentPrimes {
            words: self.bytes.chunks(8),
            low: self.low,
            word_index: 0,
            bits: 0,
            last: None,
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u64 {
        let mut chunks = self.bytes.chunks_exact(8);
        let mut sum = 0u64;
        for chunk in &mut chunks {
            sum += u64::from(load_word(chunk).count_ones());
        }
        for &b in chunks.remainder() {
            sum += u64::from(b.count_ones());
        }
        sum
    }

    /// Split just after `position`: the bytes before its byte, and its byte
    /// restricted to the bits up to and including it, with that byte's base.
    pub fn split_after(&self, position: BitPosition) -> (Segment<'a>, u8, u64) {
        let head = Segment::new(&self.bytes[..position.byte], self.low);
        let through = ((2u16 << position.bit) - 1) as u8;
        let tail = self.bytes[position.byte] & through;
        let tail_low = self.low + NUMBERS_PER_BYTE * position.byte as u64;
        (head, tail, tail_low)
    }
}

/// Load up to 8 bytes as a little-endian word, zero filled.
#[inline]
fn load_word(chunk: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word[..chunk.len()].copy_from_slice(chunk);
    u64::from_le_bytes(word)
}

/// Iterator over the primes of a [`Segment`], 8 bytes at a time.
pub struct SegmentPrimes<'a> {
    words: std::slice::Chunks<'a, u8>,
    low: u64,
    /// Number of words loaded so far.
    word_index: usize,
    bits: u64,
    last: Option<BitPosition>,
}

impl SegmentPrimes<'_> {
    /// Position of the prime most recently returned by `next`.
    pub fn position(&self) -> Option<BitPosition> {
        self.last
    }
}

impl Iterator for SegmentPrimes<'_> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        while self.bits == 0 {
            self.bits = load_word(self.words.next()?);
            self.word_index += 1;
        }
        let word = self.word_index - 1;
        let bit = self.bits.trailing_zeros();
        let base = self.low + NUMBERS_PER_BYTE * 8 * word as u64;
        self.last = Some(BitPosition {
            byte: word * 8 + (bit / 8) as usize,
            bit: bit % 8,
        });
        Some(wheel::next_prime(&mut self.bits, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_primes_ascending() {
        // byte 0: 7, 11, 13 ; byte 9: 30*9 + 31 = 301 ; byte 10: 30*10 + 7 = 307
        let mut bytes = vec![0u8; 16];
        bytes[0] = 0b0000_0111;
        bytes[9] = 0b1000_0000;
        bytes[10] = 0b0000_0001;
        let segment = Segment::new(&bytes, 0);
        let primes: Vec<u64> = segment.primes().collect();
        assert_eq!(primes, vec![7, 11, 13, 301, 307]);
        assert_eq!(segment.count_ones(), 5);
        assert_eq!(segment.span(), 480);
    }

    #[test]
    fn test_numbers_within_interval() {
        // 16 bytes based at 30 cover 32..=511
        let bytes = [0u8; 16];
        let segment = Segment::new(&bytes, 30);
        assert_eq!(segment.numbers_within(0, u64::MAX), 480);
        assert_eq!(segment.numbers_within(100, 200), 101);
        assert_eq!(segment.numbers_within(500, 10_000), 12);
        assert_eq!(segment.numbers_within(512, 10_000), 0);
        assert_eq!(segment.numbers_within(0, 31), 0);

        let top = Segment::new(&bytes, u64::MAX - 15);
        assert_eq!(top.numbers_within(u64::MAX - 20, u64::MAX), 14);
    }

    #[test]
    fn test_position_tracks_last_prime() {
        let bytes = [0u8, 0, 0b0010_0000, 0, 0, 0, 0, 0, 0b0000_0010];
        let segment = Segment::new(&bytes, 30);
        let mut primes = segment.primes();
        assert_eq!(primes.next(), Some(30 + 60 + 23));
        assert_eq!(primes.position(), Some(BitPosition { byte: 2, bit: 5 }));
        assert_eq!(primes.next(), Some(30 + 240 + 11));
        assert_eq!(primes.position(), Some(BitPosition { byte: 8, bit: 1 }));
        assert_eq!(primes.next(), None);
    }

    #[test]
    fn test_split_after() {
        let bytes = [0xffu8, 0b1010_1010, 0xff];
        let segment = Segment::new(&bytes, 0);
        let (head, tail, tail_low) = segment.split_after(BitPosition { byte: 1, bit: 5 });
        assert_eq!(head.bytes, &[0xff]);
        assert_eq!(tail, 0b0010_1010);
        assert_eq!(tail_low, 30);

        let (head, tail, tail_low) = segment.split_after(BitPosition { byte: 2, bit: 7 });
        assert_eq!(head.bytes.len(), 2);
        assert_eq!(tail, 0xff);
        assert_eq!(tail_low, 60);
    }

    #[test]
    fn test_split_after_first_bit() {
        let bytes = [0xffu8];
        let (head, tail, _) = Segment::new(&bytes, 0).split_after(BitPosition { byte: 0, bit: 0 });
        assert!(head.bytes.is_empty());
        assert_eq!(tail, 0x01);
    }
}
