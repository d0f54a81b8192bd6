//! Pre-sieve pattern for the primes 7, 11, 13, 17 and 19.
//!
//! Multiples of these primes repeat every 7 * 11 * 13 * 17 * 19 = 323 323 bytes
//! of the modulo 30 layout. Copying the pattern at the right phase is much
//! cheaper than crossing these primes off in every segment, and it removes
//! roughly half of the remaining candidates before the real sieving starts.

use crate::wheel::{self, NUMBERS_PER_BYTE};
use std::sync::OnceLock;

/// Primes eliminated by the pattern.
pub const PRESIEVE_PRIMES: [u64; 5] = [7, 11, 13, 17, 19];

/// Pattern period in bytes.
pub const PATTERN_BYTES: usize = 7 * 11 * 13 * 17 * 19;

/// Bits of byte 0 (base 0) that hold the pre-sieve primes themselves.
const PRIME_BITS: u8 = 0b0001_1111;

/// Precomputed composite-elimination pattern.
pub struct PreSieve {
    pattern: Box<[u8]>,
}

impl std::fmt::Debug for PreSieve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreSieve")
            .field("primes", &PRESIEVE_PRIMES)
            .field("bytes", &self.pattern.len())
            .finish()
    }
}

impl Default for PreSieve {
    fn default() -> Self {
        Self::new()
    }
}

impl PreSieve {
    /// Build the pattern. Every bit whose value is a multiple of one of
    /// [`PRESIEVE_PRIMES`] is cleared, including the primes themselves;
    /// [`PreSieve::init_segment`] restores those.
    pub fn new() -> Self {
        let mut pattern = vec![0xffu8; PATTERN_BYTES].into_boxed_slice();
        let last = NUMBERS_PER_BYTE * PATTERN_BYTES as u64 + 1;

        for &prime in &PRESIEVE_PRIMES {
            let mut multiple = prime;
            while multiple <= last {
                if let Some(mask) = wheel::bit_mask(multiple) {
                    pattern[wheel::byte_index(0, multiple) as usize] &= !mask;
                }
                multiple += 2 * prime;
            }
        }

        Self { pattern }
    }

    /// Process-wide shared instance, built on first use.
    pub fn shared() -> &'static PreSieve {
        static SHARED: OnceLock<PreSieve> = OnceLock::new();
        SHARED.get_or_init(PreSieve::new)
    }

    /// Fill `sieve` with the pattern aligned to a segment based at `low`
    /// (a multiple of 30).
    pub fn init_segment(&self, sieve: &mut [u8], low: u64) {
        let mut offset = ((low / NUMBERS_PER_BYTE) % PATTERN_BYTES as u64) as usize;
        let mut filled = 0;

        while filled < sieve.len() {
            let n = (sieve.len() - filled).min(PATTERN_BYTES - offset);
            sieve[filled..filled + n].copy_from_slice(&self.pattern[offset..offset + n]);
            filled += n;
            offset = 0;
        }

        if low == 0 {
            if let Some(first) = sieve.first_mut() {
                *first |= PRIME_BITS;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_presieve_factor(n: u64) -> bool {
        PRESIEVE_PRIMES.iter().any(|&p| n % p == 0 && n != p)
    }

    fn check_segment(sieve: &[u8], low: u64) {
        for (i, &byte) in sieve.iter().enumerate() {
            for bit in 0..8 {
                let n = wheel::decode(low, i as u64, bit);
                let set = byte & (1 << bit) != 0;
                assert_eq!(set, !has_presieve_factor(n), "value {}", n);
            }
        }
    }

    #[test]
    fn test_first_segment_keeps_presieve_primes() {
        let presieve = PreSieve::shared();
        let mut sieve = vec![0u8; 64];
        presieve.init_segment(&mut sieve, 0);
        assert_eq!(sieve[0], 0xff);
        check_segment(&sieve, 0);
    }

    #[test]
    fn test_phase_alignment() {
        let presieve = PreSieve::shared();
        for low in [30u64, 30 * 1000, 30 * 323_322, 30 * 323_323, 30 * 9_999_991] {
            let mut sieve = vec![0u8; 100];
            presieve.init_segment(&mut sieve, low);
            check_segment(&sieve, low);
        }
    }

    #[test]
    fn test_wraps_around_period() {
        let presieve = PreSieve::shared();
        let low = 30 * (PATTERN_BYTES as u64 - 10);
        let mut sieve = vec![0u8; 40];
        presieve.init_segment(&mut sieve, low);
        check_segment(&sieve, low);
    }

    #[test]
    fn test_near_u64_max() {
        let presieve = PreSieve::shared();
        let low = u64::MAX - 15 - 30 * 8;
        let mut sieve = vec![0u8; 8];
        presieve.init_segment(&mut sieve, low);
        check_segment(&sieve, low);
    }
}
