//! Modulo 30 wheel: bit layout of a sieve byte and the crossing-off table.
//!
//! # Layout
//!
//! Every byte of a sieve segment covers 30 consecutive integers. Only the 8
//! residues coprime to 2, 3 and 5 can be prime, so byte `i` of a segment whose
//! base is `low` (always a multiple of 30) holds:
//!
//! ```text
//! bit:    0   1   2   3   4   5   6   7
//! value: +7 +11 +13 +17 +19 +23 +29 +31   (+ low + 30 * i)
//! ```
//!
//! Starting at 7 rather than 1 keeps every prime k-tuplet of 7 or more inside
//! a single byte, which is what makes byte-wise tuplet lookup tables possible.
//!
//! # Crossing off
//!
//! A sieving prime `p = 30 * s + r` crosses off `p * q` only for multipliers `q`
//! coprime to 30. Stepping from one such `q` to the next moves the multiple by
//! `p * gap` numbers, i.e. by `s * gap + correct` bytes, where `correct` only
//! depends on `(r, q mod 30)`. [`WHEEL`] stores these 64 states.

/// Integers represented by one sieve byte.
pub const NUMBERS_PER_BYTE: u64 = 30;

/// Value offset of each bit relative to the byte base.
pub const RESIDUES: [u64; 8] = [7, 11, 13, 17, 19, 23, 29, 31];

/// Residues coprime to 30 in ascending order (multiplier residues).
const COPRIME_RESIDUES: [u64; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// Distance from each coprime residue to the next one.
const GAPS: [u64; 8] = [6, 4, 2, 4, 2, 4, 6, 2];

/// `n % 30` -> bit position of `n` inside its byte, `0xff` if `n` is not
/// coprime to 30.
const BIT_OF_RESIDUE: [u8; 30] = {
    let mut table = [0xff; 30];
    let mut bit = 0;
    while bit < 8 {
        table[(RESIDUES[bit] % 30) as usize] = bit as u8;
        bit += 1;
    }
    table
};

/// `q % 30` -> index of `q` in [`COPRIME_RESIDUES`], `0xff` if not coprime.
const COPRIME_INDEX: [u8; 30] = {
    let mut table = [0xff; 30];
    let mut i = 0;
    while i < 8 {
        table[COPRIME_RESIDUES[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// `q % 30` -> distance to the smallest value >= `q` that is coprime to 30.
const NEXT_COPRIME: [u8; 30] = {
    let mut table = [0u8; 30];
    let mut r = 0;
    while r < 30 {
        let mut d = 0;
        while COPRIME_INDEX[(r + d) % 30] == 0xff {
            d += 1;
        }
        table[r] = d as u8;
        r += 1;
    }
    table
};

/// Offset from the word base of every bit of a little-endian 64-bit word,
/// i.e. 8 consecutive sieve bytes.
pub const BIT_VALUES: [u64; 64] = {
    let mut table = [0u64; 64];
    let mut bit = 0;
    while bit < 64 {
        table[bit] = NUMBERS_PER_BYTE * (bit / 8) as u64 + RESIDUES[bit % 8];
        bit += 1;
    }
    table
};

/// One state of the crossing-off wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelElement {
    /// AND mask clearing the bit of the current multiple.
    pub unset_mask: u8,
    /// Gap to the next multiplier coprime to 30.
    pub factor: u8,
    /// Extra bytes to add on top of `sieve_index * factor`.
    pub correct: u8,
    /// Next state.
    pub next: u8,
}

/// Crossing-off states, indexed by `prime_residue_index * 8 + multiplier_index`.
pub const WHEEL: [WheelElement; 64] = {
    let mut table = [WheelElement {
        unset_mask: 0,
        factor: 0,
        correct: 0,
        next: 0,
    }; 64];
    let mut pi = 0;
    while pi < 8 {
        let pr = COPRIME_RESIDUES[pi];
        let mut qi = 0;
        while qi < 8 {
            let product = (pr * COPRIME_RESIDUES[qi]) % 30;
            let bit = BIT_OF_RESIDUE[product as usize];
            // (multiple - 7) mod 30, i.e. the multiple's position inside its byte window
            let phase = (product + 23) % 30;
            let gap = GAPS[qi];
            table[pi * 8 + qi] = WheelElement {
                unset_mask: !(1u8 << bit),
                factor: gap as u8,
                correct: ((phase + pr * gap) / 30) as u8,
                next: (pi * 8 + (qi + 1) % 8) as u8,
            };
            qi += 1;
        }
        pi += 1;
    }
    table
};

/// Bit mask of `n` inside its byte, `None` if `n` is not coprime to 30.
#[inline]
pub fn bit_mask(n: u64) -> Option<u8> {
    match BIT_OF_RESIDUE[(n % NUMBERS_PER_BYTE) as usize] {
        0xff => None,
        bit => Some(1 << bit),
    }
}

/// Byte index of `n` relative to a segment base `low`. Requires `n >= low + 7`.
#[inline]
pub fn byte_index(low: u64, n: u64) -> u64 {
    (n - low - 7) / NUMBERS_PER_BYTE
}

/// Value of `(byte, bit)` in a segment based at `low`.
#[inline]
pub fn decode(low: u64, byte: u64, bit: u32) -> u64 {
    low + NUMBERS_PER_BYTE * byte + RESIDUES[bit as usize]
}

/// Base of the byte window that holds `n`, for `n >= 7`.
///
/// The window of base `b` covers `b + 2 ..= b + 31`, so values `≡ 0..=1 (mod 30)`
/// belong to the previous window.
#[inline]
pub fn segment_low(n: u64) -> u64 {
    let mut remainder = n % NUMBERS_PER_BYTE;
    if remainder <= 1 {
        remainder += NUMBERS_PER_BYTE;
    }
    n - remainder
}

/// Bits of a byte whose value offset is `<= offset`.
#[inline]
pub fn mask_up_to(offset: u64) -> u8 {
    RESIDUES
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r <= offset)
        .fold(0u8, |mask, (bit, _)| mask | (1 << bit))
}

/// Bits of a byte whose value offset is `>= offset`.
#[inline]
pub fn mask_from(offset: u64) -> u8 {
    !mask_up_to(offset.saturating_sub(1))
}

/// Extract the lowest set bit of `bits`, clear it and return its value.
///
/// `low` is the base of the 8-byte word `bits` was loaded from.
#[inline]
pub fn next_prime(bits: &mut u64, low: u64) -> u64 {
    let bit = bits.trailing_zeros() as usize;
    *bits &= *bits - 1;
    low + BIT_VALUES[bit]
}

/// A sieving prime together with the position of its next multiple.
///
/// Only `p / 30` is stored; the residue of `p` is folded into `wheel_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SievingPrime {
    sieve_index: u32,
    multiple_index: u64,
    wheel_index: u8,
}

impl SievingPrime {
    /// Set up `prime` (> 5, <= 2^32) for a segment based at `low`.
    ///
    /// The first multiple crossed off is the smallest `prime * q >= max(prime^2, low + 7)`
    /// with `q` coprime to 30. Returns `None` when that multiple is above `stop`
    /// or does not fit in a `u64`: the prime has nothing left to cross off.
    pub fn new(prime: u64, low: u64, stop: u64) -> Option<Self> {
        let square = prime.checked_mul(prime)?;
        let first = square.max(low + 7);
        let mut q = first / prime + u64::from(first % prime != 0);
        q += u64::from(NEXT_COPRIME[(q % NUMBERS_PER_BYTE) as usize]);
        let multiple = prime.checked_mul(q)?;
        if multiple > stop {
            return None;
        }
        let prime_index = COPRIME_INDEX[(prime % NUMBERS_PER_BYTE) as usize];
        let multiplier_index = COPRIME_INDEX[(q % NUMBERS_PER_BYTE) as usize];
        Some(Self {
            sieve_index: (prime / NUMBERS_PER_BYTE) as u32,
            multiple_index: byte_index(low, multiple),
            wheel_index: prime_index * 8 + multiplier_index,
        })
    }

    /// `prime / 30`; consecutive multiples are at least twice that many bytes apart.
    #[inline]
    pub fn sieve_index(&self) -> u32 {
        self.sieve_index
    }

    /// Byte of the next multiple, relative to the current segment base.
    #[inline]
    pub fn multiple_index(&self) -> u64 {
        self.multiple_index
    }

    /// Move the segment base forward by `bytes`. The next multiple must not
    /// lie before the new base.
    #[inline]
    pub fn rebase(&mut self, bytes: u64) {
        self.multiple_index -= bytes;
    }

    /// Cross off every multiple inside `sieve`, then rebase the next multiple
    /// onto the segment that follows `sieve`.
    #[inline]
    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let len = sieve.len() as u64;
        let step = u64::from(self.sieve_index);
        let mut i = self.multiple_index;
        let mut w = self.wheel_index as usize;

        while i < len {
            let element = &WHEEL[w];
            sieve[i as usize] &= element.unset_mask;
            i += step * u64::from(element.factor) + u64::from(element.correct);
            w = element.next as usize;
        }

        self.multiple_index = i - len;
        self.wheel_index = w as u8;
    }
}
