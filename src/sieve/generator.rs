//! Sources of sieving primes.

use super::Eratosthenes;
use crate::error::Result;
use crate::math::isqrt;

/// All primes <= `limit`, from a flat odd-only bit sieve.
///
/// Used to bootstrap the sieving-prime generator, so `limit` stays below
/// 2^16 in practice.
pub fn bootstrap_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    // bit i stands for the odd number 2 * i + 1
    let half = limit / 2;
    let mut bits = vec![!0u64; (half / 64 + 1) as usize];
    bits[0] &= !1;

    for i in 1..=isqrt(limit) / 2 {
        if (bits[(i / 64) as usize] >> (i % 64)) & 1 == 1 {
            let step = 2 * i + 1;
            let mut j = 2 * i * (i + 1);
            while j <= half {
                bits[(j / 64) as usize] &= !(1u64 << (j % 64));
                j += step;
            }
        }
    }

    let mut primes = vec![2];
    for (w, &word) in bits.iter().enumerate() {
        let mut word = word;
        while word != 0 {
            let p = ((w as u64) * 64 + u64::from(word.trailing_zeros())) * 2 + 1;
            if p > limit {
                return primes;
            }
            primes.push(p);
            word &= word - 1;
        }
    }
    primes
}

/// Yields the primes in `[7, isqrt(stop)]` in ascending order, segment by
/// segment, for use as sieving primes of an engine whose interval ends at
/// `stop`.
///
/// Its own sieving primes (<= stop^(1/4)) come from [`bootstrap_primes`].
pub struct PrimeGenerator {
    inner: Option<Eratosthenes>,
    bootstrap: std::vec::IntoIter<u64>,
    buffer: Vec<u64>,
    cursor: usize,
}

impl std::fmt::Debug for PrimeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimeGenerator")
            .field("inner", &self.inner)
            .field("buffered", &(self.buffer.len() - self.cursor))
            .finish()
    }
}

impl PrimeGenerator {
    pub fn new(stop: u64, sieve_bytes: usize) -> Result<Self> {
        let limit = isqrt(stop);
        let inner = if limit >= 7 {
            Some(Eratosthenes::new(7, limit, sieve_bytes)?)
        } else {
            None
        };
        Ok(Self {
            inner,
            bootstrap: bootstrap_primes(isqrt(limit)).into_iter(),
            buffer: Vec::new(),
            cursor: 0,
        })
    }

    /// Sieve the next inner segment into the buffer. Returns false once the
    /// generator is exhausted.
    fn refill(&mut self) -> bool {
        let Some(inner) = self.inner.as_mut() else {
            return false;
        };
        let Some(segment) = inner.next_segment(&mut self.bootstrap) else {
            return false;
        };
        self.buffer.clear();
        self.buffer.extend(segment.primes());
        self.cursor = 0;
        true
    }
}

impl Iterator for PrimeGenerator {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.cursor >= self.buffer.len() {
            if !self.refill() {
                return None;
            }
        }
        let prime = self.buffer[self.cursor];
        self.cursor += 1;
        Some(prime)
    }
}
