//! Segment production: pre-sieve, cross off, trim to the interval.

use super::{Segment, SieveState};
use crate::error::{Result, SieveError};
use crate::math::{align8, isqrt};
use crate::presieve::{PreSieve, PRESIEVE_PRIMES};
use crate::wheel::{self, SievingPrime, NUMBERS_PER_BYTE};
use std::collections::VecDeque;

/// Largest prime handled by the pre-sieve pattern.
const PRESIEVE_MAX: u64 = PRESIEVE_PRIMES[PRESIEVE_PRIMES.len() - 1];

/// Smallest value the engine can represent.
pub const MIN_START: u64 = 7;

/// The segment state machine of one interval.
///
/// Sieving primes are supplied by the caller on every step (see
/// [`Eratosthenes::next_segment`]) so the same machinery serves both the
/// main engine and the generator of its sieving primes.
pub struct Eratosthenes {
    start: u64,
    stop: u64,
    /// Base of the next segment.
    low: u64,
    sieve: Vec<u8>,
    /// Primes with several multiples per segment, crossed off every segment.
    primes: Vec<SievingPrime>,
    /// Primes of at least one segment span, indexed by the segment (0 is
    /// the current one) holding their next multiple.
    buckets: VecDeque<Vec<SievingPrime>>,
    /// Prime pulled from the source whose square is still above the bound.
    pending: Option<u64>,
    pre_sieve: &'static PreSieve,
    state: SieveState,
    segments: u64,
}

impl std::fmt::Debug for Eratosthenes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eratosthenes")
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("low", &self.low)
            .field("sieve_bytes", &self.sieve.len())
            .field("sieving_primes", &self.primes.len())
            .field("buckets", &self.buckets.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Eratosthenes {
    /// Engine over `[max(start, 7), stop]` with segments of `sieve_bytes`
    /// bytes (rounded up to a multiple of 8).
    ///
    /// Values below 7 cannot be represented by the wheel; callers report
    /// them separately.
    pub fn new(start: u64, stop: u64, sieve_bytes: usize) -> Result<Self> {
        if start > stop {
            return Err(SieveError::InvalidInterval { start, stop });
        }
        if sieve_bytes == 0 {
            return Err(SieveError::InvalidSieveSize(sieve_bytes));
        }

        let start = start.max(MIN_START);
        let state = if start > stop {
            SieveState::Done
        } else {
            SieveState::Idle
        };

        Ok(Self {
            start,
            stop,
            low: wheel::segment_low(start),
            sieve: vec![0u8; align8(sieve_bytes)],
            primes: Vec::new(),
            buckets: VecDeque::new(),
            pending: None,
            pre_sieve: PreSieve::shared(),
            state,
            segments: 0,
        })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    pub fn state(&self) -> SieveState {
        self.state
    }

    /// Number of segments produced so far.
    pub fn segments(&self) -> u64 {
        self.segments
    }

    /// Stop producing segments.
    pub fn cancel(&mut self) {
        if self.state != SieveState::Done {
            self.state = SieveState::Cancelled;
        }
    }

    /// Sieve the next segment.
    ///
    /// `source` must yield primes in ascending order; it is only advanced
    /// while primes are needed, i.e. while `p * p` is <= the segment's upper
    /// bound. Primes <= 19 are skipped (handled by the pre-sieve).
    pub fn next_segment<I>(&mut self, source: &mut I) -> Option<Segment<'_>>
    where
        I: Iterator<Item = u64> + ?Sized,
    {
        match self.state {
            SieveState::Done | SieveState::Cancelled => return None,
            SieveState::Idle => {
                tracing::trace!(
                    start = self.start,
                    stop = self.stop,
                    sieve_bytes = self.sieve.len(),
                    "segmented sieve started"
                );
                self.state = SieveState::Sieving;
            }
            SieveState::Sieving => {}
        }

        let low = self.low;
        let capacity = self.sieve.len();
        let span = NUMBERS_PER_BYTE * capacity as u64;

        // Largest value representable by a full segment is low + span + 1.
        let last = low
            .checked_add(span + 1)
            .is_none_or(|high| high >= self.stop);
        let (high, len) = if last {
            let len = if self.stop < low + 7 {
                0
            } else {
                wheel::byte_index(low, self.stop) as usize + 1
            };
            (self.stop, len)
        } else {
            (low + span + 1, capacity)
        };

        self.add_sieving_primes(source, low, high);

        let sieve = &mut self.sieve[..len];
        self.pre_sieve.init_segment(sieve, low);
        for prime in &mut self.primes {
            prime.cross_off(sieve);
        }
        if let Some(mut bucket) = self.buckets.pop_front() {
            for mut prime in bucket.drain(..) {
                prime.cross_off(sieve);
                schedule(&mut self.buckets, capacity as u64, prime);
            }
            self.buckets.push_back(bucket);
        }

        if self.segments == 0 {
            if let Some(first) = sieve.first_mut() {
                *first &= wheel::mask_from(self.start - low);
            }
        }

        if last {
            if let Some(tail) = sieve.last_mut() {
                let tail_low = low + NUMBERS_PER_BYTE * (len as u64 - 1);
                *tail &= wheel::mask_up_to(self.stop - tail_low);
            }
            self.sieve[len..align8(len)].fill(0);
            self.state = SieveState::Done;
        } else {
            self.low = low + span;
        }

        self.segments += 1;
        Some(Segment::new(&self.sieve[..align8(len)], low))
    }

    fn add_sieving_primes<I>(&mut self, source: &mut I, low: u64, high: u64)
    where
        I: Iterator<Item = u64> + ?Sized,
    {
        let limit = isqrt(high);
        let capacity = self.sieve.len() as u64;
        while let Some(prime) = self.pending.take().or_else(|| source.next()) {
            if prime > limit {
                self.pending = Some(prime);
                break;
            }
            if prime <= PRESIEVE_MAX {
                continue;
            }
            let Some(sieving_prime) = SievingPrime::new(prime, low, self.stop) else {
                continue;
            };
            if u64::from(sieving_prime.sieve_index()) >= capacity {
                schedule(&mut self.buckets, capacity, sieving_prime);
            } else {
                self.primes.push(sieving_prime);
            }
        }
    }
}

/// Put `prime` into the bucket of the segment holding its next multiple,
/// rebased onto that segment. Bucket 0 is the segment the multiple index is
/// currently relative to.
fn schedule(buckets: &mut VecDeque<Vec<SievingPrime>>, capacity: u64, mut prime: SievingPrime) {
    let ahead = prime.multiple_index() / capacity;
    prime.rebase(ahead * capacity);
    let ahead = ahead as usize;
    if buckets.len() <= ahead {
        buckets.resize_with(ahead + 1, Vec::new);
    }
    buckets[ahead].push(prime);
}
