//! Process-wide defaults for sieving runs.
//!
//! These values are read when a [`PrimeSieve`](crate::PrimeSieve) or
//! [`ParallelPrimeSieve`](crate::ParallelPrimeSieve) is constructed. Changing
//! them does not affect runs that already exist.

use crate::math::floor_power_of_2;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default sieve size in KiB. Fits the L1 data cache of most CPUs.
pub const DEFAULT_SIEVE_SIZE: usize = 32;

/// Smallest accepted sieve size in KiB.
pub const MIN_SIEVE_SIZE: usize = 1;

/// Largest accepted sieve size in KiB.
pub const MAX_SIEVE_SIZE: usize = 4096;

static SIEVE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_SIEVE_SIZE);

/// 0 means one thread per CPU.
static NUM_THREADS: AtomicUsize = AtomicUsize::new(0);

/// Clamp `kib` to `MIN_SIEVE_SIZE..=MAX_SIEVE_SIZE` and round it down to a
/// power of two.
#[inline]
pub fn normalize_sieve_size(kib: usize) -> usize {
    floor_power_of_2(kib.clamp(MIN_SIEVE_SIZE, MAX_SIEVE_SIZE))
}

/// Set the default sieve size in KiB (normalized, see [`normalize_sieve_size`]).
pub fn set_sieve_size(kib: usize) {
    SIEVE_SIZE.store(normalize_sieve_size(kib), Ordering::Release);
}

/// Default sieve size in KiB.
#[inline]
pub fn sieve_size() -> usize {
    SIEVE_SIZE.load(Ordering::Acquire)
}

/// Set the default number of threads for parallel runs (0 = all CPUs).
pub fn set_num_threads(threads: usize) {
    NUM_THREADS.store(threads, Ordering::Release);
}

/// Default number of threads for parallel runs, resolved against the
/// available parallelism when unset.
pub fn num_threads() -> usize {
    match NUM_THREADS.load(Ordering::Acquire) {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    }
}
