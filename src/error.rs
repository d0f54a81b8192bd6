//! Error types for sieving runs.

use std::io;
use thiserror::Error;

/// Errors that can occur while configuring or running a sieve.
///
/// Configuration errors are always reported before any segment is sieved.
/// Cancellation through a callback is not an error, see
/// [`SieveOutcome`](crate::sieve::SieveOutcome).
#[derive(Error, Debug)]
pub enum SieveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid interval: start ({start}) must be <= stop ({stop})")]
    InvalidInterval { start: u64, stop: u64 },

    #[error("invalid sieve size: {0} (must be > 0)")]
    InvalidSieveSize(usize),

    #[error("unsupported flags: {0:#x}")]
    UnsupportedFlags(u32),

    #[error("only one of PRINT_PRIMES..PRINT_SEXTUPLETS may be set per run")]
    ConflictingPrintFlags,

    #[error("invalid prime index: {0} (must be >= 1)")]
    InvalidPrimeIndex(u64),

    #[error("fewer than {n} primes exist in [{start}, 2^64)")]
    PrimeNotFound { n: u64, start: u64 },

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SieveError>;
