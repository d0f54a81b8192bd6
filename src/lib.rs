//! segsieve: segmented sieve of Eratosthenes
//!
//! This library generates, counts and prints primes and prime k-tuplets
//! (twins up to sextuplets) in any interval of `[0, 2^64)`.
//!
//! # Features
//!
//! - **Bounded memory**: the interval is sieved in cache-sized segments
//! - **Modulo 30 wheel**: one byte holds 30 integers, multiples of 2, 3 and 5
//!   are never stored
//! - **Pre-sieving**: multiples of 7..=19 are copied from a precomputed pattern
//! - **Tuplet lookup tables**: k-tuplets are counted one byte at a time
//! - **Parallel counting**: uses Rayon to spread large counts over all cores
//!
//! # Example
//!
//! ```rust
//! use segsieve::{PrimeSieve, TupletKind};
//! use std::ops::ControlFlow;
//!
//! let mut ps = PrimeSieve::new();
//! assert_eq!(ps.count_primes(0, 1000).unwrap(), 168);
//! assert_eq!(ps.count(TupletKind::Twins, 0, 1000).unwrap(), 35);
//!
//! // Stop after the first prime above one million
//! let mut first = None;
//! ps.callback_primes(1_000_000, u64::MAX, |p| {
//!     first = Some(p);
//!     ControlFlow::Break(())
//! })
//! .unwrap();
//! assert_eq!(first, Some(1_000_003));
//! ```

pub mod config;
pub mod counts;
pub mod error;
pub mod finder;
pub mod flags;
pub mod math;
pub mod output;
pub mod parallel;
pub mod presieve;
pub mod prime_sieve;
pub mod sieve;
pub mod status;
pub mod tuplet;
pub mod wheel;

// Re-export commonly used types
pub use counts::Counts;
pub use error::{Result, SieveError};
pub use finder::{PrimeCallback, PrimeFinder};
pub use flags::Flags;
pub use parallel::ParallelPrimeSieve;
pub use prime_sieve::PrimeSieve;
pub use sieve::{SegmentConsumer, SegmentedSieve, SieveOutcome};
pub use status::{Progress, StatusSink};
pub use tuplet::TupletKind;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::counts::Counts;
    pub use crate::error::{Result, SieveError};
    pub use crate::flags::Flags;
    pub use crate::parallel::ParallelPrimeSieve;
    pub use crate::prime_sieve::PrimeSieve;
    pub use crate::sieve::SieveOutcome;
    pub use crate::tuplet::TupletKind;
}
