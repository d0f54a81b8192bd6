//! The outer engine: an [`Eratosthenes`] fed by a [`PrimeGenerator`].

use super::{Eratosthenes, PrimeGenerator, Segment, SieveOutcome, SieveState};
use crate::error::Result;
use std::ops::ControlFlow;

/// Receives every finished segment of a run.
///
/// The segment borrows the engine's buffer, which is overwritten by the next
/// segment; implementations must copy out whatever they keep. Returning
/// `ControlFlow::Break` cancels the run.
pub trait SegmentConsumer {
    fn consume(&mut self, segment: Segment<'_>) -> Result<ControlFlow<()>>;
}

/// Segmented sieve of Eratosthenes over one interval.
#[derive(Debug)]
pub struct SegmentedSieve {
    sieve: Eratosthenes,
    generator: PrimeGenerator,
}

impl SegmentedSieve {
    /// Engine over `[max(start, 7), stop]`. See [`Eratosthenes::new`].
    pub fn new(start: u64, stop: u64, sieve_bytes: usize) -> Result<Self> {
        let sieve = Eratosthenes::new(start, stop, sieve_bytes)?;
        let generator = PrimeGenerator::new(stop, sieve_bytes)?;
        Ok(Self { sieve, generator })
    }

    pub fn state(&self) -> SieveState {
        self.sieve.state()
    }

    pub fn segments(&self) -> u64 {
        self.sieve.segments()
    }

    /// Sieve the next segment, pulling new sieving primes as needed.
    pub fn next_segment(&mut self) -> Option<Segment<'_>> {
        self.sieve.next_segment(&mut self.generator)
    }

    /// Deliver every remaining segment to `consumer`.
    ///
    /// Stops at the first `Break`, after which the engine stays cancelled.
    /// Consumer errors abort the run and are returned as-is.
    pub fn run<C>(&mut self, consumer: &mut C) -> Result<SieveOutcome>
    where
        C: SegmentConsumer + ?Sized,
    {
        while let Some(segment) = self.sieve.next_segment(&mut self.generator) {
            if consumer.consume(segment)?.is_break() {
                self.sieve.cancel();
                tracing::trace!(segments = self.sieve.segments(), "sieve cancelled");
                return Ok(SieveOutcome::Cancelled);
            }
        }
        Ok(SieveOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SieveError;
    use crate::sieve::bootstrap_primes;

    struct Collect {
        primes: Vec<u64>,
        limit: usize,
    }

    impl SegmentConsumer for Collect {
        fn consume(&mut self, segment: Segment<'_>) -> Result<ControlFlow<()>> {
            for prime in segment.primes() {
                if self.primes.len() == self.limit {
                    return Ok(ControlFlow::Break(()));
                }
                self.primes.push(prime);
            }
            Ok(ControlFlow::Continue(()))
        }
    }

    struct Failing;

    impl SegmentConsumer for Failing {
        fn consume(&mut self, _segment: Segment<'_>) -> Result<ControlFlow<()>> {
            Err(SieveError::Io(std::io::Error::other("sink closed")))
        }
    }

    fn collect(start: u64, stop: u64, sieve_bytes: usize) -> Vec<u64> {
        let mut sieve = SegmentedSieve::new(start, stop, sieve_bytes).unwrap();
        let mut consumer = Collect {
            primes: Vec::new(),
            limit: usize::MAX,
        };
        assert_eq!(sieve.run(&mut consumer).unwrap(), SieveOutcome::Done);
        assert_eq!(sieve.state(), SieveState::Done);
        consumer.primes
    }

    #[test]
    fn test_run_matches_reference() {
        let expected: Vec<u64> = bootstrap_primes(2_000_000)
            .into_iter()
            .filter(|&p| p >= 7)
            .collect();
        assert_eq!(collect(0, 2_000_000, 1024), expected);
        assert_eq!(collect(0, 2_000_000, 8), expected);
    }

    #[test]
    fn test_large_offset_interval() {
        // 10^12 + 39 is the first prime above 10^12
        let primes = collect(1_000_000_000_000, 1_000_000_000_100, 64);
        assert_eq!(primes.first(), Some(&1_000_000_000_039));
        assert!(primes.iter().all(|&p| p <= 1_000_000_000_100));
        for &p in &primes {
            assert!((2..=1_000_000u64).take_while(|d| d * d <= p).all(|d| p % d != 0));
        }
    }

    #[test]
    fn test_cancel_leaves_engine_cancelled() {
        let mut sieve = SegmentedSieve::new(0, 10_000_000, 8).unwrap();
        let mut consumer = Collect {
            primes: Vec::new(),
            limit: 100,
        };
        assert_eq!(sieve.run(&mut consumer).unwrap(), SieveOutcome::Cancelled);
        assert_eq!(sieve.state(), SieveState::Cancelled);
        assert_eq!(consumer.primes.len(), 100);
        assert!(sieve.next_segment().is_none());
    }

    #[test]
    fn test_consumer_error_is_propagated() {
        let mut sieve = SegmentedSieve::new(0, 1000, 8).unwrap();
        assert!(matches!(sieve.run(&mut Failing), Err(SieveError::Io(_))));
    }
}
