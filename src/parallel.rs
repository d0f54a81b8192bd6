//! Parallel counting using Rayon.
//!
//! The interval is split into chunks that start at a value `≡ 2 (mod 30)`,
//! which is where a sieve byte begins. No prime k-tuplet crosses a byte, so
//! per-chunk counts add up to the counts of the whole interval.

use crate::config;
use crate::counts::Counts;
use crate::error::Result;
use crate::flags::Flags;
use crate::prime_sieve::PrimeSieve;
use crate::sieve::SieveOutcome;
use crate::status::{Progress, StatusSink};
use crate::tuplet::TupletKind;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::time::Instant;

/// Minimum number of integers per chunk. Below this, thread overhead
/// dominates the sieving work.
pub const MIN_CHUNK_SPAN: u64 = 1_000_000;

/// Forwards per-segment progress of a worker to the collecting thread.
struct ChannelStatus<'a>(&'a Sender<u64>);

impl StatusSink for ChannelStatus<'_> {
    fn update_status(&mut self, numbers_processed: u64) {
        // the receiver only goes away once every worker is done
        let _ = self.0.send(numbers_processed);
    }
}

/// Split `[start, stop]` into consecutive chunks of about `span` integers.
/// Every chunk but the first starts at a value `≡ 2 (mod 30)`.
pub fn split_interval(start: u64, stop: u64, span: u64) -> Vec<(u64, u64)> {
    let span = span.max(30);
    let mut chunks = Vec::new();
    let mut low = start;
    loop {
        let next = low
            .checked_add(span)
            .map(|n| n - n % 30 + 2)
            .filter(|&n| n <= stop);
        match next {
            Some(next) => {
                chunks.push((low, next - 1));
                low = next;
            }
            None => {
                chunks.push((low, stop));
                return chunks;
            }
        }
    }
}

/// A [`PrimeSieve`] whose counting runs are spread over a thread pool.
///
/// Printing and callbacks need a single ascending stream, so runs with those
/// flags are executed sequentially.
#[derive(Debug, Clone)]
pub struct ParallelPrimeSieve {
    inner: PrimeSieve,
    num_threads: usize,
}

impl Default for ParallelPrimeSieve {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelPrimeSieve {
    /// Uses [`config::num_threads`] threads.
    pub fn new() -> Self {
        Self {
            inner: PrimeSieve::new(),
            num_threads: config::num_threads(),
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Set the number of threads (0 = all CPUs).
    pub fn set_num_threads(&mut self, threads: usize) {
        self.num_threads = match threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };
    }

    pub fn set_interval(&mut self, start: u64, stop: u64) -> Result<()> {
        self.inner.set_interval(start, stop)
    }

    pub fn set_sieve_size(&mut self, kib: usize) {
        self.inner.set_sieve_size(kib);
    }

    pub fn set_flags(&mut self, flags: Flags) -> Result<()> {
        self.inner.set_flags(flags)
    }

    pub fn flags(&self) -> Flags {
        self.inner.flags()
    }

    pub fn counts(&self) -> &Counts {
        self.inner.counts()
    }

    pub fn seconds(&self) -> f64 {
        self.inner.seconds()
    }

    pub fn percent(&self) -> f64 {
        self.inner.percent()
    }

    /// Run the configured interval.
    pub fn sieve(&mut self) -> Result<SieveOutcome> {
        let flags = self.inner.flags();
        if flags.any_print() || flags.contains(Flags::CALLBACK) {
            return self.inner.sieve();
        }

        let (start, stop) = (self.inner.start(), self.inner.stop());
        let total = (stop - start).saturating_add(1);
        let threads = self.num_threads.max(1) as u64;
        let span = (total / threads).max(MIN_CHUNK_SPAN);
        let chunks = split_interval(start, stop, span);
        if chunks.len() == 1 {
            return self.inner.sieve_with(None, None, None);
        }

        flags.validate()?;
        let timer = Instant::now();
        tracing::debug!(
            start,
            stop,
            threads,
            chunks = chunks.len(),
            "parallel sieve started"
        );

        let mut progress = flags.is_status().then(|| {
            let p = Progress::new(total);
            if flags.contains(Flags::PRINT_STATUS) {
                p.to_stderr()
            } else {
                p
            }
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .build()?;
        let (tx, rx) = crossbeam_channel::unbounded::<u64>();
        let worker = &self.inner;

        let results = std::thread::scope(|scope| {
            if let Some(progress) = progress.as_mut() {
                scope.spawn(move || {
                    for n in rx.iter() {
                        progress.update_status(n);
                    }
                });
            }
            pool.install(|| {
                chunks
                    .par_iter()
                    .map_with(tx, |tx, &(low, high)| sieve_chunk(worker, low, high, tx))
                    .collect::<Result<Vec<Counts>>>()
            })
        });

        let mut counts = Counts::new();
        for chunk in &results? {
            counts.merge(chunk);
        }
        let percent = match progress.as_mut() {
            Some(progress) => {
                progress.finish();
                progress.percent()
            }
            None => 0.0,
        };
        let seconds = timer.elapsed().as_secs_f64();
        tracing::debug!(counts = ?counts.as_array(), seconds, "parallel sieve finished");
        self.inner.set_results(counts, seconds, percent);
        Ok(SieveOutcome::Done)
    }

    /// Number of `kind` tuplets in `[start, stop]`.
    pub fn count(&mut self, kind: TupletKind, start: u64, stop: u64) -> Result<u64> {
        self.set_interval(start, stop)?;
        self.set_flags(Flags::count(kind))?;
        self.sieve()?;
        Ok(self.counts()[kind])
    }

    pub fn count_primes(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Primes, start, stop)
    }

    pub fn count_twins(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Twins, start, stop)
    }
}

/// Count one chunk with the configuration of `template`.
fn sieve_chunk(template: &PrimeSieve, low: u64, high: u64, tx: &Sender<u64>) -> Result<Counts> {
    let mut sieve = template.clone();
    sieve.set_interval(low, high)?;
    let status = template.flags().is_status();
    sieve.set_flags(template.flags().remove(Flags::PRINT_STATUS))?;

    let mut forward = ChannelStatus(tx);
    let sink: Option<&mut dyn StatusSink> = if status { Some(&mut forward) } else { None };
    sieve.sieve_with(None, None, sink)?;
    Ok(*sieve.counts())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_interval() {
        let chunks = split_interval(5, 10_000, 1000);
        assert_eq!(chunks.first().map(|c| c.0), Some(5));
        assert_eq!(chunks.last().map(|c| c.1), Some(10_000));
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].1 + 1, pair[1].0);
            assert_eq!(pair[1].0 % 30, 2);
        }
        for &(low, high) in &chunks {
            assert!(low <= high);
        }
    }

    #[test]
    fn test_split_interval_single_chunk() {
        assert_eq!(split_interval(0, 100, 1000), vec![(0, 100)]);
        assert_eq!(split_interval(7, 7, 1000), vec![(7, 7)]);
        assert_eq!(
            split_interval(u64::MAX - 10, u64::MAX, 1000),
            vec![(u64::MAX - 10, u64::MAX)]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut parallel = ParallelPrimeSieve::new();
        parallel.set_num_threads(4);
        parallel.set_sieve_size(16);
        parallel.set_interval(0, 10_000_000).unwrap();
        parallel
            .set_flags(Flags::COUNT_PRIMES | Flags::COUNT_TWINS | Flags::COUNT_SEXTUPLETS)
            .unwrap();
        parallel.sieve().unwrap();

        let mut sequential = PrimeSieve::new();
        sequential.set_sieve_size(16);
        sequential.set_interval(0, 10_000_000).unwrap();
        sequential
            .set_flags(Flags::COUNT_PRIMES | Flags::COUNT_TWINS | Flags::COUNT_SEXTUPLETS)
            .unwrap();
        sequential.sieve_with(None, None, None).unwrap();

        assert_eq!(parallel.counts(), sequential.counts());
        assert_eq!(parallel.counts()[TupletKind::Primes], 664_579);
    }

    #[test]
    fn test_parallel_status() {
        let mut parallel = ParallelPrimeSieve::new();
        parallel.set_num_threads(2);
        parallel.set_interval(1_000_000, 5_000_000).unwrap();
        parallel.set_flags(Flags::COUNT_PRIMES | Flags::STATUS).unwrap();
        parallel.sieve().unwrap();
        assert_eq!(parallel.percent(), 100.0);
        // pi(5e6) - pi(1e6)
        assert_eq!(parallel.counts()[TupletKind::Primes], 348_513 - 78_498);
    }

    #[test]
    fn test_parallel_count_helpers() {
        let mut parallel = ParallelPrimeSieve::new();
        parallel.set_num_threads(3);
        assert_eq!(parallel.count_twins(0, 100).unwrap(), 8);
        assert_eq!(parallel.count_primes(0, 3_000_000).unwrap(), 216_816);
    }
}
