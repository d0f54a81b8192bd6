//! High level interface: configure an interval and the requested outputs,
//! then run the segmented sieve over it.

use crate::config;
use crate::counts::Counts;
use crate::error::{Result, SieveError};
use crate::finder::{PendingTuplet, PrimeCallback, PrimeFinder};
use crate::flags::Flags;
use crate::sieve::{SegmentedSieve, SieveOutcome};
use crate::status::{Progress, StatusSink};
use crate::tuplet::TupletKind;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::time::Instant;

/// Primes and tuplets the wheel cannot represent, as
/// `(first, last, kind, text)`. Each is reported iff `[first, last]` lies in
/// the interval.
const SMALL_PRIMES: [(u64, u64, TupletKind, &str); 8] = [
    (2, 2, TupletKind::Primes, "2"),
    (3, 3, TupletKind::Primes, "3"),
    (5, 5, TupletKind::Primes, "5"),
    (3, 5, TupletKind::Twins, "(3, 5)"),
    (5, 7, TupletKind::Twins, "(5, 7)"),
    (5, 11, TupletKind::Triplets, "(5, 7, 11)"),
    (5, 13, TupletKind::Quadruplets, "(5, 7, 11, 13)"),
    (5, 17, TupletKind::Quintuplets, "(5, 7, 11, 13, 17)"),
];

/// A configurable sieving run.
///
/// ```
/// use segsieve::{Flags, PrimeSieve, TupletKind};
///
/// let mut ps = PrimeSieve::new();
/// ps.set_interval(0, 100).unwrap();
/// ps.set_flags(Flags::COUNT_PRIMES | Flags::COUNT_TWINS).unwrap();
/// ps.sieve_with(None, None, None).unwrap();
/// assert_eq!(ps.counts()[TupletKind::Primes], 25);
/// assert_eq!(ps.counts()[TupletKind::Twins], 8);
/// ```
#[derive(Debug, Clone)]
pub struct PrimeSieve {
    start: u64,
    stop: u64,
    /// Sieve size in KiB.
    sieve_size: usize,
    flags: Flags,
    counts: Counts,
    seconds: f64,
    percent: f64,
}

impl Default for PrimeSieve {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimeSieve {
    /// Counts primes by default; the sieve size comes from [`config`].
    pub fn new() -> Self {
        Self {
            start: 0,
            stop: 0,
            sieve_size: config::sieve_size(),
            flags: Flags::COUNT_PRIMES,
            counts: Counts::new(),
            seconds: 0.0,
            percent: 0.0,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Set both bounds, rejecting `start > stop`.
    pub fn set_interval(&mut self, start: u64, stop: u64) -> Result<()> {
        if start > stop {
            return Err(SieveError::InvalidInterval { start, stop });
        }
        self.start = start;
        self.stop = stop;
        Ok(())
    }

    /// Sieve size in KiB.
    pub fn sieve_size(&self) -> usize {
        self.sieve_size
    }

    /// Set the sieve size in KiB, clamped to `1..=4096` and rounded down to
    /// a power of two.
    pub fn set_sieve_size(&mut self, kib: usize) {
        self.sieve_size = config::normalize_sieve_size(kib);
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) -> Result<()> {
        flags.validate()?;
        self.flags = flags;
        Ok(())
    }

    /// Counters of the last run.
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Wall time of the last run.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Progress of the last run, 0..=100. Only tracked with `STATUS`.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub(crate) fn set_results(&mut self, counts: Counts, seconds: f64, percent: f64) {
        self.counts = counts;
        self.seconds = seconds;
        self.percent = percent;
    }

    /// Run with printed output going to stdout.
    pub fn sieve(&mut self) -> Result<SieveOutcome> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.sieve_with(Some(&mut handle), None, None)
    }

    /// Run the sieve over the configured interval.
    ///
    /// `output` receives printed primes or tuplets, `callback` every prime
    /// when `CALLBACK` is set. Progress goes to `status` if given, otherwise
    /// to an internal [`Progress`] when `STATUS` or `PRINT_STATUS` is set.
    /// Counters are reset at the start of every run.
    pub fn sieve_with(
        &mut self,
        mut output: Option<&mut dyn Write>,
        mut callback: Option<&mut dyn PrimeCallback>,
        status: Option<&mut dyn StatusSink>,
    ) -> Result<SieveOutcome> {
        self.flags.validate()?;
        if self.start > self.stop {
            return Err(SieveError::InvalidInterval {
                start: self.start,
                stop: self.stop,
            });
        }

        let timer = Instant::now();
        self.counts = Counts::new();
        self.percent = 0.0;
        tracing::debug!(
            start = self.start,
            stop = self.stop,
            sieve_size = self.sieve_size,
            flags = ?self.flags,
            "sieve started"
        );

        let mut progress = None;
        if status.is_none() && self.flags.is_status() {
            let p = Progress::new((self.stop - self.start).saturating_add(1));
            progress = Some(if self.flags.contains(Flags::PRINT_STATUS) {
                p.to_stderr()
            } else {
                p
            });
        }

        let (mut outcome, pending) =
            self.small_primes(output.as_deref_mut(), callback.as_deref_mut())?;

        if outcome == SieveOutcome::Done && self.stop >= 7 {
            let mut engine = SegmentedSieve::new(self.start, self.stop, self.sieve_size * 1024)?;
            let mut finder = PrimeFinder::new(self.flags)
                .with_bounds(self.start, self.stop)
                .with_pending(pending);
            if let Some(output) = output {
                finder = finder.with_output(output);
            }
            if let Some(callback) = callback {
                finder = finder.with_callback(callback);
            }
            let status: Option<&mut dyn StatusSink> = match status {
                Some(status) => Some(status),
                None => progress.as_mut().map(|p| p as &mut dyn StatusSink),
            };
            if let Some(status) = status {
                finder = finder.with_status(status);
            }
            outcome = engine.run(&mut finder)?;
            let counts = finder.finish()?;
            self.counts.merge(&counts);
        }

        if let Some(progress) = progress.as_mut() {
            if outcome == SieveOutcome::Done {
                progress.finish();
            }
            self.percent = progress.percent();
        }
        self.seconds = timer.elapsed().as_secs_f64();
        tracing::debug!(
            ?outcome,
            counts = ?self.counts.as_array(),
            seconds = self.seconds,
            "sieve finished"
        );
        Ok(outcome)
    }

    /// Report 2, 3, 5 and the tuplets containing them.
    ///
    /// Tuplets ending at 7 or above are returned instead, for the finder to
    /// report once the engine has delivered their last member.
    fn small_primes<'w, 'c>(
        &mut self,
        mut output: Option<&mut (dyn Write + 'w)>,
        mut callback: Option<&mut (dyn PrimeCallback + 'c)>,
    ) -> Result<(SieveOutcome, Vec<PendingTuplet>)> {
        let mut pending = Vec::new();
        if self.start > 5 {
            return Ok((SieveOutcome::Done, pending));
        }

        // Largest value delivered before a callback stopped the run.
        let mut cut = u64::MAX;
        if self.flags.contains(Flags::CALLBACK) {
            if let Some(callback) = callback.as_deref_mut() {
                for &(prime, _, kind, _) in &SMALL_PRIMES {
                    if kind != TupletKind::Primes || !self.contains(prime, prime) {
                        continue;
                    }
                    if callback.on_prime(prime).is_break() {
                        cut = prime;
                        break;
                    }
                }
            }
        }

        let print_kind = self.flags.print_kind();
        for &(first, last, kind, text) in &SMALL_PRIMES {
            if !self.contains(first, last) || last > cut {
                continue;
            }
            if last > 5 {
                pending.push(PendingTuplet { last, kind, text });
                continue;
            }
            if self.flags.is_count(kind) {
                self.counts.add(kind, 1);
            }
            if print_kind == Some(kind) {
                if let Some(out) = output.as_deref_mut() {
                    writeln!(out, "{}", text)?;
                }
            }
        }

        let outcome = if cut == u64::MAX {
            SieveOutcome::Done
        } else {
            SieveOutcome::Cancelled
        };
        Ok((outcome, pending))
    }

    fn contains(&self, first: u64, last: u64) -> bool {
        self.start <= first && last <= self.stop
    }

    /// Number of `kind` tuplets in `[start, stop]`.
    pub fn count(&mut self, kind: TupletKind, start: u64, stop: u64) -> Result<u64> {
        self.set_interval(start, stop)?;
        self.set_flags(Flags::count(kind))?;
        self.sieve_with(None, None, None)?;
        Ok(self.counts[kind])
    }

    pub fn count_primes(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Primes, start, stop)
    }

    pub fn count_twins(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Twins, start, stop)
    }

    pub fn count_triplets(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Triplets, start, stop)
    }

    pub fn count_quadruplets(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Quadruplets, start, stop)
    }

    pub fn count_quintuplets(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Quintuplets, start, stop)
    }

    pub fn count_sextuplets(&mut self, start: u64, stop: u64) -> Result<u64> {
        self.count(TupletKind::Sextuplets, start, stop)
    }

    /// Print the `kind` tuplets of `[start, stop]` to `out`, one per line.
    pub fn print(
        &mut self,
        kind: TupletKind,
        start: u64,
        stop: u64,
        out: &mut dyn Write,
    ) -> Result<()> {
        self.set_interval(start, stop)?;
        self.set_flags(Flags::print(kind))?;
        self.sieve_with(Some(out), None, None)?;
        Ok(())
    }

    /// Call `callback` with every prime of `[start, stop]` in ascending order.
    pub fn callback_primes<F>(&mut self, start: u64, stop: u64, mut callback: F) -> Result<SieveOutcome>
    where
        F: FnMut(u64) -> ControlFlow<()>,
    {
        self.set_interval(start, stop)?;
        self.set_flags(Flags::CALLBACK)?;
        self.sieve_with(None, Some(&mut callback), None)
    }

    /// Primes of `[start, stop]`.
    pub fn generate_primes(&mut self, start: u64, stop: u64) -> Result<Vec<u64>> {
        let mut primes = Vec::new();
        self.callback_primes(start, stop, |p| {
            primes.push(p);
            ControlFlow::Continue(())
        })?;
        Ok(primes)
    }

    /// The first `n` primes >= `start`. Fewer are returned only when the
    /// 64-bit range runs out.
    pub fn generate_n_primes(&mut self, n: u64, start: u64) -> Result<Vec<u64>> {
        let mut primes = Vec::with_capacity(n.min(1 << 20) as usize);
        if n == 0 {
            return Ok(primes);
        }
        self.callback_primes(start, u64::MAX, |p| {
            primes.push(p);
            if primes.len() as u64 == n {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(primes)
    }

    /// The `n`-th prime >= `start`, `n >= 1`.
    pub fn nth_prime(&mut self, n: u64, start: u64) -> Result<u64> {
        if n == 0 {
            return Err(SieveError::InvalidPrimeIndex(n));
        }
        let mut seen = 0u64;
        let mut nth = None;
        self.callback_primes(start, u64::MAX, |p| {
            seen += 1;
            if seen == n {
                nth = Some(p);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        nth.ok_or(SieveError::PrimeNotFound { n, start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_below_wheel() {
        let mut ps = PrimeSieve::new();
        assert_eq!(ps.count_primes(0, 1).unwrap(), 0);
        assert_eq!(ps.count_primes(2, 2).unwrap(), 1);
        assert_eq!(ps.count_primes(0, 6).unwrap(), 3);
        assert_eq!(ps.count_primes(4, 5).unwrap(), 1);
        assert_eq!(ps.count_twins(0, 6).unwrap(), 1);
        assert_eq!(ps.count_twins(0, 7).unwrap(), 2);
        assert_eq!(ps.count_twins(4, 7).unwrap(), 1);
    }

    #[test]
    fn test_counts_to_hundred() {
        let mut ps = PrimeSieve::new();
        assert_eq!(ps.count_primes(0, 100).unwrap(), 25);
        assert_eq!(ps.count_twins(0, 100).unwrap(), 8);
        // (5,7,11) (7,11,13) (11,13,17) (13,17,19) (17,19,23) (37,41,43) (41,43,47) (67,71,73)
        assert_eq!(ps.count_triplets(0, 100).unwrap(), 8);
        // (5,7,11,13) (11,13,17,19)
        assert_eq!(ps.count_quadruplets(0, 100).unwrap(), 2);
        // (5,7,11,13,17) (7,11,13,17,19) (11,13,17,19,23)
        assert_eq!(ps.count_quintuplets(0, 100).unwrap(), 3);
        assert_eq!(ps.count_sextuplets(0, 100).unwrap(), 1);
    }

    #[test]
    fn test_known_counts() {
        let mut ps = PrimeSieve::new();
        assert_eq!(ps.count_primes(0, 1_000_000).unwrap(), 78_498);
        assert_eq!(ps.count_primes(0, 10_000_000).unwrap(), 664_579);
        assert_eq!(ps.count_twins(0, 10_000_000).unwrap(), 58_980);
    }

    #[test]
    fn test_print_small_tuplets_first() {
        let mut ps = PrimeSieve::new();
        let mut out = Vec::new();
        ps.print(TupletKind::Quadruplets, 0, 1000, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "(5, 7, 11, 13)\n(11, 13, 17, 19)\n(101, 103, 107, 109)\n(191, 193, 197, 199)\n(821, 823, 827, 829)\n"
        );

        let mut out = Vec::new();
        ps.print(TupletKind::Primes, 0, 20, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2\n3\n5\n7\n11\n13\n17\n19\n"
        );
    }

    #[test]
    fn test_generate_primes() {
        let mut ps = PrimeSieve::new();
        assert_eq!(ps.generate_primes(0, 30).unwrap(), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(ps.generate_primes(24, 28).unwrap(), Vec::<u64>::new());
        assert_eq!(ps.generate_n_primes(5, 0).unwrap(), vec![2, 3, 5, 7, 11]);
        assert_eq!(ps.generate_n_primes(2, 3).unwrap(), vec![3, 5]);
        assert_eq!(ps.generate_n_primes(3, 100).unwrap(), vec![101, 103, 107]);
        assert!(ps.generate_n_primes(0, 100).unwrap().is_empty());
    }

    #[test]
    fn test_nth_prime() {
        let mut ps = PrimeSieve::new();
        assert_eq!(ps.nth_prime(1, 0).unwrap(), 2);
        assert_eq!(ps.nth_prime(3, 0).unwrap(), 5);
        assert_eq!(ps.nth_prime(4, 0).unwrap(), 7);
        assert_eq!(ps.nth_prime(10_000, 0).unwrap(), 104_729);
        assert_eq!(ps.nth_prime(1, 1_000_000).unwrap(), 1_000_003);
        assert!(matches!(ps.nth_prime(0, 0), Err(SieveError::InvalidPrimeIndex(0))));
    }

    #[test]
    #[ignore = "sieves every prime below 2^32"]
    fn test_nth_prime_past_u64_max() {
        let mut ps = PrimeSieve::new();
        assert!(matches!(
            ps.nth_prime(2, u64::MAX - 58),
            Err(SieveError::PrimeNotFound { n: 2, .. })
        ));
    }

    #[test]
    fn test_callback_stop_in_small_primes() {
        let mut ps = PrimeSieve::new();
        let mut seen = Vec::new();
        let outcome = ps
            .callback_primes(0, 1000, |p| {
                seen.push(p);
                if p == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(outcome, SieveOutcome::Cancelled);
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn test_callback_stop_at_seven_excludes_later_tuplets() {
        let mut ps = PrimeSieve::new();
        ps.set_interval(0, 100).unwrap();
        ps.set_flags(
            Flags::CALLBACK
                | Flags::COUNT_TWINS
                | Flags::COUNT_TRIPLETS
                | Flags::COUNT_QUINTUPLETS
                | Flags::PRINT_TRIPLETS,
        )
        .unwrap();

        let mut seen = Vec::new();
        let mut callback = |p: u64| {
            seen.push(p);
            if p == 7 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let mut out = Vec::new();
        let outcome = ps
            .sieve_with(Some(&mut out), Some(&mut callback), None)
            .unwrap();

        assert_eq!(outcome, SieveOutcome::Cancelled);
        assert_eq!(seen, vec![2, 3, 5, 7]);
        // (3, 5) and (5, 7) were fully delivered, (5, 7, 11) was not
        assert_eq!(ps.counts()[TupletKind::Twins], 2);
        assert_eq!(ps.counts()[TupletKind::Triplets], 0);
        assert_eq!(ps.counts()[TupletKind::Quintuplets], 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_callback_stop_at_eleven_reports_first_triplet() {
        let mut ps = PrimeSieve::new();
        ps.set_interval(0, 100).unwrap();
        ps.set_flags(Flags::CALLBACK | Flags::COUNT_TRIPLETS | Flags::PRINT_TRIPLETS)
            .unwrap();

        let mut callback = |p: u64| {
            if p == 11 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let mut out = Vec::new();
        ps.sieve_with(Some(&mut out), Some(&mut callback), None)
            .unwrap();

        assert_eq!(ps.counts()[TupletKind::Triplets], 1);
        assert_eq!(String::from_utf8(out).unwrap(), "(5, 7, 11)\n");
    }

    #[test]
    fn test_status_reaches_hundred() {
        let mut ps = PrimeSieve::new();
        ps.set_interval(0, 1_000_000).unwrap();
        ps.set_flags(Flags::COUNT_PRIMES | Flags::STATUS).unwrap();
        ps.sieve_with(None, None, None).unwrap();
        assert_eq!(ps.percent(), 100.0);
        assert_eq!(ps.counts()[TupletKind::Primes], 78_498);
    }

    #[test]
    fn test_status_counts_only_the_interval() {
        struct Total(u64);
        impl StatusSink for Total {
            fn update_status(&mut self, n: u64) {
                self.0 += n;
            }
        }
        let mut total = Total(0);
        let mut ps = PrimeSieve::new();
        ps.set_sieve_size(1);
        ps.set_interval(1000, 1_000_000).unwrap();
        ps.set_flags(Flags::COUNT_PRIMES | Flags::STATUS).unwrap();
        ps.sieve_with(None, None, Some(&mut total)).unwrap();
        assert_eq!(total.0, 999_001);
    }

    #[test]
    fn test_configuration_errors() {
        let mut ps = PrimeSieve::new();
        assert!(matches!(
            ps.count_primes(10, 5),
            Err(SieveError::InvalidInterval { start: 10, stop: 5 })
        ));
        assert!(matches!(
            ps.set_flags(Flags::PRINT_PRIMES | Flags::PRINT_TWINS),
            Err(SieveError::ConflictingPrintFlags)
        ));
        ps.set_sieve_size(100_000);
        assert_eq!(ps.sieve_size(), 4096);
        ps.set_sieve_size(0);
        assert_eq!(ps.sieve_size(), 1);
    }

    #[test]
    #[ignore = "sieves every prime below 2^32"]
    fn test_near_u64_max() {
        let mut ps = PrimeSieve::new();
        ps.set_sieve_size(1);
        let primes = ps.generate_primes(u64::MAX - 100, u64::MAX).unwrap();
        // 2^64 - 59, 2^64 - 83, 2^64 - 95 are the three largest 64-bit primes
        assert_eq!(
            primes,
            vec![u64::MAX - 94, u64::MAX - 82, u64::MAX - 58]
        );
    }
}
