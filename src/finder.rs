//! Segment consumer that streams, counts and prints primes.

use crate::counts::Counts;
use crate::error::Result;
use crate::flags::Flags;
use crate::output::PrimeWriter;
use crate::sieve::{Segment, SegmentConsumer};
use crate::status::StatusSink;
use crate::tuplet::{TupletKind, TupletLookup};
use crate::wheel::NUMBERS_PER_BYTE;
use std::io::Write;
use std::ops::ControlFlow;

/// Receives every prime of a run in ascending order.
///
/// Returning `ControlFlow::Break` stops the run. The prime passed to the
/// breaking call counts as delivered.
pub trait PrimeCallback {
    fn on_prime(&mut self, prime: u64) -> ControlFlow<()>;
}

impl<F> PrimeCallback for F
where
    F: FnMut(u64) -> ControlFlow<()>,
{
    #[inline]
    fn on_prime(&mut self, prime: u64) -> ControlFlow<()> {
        self(prime)
    }
}

/// A tuplet starting below 7 whose last member comes from the engine. It is
/// reported once that member has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTuplet {
    pub last: u64,
    pub kind: TupletKind,
    /// Printed form, e.g. `"(5, 7, 11)"`.
    pub text: &'static str,
}

/// Decodes finished segments according to a run's [`Flags`].
///
/// Sinks are attached with the `with_*` builders and are only used when the
/// matching flag is set.
pub struct PrimeFinder<'a> {
    flags: Flags,
    lookup: TupletLookup,
    counts: Counts,
    callback: Option<&'a mut dyn PrimeCallback>,
    writer: Option<PrimeWriter<&'a mut dyn Write>>,
    status: Option<&'a mut dyn StatusSink>,
    /// Interval progress is reported against.
    bounds: (u64, u64),
    pending: Vec<PendingTuplet>,
}

impl<'a> PrimeFinder<'a> {
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            lookup: TupletLookup::for_kinds(flags.count_kinds()),
            counts: Counts::new(),
            callback: None,
            writer: None,
            status: None,
            bounds: (0, u64::MAX),
            pending: Vec::new(),
        }
    }

    pub fn with_callback(mut self, callback: &'a mut dyn PrimeCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_output(mut self, output: &'a mut dyn Write) -> Self {
        self.writer = Some(PrimeWriter::new(output));
        self
    }

    pub fn with_status(mut self, status: &'a mut dyn StatusSink) -> Self {
        self.status = Some(status);
        self
    }

    /// Only report progress for integers of `[start, stop]`.
    pub fn with_bounds(mut self, start: u64, stop: u64) -> Self {
        self.bounds = (start, stop);
        self
    }

    /// Tuplets to report before the first segment, as far as the callback
    /// lets the run get.
    pub fn with_pending(mut self, pending: Vec<PendingTuplet>) -> Self {
        self.pending = pending;
        self
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Flush the output and return the counters.
    pub fn finish(mut self) -> Result<Counts> {
        // no segment was delivered, so nothing stopped the run
        self.report_pending(u64::MAX)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(self.counts)
    }

    /// Report pending tuplets whose last member is `<= through`, drop the rest.
    fn report_pending(&mut self, through: u64) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let print_kind = self.flags.print_kind();
        for tuplet in std::mem::take(&mut self.pending) {
            if tuplet.last > through {
                continue;
            }
            if self.flags.is_count(tuplet.kind) {
                self.counts.add(tuplet.kind, 1);
            }
            if print_kind == Some(tuplet.kind) {
                if let Some(writer) = self.writer.as_mut() {
                    writer.write_line(tuplet.text)?;
                }
            }
        }
        Ok(())
    }

    fn count(&mut self, segment: &Segment<'_>) {
        for kind in self.flags.count_kinds() {
            let n = match kind {
                TupletKind::Primes => segment.count_ones(),
                kind => self.lookup.count(kind, segment.bytes).unwrap_or(0),
            };
            self.counts.add(kind, n);
        }
    }

    fn print(&mut self, segment: &Segment<'_>) -> Result<()> {
        let Some(kind) = self.flags.print_kind() else {
            return Ok(());
        };
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if kind == TupletKind::Primes {
            for prime in segment.primes() {
                writer.write_prime(prime)?;
            }
            return Ok(());
        }
        let mut low = segment.low;
        for &byte in segment.bytes {
            for &mask in kind.bitmasks() {
                if byte & mask == mask {
                    writer.write_tuplet(low, mask)?;
                }
            }
            low += NUMBERS_PER_BYTE;
        }
        Ok(())
    }
}

impl SegmentConsumer for PrimeFinder<'_> {
    fn consume(&mut self, segment: Segment<'_>) -> Result<ControlFlow<()>> {
        let mut cut = None;
        if self.flags.contains(Flags::CALLBACK) {
            if let Some(callback) = self.callback.as_deref_mut() {
                let mut primes = segment.primes();
                while let Some(prime) = primes.next() {
                    if callback.on_prime(prime).is_break() {
                        cut = primes.position().map(|position| (position, prime));
                        break;
                    }
                }
            }
        }

        let Some((position, prime)) = cut else {
            self.report_pending(u64::MAX)?;
            self.count(&segment);
            self.print(&segment)?;
            if self.flags.is_status() {
                if let Some(status) = self.status.as_deref_mut() {
                    let (start, stop) = self.bounds;
                    status.update_status(segment.numbers_within(start, stop));
                }
            }
            return Ok(ControlFlow::Continue(()));
        };

        // Only what precedes the cut, the breaking prime included.
        self.report_pending(prime)?;
        let (head, tail, tail_low) = segment.split_after(position);
        let tail_bytes = [tail];
        let tail = Segment::new(&tail_bytes, tail_low);
        for part in [head, tail] {
            self.count(&part);
            self.print(&part)?;
        }
        Ok(ControlFlow::Break(()))
    }
}
