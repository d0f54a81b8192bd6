//! Text output for printed primes and prime k-tuplets.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::error::SieveError;
use crate::wheel;
use std::io::{BufWriter, Write};

/// Buffer size for PrimeWriter (1MB default).
const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffered writer of primes (one per line) and tuplets
/// (`(a, b, c)`, one group per line).
pub struct PrimeWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> PrimeWriter<W> {
    /// Create a new PrimeWriter with default 1MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a prime followed by newline.
    #[inline]
    pub fn write_prime(&mut self, prime: u64) -> Result<(), SieveError> {
        self.writer.write_all(self.itoa_buf.format(prime).as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write the values selected by `mask` in the byte window based at `low`
    /// as one parenthesized group, e.g. `(11, 13)`.
    pub fn write_tuplet(&mut self, low: u64, mask: u8) -> Result<(), SieveError> {
        let mut bits = mask;
        let mut separator: &[u8] = b"(";
        while bits != 0 {
            let bit = bits.trailing_zeros();
            bits &= bits - 1;
            self.writer.write_all(separator)?;
            self.writer
                .write_all(self.itoa_buf.format(wheel::decode(low, 0, bit)).as_bytes())?;
            separator = b", ";
        }
        self.writer.write_all(b")\n")?;
        Ok(())
    }

    /// Write a full line as-is with newline.
    #[inline]
    pub fn write_line(&mut self, line: &str) -> Result<(), SieveError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), SieveError> {
        self.writer.flush()?;
        Ok(())
    }
}
