//! Requested outputs of a sieving run.

use crate::error::{Result, SieveError};
use crate::tuplet::TupletKind;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set of requested outputs.
///
/// Bits 0..=5 count a [`TupletKind`], bits 6..=11 print one, the remaining
/// bits enable the callback and progress tracking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    pub const COUNT_PRIMES: Flags = Flags(1 << 0);
    pub const COUNT_TWINS: Flags = Flags(1 << 1);
    pub const COUNT_TRIPLETS: Flags = Flags(1 << 2);
    pub const COUNT_QUADRUPLETS: Flags = Flags(1 << 3);
    pub const COUNT_QUINTUPLETS: Flags = Flags(1 << 4);
    pub const COUNT_SEXTUPLETS: Flags = Flags(1 << 5);

    pub const PRINT_PRIMES: Flags = Flags(1 << 6);
    pub const PRINT_TWINS: Flags = Flags(1 << 7);
    pub const PRINT_TRIPLETS: Flags = Flags(1 << 8);
    pub const PRINT_QUADRUPLETS: Flags = Flags(1 << 9);
    pub const PRINT_QUINTUPLETS: Flags = Flags(1 << 10);
    pub const PRINT_SEXTUPLETS: Flags = Flags(1 << 11);

    /// Deliver every prime to a callback.
    pub const CALLBACK: Flags = Flags(1 << 12);
    /// Track progress through a status sink.
    pub const STATUS: Flags = Flags(1 << 13);
    /// Print the progress percentage to stderr (implies `STATUS`).
    pub const PRINT_STATUS: Flags = Flags(1 << 14);

    const COUNT_MASK: u32 = 0x3f;
    const PRINT_MASK: u32 = 0x3f << 6;
    const ALL_MASK: u32 = (1 << 15) - 1;

    /// Flags from raw bits, rejecting unknown bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::ALL_MASK != 0 {
            return Err(SieveError::UnsupportedFlags(bits));
        }
        Ok(Flags(bits))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    #[inline]
    pub const fn remove(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    /// Count flag of `kind`.
    pub const fn count(kind: TupletKind) -> Flags {
        Flags(1 << kind.index())
    }

    /// Print flag of `kind`.
    pub const fn print(kind: TupletKind) -> Flags {
        Flags(1 << (kind.index() + 6))
    }

    pub fn is_count(self, kind: TupletKind) -> bool {
        self.contains(Self::count(kind))
    }

    pub fn is_print(self, kind: TupletKind) -> bool {
        self.contains(Self::print(kind))
    }

    pub fn any_count(self) -> bool {
        self.0 & Self::COUNT_MASK != 0
    }

    pub fn any_print(self) -> bool {
        self.0 & Self::PRINT_MASK != 0
    }

    pub fn is_status(self) -> bool {
        self.intersects(Self::STATUS.union(Self::PRINT_STATUS))
    }

    /// Kinds with their count flag set.
    pub fn count_kinds(self) -> impl Iterator<Item = TupletKind> {
        TupletKind::ALL.into_iter().filter(move |&k| self.is_count(k))
    }

    /// The single kind to print, if any.
    pub fn print_kind(self) -> Option<TupletKind> {
        TupletKind::ALL.into_iter().find(|&k| self.is_print(k))
    }

    /// Check the flags describe a runnable configuration.
    pub fn validate(self) -> Result<()> {
        Self::from_bits(self.0)?;
        if (self.0 & Self::PRINT_MASK).count_ones() > 1 {
            return Err(SieveError::ConflictingPrintFlags);
        }
        Ok(())
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#x})", self.0)
    }
}
