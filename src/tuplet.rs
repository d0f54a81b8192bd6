//! Prime k-tuplet kinds and their per-byte lookup tables.
//!
//! With the modulo 30 layout every prime k-tuplet made of values >= 7 fits
//! inside one sieve byte, so counting tuplets of a segment reduces to summing
//! a 256-entry table over its bytes.

use std::fmt;

/// The outputs a run can count or print. `Primes` is the 1-tuplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TupletKind {
    Primes = 0,
    Twins = 1,
    Triplets = 2,
    Quadruplets = 3,
    Quintuplets = 4,
    Sextuplets = 5,
}

impl TupletKind {
    /// All kinds, ordered by tuplet size.
    pub const ALL: [TupletKind; 6] = [
        TupletKind::Primes,
        TupletKind::Twins,
        TupletKind::Triplets,
        TupletKind::Quadruplets,
        TupletKind::Quintuplets,
        TupletKind::Sextuplets,
    ];

    /// Index into [`Counts`](crate::counts::Counts) and flag bit offset.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind from its index (0 = primes, 1 = twins, ...).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Number of primes in one tuplet.
    pub const fn size(self) -> usize {
        self as usize + 1
    }

    /// Byte patterns of this kind, ascending. Every mask selects the bits of
    /// one admissible constellation inside a byte window.
    pub const fn bitmasks(self) -> &'static [u8] {
        match self {
            TupletKind::Primes => &[],
            // (11, 13), (17, 19), (29, 31)
            TupletKind::Twins => &[0x06, 0x18, 0xc0],
            // (7, 11, 13), (11, 13, 17), (13, 17, 19), (17, 19, 23)
            TupletKind::Triplets => &[0x07, 0x0e, 0x1c, 0x38],
            // (11, 13, 17, 19)
            TupletKind::Quadruplets => &[0x1e],
            // (7, 11, 13, 17, 19), (11, 13, 17, 19, 23)
            TupletKind::Quintuplets => &[0x1f, 0x3e],
            // (7, 11, 13, 17, 19, 23)
            TupletKind::Sextuplets => &[0x3f],
        }
    }

    /// Label used in result summaries.
    pub const fn label(self) -> &'static str {
        match self {
            TupletKind::Primes => "Primes",
            TupletKind::Twins => "Twin primes",
            TupletKind::Triplets => "Prime triplets",
            TupletKind::Quadruplets => "Prime quadruplets",
            TupletKind::Quintuplets => "Prime quintuplets",
            TupletKind::Sextuplets => "Prime sextuplets",
        }
    }
}

impl fmt::Display for TupletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// For every byte value, the number of `bitmasks` fully contained in it.
pub fn pattern_counts(bitmasks: &[u8]) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (value, entry) in table.iter_mut().enumerate() {
        let value = value as u8;
        *entry = bitmasks.iter().filter(|&&m| value & m == m).count() as u8;
    }
    table
}

/// Lookup tables for the requested tuplet kinds, built once per run.
#[derive(Clone, Default)]
pub struct TupletLookup {
    tables: [Option<Box<[u8; 256]>>; 6],
}

impl fmt::Debug for TupletLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let built: Vec<TupletKind> = TupletKind::ALL
            .iter()
            .copied()
            .filter(|&k| self.tables[k.index()].is_some())
            .collect();
        f.debug_struct("TupletLookup").field("built", &built).finish()
    }
}

impl TupletLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup tables for `kinds`. `Primes` is counted with popcount
    /// and gets no table.
    pub fn for_kinds<I: IntoIterator<Item = TupletKind>>(kinds: I) -> Self {
        let mut lookup = Self::new();
        for kind in kinds {
            lookup.build(kind);
        }
        lookup
    }

    /// Build the table of `kind` if it is not built yet.
    pub fn build(&mut self, kind: TupletKind) {
        if kind == TupletKind::Primes {
            return;
        }
        let slot = &mut self.tables[kind.index()];
        if slot.is_none() {
            *slot = Some(Box::new(pattern_counts(kind.bitmasks())));
        }
    }

    /// Table of `kind`, if built.
    #[inline]
    pub fn table(&self, kind: TupletKind) -> Option<&[u8; 256]> {
        self.tables[kind.index()].as_deref()
    }

    /// Number of `kind` tuplets in `bytes`, `None` if the table was not built.
    pub fn count(&self, kind: TupletKind, bytes: &[u8]) -> Option<u64> {
        let table = self.table(kind)?;
        let mut sum = 0u64;
        let mut chunks = bytes.chunks_exact(4);
        for c in &mut chunks {
            sum += u64::from(table[c[0] as usize])
                + u64::from(table[c[1] as usize])
                + u64::from(table[c[2] as usize])
                + u64::from(table[c[3] as usize]);
        }
        for &b in chunks.remainder() {
            sum += u64::from(table[b as usize]);
        }
        Some(sum)
    }
}
