//! Per-run result counters.

use crate::tuplet::TupletKind;
use std::ops::{AddAssign, Index};

/// One counter per [`TupletKind`], owned by a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts([u64; 6]);

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, kind: TupletKind) -> u64 {
        self.0[kind.index()]
    }

    #[inline]
    pub fn add(&mut self, kind: TupletKind, n: u64) {
        self.0[kind.index()] += n;
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &Counts) {
        for (a, b) in self.0.iter_mut().zip(other.0) {
            *a += b;
        }
    }

    pub fn as_array(&self) -> [u64; 6] {
        self.0
    }
}

impl Index<TupletKind> for Counts {
    type Output = u64;

    fn index(&self, kind: TupletKind) -> &u64 {
        &self.0[kind.index()]
    }
}

impl AddAssign<&Counts> for Counts {
    fn add_assign(&mut self, rhs: &Counts) {
        self.merge(rhs);
    }
}
