// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable scratch-value pool.

use alloc::vec::Vec;

/// Something a [`Pool`] can hand out again after resetting it.
pub trait Reusable: Default {
    /// Clears the value for its next user, keeping any allocation.
    fn reset(&mut self);
}

impl<T> Reusable for Vec<T> {
    #[inline]
    fn reset(&mut self) {
        self.clear();
    }
}

/// Counters describing how a [`Pool`] has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of [`Pool::get`] calls.
    pub acquired: u64,
    /// Number of [`Pool::release`] calls.
    pub released: u64,
    /// Number of values the pool had to create because it was empty.
    pub created: u64,
}

impl PoolStats {
    /// Values handed out and not yet returned.
    #[inline]
    #[must_use]
    pub const fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

/// A free list of reusable values.
///
/// [`get`](Self::get) pops a previously released value (reset) or creates a
/// fresh one when the pool is empty, so an undersized pool simply grows.
/// Values that are never released are a capacity leak, not a correctness
/// problem. Every value is owned by whoever holds it, which makes nested
/// acquisition within one traversal safe.
#[derive(Debug, Default)]
pub struct Pool<T> {
    free: Vec<T>,
    stats: PoolStats,
}

impl<T: Reusable> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Creates a pool pre-filled with `n` values.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        let mut free = Vec::with_capacity(n);
        free.resize_with(n, T::default);
        Self {
            free,
            stats: PoolStats::default(),
        }
    }

    /// Takes a value out of the pool.
    pub fn get(&mut self) -> T {
        self.stats.acquired += 1;
        match self.free.pop() {
            Some(mut v) => {
                v.reset();
                v
            }
            None => {
                self.stats.created += 1;
                T::default()
            }
        }
    }

    /// Returns a value to the pool.
    pub fn release(&mut self, value: T) {
        self.stats.released += 1;
        self.free.push(value);
    }

    /// Number of values currently idle in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Usage counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
