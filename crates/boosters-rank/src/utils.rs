//! Common utilities used across the crate.
//!
//! This module provides parallelism configuration and the small buffer
//! primitives (prefix scan, gather, stable zero filtering, block splitting)
//! that the pairwise objectives are composed from.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// This is a simple boolean flag passed through training components.
/// When `Parallel`, components may use `rayon` parallel iterators.
/// When `Sequential`, components must use sequential iteration.
///
/// Every component produces bit-identical output under both settings; work is
/// only ever split along independent units (shards, queries).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    #[inline]
    pub fn maybe_par_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().for_each(f);
        } else {
            iter.into_iter().for_each(f);
        }
    }

    /// Map in parallel, preserving input order in the output.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Buffer Primitives
// =============================================================================

/// Exclusive prefix sum with the total appended.
///
/// Returns a vector of length `sizes.len() + 1` where `out[i]` is the sum of
/// `sizes[..i]` and `out[sizes.len()]` is the grand total. Block `i` therefore
/// occupies `out[i]..out[i + 1]`.
pub fn exclusive_scan(sizes: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(sizes.len() + 1);
    let mut total = 0usize;
    offsets.push(0);
    for &size in sizes {
        total += size;
        offsets.push(total);
    }
    offsets
}

/// Gather `src[indices[i]]` into a new vector.
#[inline]
pub fn gather<T: Copy>(src: &[T], indices: &[u32]) -> Vec<T> {
    indices.iter().map(|&idx| src[idx as usize]).collect()
}

/// Stable compaction of strictly positive entries.
///
/// Returns the retained values and their original indices. The index list is
/// strictly increasing.
pub fn filter_zero_entries(weights: &[f32]) -> (Vec<f32>, Vec<usize>) {
    let mut values = Vec::new();
    let mut indices = Vec::new();
    for (idx, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            values.push(w);
            indices.push(idx);
        }
    }
    (values, indices)
}

/// Split a mutable slice into disjoint blocks described by `offsets`.
///
/// `offsets` has the layout produced by [`exclusive_scan`]: block `i` is
/// `slice[offsets[i]..offsets[i + 1]]`.
///
/// # Panics
///
/// Panics if `offsets` is not non-decreasing or exceeds the slice.
pub fn split_blocks_mut<'a, T>(mut slice: &'a mut [T], offsets: &[usize]) -> Vec<&'a mut [T]> {
    let n_blocks = offsets.len().saturating_sub(1);
    let mut blocks = Vec::with_capacity(n_blocks);
    let mut consumed = offsets.first().copied().unwrap_or(0);
    slice = &mut std::mem::take(&mut slice)[consumed..];
    for window in offsets.windows(2) {
        assert!(window[0] <= window[1], "block offsets must be non-decreasing");
        let (head, tail) = std::mem::take(&mut slice).split_at_mut(window[1] - consumed);
        blocks.push(head);
        slice = tail;
        consumed = window[1];
    }
    blocks
}
