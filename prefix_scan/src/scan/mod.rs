//! Recursive orchestration of the chunked exclusive scan.
//!
//! A backend can only scan one chunk of `block_size` elements at a time. Larger
//! sequences are scanned chunk by chunk, the chunk totals are scanned recursively
//! to produce per-chunk offsets, and the offsets are added back into every chunk.

#[cfg(test)]
mod tests;

use std::borrow::{Borrow, BorrowMut};

use crate::prelude::*;

/// Parallel execution substrate for the two scan primitives.
///
/// Primitives operate on borrowed `View`s so callers can pass data they do not
/// own; the orchestrator allocates owned `Sequence`s for its intermediates.
/// Every call must have completed (its results visible to subsequent calls)
/// by the time it returns.
pub trait ScanBackend {
    type View: ?Sized;
    type Sequence: BorrowMut<Self::View>;

    /// Allocates a sequence of `len` elements owned by the caller.
    fn alloc(&mut self, len: usize) -> Result<Self::Sequence>;

    fn sequence_len(view: &Self::View) -> usize;

    /// Exclusive scan of each `block_size` chunk of `input[..len]` into `output`,
    /// writing the sum of chunk `i` to `totals[i]`. Reads past `len` count as zero.
    fn scan_chunks(
        &mut self,
        input: &Self::View,
        output: &mut Self::View,
        totals: &mut Self::View,
        len: usize,
        block_size: usize,
    ) -> Result<()>;

    /// `output[p] = scanned[p] + offsets[p / block_size]` for every `p < len`.
    fn add_offsets(
        &mut self,
        scanned: &Self::View,
        offsets: &Self::View,
        output: &mut Self::View,
        len: usize,
        block_size: usize,
    ) -> Result<()>;
}

/// Lengths scanned at each recursion level of one top-level call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub levels: Vec<usize>,
}

impl ScanStats {
    /// Number of orchestrator frames entered.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

/// Rounds `len` up to the next multiple of `block_size`.
#[inline]
pub fn round_up(len: usize, block_size: usize) -> usize {
    len.div_ceil(block_size) * block_size
}

#[inline]
pub fn chunk_count(len: usize, block_size: usize) -> usize {
    len.div_ceil(block_size)
}

/// Exclusive prefix sum of `input[..len]` into `output`.
pub fn scan<B: ScanBackend>(
    backend: &mut B,
    input: &B::View,
    output: &mut B::View,
    len: usize,
    block_size: usize,
) -> Result<ScanStats> {
    validate_block_size(block_size)?;

    let input_len = B::sequence_len(input);
    if input_len < len {
        return Err(ScanError::LengthMismatch {
            expected: len,
            actual: input_len,
        });
    }
    let output_len = B::sequence_len(output);
    if output_len != len {
        return Err(ScanError::LengthMismatch {
            expected: len,
            actual: output_len,
        });
    }

    let mut stats = ScanStats::default();
    scan_recursive(backend, input, output, len, block_size, &mut stats)?;
    Ok(stats)
}

fn scan_recursive<B: ScanBackend>(
    backend: &mut B,
    input: &B::View,
    output: &mut B::View,
    len: usize,
    block_size: usize,
    stats: &mut ScanStats,
) -> Result<()> {
    if len == 0 {
        return Ok(());
    }

    let level = stats.levels.len();
    stats.levels.push(len);

    let num_chunks = chunk_count(len, block_size);
    let mut totals = backend.alloc(num_chunks)?;

    if len <= block_size {
        tracing::debug!(level, len, "scanning single chunk");
        return backend.scan_chunks(input, output, totals.borrow_mut(), len, block_size);
    }

    tracing::debug!(
        level,
        len,
        padded_len = round_up(len, block_size),
        num_chunks,
        "scanning chunks"
    );

    let mut scanned = backend.alloc(len)?;
    backend.scan_chunks(
        input,
        scanned.borrow_mut(),
        totals.borrow_mut(),
        len,
        block_size,
    )?;

    let mut offsets = backend.alloc(num_chunks)?;
    scan_recursive(
        backend,
        totals.borrow(),
        offsets.borrow_mut(),
        num_chunks,
        block_size,
        stats,
    )?;

    backend.add_offsets(
        scanned.borrow(),
        offsets.borrow(),
        output,
        len,
        block_size,
    )
}
