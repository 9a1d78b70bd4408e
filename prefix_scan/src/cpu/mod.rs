//! CPU execution of the scan primitives on the rayon thread pool.
//!
//! Each chunk is one rayon task with its own scratch buffer. Inside a chunk the
//! tree levels run one after another, so every level observes all writes of the
//! previous one, the same guarantee a work-group barrier gives on the GPU.


use rayon::prelude::*;

use crate::prelude::*;

/// Scan backend running on the rayon thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ScanBackend for CpuBackend {
    type View = [f32];
    type Sequence = Vec<f32>;

    fn alloc(&mut self, len: usize) -> Result<Vec<f32>> {
        Ok(vec![0.0; len])
    }

    fn sequence_len(view: &[f32]) -> usize {
        view.len()
    }

    fn scan_chunks(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        totals: &mut [f32],
        len: usize,
        block_size: usize,
    ) -> Result<()> {
        scan_chunks(&input[..len], &mut output[..len], totals, block_size);
        Ok(())
    }

    fn add_offsets(
        &mut self,
        scanned: &[f32],
        offsets: &[f32],
        output: &mut [f32],
        len: usize,
        block_size: usize,
    ) -> Result<()> {
        add_offsets(&scanned[..len], offsets, &mut output[..len], block_size);
        Ok(())
    }
}

/// Work-efficient exclusive scan of one chunk.
///
/// `scratch.len()` is the block size and must be a power of two; `chunk` may be
/// shorter, in which case the remainder is zero padded. Writes the exclusive scan
/// of `chunk` into `output` and returns the chunk total.
pub fn scan_chunk(chunk: &[f32], scratch: &mut [f32], output: &mut [f32]) -> f32 {
    let block_size = scratch.len();
    debug_assert!(block_size.is_power_of_two());
    debug_assert!(chunk.len() <= block_size);
    debug_assert_eq!(chunk.len(), output.len());

    scratch[..chunk.len()].copy_from_slice(chunk);
    scratch[chunk.len()..].fill(0.0);

    // Up-sweep: partial sums accumulate at the right node of each pair.
    let mut stride = 1;
    while stride < block_size {
        for i in (2 * stride - 1..block_size).step_by(2 * stride) {
            scratch[i] += scratch[i - stride];
        }
        stride *= 2;
    }

    let total = scratch[block_size - 1];
    scratch[block_size - 1] = 0.0;

    // Down-sweep
    let mut stride = block_size / 2;
    while stride > 0 {
        for i in (2 * stride - 1..block_size).step_by(2 * stride) {
            let left = scratch[i - stride];
            scratch[i - stride] = scratch[i];
            scratch[i] += left;
        }
        stride /= 2;
    }

    output.copy_from_slice(&scratch[..output.len()]);
    total
}

/// Scans every chunk of `input` independently, one chunk total per chunk.
pub fn scan_chunks(input: &[f32], output: &mut [f32], totals: &mut [f32], block_size: usize) {
    debug_assert_eq!(input.len(), output.len());
    debug_assert_eq!(totals.len(), input.len().div_ceil(block_size));

    output
        .par_chunks_mut(block_size)
        .zip(input.par_chunks(block_size))
        .zip(totals.par_iter_mut())
        .for_each_init(
            || vec![0.0f32; block_size],
            |scratch, ((out, chunk), total)| {
                *total = scan_chunk(chunk, scratch, out);
            },
        );
}

/// Adds `offsets[i]` to every element of chunk `i`.
pub fn add_offsets(scanned: &[f32], offsets: &[f32], output: &mut [f32], block_size: usize) {
    debug_assert_eq!(scanned.len(), output.len());
    debug_assert_eq!(offsets.len(), scanned.len().div_ceil(block_size));

    output
        .par_chunks_mut(block_size)
        .zip(scanned.par_chunks(block_size))
        .zip(offsets.par_iter())
        .for_each(|((out, chunk), &offset)| {
            for (dst, &value) in out.iter_mut().zip(chunk) {
                *dst = value + offset;
            }
        });
}
