use super::*;
use crate::cpu::CpuBackend;
use common::test_utils::{assert_scan_close, ceil_log, random_sequence, reference_exclusive_scan};

/// CPU backend that records every primitive invocation.
#[derive(Debug, Default)]
struct RecordingBackend {
    inner: CpuBackend,
    chunk_totals: Vec<Vec<f32>>,
    offsets: Vec<Vec<f32>>,
}

impl ScanBackend for RecordingBackend {
    type View = [f32];
    type Sequence = Vec<f32>;

    fn alloc(&mut self, len: usize) -> Result<Vec<f32>> {
        self.inner.alloc(len)
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
        self.inner
            .scan_chunks(input, output, totals, len, block_size)?;
        self.chunk_totals.push(totals.to_vec());
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
        self.offsets.push(offsets.to_vec());
        self.inner
            .add_offsets(scanned, offsets, output, len, block_size)
    }
}

fn run_cpu(input: &[f32], block_size: usize) -> (Vec<f32>, ScanStats) {
    let mut backend = CpuBackend::new();
    let mut output = vec![0.0; input.len()];
    let stats = scan(&mut backend, &input[..], &mut output[..], input.len(), block_size).unwrap();
    (output, stats)
}

#[test]
fn eight_ones_two_chunks() {
    let mut backend = RecordingBackend::default();
    let input = vec![1.0; 8];
    let mut output = vec![0.0; 8];
    let stats = scan(&mut backend, &input[..], &mut output[..], 8, 4).unwrap();

    assert_eq!(output, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(backend.chunk_totals[0], vec![4.0, 4.0]);
    assert_eq!(backend.offsets, vec![vec![0.0, 4.0]]);
    assert_eq!(stats.levels, vec![8, 2]);
}

#[test]
fn empty_input_invokes_nothing() {
    let mut backend = RecordingBackend::default();
    let input: Vec<f32> = Vec::new();
    let mut output: Vec<f32> = Vec::new();
    let stats = scan(&mut backend, &input[..], &mut output[..], 0, 4).unwrap();

    assert!(output.is_empty());
    assert_eq!(stats.depth(), 0);
    assert!(backend.chunk_totals.is_empty());
    assert!(backend.offsets.is_empty());
}

#[test]
fn five_elements_two_chunks() {
    let mut backend = RecordingBackend::default();
    let input = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let mut output = vec![0.0; 5];
    scan(&mut backend, &input[..], &mut output[..], 5, 4).unwrap();

    assert_eq!(output.len(), 5);
    assert_eq!(output, vec![0.0, 1.0, 3.0, 6.0, 10.0]);
    let totals = &backend.chunk_totals[0];
    assert_eq!(totals, &vec![10.0, 5.0]);
    assert_eq!(totals.iter().sum::<f32>(), 15.0);
}

#[test]
fn block_size_squared_recurses_exactly_twice() {
    let block_size = 16;
    let input = random_sequence(block_size * block_size, 7);
    let mut backend = RecordingBackend::default();
    let mut output = vec![0.0; input.len()];
    let stats = scan(&mut backend, &input[..], &mut output[..], input.len(), block_size).unwrap();

    assert_eq!(stats.levels, vec![block_size * block_size, block_size]);
    // The offsets level is a base case: one scan, no correction of its own.
    assert_eq!(backend.chunk_totals.len(), 2);
    assert_eq!(backend.offsets.len(), 1);
    assert_scan_close(&output, &reference_exclusive_scan(&input));
}

#[test]
fn base_case_matches_single_primitive_call() {
    let block_size = 32;
    for len in [1, 2, 17, 31, 32] {
        let input = random_sequence(len, len as u64);
        let (output, stats) = run_cpu(&input, block_size);
        assert_eq!(stats.depth(), 1);

        let mut direct = vec![0.0; len];
        let mut totals = vec![0.0; 1];
        crate::cpu::scan_chunks(&input, &mut direct, &mut totals, block_size);
        assert_eq!(output, direct, "len {}", len);
    }
}

#[test]
fn recursion_depth_is_ceil_log() {
    for (len, block_size) in [
        (2, 2),
        (3, 2),
        (8, 4),
        (17, 4),
        (64, 4),
        (65, 4),
        (1000, 8),
        (4096, 16),
        (4097, 16),
        (100_000, 256),
    ] {
        let input = vec![1.0; len];
        let (_, stats) = run_cpu(&input, block_size);
        assert_eq!(
            stats.depth(),
            ceil_log(len, block_size),
            "len {} block {}",
            len,
            block_size
        );
        // Each level is strictly shorter than the one before.
        assert!(stats.levels.windows(2).all(|w| w[1] < w[0]));
        assert!(*stats.levels.last().unwrap() <= block_size);
    }
}

#[test]
fn matches_reference_for_many_sizes() {
    for block_size in [2, 4, 64, 256] {
        for len in [1, 3, 255, 256, 257, 1000, 65_537] {
            let input = random_sequence(len, (len * block_size) as u64);
            let (output, _) = run_cpu(&input, block_size);
            assert_scan_close(&output, &reference_exclusive_scan(&input));
        }
    }
}

#[test]
fn padding_is_transparent() {
    let block_size = 8;
    for len in [9, 13, 67, 250] {
        let input = random_sequence(len, 11);
        let (output, _) = run_cpu(&input, block_size);

        let mut padded = input.clone();
        padded.resize(round_up(len, block_size), 0.0);
        let (padded_output, _) = run_cpu(&padded, block_size);

        assert_eq!(output.len(), len);
        assert_eq!(output, padded_output[..len], "len {}", len);
    }
}

#[test]
fn chunk_boundaries_hold_prefix_totals() {
    let block_size = 16;
    let input = random_sequence(16 * 40 + 5, 3);
    let (output, _) = run_cpu(&input, block_size);

    for k in 0..chunk_count(input.len(), block_size) {
        let expected: f64 = input[..k * block_size].iter().map(|&x| x as f64).sum();
        let actual = output[k * block_size] as f64;
        assert!(
            (actual - expected).abs() <= 1e-4 * expected.max(1.0),
            "boundary {}: got {}, expected {}",
            k,
            actual,
            expected
        );
    }
}

#[test]
fn negative_values() {
    let input: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { -1.5 } else { 0.5 }).collect();
    let (output, _) = run_cpu(&input, 4);
    assert_scan_close(&output, &reference_exclusive_scan(&input));
}

#[test]
fn rejects_invalid_block_size() {
    let mut backend = CpuBackend::new();
    let input = vec![1.0; 10];
    let mut output = vec![0.0; 10];
    for block_size in [0, 1, 3, 12] {
        let err = scan(&mut backend, &input[..], &mut output[..], 10, block_size).unwrap_err();
        assert!(matches!(err, ScanError::InvalidBlockSize { .. }));
    }
}

#[test]
fn rejects_mismatched_lengths() {
    let mut backend = CpuBackend::new();
    let input = vec![1.0; 4];
    let mut output = vec![0.0; 5];
    let err = scan(&mut backend, &input[..], &mut output[..], 5, 4).unwrap_err();
    assert!(matches!(
        err,
        ScanError::LengthMismatch {
            expected: 5,
            actual: 4
        }
    ));

    let input = vec![1.0; 5];
    let mut output = vec![0.0; 6];
    let err = scan(&mut backend, &input[..], &mut output[..], 5, 4).unwrap_err();
    assert!(matches!(
        err,
        ScanError::LengthMismatch {
            expected: 5,
            actual: 6
        }
    ));
}

#[test]
fn round_up_and_chunk_count() {
    assert_eq!(round_up(0, 4), 0);
    assert_eq!(round_up(5, 4), 8);
    assert_eq!(round_up(8, 4), 8);
    assert_eq!(chunk_count(5, 4), 2);
    assert_eq!(chunk_count(256, 256), 1);
    assert_eq!(chunk_count(257, 256), 2);
}
