use crate::cpu::CpuBackend;
use crate::gpu::{Gpu, GpuBackend, GpuSequence};
use crate::prelude::*;
use crate::scan;

#[derive(Debug)]
enum Engine {
    Cpu(CpuBackend),
    Gpu(GpuBackend),
}

/// Entry point for scanning host slices.
///
/// Owns the selected backend across calls so GPU pipelines are compiled once.
/// Each [`Scanner::scan`] uploads the input, runs the recursive scan and reads the
/// result back; all device buffers are released before it returns.
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    engine: Engine,
}

impl Scanner {
    /// Creates a scanner for the configured backend.
    ///
    /// `Backend::Auto` falls back to the CPU when no GPU can be initialized;
    /// `Backend::Gpu` reports that as an error.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let engine = match config.backend {
            Backend::Cpu => Engine::Cpu(CpuBackend::new()),
            Backend::Gpu => Engine::Gpu(Self::gpu_backend(Gpu::new()?, config.block_size)?),
            Backend::Auto => match fallback_if_unavailable(Gpu::new(), |gpu| {
                Self::gpu_backend(gpu, config.block_size)
            })? {
                Some(backend) => Engine::Gpu(backend),
                None => Engine::Cpu(CpuBackend::new()),
            },
        };

        Ok(Self { config, engine })
    }

    /// CPU-only scanner.
    pub fn cpu(block_size: usize) -> Result<Self> {
        Self::new(ScanConfig::new(block_size, Backend::Cpu))
    }

    /// Scanner on an already initialized GPU.
    pub fn with_gpu(gpu: Gpu, block_size: usize) -> Result<Self> {
        let config = ScanConfig::new(block_size, Backend::Gpu);
        config.validate()?;
        Ok(Self {
            config,
            engine: Engine::Gpu(Self::gpu_backend(gpu, block_size)?),
        })
    }

    fn gpu_backend(gpu: Gpu, block_size: usize) -> Result<GpuBackend> {
        let mut backend = GpuBackend::new(gpu);
        backend.prepare(block_size)?;
        Ok(backend)
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// The backend actually in use, never `Backend::Auto`.
    pub fn backend(&self) -> Backend {
        match self.engine {
            Engine::Cpu(_) => Backend::Cpu,
            Engine::Gpu(_) => Backend::Gpu,
        }
    }

    /// Exclusive prefix sum of `input`.
    pub fn scan(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.scan_with_stats(input).map(|(output, _)| output)
    }

    pub fn scan_with_stats(&mut self, input: &[f32]) -> Result<(Vec<f32>, ScanStats)> {
        if input.is_empty() {
            return Ok((Vec::new(), ScanStats::default()));
        }

        let block_size = self.config.block_size;
        let len = input.len();

        let (output, stats) = match &mut self.engine {
            Engine::Cpu(backend) => {
                let mut output = vec![0.0; len];
                let stats = scan::scan(backend, input, &mut output[..], len, block_size)?;
                (output, stats)
            }
            Engine::Gpu(backend) => {
                let gpu = backend.gpu().clone();
                let input = GpuSequence::from_slice(&gpu, input)?;
                let mut output = GpuSequence::new_empty(&gpu, len)?;
                let stats = scan::scan(backend, &input, &mut output, len, block_size)?;
                (output.to_vec(&gpu)?, stats)
            }
        };

        tracing::debug!(
            len,
            block_size,
            backend = %self.backend(),
            levels = stats.depth(),
            "scan complete"
        );

        Ok((output, stats))
    }
}

/// Resolves GPU initialization for `Backend::Auto`.
///
/// Only a missing adapter or device yields `Ok(None)`, meaning run on the CPU.
/// Errors from `prepare` (shader build, block size beyond the device limits)
/// are returned as is.
fn fallback_if_unavailable<G, T>(
    init: Result<G>,
    prepare: impl FnOnce(G) -> Result<T>,
) -> Result<Option<T>> {
    match init {
        Ok(gpu) => prepare(gpu).map(Some),
        Err(e @ (ScanError::NoAdapter(_) | ScanError::DeviceRequest(_))) => {
            tracing::warn!("GPU initialization failed, falling back to CPU: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
