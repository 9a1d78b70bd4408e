mod backend;
mod pipeline;
mod sequence;
#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use self::backend::GpuBackend;
pub use self::pipeline::ScanPipelines;
pub use self::sequence::GpuSequence;

use crate::prelude::*;

/// GPU context holding the wgpu device and queue used for scan dispatches.
#[derive(Debug, Clone)]
pub struct Gpu {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    limits: wgpu::Limits,
}

impl Gpu {
    /// Picks the high-performance adapter and requests a device with the adapter's full limits.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| ScanError::NoAdapter(e.to_string()))?;

        let info = adapter.get_info();
        let limits = adapter.limits();

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("prefix_scan_device"),
            required_limits: limits.clone(),
            ..Default::default()
        }))
        .map_err(|e| ScanError::DeviceRequest(e.to_string()))?;

        tracing::info!("Using device: {} ({:?})", info.name, info.backend);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            limits,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    /// Blocks until all submitted work has completed.
    pub fn wait(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| ScanError::Execution(e.to_string()))
    }

    /// Checks that one work-group of `block_size` invocations fits this device.
    pub fn validate_block_size(&self, block_size: usize) -> Result<()> {
        validate_block_size(block_size)?;

        let limits = &self.limits;
        let reject = |reason: String| ScanError::InvalidBlockSize { block_size, reason };

        if block_size > limits.max_compute_workgroup_size_x as usize {
            return Err(reject(format!(
                "exceeds max workgroup size {}",
                limits.max_compute_workgroup_size_x
            )));
        }
        let max_invocations = limits.max_compute_invocations_per_workgroup as usize;
        if max_invocations % block_size != 0 {
            return Err(reject(format!(
                "does not divide max invocations per workgroup {}",
                max_invocations
            )));
        }
        let scratch_bytes = block_size * std::mem::size_of::<f32>();
        if scratch_bytes > limits.max_compute_workgroup_storage_size as usize {
            return Err(reject(format!(
                "scratch of {} bytes exceeds workgroup storage {}",
                scratch_bytes, limits.max_compute_workgroup_storage_size
            )));
        }
        Ok(())
    }

    /// Largest sequence a single storage binding can hold.
    pub fn max_sequence_len(&self) -> usize {
        let max_bytes = (self.limits.max_storage_buffer_binding_size as u64)
            .min(self.limits.max_buffer_size);
        (max_bytes / std::mem::size_of::<f32>() as u64) as usize
    }

    /// Splits `num_groups` work-groups over a 2D grid that respects the per-dimension limit.
    pub(crate) fn workgroup_grid(&self, num_groups: usize) -> Result<(u32, u32)> {
        let max = self.limits.max_compute_workgroups_per_dimension as usize;
        let x = num_groups.clamp(1, max);
        let y = num_groups.div_ceil(x).max(1);
        if y > max {
            return Err(ScanError::TooLarge {
                len: num_groups,
                max: max * max,
            });
        }
        Ok((x as u32, y as u32))
    }
}
