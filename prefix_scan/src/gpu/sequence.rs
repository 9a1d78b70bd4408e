use std::sync::mpsc;

use wgpu::util::DeviceExt;

use super::Gpu;
use crate::prelude::*;

/// Device-resident sequence of `f32` values.
///
/// The buffer is always read-write so it can serve as a primitive's output as
/// well as the next primitive's input.
#[derive(Debug)]
pub struct GpuSequence {
    pub(crate) buffer: wgpu::Buffer,
    len: usize,
}

const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_SRC)
    .union(wgpu::BufferUsages::COPY_DST);

impl GpuSequence {
    /// Uploads host values.
    pub fn from_slice(gpu: &Gpu, values: &[f32]) -> Result<Self> {
        if values.is_empty() {
            return Self::new_empty(gpu, 0);
        }
        check_len(gpu, values.len())?;

        let buffer = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scan_sequence_buffer"),
                contents: bytemuck::cast_slice(values),
                usage: USAGE,
            });

        Ok(Self {
            buffer,
            len: values.len(),
        })
    }

    /// Allocates an uninitialized sequence of `len` elements.
    pub fn new_empty(gpu: &Gpu, len: usize) -> Result<Self> {
        check_len(gpu, len)?;

        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("scan_sequence_buffer"),
            size: byte_size(len),
            usage: USAGE,
            mapped_at_creation: false,
        });

        Ok(Self { buffer, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Downloads the sequence to host memory through a staging buffer.
    pub fn to_vec(&self, gpu: &Gpu) -> Result<Vec<f32>> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        let size = (self.len * std::mem::size_of::<f32>()) as u64;

        let staging_buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("scan_sequence_staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scan_sequence_download_encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        gpu.queue().submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = mpsc::channel();
        let buffer_slice = staging_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        gpu.wait()?;

        receiver
            .recv()
            .map_err(|_| ScanError::Execution("staging buffer was never mapped".to_string()))?
            .map_err(|e| ScanError::Execution(format!("failed to map staging buffer: {}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let values: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging_buffer.unmap();

        Ok(values)
    }
}

/// Zero-length bindings are invalid, so empty sequences still get one element of storage.
fn byte_size(len: usize) -> u64 {
    (len.max(1) * std::mem::size_of::<f32>()) as u64
}

fn check_len(gpu: &Gpu, len: usize) -> Result<()> {
    let max = gpu.max_sequence_len();
    if len > max || len > u32::MAX as usize {
        return Err(ScanError::TooLarge { len, max });
    }
    Ok(())
}
