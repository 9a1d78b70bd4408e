use bytemuck::{Pod, Zeroable};
use hashbrown::HashMap;
use wgpu::util::DeviceExt;

use super::{Gpu, GpuSequence, ScanPipelines};
use crate::prelude::*;

/// Uniform parameters shared by both shaders. Must match the WGSL `Params` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GpuParams {
    len: u32,
    groups_x: u32,
    _padding: [u32; 2],
}

/// Scan backend dispatching the primitives as wgpu compute passes.
///
/// Pipelines are compiled on first use of each block size and cached.
#[derive(Debug)]
pub struct GpuBackend {
    gpu: Gpu,
    pub(super) pipelines: HashMap<usize, ScanPipelines>,
}

impl GpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            pipelines: HashMap::new(),
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Compiles the pipelines for `block_size` ahead of the first scan.
    pub fn prepare(&mut self, block_size: usize) -> Result<()> {
        pipelines_for(&mut self.pipelines, &self.gpu, block_size).map(|_| ())
    }
}

fn pipelines_for<'a>(
    cache: &'a mut HashMap<usize, ScanPipelines>,
    gpu: &Gpu,
    block_size: usize,
) -> Result<&'a ScanPipelines> {
    if !cache.contains_key(&block_size) {
        let pipelines = ScanPipelines::new(gpu, block_size)?;
        cache.insert(block_size, pipelines);
    }
    Ok(&cache[&block_size])
}

/// Runs one compute pass over `len` elements in `block_size` work-groups and blocks until done.
fn dispatch(
    gpu: &Gpu,
    label: &'static str,
    pipeline: &wgpu::ComputePipeline,
    layout: &wgpu::BindGroupLayout,
    buffers: [&wgpu::Buffer; 3],
    len: usize,
    block_size: usize,
) -> Result<()> {
    let device = gpu.device();
    let num_groups = len.div_ceil(block_size);
    let (groups_x, groups_y) = gpu.workgroup_grid(num_groups)?;

    let params = GpuParams {
        len: len as u32,
        groups_x,
        _padding: [0; 2],
    };
    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&params),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: buffers[0].as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffers[1].as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: buffers[2].as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some(label),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    gpu.queue().submit(std::iter::once(encoder.finish()));
    gpu.wait()
}

impl ScanBackend for GpuBackend {
    type View = GpuSequence;
    type Sequence = GpuSequence;

    fn alloc(&mut self, len: usize) -> Result<GpuSequence> {
        GpuSequence::new_empty(&self.gpu, len)
    }

    fn sequence_len(view: &GpuSequence) -> usize {
        view.len()
    }

    fn scan_chunks(
        &mut self,
        input: &GpuSequence,
        output: &mut GpuSequence,
        totals: &mut GpuSequence,
        len: usize,
        block_size: usize,
    ) -> Result<()> {
        let pipelines = pipelines_for(&mut self.pipelines, &self.gpu, block_size)?;
        dispatch(
            &self.gpu,
            "scan_blocks",
            &pipelines.scan_blocks,
            &pipelines.scan_blocks_layout,
            [&input.buffer, &output.buffer, &totals.buffer],
            len,
            block_size,
        )
    }

    fn add_offsets(
        &mut self,
        scanned: &GpuSequence,
        offsets: &GpuSequence,
        output: &mut GpuSequence,
        len: usize,
        block_size: usize,
    ) -> Result<()> {
        let pipelines = pipelines_for(&mut self.pipelines, &self.gpu, block_size)?;
        dispatch(
            &self.gpu,
            "add_offsets",
            &pipelines.add_offsets,
            &pipelines.add_offsets_layout,
            [&scanned.buffer, &offsets.buffer, &output.buffer],
            len,
            block_size,
        )
    }
}
