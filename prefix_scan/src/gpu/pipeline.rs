//! Compute pipelines for the two scan primitives.

use super::Gpu;
use crate::prelude::*;

/// Both scan pipelines compiled for one block size.
#[derive(Debug)]
pub struct ScanPipelines {
    pub(super) block_size: usize,
    pub(super) scan_blocks: wgpu::ComputePipeline,
    pub(super) scan_blocks_layout: wgpu::BindGroupLayout,
    pub(super) add_offsets: wgpu::ComputePipeline,
    pub(super) add_offsets_layout: wgpu::BindGroupLayout,
}

impl ScanPipelines {
    /// Compiles the scan shaders with `block_size` baked in as the workgroup size.
    ///
    /// Shader validation failures are returned as [`ScanError::ShaderCompile`]
    /// carrying the compiler diagnostics.
    pub fn new(gpu: &Gpu, block_size: usize) -> Result<Self> {
        gpu.validate_block_size(block_size)?;

        let (scan_blocks, scan_blocks_layout) = build_pipeline(
            gpu,
            "scan_blocks",
            include_str!("scan_blocks.wgsl"),
            block_size,
            // params, input, output, totals
            &[false, true, false, false],
        )?;

        let (add_offsets, add_offsets_layout) = build_pipeline(
            gpu,
            "add_offsets",
            include_str!("add_offsets.wgsl"),
            block_size,
            // params, scanned, offsets, output
            &[false, true, true, false],
        )?;

        tracing::debug!(block_size, "scan pipelines compiled");

        Ok(Self {
            block_size,
            scan_blocks,
            scan_blocks_layout,
            add_offsets,
            add_offsets_layout,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

/// Builds a single-entry-point compute pipeline. Binding 0 is the params uniform;
/// bindings `1..` are storage buffers whose read-only flags come from `read_only[1..]`.
fn build_pipeline(
    gpu: &Gpu,
    entry_point: &'static str,
    source: &str,
    block_size: usize,
    read_only: &[bool],
) -> Result<(wgpu::ComputePipeline, wgpu::BindGroupLayout)> {
    let device = gpu.device();
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let source = format!("const BLOCK_SIZE: u32 = {}u;\n\n{}", block_size, source);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(entry_point),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let entries: Vec<wgpu::BindGroupLayoutEntry> = read_only
        .iter()
        .enumerate()
        .map(|(binding, &read_only)| wgpu::BindGroupLayoutEntry {
            binding: binding as u32,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: if binding == 0 {
                    wgpu::BufferBindingType::Uniform
                } else {
                    wgpu::BufferBindingType::Storage { read_only }
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(entry_point),
        entries: &entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(entry_point),
        bind_group_layouts: &[&bind_group_layout],
        ..Default::default()
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(entry_point),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    });

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(ScanError::ShaderCompile {
            label: entry_point,
            log: error.to_string(),
        });
    }

    Ok((pipeline, bind_group_layout))
}
