//! Compute program loading and kernel resolution.
//!
//! A [`ComputeProgram`] wraps one WGSL module exposing every simulation
//! kernel as a named entry point, mirroring the single-program layout of the
//! device side. Resolution happens once at startup: a miss is a packaging
//! mismatch and fatal, never retried.
//!
//! ## Binding contract
//!
//! Every kernel is compiled against one explicit layout so any kernel can be
//! dispatched with the full common buffer set bound:
//!
//! * group(0) binding 0 — `Globals` record, `storage, read_write`
//! * group(0) binding 1 — player array, `storage, read_write`
//! * group(0) binding 2 — asteroid array, `storage, read_write`
//! * group(0) binding 3 — bullet array, `storage, read_write`
//! * group(0) binding 4 — line array, `storage, read_write`
//! * group(0) binding 5 — glyph array, `storage, read_write`
//! * group(0) binding 6 — sound-request array, `storage, read_write`
//! * group(0) binding 7 — key-state array, `storage, read`
//! * group(0) binding 8 — font line array, `storage, read_write`
//! * group(0) binding 9 — frame uniform (`LaunchParams`)
//!
//! The indirect-argument buffer lives alone on group(1) binding 0 and is
//! bound only for kernels that declare it. It cannot join group(0): a buffer
//! may not be writable storage and an indirect launch source within the same
//! dispatch, and the argument buffer is the launch source of every indirect
//! stage.
//!
//! Kernels declare only the bindings they use; declared access must match
//! the contract above (`read` for keys, `read_write` elsewhere).

use std::collections::HashMap;

use crate::error::{DeviceError, EngineResult, KernelNotFoundError};
use crate::gpu::context::GpuContext;

/// Number of storage bindings in bind group 0 (excluding the uniform).
const COMMON_STORAGE_BINDINGS: u32 = 9;

/// Binding index of the key-state array, the one read-only entry.
const KEYS_BINDING: u32 = 7;

/// Binding index of the frame uniform within group 0.
const PARAMS_BINDING: u32 = 9;

/// A resolved compute kernel.
///
/// ## Role
/// Carries the compiled pipeline plus the launch metadata the dispatch
/// builder needs: the entry point's declared 1-D thread-group size and
/// whether the kernel binds the indirect-argument group.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub(crate) pipeline: wgpu::ComputePipeline,

    /// Declared `@workgroup_size` x-dimension, queried once from the module.
    pub workgroup_x: u32,

    /// True when the kernel declares the group(1) argument buffer.
    pub uses_args: bool,

    /// Entry point name, for diagnostics.
    pub name: String,
}

/// A compiled compute program and its kernel cache.
pub struct ComputeProgram {
    module: wgpu::ShaderModule,
    ir: naga::Module,
    info: naga::valid::ModuleInfo,
    layout_common: wgpu::PipelineLayout,
    layout_with_args: wgpu::PipelineLayout,
    bgl_common: wgpu::BindGroupLayout,
    bgl_args: wgpu::BindGroupLayout,
    kernels: HashMap<String, Kernel>,
}

impl ComputeProgram {
    /// Parses, validates, and compiles a WGSL program against the fixed
    /// binding contract.
    ///
    /// ## Errors
    /// Fails with [`DeviceError`] if the source does not parse or validate;
    /// individual entry points are resolved lazily by
    /// [`ComputeProgram::resolve`].
    pub fn from_wgsl(ctx: &GpuContext, source: &str) -> EngineResult<Self> {
        let ir = naga::front::wgsl::parse_str(source)
            .map_err(|e| DeviceError::new(format!("WGSL parse failed: {e}")))?;

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&ir)
        .map_err(|e| DeviceError::new(format!("WGSL validation failed: {e:?}")))?;

        let module = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("vectoroids_program"),
                source: wgpu::ShaderSource::Naga(std::borrow::Cow::Owned(ir.clone())),
            });

        let (bgl_common, bgl_args) = create_bind_group_layouts(ctx);

        let layout_common = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("vectoroids_layout_common"),
                bind_group_layouts: &[&bgl_common],
                push_constant_ranges: &[],
            });
        let layout_with_args = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("vectoroids_layout_args"),
                bind_group_layouts: &[&bgl_common, &bgl_args],
                push_constant_ranges: &[],
            });

        Ok(Self {
            module,
            ir,
            info,
            layout_common,
            layout_with_args,
            bgl_common,
            bgl_args,
            kernels: HashMap::new(),
        })
    }

    /// Resolves a named entry point into a [`Kernel`], creating and caching
    /// its pipeline on first use.
    ///
    /// ## Errors
    /// [`KernelNotFoundError`] if the entry point is absent — fatal at
    /// startup, listing every entry point the program exposes.
    pub fn resolve(&mut self, ctx: &GpuContext, name: &str) -> EngineResult<Kernel> {
        if let Some(kernel) = self.kernels.get(name) {
            return Ok(kernel.clone());
        }

        let (entry_index, entry) = self
            .ir
            .entry_points
            .iter()
            .enumerate()
            .find(|(_, ep)| ep.name == name)
            .ok_or_else(|| KernelNotFoundError {
                name: name.to_string(),
                available: self.ir.entry_points.iter().map(|ep| ep.name.clone()).collect(),
            })?;

        let workgroup_x = entry.workgroup_size[0].max(1);
        let uses_args = self.entry_uses_group(entry_index, 1);

        let layout = if uses_args {
            &self.layout_with_args
        } else {
            &self.layout_common
        };

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(name),
                layout: Some(layout),
                module: &self.module,
                entry_point: Some(name),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        let kernel = Kernel {
            pipeline,
            workgroup_x,
            uses_args,
            name: name.to_string(),
        };
        self.kernels.insert(name.to_string(), kernel.clone());
        Ok(kernel)
    }

    /// Layout of bind group 0 (common simulation buffers + frame uniform).
    pub fn common_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bgl_common
    }

    /// Layout of bind group 1 (the indirect-argument buffer).
    pub fn args_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bgl_args
    }

    /// Whether the entry point (including every helper it calls) touches any
    /// global bound to the given group. Uses the validator's per-entry usage
    /// analysis, so "declared but unused" bindings do not force the argument
    /// group onto a kernel.
    fn entry_uses_group(&self, entry_index: usize, group: u32) -> bool {
        let usage = self.info.get_entry_point(entry_index);
        self.ir.global_variables.iter().any(|(handle, var)| {
            var.binding.as_ref().is_some_and(|b| b.group == group)
                && !usage[handle].is_empty()
        })
    }
}

fn create_bind_group_layouts(ctx: &GpuContext) -> (wgpu::BindGroupLayout, wgpu::BindGroupLayout) {
    let mut entries = Vec::with_capacity(COMMON_STORAGE_BINDINGS as usize + 1);

    for binding in 0..COMMON_STORAGE_BINDINGS {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage {
                    read_only: binding == KEYS_BINDING,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: PARAMS_BINDING,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });

    let bgl_common = ctx
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vectoroids_bgl_common"),
            entries: &entries,
        });

    let bgl_args = ctx
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vectoroids_bgl_args"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

    (bgl_common, bgl_args)
}
