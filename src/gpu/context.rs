//! GPU device and queue initialization.
//!
//! A [`GpuContext`] bundles the `wgpu` device and queue every other GPU
//! module operates through. It is created once at startup and lives for the
//! whole simulation; nothing in this crate ever re-acquires the device.
//!
//! ## Limits
//! The frame pipeline binds the full simulation buffer set to every kernel,
//! which exceeds the WebGPU baseline of eight storage buffers per shader
//! stage. Device acquisition therefore requests a raised
//! `max_storage_buffers_per_shader_stage`; adapters that cannot satisfy it
//! fail initialization with a [`DeviceError`].

use crate::error::{DeviceError, EngineResult};

/// Storage-buffer limit requested from the adapter. A kernel sees at most
/// ten (nine simulation buffers plus the argument buffer on group 1); the
/// rest is headroom for auxiliary kernels.
const MAX_STORAGE_BINDINGS: u32 = 16;

/// Long-lived GPU device state.
///
/// ## Role
/// Owns the `wgpu` instance-derived device and queue and exposes them to the
/// buffer registry, kernel table, and frame scheduler.
///
/// ## Lifetime
/// Constructed once before the first tick; dropped on shutdown, which
/// releases every device resource allocated against it.

pub struct GpuContext {
    /// The logical GPU device.
    pub device: wgpu::Device,

    /// The submission queue for the device.
    pub queue: wgpu::Queue,

    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Initializes a device on the best available adapter, blocking until
    /// acquisition completes.
    ///
    /// ## Errors
    /// Fails with [`DeviceError`] if no adapter is available or the adapter
    /// cannot satisfy the requested limits.
    pub fn new() -> EngineResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Async variant of [`GpuContext::new`] for callers already inside an
    /// executor.
    pub async fn new_async() -> EngineResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| DeviceError::new(format!("no suitable GPU adapter: {e}")))?;

        let adapter_info = adapter.get_info();
        log::debug!(
            "selected adapter '{}' ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vectoroids_device"),
                required_limits: wgpu::Limits {
                    max_storage_buffers_per_shader_stage: MAX_STORAGE_BINDINGS,
                    ..wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .map_err(|e| DeviceError::new(format!("device creation failed: {e}")))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Returns information about the adapter backing this context.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Blocks until the given submission has fully executed on the device.
    ///
    /// This is the synchronization point between frame stages: every stage is
    /// submitted and waited on before the next stage's reads are encoded.
    pub fn wait_for(&self, submission: wgpu::SubmissionIndex) -> EngineResult<()> {
        self.device
            .poll(wgpu::PollType::WaitForSubmissionIndex(submission))
            .map_err(|e| DeviceError::new(format!("device poll failed: {e:?}")))?;
        Ok(())
    }
}
