//! Device buffer registry.
//!
//! The registry owns every device-resident array and single-record struct in
//! the simulation. It provides typed allocation, host upload, blocking
//! readback, and explicit release, and it is the **only** module that creates
//! or destroys `wgpu::Buffer` objects.
//!
//! ## Handle discipline
//!
//! [`BufferHandle<T>`] is typed by element and deliberately **not** `Copy`:
//! * transfers take `&BufferHandle<T>`, so the element type of the host array
//!   always matches the device layout at compile time,
//! * [`BufferRegistry::free`] consumes the handle by value, making
//!   use-after-free unrepresentable in safe code,
//! * a handle presented after its slot was released (possible only through
//!   registry-wide teardown) fails loudly with [`ResourceError::StaleHandle`].
//!
//! ## Lifecycle
//! Every buffer is allocated once at startup and released on shutdown (or
//! when the registry is dropped); nothing is resized or reallocated during
//! normal operation.

use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::error::{DeviceError, EngineResult, ResourceError};
use crate::gpu::context::GpuContext;

/// Usage tag attached to a buffer at allocation time.
///
/// `Indirect` marks the buffer as a valid launch-geometry and draw-argument
/// source in addition to being ordinary read-write storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Read-write storage visible to compute kernels.
    Storage,

    /// Storage that may also feed indirect dispatch and indirect draws.
    Indirect,

    /// Per-dispatch uniform parameters.
    Uniform,
}

impl BufferUsage {
    fn wgpu_usages(self) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Storage => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC
            }
            BufferUsage::Indirect => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::INDIRECT
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC
            }
            BufferUsage::Uniform => {
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST
            }
        }
    }
}

/// Opaque typed handle to a registry-owned device buffer.
///
/// Obtained from [`BufferRegistry::alloc`]; surrendered to
/// [`BufferRegistry::free`].
#[derive(Debug)]
pub struct BufferHandle<T> {
    slot: usize,
    _marker: PhantomData<T>,
}

struct Entry {
    buffer: wgpu::Buffer,
    label: &'static str,
    capacity: usize,
    usage: BufferUsage,
}

/// Owner of all device-resident simulation buffers.
#[derive(Default)]
pub struct BufferRegistry {
    entries: Vec<Option<Entry>>,
}

impl BufferRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a zero-initialized device buffer of `capacity` elements.
    ///
    /// ## Semantics
    /// * The buffer size is `capacity * size_of::<T>()`, in declared element
    ///   order.
    /// * `wgpu` guarantees zero initialization, matching the all-zero state
    ///   every record type starts from.
    pub fn alloc<T: Pod>(
        &mut self,
        ctx: &GpuContext,
        label: &'static str,
        capacity: usize,
        usage: BufferUsage,
    ) -> EngineResult<BufferHandle<T>> {
        let size = (capacity * std::mem::size_of::<T>()) as wgpu::BufferAddress;
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage.wgpu_usages(),
            mapped_at_creation: false,
        });

        let slot = self.entries.len();
        self.entries.push(Some(Entry {
            buffer,
            label,
            capacity,
            usage,
        }));

        Ok(BufferHandle {
            slot,
            _marker: PhantomData,
        })
    }

    /// Allocates a device buffer initialized from `data`; capacity is
    /// `data.len()`.
    pub fn alloc_init<T: Pod>(
        &mut self,
        ctx: &GpuContext,
        label: &'static str,
        data: &[T],
        usage: BufferUsage,
    ) -> EngineResult<BufferHandle<T>> {
        let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: usage.wgpu_usages(),
        });

        let slot = self.entries.len();
        self.entries.push(Some(Entry {
            buffer,
            label,
            capacity: data.len(),
            usage,
        }));

        Ok(BufferHandle {
            slot,
            _marker: PhantomData,
        })
    }

    /// Copies `data` into the device buffer, in element order.
    ///
    /// ## Errors
    /// * [`ResourceError::LengthMismatch`] if `data.len()` differs from the
    ///   allocated capacity — partial uploads are not part of the contract.
    /// * [`ResourceError::StaleHandle`] if the buffer was released.
    pub fn upload<T: Pod>(
        &self,
        ctx: &GpuContext,
        handle: &BufferHandle<T>,
        data: &[T],
    ) -> EngineResult<()> {
        let entry = self.entry(handle)?;
        if data.len() != entry.capacity {
            return Err(ResourceError::LengthMismatch {
                label: entry.label,
                expected: entry.capacity,
                actual: data.len(),
            }
            .into());
        }
        ctx.queue.write_buffer(&entry.buffer, 0, bytemuck::cast_slice(data));
        Ok(())
    }

    /// Copies the device buffer back into `out`, blocking until every prior
    /// writer to the buffer has completed.
    ///
    /// Readback goes through a transient staging buffer: copy, submit, wait,
    /// map. This is the only suspension point the orchestrator ever takes.
    pub fn download<T: Pod>(
        &self,
        ctx: &GpuContext,
        handle: &BufferHandle<T>,
        out: &mut [T],
    ) -> EngineResult<()> {
        let entry = self.entry(handle)?;
        if out.len() != entry.capacity {
            return Err(ResourceError::LengthMismatch {
                label: entry.label,
                expected: entry.capacity,
                actual: out.len(),
            }
            .into());
        }

        let size = (entry.capacity * std::mem::size_of::<T>()) as wgpu::BufferAddress;
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_copy"),
            });
        encoder.copy_buffer_to_buffer(&entry.buffer, 0, &staging, 0, size);
        let submission = ctx.queue.submit(Some(encoder.finish()));
        ctx.wait_for(submission)?;

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        ctx.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| DeviceError::new(format!("poll during readback failed: {e:?}")))?;
        receiver
            .recv()
            .map_err(|e| DeviceError::new(format!("readback channel closed: {e}")))?
            .map_err(|e| DeviceError::new(format!("buffer map failed: {e}")))?;

        let view = slice.get_mapped_range();
        out.copy_from_slice(bytemuck::cast_slice(&view[..]));
        drop(view);
        staging.unmap();
        Ok(())
    }

    /// Releases the buffer and invalidates the handle.
    ///
    /// The handle is consumed, so a second free of the same buffer does not
    /// compile; presenting a handle whose slot was already emptied (only
    /// reachable through teardown paths) fails with
    /// [`ResourceError::StaleHandle`].
    pub fn free<T>(&mut self, handle: BufferHandle<T>) -> EngineResult<()> {
        let entry = self
            .entries
            .get_mut(handle.slot)
            .and_then(Option::take)
            .ok_or(ResourceError::StaleHandle { label: "<released>" })?;
        entry.buffer.destroy();
        Ok(())
    }

    /// Returns the raw device buffer for binding.
    pub fn raw<T>(&self, handle: &BufferHandle<T>) -> EngineResult<&wgpu::Buffer> {
        Ok(&self.entry(handle)?.buffer)
    }

    /// Returns the raw device buffer, checking it carries the `Indirect`
    /// usage tag required of launch-geometry sources.
    pub fn raw_indirect<T>(&self, handle: &BufferHandle<T>) -> EngineResult<&wgpu::Buffer> {
        let entry = self.entry(handle)?;
        if entry.usage != BufferUsage::Indirect {
            return Err(ResourceError::UsageMismatch {
                label: entry.label,
                required: "indirect",
            }
            .into());
        }
        Ok(&entry.buffer)
    }

    /// Element capacity the buffer was allocated with.
    pub fn capacity<T>(&self, handle: &BufferHandle<T>) -> EngineResult<usize> {
        Ok(self.entry(handle)?.capacity)
    }

    fn entry<T>(&self, handle: &BufferHandle<T>) -> EngineResult<&Entry> {
        self.entries
            .get(handle.slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| ResourceError::StaleHandle { label: "<released>" }.into())
    }
}
