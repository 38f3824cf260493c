//! # GPU Execution Backend
//!
//! This module implements the device-facing half of the orchestrator: the
//! buffer registry, the kernel table, and the launch-geometry machinery the
//! frame scheduler drives every tick.
//!
//! ## Design goals
//!
//! * Keep every piece of authoritative simulation state device-resident
//! * Make all host/device transfers explicit and phase-controlled
//! * Provide explicit, deterministic error propagation
//! * Avoid hidden synchronization or implicit state
//!
//! ---
//!
//! ## Execution model
//!
//! The host issues a strictly ordered sequence of launches; within a launch
//! the device executes many threads with no ordering guarantee among them.
//! Each stage is submitted as its own command buffer and waited on before
//! the next stage is encoded, so stage N's writes are fully visible to stage
//! N+1's reads. The only other suspension point is explicit readback through
//! [`BufferRegistry::download`].
//!
//! ---
//!
//! ## Module structure
//!
//! * [`context`] — GPU device and queue initialization
//! * [`registry`] — typed device buffer ownership and host transfer
//! * [`program`] — WGSL program compilation and kernel resolution
//! * [`dispatch`] — direct and two-phase indirect launch geometry
//!
//! ---
//!
//! ## Safety and correctness
//!
//! * Buffers are logically owned by the orchestrator for a tick's duration;
//!   kernels only borrow bound buffers and never resize them.
//! * Cross-thread accumulation on the device must go through atomic
//!   increment-and-get; the orchestrator guarantees nothing about intra-stage
//!   write ordering.
//! * A missing kernel or stale buffer handle indicates a corrupt program
//!   image and is surfaced as a fatal error, never retried.

pub mod context;
pub mod dispatch;
pub mod program;
pub mod registry;

pub use context::GpuContext;
pub use dispatch::{group_count, Launch, LaunchParams, THREAD_COUNT_INDIRECT};
pub use program::{ComputeProgram, Kernel};
pub use registry::{BufferHandle, BufferRegistry, BufferUsage};
