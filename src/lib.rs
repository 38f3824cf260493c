//! # Vectoroids
//!
//! Host orchestrator for a fully device-resident vector-line Asteroids
//! simulation. Entity state, collision detection, and line/glyph geometry
//! are all computed on the GPU; the host acts only as frame clock,
//! dispatch sequencer, and bridge for input and audio side effects.
//!
//! ## Design Goals
//! - Keep authoritative simulation state on the device
//! - One fixed, hand-authored dispatch order per tick, no graph inference
//! - Two-phase indirect dispatch for device-decided launch sizes
//! - A single blocking readback per tick, at the audio bridge
//! - Explicit, deterministic error propagation
//!
//! The compute program itself (kernel source), the renderer, the audio
//! device, and the input poller are external collaborators reached through
//! the interfaces in [`gpu::program`], [`game::frame`], [`game::audio`],
//! and [`game::input`].

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod error;
pub mod game;
pub mod gpu;
pub mod profiling;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use error::{
    DeviceError,
    EngineError,
    EngineResult,
    KernelNotFoundError,
    ResourceError,
};

pub use gpu::{
    BufferHandle,
    BufferRegistry,
    BufferUsage,
    ComputeProgram,
    GpuContext,
    Kernel,
    Launch,
    LaunchParams,
};

pub use game::{
    AudioSink,
    FrameReport,
    FrameScheduler,
    KernelId,
    KeySnapshot,
    SimBuffers,
    SoundDrain,
    Voice,
    VoicePool,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used orchestrator types.
///
/// Import with:
/// ```rust
/// use vectoroids::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AudioSink,
        EngineResult,
        FrameReport,
        FrameScheduler,
        GpuContext,
        KernelId,
        KeySnapshot,
        Launch,
        Voice,
        VoicePool,
    };
}
