//! # Frame Orchestration
//!
//! This module holds the game-facing half of the orchestrator: the fixed
//! per-tick dispatch sequence, the simulation record types, and the two
//! side channels (input in, audio out) that bridge host events to
//! device-visible buffers.
//!
//! ## Module structure
//!
//! * [`types`] — fixed-layout records and pool capacities
//! * [`frame`] — the frame scheduler and its canonical stage order
//! * [`input`] — key-state snapshot with per-tick edge derivation
//! * [`audio`] — voice trait and bounded voice pool
//! * [`bridge`] — key upload and sound-request drain
//!
//! The data flow per tick is: input snapshot → key upload → ordered kernel
//! dispatches (some indirect) → globals/sound readback → voice pool →
//! draw-argument buffer for the external renderer.

pub mod audio;
pub mod bridge;
pub mod frame;
pub mod input;
pub mod types;

pub use audio::{AudioSink, Voice, VoicePool};
pub use bridge::{SideChannel, SoundDrain};
pub use frame::{FrameReport, FrameScheduler, KernelId, SimBuffers};
pub use input::{KeySnapshot, KEY_ESCAPE, KEY_SPACE};
