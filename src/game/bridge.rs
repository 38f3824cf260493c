//! Side-channel bridge between host events and device-visible buffers.
//!
//! Inbound, the bridge uploads the tick's key-state snapshot wholesale
//! before any kernel reads it. Outbound, after the final compute stage it
//! performs the tick's single blocking readback — the globals record plus
//! the sound-request queue — and drives the audio sink with each request in
//! queue order.

use crate::error::EngineResult;
use crate::game::audio::AudioSink;
use crate::game::input::KeySnapshot;
use crate::game::types::{Globals, KeyState, SoundRequest, MAX_SOUND_REQUESTS};
use crate::gpu::context::GpuContext;
use crate::gpu::registry::{BufferHandle, BufferRegistry};

/// Outcome of draining one tick's sound requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoundDrain {
    /// Requests the device queued this tick (pre-clamp).
    pub requested: u32,

    /// Requests handed to a voice.
    pub played: u32,

    /// Requests dropped by the sink (voice-pool overflow).
    pub dropped: u32,
}

/// Host-side scratch state for the two bridge directions.
///
/// Owns reusable readback arrays so the per-tick drain allocates nothing.
pub struct SideChannel {
    globals_scratch: [Globals; 1],
    sounds_scratch: Vec<SoundRequest>,
}

impl Default for SideChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SideChannel {
    /// Creates the bridge with readback scratch sized to the queue capacity.
    pub fn new() -> Self {
        Self {
            globals_scratch: [Globals::default()],
            sounds_scratch: vec![SoundRequest::default(); MAX_SOUND_REQUESTS],
        }
    }

    /// Uploads the full key-state table for this tick.
    pub fn upload_keys(
        &self,
        ctx: &GpuContext,
        registry: &BufferRegistry,
        keys: &BufferHandle<KeyState>,
        snapshot: &KeySnapshot,
    ) -> EngineResult<()> {
        registry.upload(ctx, keys, snapshot.as_slice())
    }

    /// Reads back the globals record and sound queue, then triggers playback
    /// for every queued request in order.
    ///
    /// The device clamps `num_sound_requests` while appending; the host
    /// clamps again before indexing so a misbehaving program can never drive
    /// the drain out of bounds. Returns the globals copy (the tick's frame
    /// report is built from it) alongside the drain accounting.
    pub fn drain_sounds(
        &mut self,
        ctx: &GpuContext,
        registry: &BufferRegistry,
        globals: &BufferHandle<Globals>,
        sounds: &BufferHandle<SoundRequest>,
        sink: &mut dyn AudioSink,
    ) -> EngineResult<(Globals, SoundDrain)> {
        registry.download(ctx, globals, &mut self.globals_scratch)?;
        registry.download(ctx, sounds, &mut self.sounds_scratch)?;

        let state = self.globals_scratch[0];
        let requested = state.num_sound_requests;
        let count = (requested as usize).min(MAX_SOUND_REQUESTS);

        let mut drain = SoundDrain {
            requested,
            ..SoundDrain::default()
        };
        for request in &self.sounds_scratch[..count] {
            if sink.play(request.id) {
                drain.played += 1;
            } else {
                drain.dropped += 1;
            }
        }

        Ok((state, drain))
    }
}
