//! Launch geometry and the two-phase indirect-dispatch mechanism.
//!
//! Every kernel launch in the frame pipeline is described by a [`Launch`]
//! and parameterized by a [`LaunchParams`] uniform. Two launch-geometry
//! modes exist:
//!
//! * **Direct** — the host knows the item count up front (usually a pool
//!   capacity). The thread-group count is `ceil(items / workgroup_x)` and
//!   the exact item count travels in `LaunchParams::thread_count` so every
//!   thread can bounds-check its own index against the *requested* count
//!   rather than the rounded-up launch size.
//! * **Indirect** — the item count was produced on the device earlier in the
//!   same tick. The host writes a request selector into the uniform,
//!   dispatches the setup kernel (one group) which packs a group count into
//!   the shared argument buffer at [`DISPATCH_ARGS_OFFSET`], then launches
//!   the target kernel with geometry read from that buffer.
//!   `thread_count` is set to the [`THREAD_COUNT_INDIRECT`] sentinel,
//!   telling kernel code to bounds-check against a counter in the globals
//!   record instead.
//!
//! Indirect dispatch exists to launch "spawn N" / "clear K" work without a
//! host/device round trip: a fixed-cost setup dispatch replaces a
//! synchronous readback every tick.
//!
//! ## Argument buffer map
//!
//! One buffer holds both compute dispatch arguments and the two indirect
//! draw descriptors, at fixed non-overlapping offsets:
//!
//! | words | bytes | contents |
//! |---|---|---|
//! | 0..4  | 0..16  | line-geometry draw args (vertex/instance/first/first) |
//! | 4..8  | 16..32 | glyph-geometry draw args |
//! | 8..11 | 32..44 | compute dispatch args (x, y, z) |
//!
//! Draw arguments are valid from the end of the tick that wrote them until
//! the next tick's argument build; compute dispatch arguments are only valid
//! for the launch in the same tick that wrote them.

use bytemuck::{Pod, Zeroable};

/// Byte offset of the line-geometry indirect draw arguments.
pub const LINE_DRAW_ARGS_OFFSET: u64 = 0;

/// Byte offset of the glyph-geometry indirect draw arguments.
pub const GLYPH_DRAW_ARGS_OFFSET: u64 = 16;

/// Byte offset of the compute indirect dispatch arguments.
pub const DISPATCH_ARGS_OFFSET: u64 = 32;

/// Word count of one indirect draw descriptor.
pub const DRAW_ARGS_WORDS: usize = 4;

/// Word count of one compute dispatch descriptor.
pub const DISPATCH_ARGS_WORDS: usize = 3;

/// Sentinel `thread_count` for indirect launches: the host does not know the
/// item count, kernels must bounds-check against a device-side counter.
pub const THREAD_COUNT_INDIRECT: i32 = -1;

/// Launch-geometry specification for one pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launch {
    /// One thread group; used by the frame-scoped single-record kernels.
    Single,

    /// Direct launch over a host-known item count.
    Threads(u32),

    /// Two-phase indirect launch selected by a device-side request id.
    Indirect {
        /// Selector the setup kernel uses to pick which device-side quantity
        /// becomes the launch size.
        request: u32,
    },
}

/// Frame uniform bound to every dispatch.
///
/// Matches the WGSL `Params` struct of the binding contract field for field;
/// all members are 4-byte scalars so the host and device layouts agree
/// without padding games.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LaunchParams {
    /// Seconds since the scheduler started.
    pub time: f32,

    /// Seconds advanced by this tick.
    pub time_step: f32,

    /// Monotonic tick counter.
    pub frame: u32,

    /// Exact requested item count for direct launches, or
    /// [`THREAD_COUNT_INDIRECT`] for indirect launches.
    pub thread_count: i32,

    /// Request selector consumed by the setup kernel during indirect
    /// launches; zero otherwise.
    pub request_id: u32,

    /// Player pool capacity.
    pub max_players: u32,

    /// Asteroid pool capacity.
    pub max_asteroids: u32,

    /// Bullet pool capacity.
    pub max_bullets: u32,

    /// Sound-request queue capacity.
    pub max_sound_requests: u32,

    /// Pads the uniform to a 16-byte size multiple.
    pub _pad: [u32; 3],
}

impl LaunchParams {
    /// Parameters for a direct launch over `items` threads.
    pub fn direct(mut self, items: u32) -> Self {
        self.thread_count = items as i32;
        self.request_id = 0;
        self
    }

    /// Parameters for the indirect phase of a two-phase launch.
    pub fn indirect(mut self, request: u32) -> Self {
        self.thread_count = THREAD_COUNT_INDIRECT;
        self.request_id = request;
        self
    }
}

/// Thread-group count for a direct launch: `ceil(items / workgroup_x)`.
///
/// Zero items produce zero groups — an empty launch, never an out-of-bounds
/// one.
#[inline]
pub fn group_count(items: u32, workgroup_x: u32) -> u32 {
    debug_assert!(workgroup_x > 0);
    items.div_ceil(workgroup_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_count_rounds_up() {
        assert_eq!(group_count(0, 64), 0);
        assert_eq!(group_count(1, 64), 1);
        assert_eq!(group_count(64, 64), 1);
        assert_eq!(group_count(65, 64), 2);
        assert_eq!(group_count(100, 64), 2);
        assert_eq!(group_count(10_000, 256), 40);
        assert_eq!(group_count(1, 1), 1);
    }

    #[test]
    fn argument_blocks_do_not_overlap() {
        let line = LINE_DRAW_ARGS_OFFSET..LINE_DRAW_ARGS_OFFSET + 4 * DRAW_ARGS_WORDS as u64;
        let glyph = GLYPH_DRAW_ARGS_OFFSET..GLYPH_DRAW_ARGS_OFFSET + 4 * DRAW_ARGS_WORDS as u64;
        let dispatch =
            DISPATCH_ARGS_OFFSET..DISPATCH_ARGS_OFFSET + 4 * DISPATCH_ARGS_WORDS as u64;

        assert!(line.end <= glyph.start);
        assert!(glyph.end <= dispatch.start);
    }

    #[test]
    fn argument_offsets_are_word_aligned() {
        assert_eq!(LINE_DRAW_ARGS_OFFSET % 4, 0);
        assert_eq!(GLYPH_DRAW_ARGS_OFFSET % 4, 0);
        assert_eq!(DISPATCH_ARGS_OFFSET % 4, 0);
    }

    #[test]
    fn params_modes_are_distinguishable() {
        let base = LaunchParams::default();
        let direct = base.direct(100);
        assert_eq!(direct.thread_count, 100);
        assert_eq!(direct.request_id, 0);

        let indirect = base.indirect(1);
        assert_eq!(indirect.thread_count, THREAD_COUNT_INDIRECT);
        assert_eq!(indirect.request_id, 1);
    }

    #[test]
    fn params_layout_is_uniform_compatible() {
        assert_eq!(std::mem::size_of::<LaunchParams>(), 48);
        assert_eq!(std::mem::size_of::<LaunchParams>() % 16, 0);
    }
}
