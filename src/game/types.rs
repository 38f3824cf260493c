//! Fixed-layout simulation records and pool capacities.
//!
//! Every entity lives in a fixed-capacity device array of one of the record
//! types below. The host never holds an authoritative copy; these structs
//! exist so uploads, readbacks, and tests can speak the device layout.
//!
//! ## Layout rules
//!
//! All records are `#[repr(C)]` plain data matching the WGSL structs of the
//! binding contract. WGSL aligns `vec2<f32>` to 8 bytes, so records
//! interleave explicit padding to keep each vector field on an 8-byte
//! boundary and each struct a multiple of its WGSL stride. `tests/mem_layout.rs`
//! pins every offset and stride.

use bytemuck::{Pod, Zeroable};

/// Line segment capacity of the shared geometry buffer.
pub const LINE_CAPACITY: usize = 10_000;

/// Glyph instance capacity of the text layout buffer.
pub const GLYPH_CAPACITY: usize = 10_000;

/// Player pool capacity.
pub const MAX_PLAYERS: usize = 1;

/// Asteroid pool capacity.
pub const MAX_ASTEROIDS: usize = 100;

/// Bullet pool capacity.
pub const MAX_BULLETS: usize = 100;

/// Asteroids seeded at the start of a level.
pub const START_ASTEROIDS: usize = 4;

/// Sound-request queue capacity per tick.
pub const MAX_SOUND_REQUESTS: usize = 20;

/// Line segments reserved per font glyph.
pub const LINES_PER_GLYPH: usize = 16;

/// Glyph slots in the font geometry buffer.
pub const FONT_GLYPHS: usize = 256;

/// Total line capacity of the font geometry buffer.
pub const FONT_LINE_CAPACITY: usize = LINES_PER_GLYPH * FONT_GLYPHS;

/// Tracked key codes in the key-state table.
pub const KEY_COUNT: usize = 256;

/// Word capacity of the shared indirect-argument buffer.
pub const ARGS_CAPACITY: usize = 1024;

/// Playfield extent in world units; entities wrap at these bounds.
pub const WORLD_SIZE: [f32; 2] = [1024.0, 768.0];

/// Indirect-request selector: launch size = asteroids requested this tick.
pub const REQ_SPAWN_ASTEROIDS: u32 = 0;

/// Indirect-request selector: launch size = asteroid slots to reclaim.
pub const REQ_CLEAR_ASTEROIDS: u32 = 1;

/// Frame-scoped counters and game state, one record device-resident.
///
/// The append counters (`num_lines`, `num_characters`, `next_bullet`,
/// `next_asteroid`, `num_sound_requests`) are reset to zero exactly once per
/// tick by the begin-frame stage and only ever advanced by device-side
/// atomic increment afterward. The request fields are one-shot flags raised
/// by the game-update stage and consumed by the following indirect stages.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Globals {
    /// Lines appended to the geometry buffer this tick.
    pub num_lines: u32,

    /// Glyph instances appended this tick.
    pub num_characters: u32,

    /// Bullet slots claimed this tick.
    pub next_bullet: u32,

    /// Asteroid spawns claimed this tick.
    pub next_asteroid: u32,

    /// Sound requests queued this tick.
    pub num_sound_requests: u32,

    /// Current game mode (attract, playing, game over).
    pub game_mode: u32,

    /// One-shot request to reclaim dead asteroid slots.
    pub request_clear_asteroids: u32,

    /// One-shot request: number of asteroids to spawn this tick.
    pub request_spawn_asteroids: u32,

    /// Asteroids alive at the end of the previous entity-update pass.
    pub live_asteroids: u32,

    /// Current level index.
    pub level: u32,

    /// Seconds spent in the current level.
    pub total_level_time: f32,

    /// Timestamp of the most recent heartbeat sound.
    pub last_blop_time: f32,
}

/// Per-key input state: level plus both edges for this tick.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct KeyState {
    /// Key is currently held.
    pub down: u32,

    /// Key transitioned up→down this tick.
    pub pressed: u32,

    /// Key transitioned down→up this tick.
    pub released: u32,
}

/// Player ship state.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Player {
    /// World position.
    pub position: [f32; 2],

    /// Heading in radians.
    pub rotation: f32,

    /// Alignment padding.
    pub _pad0: f32,

    /// World velocity.
    pub velocity: [f32; 2],

    /// Nonzero while the ship is alive.
    pub alive: u32,

    /// Ship wants to (re)spawn when eligible.
    pub wants_to_spawn: u32,

    /// Spawn-safety verdict written by the spawn-preparation stages.
    pub can_spawn: u32,

    /// Remaining lives.
    pub lives: u32,

    /// Accumulated score.
    pub score: u32,

    /// Alignment padding.
    pub _pad1: u32,
}

/// Asteroid state.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Asteroid {
    /// World position.
    pub position: [f32; 2],

    /// Spin angle in radians.
    pub rotation: f32,

    /// Collision radius in world units.
    pub radius: f32,

    /// World velocity.
    pub velocity: [f32; 2],

    /// Nonzero while this slot holds a live asteroid.
    pub alive: u32,

    /// Subdivision level (0 = largest).
    pub level: u32,
}

/// Bullet state; a slot is live while `lifetime > 0`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Bullet {
    /// World position.
    pub position: [f32; 2],

    /// World velocity.
    pub velocity: [f32; 2],

    /// Remaining lifetime in seconds.
    pub lifetime: f32,

    /// Alignment padding.
    pub _pad: f32,
}

/// A queued audio trigger; `Globals::num_sound_requests` gives the live
/// prefix length.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SoundRequest {
    /// Stable index into the preloaded clip table.
    pub id: u32,
}

/// A line segment in world units, consumed by the external renderer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Line {
    /// First endpoint.
    pub a: [f32; 2],

    /// Second endpoint.
    pub b: [f32; 2],
}

/// A glyph instance placed by the device-side text layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Glyph {
    /// World position of the glyph origin.
    pub position: [f32; 2],

    /// Glyph scale in world units.
    pub scale: [f32; 2],

    /// Index into the font geometry buffer.
    pub id: u32,

    /// Alignment padding.
    pub _pad: u32,
}
