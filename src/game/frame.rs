//! The per-tick frame scheduler.
//!
//! One tick executes the fixed, dependency-ordered dispatch sequence that
//! advances the whole simulation on the device:
//!
//! 1. upload the key-state snapshot,
//! 2. build the font geometry (once; idempotent),
//! 3. `begin_frame` — reset the per-tick counters in the globals record,
//! 4. `update_game` — level/game-mode logic, raises spawn/clear requests,
//! 5. indirect clear-asteroids,
//! 6. indirect spawn-asteroids,
//! 7. player spawn preparation and safety sweep,
//! 8. fused update-and-draw passes for players, asteroids, bullets,
//! 9. all-pairs collision sweeps (player×asteroid, bullet×asteroid),
//! 10. `draw_args` — write both indirect-draw descriptors,
//! 11. drain sound requests to the audio sink (the tick's one readback).
//!
//! Stages run strictly in sequence: each dispatch is submitted as its own
//! command buffer and waited on, so stage N's writes are visible to stage
//! N+1's reads. Every dispatch binds the full common buffer set and a fresh
//! frame uniform — over-binding is a deliberate simplification; the argument
//! buffer alone lives on bind group 1, bound only for the kernels that write
//! it, because a buffer cannot be writable storage and an indirect launch
//! source within the same dispatch.
//!
//! A missing kernel or buffer at any stage indicates a corrupt program image:
//! the tick aborts with an error and nothing is retried.

use wgpu::util::DeviceExt;

use crate::error::EngineResult;
use crate::game::audio::AudioSink;
use crate::game::bridge::{SideChannel, SoundDrain};
use crate::game::input::KeySnapshot;
use crate::game::types::{
    Asteroid, Bullet, Globals, Glyph, KeyState, Line, Player, SoundRequest, ARGS_CAPACITY,
    FONT_LINE_CAPACITY, GLYPH_CAPACITY, KEY_COUNT, LINE_CAPACITY, MAX_ASTEROIDS, MAX_BULLETS,
    MAX_PLAYERS, MAX_SOUND_REQUESTS, REQ_CLEAR_ASTEROIDS, REQ_SPAWN_ASTEROIDS,
};
use crate::gpu::context::GpuContext;
use crate::gpu::dispatch::{group_count, Launch, LaunchParams, DISPATCH_ARGS_OFFSET};
use crate::gpu::program::{ComputeProgram, Kernel};
use crate::gpu::registry::{BufferHandle, BufferRegistry, BufferUsage};
use crate::profiling;

/// The canonical kernels of the frame pipeline, one per entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelId {
    /// Resets per-tick counters and consumes the previous tick's one-shots.
    BeginFrame,

    /// Game-mode and level logic; raises spawn/clear requests.
    UpdateGame,

    /// Packs a device-side count into the indirect dispatch arguments.
    SetupDispatch,

    /// Reclaims asteroid slots; launched indirectly.
    ClearAsteroids,

    /// Spawns requested asteroids; launched indirectly.
    SpawnAsteroids,

    /// Marks respawning players as provisionally eligible.
    PreparePlayerSpawn,

    /// Vetoes unsafe spawns against every live asteroid.
    UpdatePlayerSpawn,

    /// Advances player physics and appends ship geometry.
    UpdatePlayer,

    /// Advances asteroid physics and appends asteroid geometry.
    UpdateAsteroids,

    /// Advances bullet physics and appends bullet geometry.
    UpdateBullets,

    /// Player×asteroid all-pairs collision sweep.
    CollidePlayerAsteroid,

    /// Bullet×asteroid all-pairs collision sweep.
    CollideBulletAsteroid,

    /// Builds the read-only font geometry; dispatched once at startup.
    BuildFont,

    /// Writes both indirect-draw descriptors from the final counters.
    DrawArgs,
}

impl KernelId {
    /// Every kernel, in resolution order.
    pub const ALL: [KernelId; 14] = [
        KernelId::BeginFrame,
        KernelId::UpdateGame,
        KernelId::SetupDispatch,
        KernelId::ClearAsteroids,
        KernelId::SpawnAsteroids,
        KernelId::PreparePlayerSpawn,
        KernelId::UpdatePlayerSpawn,
        KernelId::UpdatePlayer,
        KernelId::UpdateAsteroids,
        KernelId::UpdateBullets,
        KernelId::CollidePlayerAsteroid,
        KernelId::CollideBulletAsteroid,
        KernelId::BuildFont,
        KernelId::DrawArgs,
    ];

    /// The entry point name this kernel resolves against.
    pub fn name(self) -> &'static str {
        match self {
            KernelId::BeginFrame => "begin_frame",
            KernelId::UpdateGame => "update_game",
            KernelId::SetupDispatch => "setup_dispatch",
            KernelId::ClearAsteroids => "clear_asteroids",
            KernelId::SpawnAsteroids => "spawn_asteroids",
            KernelId::PreparePlayerSpawn => "prepare_player_spawn",
            KernelId::UpdatePlayerSpawn => "update_player_spawn",
            KernelId::UpdatePlayer => "update_player",
            KernelId::UpdateAsteroids => "update_asteroids",
            KernelId::UpdateBullets => "update_bullets",
            KernelId::CollidePlayerAsteroid => "collide_player_asteroid",
            KernelId::CollideBulletAsteroid => "collide_bullet_asteroid",
            KernelId::BuildFont => "build_font",
            KernelId::DrawArgs => "draw_args",
        }
    }
}

/// One stage of the fixed tick sequence.
struct Stage {
    kernel: KernelId,
    launch: Launch,
}

/// The canonical tick order. Hand-authored, not inferred: the dependency
/// structure is the design, not an input.
const STAGES: &[Stage] = &[
    Stage { kernel: KernelId::BeginFrame, launch: Launch::Single },
    Stage { kernel: KernelId::UpdateGame, launch: Launch::Single },
    Stage {
        kernel: KernelId::ClearAsteroids,
        launch: Launch::Indirect { request: REQ_CLEAR_ASTEROIDS },
    },
    Stage {
        kernel: KernelId::SpawnAsteroids,
        launch: Launch::Indirect { request: REQ_SPAWN_ASTEROIDS },
    },
    Stage {
        kernel: KernelId::PreparePlayerSpawn,
        launch: Launch::Threads(MAX_PLAYERS as u32),
    },
    Stage {
        kernel: KernelId::UpdatePlayerSpawn,
        launch: Launch::Threads((MAX_PLAYERS * MAX_ASTEROIDS) as u32),
    },
    Stage {
        kernel: KernelId::UpdatePlayer,
        launch: Launch::Threads(MAX_PLAYERS as u32),
    },
    Stage {
        kernel: KernelId::UpdateAsteroids,
        launch: Launch::Threads(MAX_ASTEROIDS as u32),
    },
    Stage {
        kernel: KernelId::UpdateBullets,
        launch: Launch::Threads(MAX_BULLETS as u32),
    },
    Stage {
        kernel: KernelId::CollidePlayerAsteroid,
        launch: Launch::Threads((MAX_PLAYERS * MAX_ASTEROIDS) as u32),
    },
    Stage {
        kernel: KernelId::CollideBulletAsteroid,
        launch: Launch::Threads((MAX_BULLETS * MAX_ASTEROIDS) as u32),
    },
    Stage { kernel: KernelId::DrawArgs, launch: Launch::Single },
];

/// Handles to every device-resident simulation buffer.
///
/// Allocated once by [`FrameScheduler::new`]; never resized.
pub struct SimBuffers {
    /// Frame-scoped counters and game state (capacity 1).
    pub globals: BufferHandle<Globals>,

    /// Player pool.
    pub players: BufferHandle<Player>,

    /// Asteroid pool.
    pub asteroids: BufferHandle<Asteroid>,

    /// Bullet pool.
    pub bullets: BufferHandle<Bullet>,

    /// Shared line-geometry buffer.
    pub lines: BufferHandle<Line>,

    /// Glyph instance buffer.
    pub glyphs: BufferHandle<Glyph>,

    /// Sound-request queue.
    pub sounds: BufferHandle<SoundRequest>,

    /// Key-state table.
    pub keys: BufferHandle<KeyState>,

    /// Font glyph geometry, built once at startup.
    pub font: BufferHandle<Line>,

    /// Shared indirect dispatch/draw argument buffer.
    pub args: BufferHandle<u32>,
}

/// What one tick produced, built from the tick's single readback.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameReport {
    /// Full copy of the globals record at end of tick.
    pub globals: Globals,

    /// Sound-drain accounting for this tick.
    pub sounds: SoundDrain,

    /// The line append counter reached the buffer capacity this tick.
    pub lines_saturated: bool,

    /// The glyph append counter reached the buffer capacity this tick.
    pub glyphs_saturated: bool,

    /// The sound queue reached its capacity this tick.
    pub sounds_saturated: bool,
}

/// Executes the fixed per-tick dispatch sequence.
///
/// ## Role
/// Owns the buffer registry, the resolved kernel set, the frame clock, and
/// the side-channel bridge; `tick` is the only way simulation time advances.
///
/// ## Failure semantics
/// Construction fails if any canonical kernel is missing — a packaging
/// mismatch, fatal. A tick that fails mid-sequence leaves device state
/// valid for the next `begin_frame` (every counter is re-zeroed there), but
/// callers should treat tick errors as fatal: they indicate device loss, not
/// a gameplay condition.
pub struct FrameScheduler {
    registry: BufferRegistry,
    buffers: SimBuffers,
    program: ComputeProgram,
    kernels: Vec<Kernel>,
    bridge: SideChannel,
    frame: u32,
    time: f32,
    time_step: f32,
    font_built: bool,
}

impl FrameScheduler {
    /// Compiles the program, resolves every canonical kernel, and allocates
    /// the full buffer set.
    pub fn new(ctx: &GpuContext, program_source: &str) -> EngineResult<Self> {
        let mut program = ComputeProgram::from_wgsl(ctx, program_source)?;

        let mut kernels = Vec::with_capacity(KernelId::ALL.len());
        for id in KernelId::ALL {
            kernels.push(program.resolve(ctx, id.name())?);
        }

        let mut registry = BufferRegistry::new();
        let buffers = SimBuffers {
            globals: registry.alloc_init(ctx, "globals", &[Globals::default()], BufferUsage::Storage)?,
            players: registry.alloc(ctx, "players", MAX_PLAYERS, BufferUsage::Storage)?,
            asteroids: registry.alloc(ctx, "asteroids", MAX_ASTEROIDS, BufferUsage::Storage)?,
            bullets: registry.alloc(ctx, "bullets", MAX_BULLETS, BufferUsage::Storage)?,
            lines: registry.alloc(ctx, "lines", LINE_CAPACITY, BufferUsage::Storage)?,
            glyphs: registry.alloc(ctx, "glyphs", GLYPH_CAPACITY, BufferUsage::Storage)?,
            sounds: registry.alloc(ctx, "sound_requests", MAX_SOUND_REQUESTS, BufferUsage::Storage)?,
            keys: registry.alloc(ctx, "key_states", KEY_COUNT, BufferUsage::Storage)?,
            font: registry.alloc(ctx, "font_lines", FONT_LINE_CAPACITY, BufferUsage::Storage)?,
            args: registry.alloc(ctx, "indirect_args", ARGS_CAPACITY, BufferUsage::Indirect)?,
        };

        Ok(Self {
            registry,
            buffers,
            program,
            kernels,
            bridge: SideChannel::new(),
            frame: 0,
            time: 0.0,
            time_step: 0.0,
            font_built: false,
        })
    }

    /// Runs one full tick.
    ///
    /// `keys` is this tick's complete input snapshot; `audio` receives every
    /// device-queued sound request after the final compute stage;
    /// `time_step` is the simulated seconds this tick advances.
    pub fn tick(
        &mut self,
        ctx: &GpuContext,
        keys: &KeySnapshot,
        audio: &mut dyn AudioSink,
        time_step: f32,
    ) -> EngineResult<FrameReport> {
        let _tick_span = profiling::span("frame::tick");
        self.time_step = time_step;

        self.bridge
            .upload_keys(ctx, &self.registry, &self.buffers.keys, keys)?;

        if !self.font_built {
            self.dispatch_id(ctx, KernelId::BuildFont, Launch::Single)?;
            self.font_built = true;
        }

        for stage in STAGES {
            let _span = profiling::span(stage.kernel.name());
            self.dispatch_id(ctx, stage.kernel, stage.launch)?;
        }

        let (globals, sounds) = self.bridge.drain_sounds(
            ctx,
            &self.registry,
            &self.buffers.globals,
            &self.buffers.sounds,
            audio,
        )?;

        let report = FrameReport {
            globals,
            sounds,
            lines_saturated: globals.num_lines as usize >= LINE_CAPACITY,
            glyphs_saturated: globals.num_characters as usize >= GLYPH_CAPACITY,
            sounds_saturated: globals.num_sound_requests as usize >= MAX_SOUND_REQUESTS,
        };
        if report.lines_saturated {
            log::warn!("line buffer saturated at frame {}", self.frame);
        }
        if report.glyphs_saturated {
            log::warn!("glyph buffer saturated at frame {}", self.frame);
        }
        if report.sounds_saturated {
            log::warn!("sound queue saturated at frame {}", self.frame);
        }

        self.frame = self.frame.wrapping_add(1);
        self.time += time_step;
        Ok(report)
    }

    /// Dispatches one canonical kernel outside the tick sequence.
    pub fn dispatch_id(&self, ctx: &GpuContext, id: KernelId, launch: Launch) -> EngineResult<()> {
        self.dispatch(ctx, &self.kernels[id as usize], launch)
    }

    /// Resolves an auxiliary entry point from the same program.
    ///
    /// Auxiliary kernels share the binding contract and can be dispatched
    /// through [`FrameScheduler::dispatch`]; missing names fail exactly like
    /// canonical ones.
    pub fn resolve_kernel(&mut self, ctx: &GpuContext, name: &str) -> EngineResult<Kernel> {
        self.program.resolve(ctx, name)
    }

    /// Dispatches a resolved kernel with the given launch geometry, binding
    /// the full common buffer set and a fresh frame uniform.
    pub fn dispatch(&self, ctx: &GpuContext, kernel: &Kernel, launch: Launch) -> EngineResult<()> {
        match launch {
            Launch::Single => {
                let params = self.base_params().direct(kernel.workgroup_x);
                self.run_kernel(ctx, kernel, params, Geometry::Groups(1))
            }
            Launch::Threads(items) => {
                let groups = group_count(items, kernel.workgroup_x);
                if groups == 0 {
                    return Ok(());
                }
                let params = self.base_params().direct(items);
                self.run_kernel(ctx, kernel, params, Geometry::Groups(groups))
            }
            Launch::Indirect { request } => {
                let params = self.base_params().indirect(request);
                let setup = &self.kernels[KernelId::SetupDispatch as usize];
                self.run_kernel(ctx, setup, params, Geometry::Groups(1))?;
                self.run_kernel(ctx, kernel, params, Geometry::FromArgs)
            }
        }
    }

    /// Downloads the current globals record; test and diagnostic use.
    pub fn globals(&self, ctx: &GpuContext) -> EngineResult<Globals> {
        let mut scratch = [Globals::default()];
        self.registry
            .download(ctx, &self.buffers.globals, &mut scratch)?;
        Ok(scratch[0])
    }

    /// The buffer registry, for host transfers against [`SimBuffers`].
    pub fn registry(&self) -> &BufferRegistry {
        &self.registry
    }

    /// Handles to every simulation buffer.
    pub fn buffers(&self) -> &SimBuffers {
        &self.buffers
    }

    /// The raw argument buffer the external renderer draws from, indirectly,
    /// at the two fixed draw-argument offsets.
    pub fn args_buffer(&self) -> EngineResult<&wgpu::Buffer> {
        self.registry.raw_indirect(&self.buffers.args)
    }

    /// The raw line-geometry buffer for the renderer's first pass.
    pub fn line_buffer(&self) -> EngineResult<&wgpu::Buffer> {
        self.registry.raw(&self.buffers.lines)
    }

    /// The raw glyph-instance buffer for the renderer's font pass.
    pub fn glyph_buffer(&self) -> EngineResult<&wgpu::Buffer> {
        self.registry.raw(&self.buffers.glyphs)
    }

    /// The raw font-geometry buffer for the renderer's font pass.
    pub fn font_buffer(&self) -> EngineResult<&wgpu::Buffer> {
        self.registry.raw(&self.buffers.font)
    }

    /// Ticks completed so far.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Simulated seconds accumulated so far.
    pub fn time(&self) -> f32 {
        self.time
    }

    fn base_params(&self) -> LaunchParams {
        LaunchParams {
            time: self.time,
            time_step: self.time_step,
            frame: self.frame,
            max_players: MAX_PLAYERS as u32,
            max_asteroids: MAX_ASTEROIDS as u32,
            max_bullets: MAX_BULLETS as u32,
            max_sound_requests: MAX_SOUND_REQUESTS as u32,
            ..LaunchParams::default()
        }
    }

    /// Encodes, submits, and waits for one kernel launch.
    fn run_kernel(
        &self,
        ctx: &GpuContext,
        kernel: &Kernel,
        params: LaunchParams,
        geometry: Geometry,
    ) -> EngineResult<()> {
        let params_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let b = &self.buffers;
        let r = &self.registry;
        let entries = [
            bind(0, r.raw(&b.globals)?),
            bind(1, r.raw(&b.players)?),
            bind(2, r.raw(&b.asteroids)?),
            bind(3, r.raw(&b.bullets)?),
            bind(4, r.raw(&b.lines)?),
            bind(5, r.raw(&b.glyphs)?),
            bind(6, r.raw(&b.sounds)?),
            bind(7, r.raw(&b.keys)?),
            bind(8, r.raw(&b.font)?),
            bind(9, &params_buffer),
        ];

        let common_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_common_group"),
            layout: self.program.common_layout(),
            entries: &entries,
        });

        let args_buffer = r.raw_indirect(&b.args)?;
        let args_group = kernel.uses_args.then(|| {
            ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("frame_args_group"),
                layout: self.program.args_layout(),
                entries: &[bind(0, args_buffer)],
            })
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&kernel.name),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&kernel.name),
                timestamp_writes: None,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, &common_group, &[]);
            if let Some(group) = &args_group {
                pass.set_bind_group(1, group, &[]);
            }
            match geometry {
                Geometry::Groups(groups) => pass.dispatch_workgroups(groups, 1, 1),
                Geometry::FromArgs => {
                    pass.dispatch_workgroups_indirect(args_buffer, DISPATCH_ARGS_OFFSET)
                }
            }
        }

        let submission = ctx.queue.submit(Some(encoder.finish()));
        ctx.wait_for(submission)
    }
}

/// Resolved launch geometry for one encoded dispatch.
enum Geometry {
    Groups(u32),
    FromArgs,
}

fn bind<'a>(binding: u32, buffer: &'a wgpu::Buffer) -> wgpu::BindGroupEntry<'a> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}
