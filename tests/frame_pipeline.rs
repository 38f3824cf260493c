//! Device integration tests for the frame pipeline.
//!
//! Every test here drives a real `wgpu` device against the test build of the
//! compute program in `shaders/asteroids.wgsl`, so they are ignored by
//! default; run with `cargo test -- --ignored` on a machine with a GPU.

use std::cell::RefCell;
use std::rc::Rc;

use vectoroids::game::audio::{Voice, VoicePool, CLIP_EXPLODE, CLIP_FIRE};
use vectoroids::game::types::{
    Asteroid, Globals, KeyState, Line, ARGS_CAPACITY, KEY_COUNT, LINES_PER_GLYPH, LINE_CAPACITY,
    MAX_ASTEROIDS, REQ_SPAWN_ASTEROIDS, START_ASTEROIDS,
};
use vectoroids::{
    AudioSink, EngineError, FrameScheduler, GpuContext, KernelId, KeySnapshot, Launch,
};

const PROGRAM: &str = include_str!("shaders/asteroids.wgsl");
const DT: f32 = 1.0 / 60.0;

fn init() -> (GpuContext, FrameScheduler) {
    let _ = env_logger::builder().is_test(true).try_init();
    let ctx = GpuContext::new().expect("GPU device");
    let scheduler = FrameScheduler::new(&ctx, PROGRAM).expect("scheduler");
    (ctx, scheduler)
}

struct RecordingVoice {
    started: u32,
    log: Rc<RefCell<Vec<u32>>>,
}

impl Voice for RecordingVoice {
    fn is_idle(&self) -> bool {
        self.started == 0
    }

    fn start(&mut self, clip: u32) {
        self.started += 1;
        self.log.borrow_mut().push(clip);
    }
}

fn recording_pool() -> (
    VoicePool<RecordingVoice, impl FnMut() -> RecordingVoice>,
    Rc<RefCell<Vec<u32>>>,
) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let factory_log = Rc::clone(&log);
    let pool = VoicePool::new(move || RecordingVoice {
        started: 0,
        log: Rc::clone(&factory_log),
    });
    (pool, log)
}

/// Discards every request; for tests that do not observe audio.
struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _clip: u32) -> bool {
        true
    }
}

#[test]
#[ignore = "requires GPU"]
fn begin_frame_zeroes_every_per_tick_counter() {
    let (ctx, scheduler) = init();

    let dirty = Globals {
        num_lines: 123,
        num_characters: 45,
        next_bullet: 6,
        next_asteroid: 7,
        num_sound_requests: 8,
        request_clear_asteroids: 1,
        request_spawn_asteroids: 9,
        live_asteroids: 10,
        ..Globals::default()
    };
    scheduler
        .registry()
        .upload(&ctx, &scheduler.buffers().globals, &[dirty])
        .unwrap();

    scheduler
        .dispatch_id(&ctx, KernelId::BeginFrame, Launch::Single)
        .unwrap();

    let g = scheduler.globals(&ctx).unwrap();
    assert_eq!(g.num_lines, 0);
    assert_eq!(g.num_characters, 0);
    assert_eq!(g.next_bullet, 0);
    assert_eq!(g.next_asteroid, 0);
    assert_eq!(g.num_sound_requests, 0);
    assert_eq!(g.request_clear_asteroids, 0);
    assert_eq!(g.request_spawn_asteroids, 0);
}

#[test]
#[ignore = "requires GPU"]
fn missing_kernel_is_a_fatal_startup_error() {
    let (ctx, mut scheduler) = init();
    let err = scheduler.resolve_kernel(&ctx, "no_such_kernel").unwrap_err();
    match err {
        EngineError::KernelNotFound(e) => {
            assert_eq!(e.name, "no_such_kernel");
            assert!(e.available.iter().any(|n| n == "begin_frame"));
        }
        other => panic!("expected KernelNotFound, got {other}"),
    }
}

#[test]
#[ignore = "requires GPU"]
fn concurrent_appends_claim_unique_slots() {
    let (ctx, mut scheduler) = init();
    let stress = scheduler.resolve_kernel(&ctx, "stress_append").unwrap();

    scheduler
        .dispatch_id(&ctx, KernelId::BeginFrame, Launch::Single)
        .unwrap();

    // Two waves of writers against the same counter.
    let per_wave = 2_500u32;
    scheduler.dispatch(&ctx, &stress, Launch::Threads(per_wave)).unwrap();
    scheduler.dispatch(&ctx, &stress, Launch::Threads(per_wave)).unwrap();

    let g = scheduler.globals(&ctx).unwrap();
    assert_eq!(g.num_lines, per_wave * 2);

    let mut lines = vec![Line::default(); LINE_CAPACITY];
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().lines, &mut lines)
        .unwrap();

    // Every claimed slot bumped exactly once; nothing written past the count.
    for (i, line) in lines.iter().enumerate() {
        if i < (per_wave * 2) as usize {
            assert_eq!(line.a[0], 1.0, "slot {i} written {} times", line.a[0]);
        } else {
            assert_eq!(line.a[0], 0.0, "slot {i} written past the counter");
        }
    }
}

#[test]
#[ignore = "requires GPU"]
fn indirect_launch_geometry_is_ceil_of_device_count() {
    let (ctx, mut scheduler) = init();
    let probe = scheduler.resolve_kernel(&ctx, "probe_indirect").unwrap();

    for k in [0u32, 1, 63, 64, 65, 100] {
        let staged = Globals {
            request_spawn_asteroids: k,
            ..Globals::default()
        };
        scheduler
            .registry()
            .upload(&ctx, &scheduler.buffers().globals, &[staged])
            .unwrap();

        scheduler
            .dispatch(&ctx, &probe, Launch::Indirect { request: REQ_SPAWN_ASTEROIDS })
            .unwrap();

        let g = scheduler.globals(&ctx).unwrap();
        assert_eq!(g.live_asteroids, k.div_ceil(64), "k = {k}");
    }
}

#[test]
#[ignore = "requires GPU"]
fn first_tick_seeds_the_level_away_from_the_player() {
    let (ctx, mut scheduler) = init();
    let keys = KeySnapshot::new();

    let report = scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    assert_eq!(report.globals.next_asteroid, START_ASTEROIDS as u32);
    assert_eq!(report.globals.live_asteroids, START_ASTEROIDS as u32);
    assert_eq!(report.globals.level, 1);
    assert!(report.globals.num_lines > 0, "entities drew no geometry");
    assert!(report.globals.num_characters > 0, "HUD laid out no glyphs");

    let mut asteroids = vec![Asteroid::default(); MAX_ASTEROIDS];
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().asteroids, &mut asteroids)
        .unwrap();

    let alive: Vec<&Asteroid> = asteroids.iter().filter(|a| a.alive != 0).collect();
    assert_eq!(alive.len(), START_ASTEROIDS);
    for a in alive {
        let dx = a.position[0] - 512.0;
        let dy = a.position[1] - 384.0;
        assert!(
            (dx * dx + dy * dy).sqrt() > 200.0,
            "asteroid spawned {:?} from start position",
            a.position
        );
    }
}

#[test]
#[ignore = "requires GPU"]
fn spawn_request_advances_the_counter_exactly() {
    let (ctx, mut scheduler) = init();
    let mut keys = KeySnapshot::new();

    scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    // '3' asks the game-update kernel for three more asteroids.
    keys.apply_raw(KeySnapshot::code('3'), true);
    let report = scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    assert_eq!(report.globals.next_asteroid, 3);
    assert_eq!(
        report.globals.live_asteroids,
        START_ASTEROIDS as u32 + 3
    );

    // Saturate the pool; the spawn counter must clamp at capacity.
    for _ in 0..60 {
        keys.apply_raw(KeySnapshot::code('3'), false);
        scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();
        keys.apply_raw(KeySnapshot::code('3'), true);
        let r = scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();
        assert!(r.globals.next_asteroid <= MAX_ASTEROIDS as u32);
        assert!(r.globals.live_asteroids <= MAX_ASTEROIDS as u32);
    }
}

#[test]
#[ignore = "requires GPU"]
fn clear_request_reclaims_every_slot() {
    let (ctx, mut scheduler) = init();
    let mut keys = KeySnapshot::new();

    scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    keys.apply_raw(KeySnapshot::code('c'), true);
    let report = scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    assert_eq!(report.globals.live_asteroids, 0);
}

#[test]
#[ignore = "requires GPU"]
fn draw_arguments_follow_the_final_counters() {
    let (ctx, mut scheduler) = init();
    let keys = KeySnapshot::new();

    let report = scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    let mut args = vec![0u32; ARGS_CAPACITY];
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().args, &mut args)
        .unwrap();

    // Line pass at word 0, glyph pass at word 4; one instance each.
    assert_eq!(args[0], report.globals.num_lines * 2);
    assert_eq!(args[1], 1);
    assert_eq!(args[4], report.globals.num_characters * LINES_PER_GLYPH as u32 * 2);
    assert_eq!(args[5], 1);
}

#[test]
#[ignore = "requires GPU"]
fn key_table_round_trips_and_edges_consume() {
    let (ctx, mut scheduler) = init();
    let mut keys = KeySnapshot::new();

    scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();

    let mut table = vec![KeyState::default(); KEY_COUNT];
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().keys, &mut table)
        .unwrap();
    assert!(table.iter().all(|k| *k == KeyState::default()));

    // Hold a key across two ticks: the device must see the press edge once.
    let code = KeySnapshot::code('w');
    keys.apply_raw(code, true);
    scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().keys, &mut table)
        .unwrap();
    assert_eq!(table[code].down, 1);
    assert_eq!(table[code].pressed, 1);

    keys.apply_raw(code, true);
    scheduler.tick(&ctx, &keys, &mut NullSink, DT).unwrap();
    scheduler
        .registry()
        .download(&ctx, &scheduler.buffers().keys, &mut table)
        .unwrap();
    assert_eq!(table[code].down, 1);
    assert_eq!(table[code].pressed, 0, "press edge re-fired for a held key");
}

#[test]
#[ignore = "requires GPU"]
fn queued_sounds_play_in_order_on_pooled_voices() {
    let (ctx, mut scheduler) = init();
    let mut keys = KeySnapshot::new();
    let (mut pool, log) = recording_pool();

    let report = scheduler.tick(&ctx, &keys, &mut pool, DT).unwrap();
    assert_eq!(report.sounds.played, 0);

    keys.apply_raw(KeySnapshot::code('x'), true);
    let report = scheduler.tick(&ctx, &keys, &mut pool, DT).unwrap();

    assert_eq!(report.sounds.requested, 2);
    assert_eq!(report.sounds.played, 2);
    assert_eq!(report.sounds.dropped, 0);
    assert_eq!(*log.borrow(), vec![CLIP_EXPLODE, CLIP_FIRE]);
    assert_eq!(pool.len(), 2, "expected at most two distinct voices");
}
