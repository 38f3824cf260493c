use criterion::*;
use std::hint::black_box;

use vectoroids::game::audio::{AudioSink, Voice, VoicePool};
use vectoroids::game::types::KEY_COUNT;
use vectoroids::gpu::dispatch::group_count;
use vectoroids::KeySnapshot;

struct BenchVoice {
    busy: bool,
}

impl Voice for BenchVoice {
    fn is_idle(&self) -> bool {
        !self.busy
    }

    fn start(&mut self, _clip: u32) {
        self.busy = true;
    }
}

fn host_math_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_math");

    group.bench_function("group_count_sweep", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for items in 0..10_000u32 {
                acc = acc.wrapping_add(group_count(black_box(items), 64));
            }
            black_box(acc)
        });
    });

    group.bench_function("key_snapshot_full_table", |b| {
        b.iter_batched(
            KeySnapshot::new,
            |mut snap| {
                for code in 0..KEY_COUNT {
                    snap.apply_raw(code, code % 3 == 0);
                }
                black_box(snap)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("voice_pool_burst_20", |b| {
        b.iter_batched(
            || VoicePool::new(|| BenchVoice { busy: false }),
            |mut pool| {
                for clip in 0..20u32 {
                    pool.play(clip % 3);
                }
                black_box(pool.dropped())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, host_math_benchmark);
criterion_main!(benches);
