//! Dispatch benchmark: Measure frame dispatch and registry churn.
//!
//! Target: < 50µs to tick 1000 every-frame actors

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tickwheel::{
    spawn_actor, Actor, ActorOptions, CapabilityResult, EndPlayReason, Manager, SpawnOptions,
};

/// Actor that bumps a shared counter on every tick.
struct Counted {
    frames: Arc<AtomicU64>,
}

impl Actor for Counted {
    fn tick(&self, _delta: Duration) -> CapabilityResult {
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[derive(Default)]
struct Inert;

impl Actor for Inert {}

fn frame_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_dispatch");

    for size in [1u64, 100, 1000] {
        let manager = Manager::new();
        let frames = Arc::new(AtomicU64::new(0));
        for _ in 0..size {
            let actor = Arc::new(Counted {
                frames: frames.clone(),
            });
            manager
                .add_actor(actor, ActorOptions::new().with_every_frame_tick())
                .unwrap();
        }
        manager.start(None).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let target = frames.load(Ordering::Relaxed) + size;
                manager.tick_frame().unwrap();
                while frames.load(Ordering::Relaxed) < target {
                    std::hint::spin_loop();
                }
            });
        });

        manager.stop();
    }

    group.finish();
}

fn add_remove(c: &mut Criterion) {
    let manager = Manager::new();
    let options = ActorOptions::new().with_tick_interval(Duration::from_secs(60));

    c.bench_function("add_remove_actor", |b| {
        b.iter(|| {
            let actor = Arc::new(Inert);
            manager.add_actor(actor.clone(), black_box(options)).unwrap();
            manager
                .remove_actor(&actor, &EndPlayReason::Removed)
                .unwrap();
        });
    });

    manager.stop();
}

fn spawn_sequence(c: &mut Criterion) {
    c.bench_function("spawn_actor", |b| {
        b.iter(|| spawn_actor::<Inert>(black_box(SpawnOptions::default())).unwrap())
    });
}

criterion_group!(benches, frame_dispatch, add_remove, spawn_sequence);
criterion_main!(benches);
