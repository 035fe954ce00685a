//! Ticking demo: a few actors on different intervals plus a manually
//! driven every-frame actor.
//!
//! Run with `RUST_LOG=tickwheel=debug` to watch groups come and go.

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;
use tickwheel::{
    spawn_actor_with, Actor, ActorOptions, CapabilityResult, EndPlayReason, Manager,
    SpawnOptions,
};
use tracing_subscriber::EnvFilter;

/// Prints a line every tick.
struct Beacon {
    name: &'static str,
    ticks: AtomicU32,
}

impl Beacon {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            ticks: AtomicU32::new(0),
        }
    }
}

impl Actor for Beacon {
    fn on_actor_spawned(&self) -> CapabilityResult {
        println!("[{}] spawned", self.name);
        Ok(())
    }

    fn begin_play(&self) -> CapabilityResult {
        println!("[{}] begin play", self.name);
        Ok(())
    }

    fn tick(&self, delta: Duration) -> CapabilityResult {
        let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[{}] tick #{n} (+{delta:?})", self.name);
        Ok(())
    }

    fn end_play(&self, reason: &EndPlayReason) -> CapabilityResult {
        println!(
            "[{}] end play: {reason} after {} ticks",
            self.name,
            self.ticks.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

fn main() -> tickwheel::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Tickwheel Ticking Demo");
    println!("======================");
    println!();

    let manager = Manager::new();
    manager.start(None)?;

    let fast = spawn_actor_with(Beacon::new("fast"), SpawnOptions::default())?;
    let slow = spawn_actor_with(Beacon::new("slow"), SpawnOptions::default())?;
    let frame = spawn_actor_with(Beacon::new("frame"), SpawnOptions::default())?;

    manager.add_actor(
        fast.clone(),
        ActorOptions::new().with_tick_interval(Duration::from_millis(100)),
    )?;
    manager.add_actor(slow, ActorOptions::new())?;
    manager.add_actor(frame, ActorOptions::new().with_every_frame_tick())?;

    println!("{} actors in {} groups", manager.actor_count(), manager.group_count());

    for _ in 0..5 {
        thread::sleep(Duration::from_millis(150));
        manager.tick_frame()?;
    }

    manager.remove_actor(&fast, &EndPlayReason::Removed)?;
    thread::sleep(Duration::from_millis(300));

    manager.stop();
    println!();
    println!("Manager {:?}", manager.state());
    Ok(())
}
