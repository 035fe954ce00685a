//! Actors: identity objects with optional lifecycle capabilities.
//!
//! An actor is any `Send + Sync` value that implements [`Actor`]. Every
//! capability on the trait has a no-op default, so a concrete type only
//! overrides the stages it cares about:
//!
//! ```rust,ignore
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//! use tickwheel::{Actor, CapabilityResult};
//!
//! #[derive(Default)]
//! struct Spinner {
//!     frames: AtomicU64,
//! }
//!
//! impl Actor for Spinner {
//!     fn tick(&self, _delta: Duration) -> CapabilityResult {
//!         self.frames.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!  spawn_actor                      Manager                    caller
//! ─────────────                ─────────────────          ──────────────
//! post_spawn_initialize
//! execute_construction
//! on_construction
//! post_actor_construction
//! pre_initialize_components
//! initialize_components
//! post_initialize_components
//! on_actor_spawned  ───────▶   begin_play (add)
//!                              want_tick / tick  (xN)
//!                              end_play (remove/stop) ──▶  begin_destroy
//!                                                          finish_destroy
//! ```
//!
//! Actors are shared as [`ActorRef`] and identified by the address of
//! their allocation, so two handles to the same `Arc` are the same actor.

mod lifecycle;
mod spawn;

pub use lifecycle::{
    begin_destroy, begin_play, destroy, end_play, execute_construction, finish_destroy,
    initialize_components, on_actor_spawned, on_construction, post_actor_construction,
    post_initialize_components, post_spawn_initialize, pre_initialize_components, tick,
    want_tick, Stage,
};
pub use spawn::{finish_spawning_actor, spawn_actor, spawn_actor_with, SpawnOptions};

use crate::error::CapabilityResult;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a registered actor.
pub type ActorRef = Arc<dyn Actor>;

/// An object with optional lifecycle capabilities.
///
/// All methods take `&self`: the scheduler ticks actors from its own
/// thread while other threads may add or remove them, so mutable state
/// belongs behind atomics or locks inside the actor.
#[allow(unused_variables)]
pub trait Actor: Send + Sync + 'static {
    /// First stage of the spawn sequence, run even for deferred spawns.
    fn post_spawn_initialize(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::on_construction`].
    fn execute_construction(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::post_actor_construction`].
    fn on_construction(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::pre_initialize_components`].
    fn post_actor_construction(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::initialize_components`].
    fn pre_initialize_components(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::post_initialize_components`].
    fn initialize_components(&self) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::on_actor_spawned`].
    fn post_initialize_components(&self) -> CapabilityResult {
        Ok(())
    }

    /// Last stage of the spawn sequence.
    fn on_actor_spawned(&self) -> CapabilityResult {
        Ok(())
    }

    /// Called by the manager when the actor is added, before it can tick.
    ///
    /// A failure keeps the actor out of the manager.
    fn begin_play(&self) -> CapabilityResult {
        Ok(())
    }

    /// Asked before every tick. Returning `false` skips this tick only.
    fn want_tick(&self) -> CapabilityResult<bool> {
        Ok(true)
    }

    /// Periodic update, with the time elapsed since the group last fired.
    fn tick(&self, delta: Duration) -> CapabilityResult {
        Ok(())
    }

    /// Called exactly once when the actor leaves the manager.
    fn end_play(&self, reason: &EndPlayReason) -> CapabilityResult {
        Ok(())
    }

    /// Runs before [`Actor::finish_destroy`]. Never called by the manager.
    fn begin_destroy(&self) -> CapabilityResult {
        Ok(())
    }

    /// Final teardown stage. Never called by the manager.
    fn finish_destroy(&self) -> CapabilityResult {
        Ok(())
    }
}

/// Identity of an actor, derived from the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(usize);

impl ActorId {
    /// Identity of the actor behind `actor`.
    ///
    /// Clones of the same `Arc` (including ones coerced to [`ActorRef`])
    /// share an identity.
    #[inline]
    pub fn of<A: Actor + ?Sized>(actor: &Arc<A>) -> Self {
        Self(Arc::as_ptr(actor).cast::<()>() as usize)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor@{:#x}", self.0)
    }
}

/// Why an actor is leaving the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EndPlayReason {
    /// Explicitly removed by the application.
    Removed,
    /// Removed because the actor is being destroyed.
    Destroyed,
    /// The manager shut down while the actor was registered.
    ManagerStopped,
    /// Application-defined reason.
    Other(String),
}

impl EndPlayReason {
    /// Application-defined reason.
    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other(reason.into())
    }
}

impl fmt::Display for EndPlayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => f.write_str("removed"),
            Self::Destroyed => f.write_str("destroyed"),
            Self::ManagerStopped => f.write_str("manager stopped"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Actor for Plain {}

    #[test]
    fn test_identity_follows_allocation() {
        let a = Arc::new(Plain);
        let b = Arc::new(Plain);
        let a_ref: ActorRef = a.clone();

        assert_eq!(ActorId::of(&a), ActorId::of(&a_ref));
        assert_ne!(ActorId::of(&a), ActorId::of(&b));
    }

    #[test]
    fn test_default_capabilities() {
        let a = Plain;
        assert!(a.begin_play().is_ok());
        assert!(a.want_tick().unwrap());
        assert!(a.tick(Duration::from_millis(5)).is_ok());
        assert!(a.end_play(&EndPlayReason::Removed).is_ok());
    }

    #[test]
    fn test_end_play_reason_display() {
        assert_eq!(EndPlayReason::ManagerStopped.to_string(), "manager stopped");
        assert_eq!(EndPlayReason::other("level unloaded").to_string(), "level unloaded");
    }
}
