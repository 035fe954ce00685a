//! # Tickwheel
//!
//! Actor lifecycle and tick-group scheduling for game-style object models.
//!
//! Tickwheel drives plain objects that opt into lifecycle callbacks
//! (`begin_play`, `tick`, `end_play`, ...) the way a game engine drives its
//! actors. It is not a message-passing actor system: there are no mailboxes,
//! only periodic invocation.
//!
//! ## Core Concepts
//!
//! - **Capabilities**: every lifecycle stage is a trait method with a no-op
//!   default, so actors implement only what they need
//! - **Tick groups**: actors with the same interval share one timer
//! - **Every-frame group**: actors ticked on demand via [`Manager::tick_frame`]
//! - **Single scheduler thread**: groups never tick concurrently with each
//!   other, and actors may add or remove actors from inside `tick`
//! - **Orderly teardown**: [`Manager::stop`] ends every remaining actor once
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickwheel::{spawn_actor, ActorOptions, Manager, SpawnOptions};
//!
//! let manager = Manager::new();
//! manager.start(None)?;
//!
//! let spinner = spawn_actor::<Spinner>(SpawnOptions::default())?;
//! manager.add_actor(spinner, ActorOptions::new().with_tick_interval(Duration::from_millis(16)))?;
//!
//! manager.stop();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod error;
pub mod manager;

// Re-exports for convenience
pub use actor::{
    finish_spawning_actor, spawn_actor, spawn_actor_with, Actor, ActorId, ActorRef,
    EndPlayReason, SpawnOptions, Stage,
};
pub use error::{BoxError, CapabilityResult, Error, Result};
pub use manager::{
    get_or_create, global, ActorOptions, CancelToken, Manager, ManagerConfig, ManagerState,
    TickFailurePolicy, TickRate, DEFAULT_TICK_INTERVAL,
};
