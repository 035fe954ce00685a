//! Spawn sequence: the one-shot construction chain run before an actor
//! is handed to a manager.

use super::{Actor, Stage};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::trace;

/// Options for [`spawn_actor`] and [`spawn_actor_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Stop after `post_spawn_initialize`; the creator must call
    /// [`finish_spawning_actor`] to run the rest of the sequence.
    pub deferred: bool,
}

impl SpawnOptions {
    /// Enable deferred spawning.
    #[must_use]
    pub const fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }
}

/// Create a default-constructed actor and run its spawn sequence.
pub fn spawn_actor<A: Actor + Default>(options: SpawnOptions) -> Result<Arc<A>> {
    spawn_actor_with(A::default(), options)
}

/// Run the spawn sequence for a caller-built actor.
pub fn spawn_actor_with<A: Actor>(actor: A, options: SpawnOptions) -> Result<Arc<A>> {
    let actor = Arc::new(actor);

    run_stage(actor.as_ref(), Stage::PostSpawnInitialize)?;

    if options.deferred {
        return Ok(actor);
    }

    finish_spawning_actor(actor.as_ref())?;
    Ok(actor)
}

/// Run the construction stages, in order, stopping at the first failure.
///
/// Called by [`spawn_actor`] unless the spawn was deferred.
pub fn finish_spawning_actor<A: Actor + ?Sized>(actor: &A) -> Result<()> {
    for stage in Stage::CONSTRUCTION {
        run_stage(actor, stage)?;
    }
    Ok(())
}

fn run_stage<A: Actor + ?Sized>(actor: &A, stage: Stage) -> Result<()> {
    trace!(%stage, "running spawn stage");
    match stage.invoke(actor) {
        Some(Err(source)) => Err(Error::capability(stage, source)),
        Some(Ok(())) | None => Ok(()),
    }
}
