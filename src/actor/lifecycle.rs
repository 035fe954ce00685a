//! Capability dispatch: one entry point per lifecycle stage.
//!
//! Each function invokes the matching [`Actor`] method and returns its
//! result unchanged. Stages an actor does not override fall through to
//! the trait's no-op defaults, so absence is never an error. Nothing here
//! retries.

use super::{Actor, EndPlayReason};
use crate::error::CapabilityResult;
use std::fmt;
use std::time::Duration;

/// A named lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// [`Actor::post_spawn_initialize`].
    PostSpawnInitialize,
    /// [`Actor::execute_construction`].
    ExecuteConstruction,
    /// [`Actor::on_construction`].
    OnConstruction,
    /// [`Actor::post_actor_construction`].
    PostActorConstruction,
    /// [`Actor::pre_initialize_components`].
    PreInitializeComponents,
    /// [`Actor::initialize_components`].
    InitializeComponents,
    /// [`Actor::post_initialize_components`].
    PostInitializeComponents,
    /// [`Actor::on_actor_spawned`].
    OnActorSpawned,
    /// [`Actor::begin_play`].
    BeginPlay,
    /// [`Actor::want_tick`].
    WantTick,
    /// [`Actor::tick`].
    Tick,
    /// [`Actor::end_play`].
    EndPlay,
    /// [`Actor::begin_destroy`].
    BeginDestroy,
    /// [`Actor::finish_destroy`].
    FinishDestroy,
}

impl Stage {
    /// Stages run by `finish_spawning_actor`, in order.
    pub const CONSTRUCTION: [Self; 7] = [
        Self::ExecuteConstruction,
        Self::OnConstruction,
        Self::PostActorConstruction,
        Self::PreInitializeComponents,
        Self::InitializeComponents,
        Self::PostInitializeComponents,
        Self::OnActorSpawned,
    ];

    /// Kebab-case name used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PostSpawnInitialize => "post-spawn-initialize",
            Self::ExecuteConstruction => "execute-construction",
            Self::OnConstruction => "on-construction",
            Self::PostActorConstruction => "post-actor-construction",
            Self::PreInitializeComponents => "pre-initialize-components",
            Self::InitializeComponents => "initialize-components",
            Self::PostInitializeComponents => "post-initialize-components",
            Self::OnActorSpawned => "on-actor-spawned",
            Self::BeginPlay => "begin-play",
            Self::WantTick => "want-tick",
            Self::Tick => "tick",
            Self::EndPlay => "end-play",
            Self::BeginDestroy => "begin-destroy",
            Self::FinishDestroy => "finish-destroy",
        }
    }

    /// Invoke a stage that takes no arguments and returns nothing.
    ///
    /// Returns `None` for [`Stage::WantTick`], [`Stage::Tick`] and
    /// [`Stage::EndPlay`], which need their own arguments or return a value.
    pub fn invoke<A: Actor + ?Sized>(self, actor: &A) -> Option<CapabilityResult> {
        let result = match self {
            Self::PostSpawnInitialize => post_spawn_initialize(actor),
            Self::ExecuteConstruction => execute_construction(actor),
            Self::OnConstruction => on_construction(actor),
            Self::PostActorConstruction => post_actor_construction(actor),
            Self::PreInitializeComponents => pre_initialize_components(actor),
            Self::InitializeComponents => initialize_components(actor),
            Self::PostInitializeComponents => post_initialize_components(actor),
            Self::OnActorSpawned => on_actor_spawned(actor),
            Self::BeginPlay => begin_play(actor),
            Self::BeginDestroy => begin_destroy(actor),
            Self::FinishDestroy => finish_destroy(actor),
            Self::WantTick | Self::Tick | Self::EndPlay => return None,
        };
        Some(result)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Calls an actor's `post_spawn_initialize`.
#[inline]
pub fn post_spawn_initialize<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.post_spawn_initialize()
}

/// Calls an actor's `execute_construction`.
#[inline]
pub fn execute_construction<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.execute_construction()
}

/// Calls an actor's `on_construction`.
#[inline]
pub fn on_construction<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.on_construction()
}

/// Calls an actor's `post_actor_construction`.
#[inline]
pub fn post_actor_construction<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.post_actor_construction()
}

/// Calls an actor's `pre_initialize_components`.
#[inline]
pub fn pre_initialize_components<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.pre_initialize_components()
}

/// Calls an actor's `initialize_components`.
#[inline]
pub fn initialize_components<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.initialize_components()
}

/// Calls an actor's `post_initialize_components`.
#[inline]
pub fn post_initialize_components<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.post_initialize_components()
}

/// Calls an actor's `on_actor_spawned`.
#[inline]
pub fn on_actor_spawned<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.on_actor_spawned()
}

/// Calls an actor's `begin_play`.
#[inline]
pub fn begin_play<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.begin_play()
}

/// Asks an actor whether it wants this tick. Defaults to `true`.
#[inline]
pub fn want_tick<A: Actor + ?Sized>(actor: &A) -> CapabilityResult<bool> {
    actor.want_tick()
}

/// Calls an actor's `tick` with the elapsed time.
#[inline]
pub fn tick<A: Actor + ?Sized>(actor: &A, delta: Duration) -> CapabilityResult {
    actor.tick(delta)
}

/// Calls an actor's `end_play` with the reason it is leaving.
#[inline]
pub fn end_play<A: Actor + ?Sized>(actor: &A, reason: &EndPlayReason) -> CapabilityResult {
    actor.end_play(reason)
}

/// Calls an actor's `begin_destroy`.
#[inline]
pub fn begin_destroy<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.begin_destroy()
}

/// Calls an actor's `finish_destroy`.
#[inline]
pub fn finish_destroy<A: Actor + ?Sized>(actor: &A) -> CapabilityResult {
    actor.finish_destroy()
}

/// Runs `begin_destroy` then `finish_destroy`, stopping at the first failure.
///
/// The manager never calls this; actors that own their teardown do, after
/// they have been removed.
pub fn destroy<A: Actor + ?Sized>(actor: &A) -> crate::Result<()> {
    for stage in [Stage::BeginDestroy, Stage::FinishDestroy] {
        if let Some(Err(source)) = stage.invoke(actor) {
            return Err(crate::Error::capability(stage, source));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Stage>>,
        fail_on: Option<Stage>,
    }

    impl Recorder {
        fn hit(&self, stage: Stage) -> CapabilityResult {
            self.calls.lock().push(stage);
            if self.fail_on == Some(stage) {
                return Err(format!("{stage} exploded").into());
            }
            Ok(())
        }
    }

    impl Actor for Recorder {
        fn begin_play(&self) -> CapabilityResult {
            self.hit(Stage::BeginPlay)
        }

        fn want_tick(&self) -> CapabilityResult<bool> {
            self.hit(Stage::WantTick)?;
            Ok(false)
        }

        fn tick(&self, _delta: Duration) -> CapabilityResult {
            self.hit(Stage::Tick)
        }

        fn begin_destroy(&self) -> CapabilityResult {
            self.hit(Stage::BeginDestroy)
        }

        fn finish_destroy(&self) -> CapabilityResult {
            self.hit(Stage::FinishDestroy)
        }
    }

    struct Bare;

    impl Actor for Bare {}

    #[test]
    fn test_absent_capabilities_are_noops() {
        let actor = Bare;
        for stage in Stage::CONSTRUCTION {
            assert!(stage.invoke(&actor).unwrap().is_ok());
        }
        assert!(want_tick(&actor).unwrap());
        assert!(tick(&actor, Duration::from_millis(1)).is_ok());
        assert!(end_play(&actor, &EndPlayReason::Removed).is_ok());
        assert!(destroy(&actor).is_ok());
    }

    #[test]
    fn test_dispatch_reaches_capability() {
        let actor = Recorder::default();
        begin_play(&actor).unwrap();
        assert!(!want_tick(&actor).unwrap());
        tick(&actor, Duration::ZERO).unwrap();
        assert_eq!(
            *actor.calls.lock(),
            vec![Stage::BeginPlay, Stage::WantTick, Stage::Tick]
        );
    }

    #[test]
    fn test_failure_is_returned_verbatim() {
        let actor = Recorder {
            fail_on: Some(Stage::Tick),
            ..Recorder::default()
        };
        let err = tick(&actor, Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "tick exploded");
        // no retry
        assert_eq!(actor.calls.lock().len(), 1);
    }

    #[test]
    fn test_invoke_skips_argument_stages() {
        let actor = Bare;
        assert!(Stage::Tick.invoke(&actor).is_none());
        assert!(Stage::WantTick.invoke(&actor).is_none());
        assert!(Stage::EndPlay.invoke(&actor).is_none());
    }

    #[test]
    fn test_destroy_stops_at_first_failure() {
        let actor = Recorder {
            fail_on: Some(Stage::BeginDestroy),
            ..Recorder::default()
        };
        let err = destroy(&actor).unwrap_err();
        assert!(matches!(
            err,
            Error::Capability {
                stage: Stage::BeginDestroy,
                ..
            }
        ));
        assert_eq!(*actor.calls.lock(), vec![Stage::BeginDestroy]);

        let actor = Recorder::default();
        destroy(&actor).unwrap();
        assert_eq!(
            *actor.calls.lock(),
            vec![Stage::BeginDestroy, Stage::FinishDestroy]
        );
    }
}
