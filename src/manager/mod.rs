//! Manager: registers actors and drives their ticks.
//!
//! The manager groups actors by tick interval and runs one scheduler
//! thread that fires each group when its timer elapses. Actors added with
//! [`ActorOptions::with_every_frame_tick`] share a group with no timer,
//! fired once per [`Manager::tick_frame`] call.
//!
//! # States
//!
//! ```text
//!  Idle ──start──▶ Running ──stop / cancel / abort──▶ Draining ──▶ Stopped
//!    └──────────────────────stop──────────────────────────┘
//! ```
//!
//! Actors may be added while `Idle`; they start ticking once the manager
//! runs. `stop` ends every remaining actor exactly once with
//! [`EndPlayReason::ManagerStopped`] and leaves the manager unusable.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickwheel::{ActorOptions, EndPlayReason, Manager};
//!
//! let manager = Manager::new();
//! manager.start(None)?;
//!
//! let spinner = Arc::new(Spinner::default());
//! manager.add_actor(spinner.clone(), ActorOptions::new().with_tick_interval(Duration::from_millis(50)))?;
//!
//! // ...
//!
//! manager.remove_actor(&spinner, &EndPlayReason::Removed)?;
//! manager.stop();
//! ```
//!
//! # Caveats
//!
//! Capabilities run on the scheduler thread without timeouts. An actor
//! whose `tick` blocks stalls every group.

mod cancel;
mod config;
mod options;
mod registry;
mod scheduler;

pub use cancel::CancelToken;
pub use config::{ManagerConfig, TickFailurePolicy, DEFAULT_TICK_INTERVAL};
pub use options::{ActorOptions, TickRate};

use crate::actor::{self, Actor, ActorId, ActorRef, EndPlayReason, Stage};
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use registry::Registry;
use scheduler::Exit;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Lifecycle state of a [`Manager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// Constructed, scheduler not started.
    Idle,
    /// Scheduler thread running.
    Running,
    /// Shutting down: the scheduler is exiting and actors are being ended.
    Draining,
    /// Terminal. Every operation fails with [`Error::ManagerStopped`].
    Stopped,
}

impl ManagerState {
    /// Whether actors may be added or removed.
    pub const fn is_accepting(self) -> bool {
        matches!(self, Self::Idle | Self::Running)
    }
}

/// Scheduler bookkeeping guarded by one mutex.
struct Lifecycle {
    state: ManagerState,
    /// Cancelled by `stop` to make the loop exit.
    shutdown: Option<CancelToken>,
    /// Scheduler thread, joined by `stop` as the drain acknowledgement.
    handle: Option<JoinHandle<()>>,
    loop_thread: Option<ThreadId>,
    /// Thread running the teardown, so re-entrant stops do not wait on themselves.
    stopper: Option<ThreadId>,
}

/// State shared between manager handles and the scheduler thread.
pub(crate) struct Shared {
    config: ManagerConfig,
    registry: RwLock<Registry>,
    topology_rx: Receiver<()>,
    frame_tx: Sender<()>,
    frame_rx: Receiver<()>,
    lifecycle: Mutex<Lifecycle>,
    /// Cancelled once the manager reaches `Stopped`.
    stopped: CancelToken,
}

impl Shared {
    pub(crate) fn new(config: ManagerConfig) -> Self {
        // Capacity 1: a pending signal absorbs any further ones.
        let (topology_tx, topology_rx) = bounded(1);
        let (frame_tx, frame_rx) = bounded(1);

        Self {
            config,
            registry: RwLock::new(Registry::new(topology_tx)),
            topology_rx,
            frame_tx,
            frame_rx,
            lifecycle: Mutex::new(Lifecycle {
                state: ManagerState::Idle,
                shutdown: None,
                handle: None,
                loop_thread: None,
                stopper: None,
            }),
            stopped: CancelToken::new(),
        }
    }

    fn state(&self) -> ManagerState {
        self.lifecycle.lock().state
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.state().is_accepting() {
            Ok(())
        } else {
            Err(Error::ManagerStopped)
        }
    }

    /// Stop the scheduler and end every remaining actor.
    fn stop(&self) {
        let current = thread::current().id();

        let (handle, shutdown) = {
            let mut lifecycle = self.lifecycle.lock();
            let state = lifecycle.state;
            match state {
                ManagerState::Idle | ManagerState::Running => {}
                ManagerState::Draining => {
                    let reentrant = lifecycle.stopper == Some(current)
                        || lifecycle.loop_thread == Some(current);
                    drop(lifecycle);
                    if !reentrant {
                        self.stopped.wait();
                    }
                    return;
                }
                ManagerState::Stopped => return,
            }
            lifecycle.state = ManagerState::Draining;
            lifecycle.stopper = Some(current);
            (lifecycle.handle.take(), lifecycle.shutdown.take())
        };

        debug!("stopping manager");

        if let Some(shutdown) = shutdown {
            shutdown.cancel();
        }

        // Joining the loop is the drain acknowledgement. From the loop
        // thread itself the loop exits on its next iteration instead.
        if let Some(handle) = handle {
            if handle.thread().id() != current && handle.join().is_err() {
                error!("scheduler thread panicked");
            }
        }

        let actors = self.registry.write().drain();
        for actor in &actors {
            end_play_on_stop(actor);
        }

        self.lifecycle.lock().state = ManagerState::Stopped;
        self.stopped.cancel();
        debug!(ended = actors.len(), "manager stopped");
    }
}

fn end_play_on_stop(actor: &ActorRef) {
    if let Err(err) = actor::end_play(actor.as_ref(), &EndPlayReason::ManagerStopped) {
        warn!(actor = %ActorId::of(actor), error = %err, "end-play failed during shutdown");
    }
}

/// Stops the manager when the last [`Manager`] handle goes away.
///
/// The scheduler thread holds only [`Shared`], never an `Owner`.
struct Owner {
    shared: Arc<Shared>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

/// Registers actors and drives their ticks.
///
/// `Manager` is a cheap handle: clones share the same registries and
/// scheduler. Dropping the last handle stops the manager as if
/// [`Manager::stop`] had been called. An actor that keeps a handle to its
/// own manager keeps it alive until it is removed or the manager is
/// stopped explicitly.
#[derive(Clone)]
pub struct Manager {
    shared: Arc<Shared>,
    _owner: Arc<Owner>,
}

impl Manager {
    /// Create an idle manager with default configuration.
    pub fn new() -> Self {
        Self::from_shared(Shared::new(ManagerConfig::default()))
    }

    fn from_shared(shared: Shared) -> Self {
        let shared = Arc::new(shared);
        Self {
            _owner: Arc::new(Owner {
                shared: Arc::clone(&shared),
            }),
            shared,
        }
    }

    /// Create an idle manager with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroTickInterval`] if the configuration is invalid.
    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_shared(Shared::new(config)))
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ManagerState {
        self.shared.state()
    }

    /// Start the scheduler thread.
    ///
    /// Cancelling `cancel` has the same effect as [`Manager::stop`].
    /// Starting a running manager is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManagerStopped`] once the manager has been stopped,
    /// or [`Error::Spawn`] if the OS refuses the thread.
    pub fn start(&self, cancel: Option<CancelToken>) -> Result<()> {
        let mut lifecycle = self.shared.lifecycle.lock();
        match lifecycle.state {
            ManagerState::Idle => {}
            ManagerState::Running => return Ok(()),
            ManagerState::Draining | ManagerState::Stopped => return Err(Error::ManagerStopped),
        }

        let shutdown = CancelToken::new();
        let loop_shutdown = shutdown.clone();
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name(self.shared.config.thread_name.clone())
            .spawn(move || {
                let exit = scheduler::run(&shared, &loop_shutdown, cancel.as_ref());
                if exit != Exit::Shutdown {
                    // Nobody called stop; finish the shutdown from here.
                    shared.stop();
                }
            })?;

        lifecycle.loop_thread = Some(handle.thread().id());
        lifecycle.handle = Some(handle);
        lifecycle.shutdown = Some(shutdown);
        lifecycle.state = ManagerState::Running;
        drop(lifecycle);

        debug!(thread = %self.shared.config.thread_name, "manager started");
        Ok(())
    }

    /// Stop the scheduler and end every remaining actor.
    ///
    /// Blocks until the scheduler has exited and every actor registered at
    /// that point has received `end_play` with
    /// [`EndPlayReason::ManagerStopped`]. Calling `stop` again is a no-op.
    /// Called from inside a capability running on the scheduler thread, it
    /// does not wait for the loop; the loop exits after the current
    /// dispatch.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Wait up to `timeout` for the manager to reach [`ManagerState::Stopped`].
    ///
    /// Returns `true` if it did. Useful when the manager stops itself after
    /// a cancellation or a failing tick.
    pub fn wait_stopped_timeout(&self, timeout: Duration) -> bool {
        self.shared.stopped.wait_timeout(timeout)
    }

    /// Register an actor.
    ///
    /// Runs the actor's `begin_play` before it can be ticked. If
    /// `begin_play` fails the actor is not added, `end_play` is not called,
    /// and the failure is returned as [`Error::Capability`].
    ///
    /// # Errors
    ///
    /// - [`Error::ManagerStopped`] once the manager is stopping.
    /// - [`Error::ActorAlreadyAdded`] if the actor is registered already.
    /// - [`Error::ZeroTickInterval`] for an explicit zero interval.
    pub fn add_actor(&self, actor: ActorRef, options: ActorOptions) -> Result<()> {
        self.shared.ensure_accepting()?;

        let id = ActorId::of(&actor);
        let interval = options.resolve(self.shared.config.default_tick_interval)?;

        self.shared.registry.write().reserve(id)?;

        if let Err(source) = actor::begin_play(actor.as_ref()) {
            self.shared.registry.write().release_reservation(id);
            return Err(Error::capability(Stage::BeginPlay, source));
        }

        let rejected = {
            let mut registry = self.shared.registry.write();
            registry.release_reservation(id);
            // Checked under the registry lock: stop drains the registry
            // after leaving the accepting states, so either the drain sees
            // this actor or this check sees the stop.
            if self.shared.state().is_accepting() {
                registry.insert(id, actor, interval)?;
                None
            } else {
                Some(actor)
            }
        };

        if let Some(actor) = rejected {
            end_play_on_stop(&actor);
            return Err(Error::ManagerStopped);
        }

        debug!(%id, ?interval, "actor added");
        Ok(())
    }

    /// Unregister an actor and call its `end_play` with `reason`.
    ///
    /// # Errors
    ///
    /// - [`Error::ManagerStopped`] once the manager is stopping.
    /// - [`Error::ActorNotFound`] if the actor is not registered.
    /// - [`Error::Capability`] if `end_play` fails; the actor is removed
    ///   regardless.
    pub fn remove_actor<A: Actor + ?Sized>(
        &self,
        actor: &Arc<A>,
        reason: &EndPlayReason,
    ) -> Result<()> {
        self.shared.ensure_accepting()?;

        let id = ActorId::of(actor);
        let removed = self.shared.registry.write().remove(id)?;
        debug!(%id, %reason, "actor removed");

        actor::end_play(removed.as_ref(), reason)
            .map_err(|source| Error::capability(Stage::EndPlay, source))
    }

    /// Fire the every-frame group once.
    ///
    /// The trigger is handled asynchronously by the scheduler thread. A
    /// trigger that is still pending absorbs further calls, so the group
    /// fires at most once per pending trigger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManagerStopped`] unless the manager is running.
    pub fn tick_frame(&self) -> Result<()> {
        if self.shared.state() != ManagerState::Running {
            return Err(Error::ManagerStopped);
        }
        let _ = self.shared.frame_tx.try_send(());
        Ok(())
    }

    /// Whether the actor is registered (or being added).
    pub fn contains<A: Actor + ?Sized>(&self, actor: &Arc<A>) -> bool {
        self.shared.registry.read().contains(ActorId::of(actor))
    }

    /// Tick interval of a registered actor; `Duration::ZERO` for every-frame.
    pub fn tick_interval_of<A: Actor + ?Sized>(&self, actor: &Arc<A>) -> Option<Duration> {
        self.shared.registry.read().interval_of(ActorId::of(actor))
    }

    /// Number of registered actors.
    pub fn actor_count(&self) -> usize {
        self.shared.registry.read().actor_count()
    }

    /// Number of live tick groups.
    pub fn group_count(&self) -> usize {
        self.shared.registry.read().group_count()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("state", &self.state())
            .field("actors", &self.actor_count())
            .field("groups", &self.group_count())
            .finish()
    }
}

static GLOBAL: OnceLock<Manager> = OnceLock::new();

/// The process-wide manager, created and started on first use.
///
/// Nothing is created until the first call. Applications that need
/// isolated schedulers (tests, multiple worlds) should build their own
/// [`Manager`] instead.
pub fn get_or_create() -> &'static Manager {
    GLOBAL.get_or_init(|| {
        let manager = Manager::new();
        if let Err(err) = manager.start(None) {
            error!(error = %err, "failed to start the global manager");
        }
        manager
    })
}

/// Alias for [`get_or_create`].
pub fn global() -> &'static Manager {
    get_or_create()
}
