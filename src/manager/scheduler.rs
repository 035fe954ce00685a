//! Scheduler loop: waits on a runtime-built set of sources and fires
//! tick groups.
//!
//! # Wait-set
//!
//! ```text
//!   ┌──────────────┐
//!   │   shutdown   │──┐
//!   ├──────────────┤  │
//!   │   cancel     │──┤  (only if a token was passed to start)
//!   ├──────────────┤  │
//!   │   topology   │──┤──▶ Select ──▶ one ready source
//!   ├──────────────┤  │
//!   │   frame      │──┤  (only while the every-frame group exists)
//!   ├──────────────┤  │
//!   │ timer × N    │──┘  (one per interval group)
//!   └──────────────┘
//! ```
//!
//! The set of groups is snapshotted from the registry and rebuilt whenever
//! the topology source fires. A group fire copies the member list under the
//! read lock and invokes capabilities with no lock held, so actors may add
//! or remove actors from inside `tick`.

use super::cancel::CancelToken;
use super::registry::{Registry, TickGroup};
use super::Shared;
use crate::actor::{self, ActorId, Stage};
use crossbeam_channel::{Receiver, Select};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// `Manager::stop` asked the loop to leave.
    Shutdown,
    /// The token passed to `Manager::start` was cancelled.
    Cancelled,
    /// A tick failure under `TickFailurePolicy::Abort`.
    Aborted,
}

/// What woke the loop.
enum Event {
    Exit(Exit),
    Topology,
    Fire(Arc<TickGroup>),
}

/// Sources registered in one `Select`, by operation index.
#[derive(Clone, Copy)]
enum Source<'a> {
    Shutdown,
    Cancel(&'a CancelToken),
    Topology,
    Frame(&'a Arc<TickGroup>),
    Timer(&'a Arc<TickGroup>, &'a Receiver<Instant>),
}

/// Snapshot of the groups the loop is waiting on.
#[derive(Default)]
pub(crate) struct WaitSet {
    frame: Option<Arc<TickGroup>>,
    timers: Vec<Arc<TickGroup>>,
}

impl WaitSet {
    pub(crate) fn build(registry: &Registry) -> Self {
        let mut wait_set = Self::default();
        for group in registry.groups() {
            if group.is_every_frame() {
                wait_set.frame = Some(Arc::clone(group));
            } else {
                wait_set.timers.push(Arc::clone(group));
            }
        }
        wait_set
    }

    /// Number of group sources (frame plus timers).
    pub(crate) fn len(&self) -> usize {
        self.timers.len() + usize::from(self.frame.is_some())
    }

    /// Block until one source is ready and consume it.
    fn wait(&self, shared: &Shared, shutdown: &CancelToken, cancel: Option<&CancelToken>) -> Event {
        let mut sources = Vec::with_capacity(self.len() + 3);
        let mut select = Select::new();

        select.recv(shutdown.receiver());
        sources.push(Source::Shutdown);

        if let Some(token) = cancel {
            select.recv(token.receiver());
            sources.push(Source::Cancel(token));
        }

        select.recv(&shared.topology_rx);
        sources.push(Source::Topology);

        if let Some(group) = &self.frame {
            select.recv(&shared.frame_rx);
            sources.push(Source::Frame(group));
        }

        for group in &self.timers {
            if let Some(timer) = group.timer() {
                select.recv(timer);
                sources.push(Source::Timer(group, timer));
            }
        }

        let oper = select.select();
        match sources[oper.index()] {
            Source::Shutdown => {
                let _ = oper.recv(shutdown.receiver());
                Event::Exit(Exit::Shutdown)
            }
            Source::Cancel(token) => {
                let _ = oper.recv(token.receiver());
                Event::Exit(Exit::Cancelled)
            }
            Source::Topology => {
                let _ = oper.recv(&shared.topology_rx);
                Event::Topology
            }
            Source::Frame(group) => {
                let _ = oper.recv(&shared.frame_rx);
                Event::Fire(Arc::clone(group))
            }
            Source::Timer(group, timer) => {
                let _ = oper.recv(timer);
                Event::Fire(Arc::clone(group))
            }
        }
    }
}

/// Run the loop until shutdown, cancellation, or an aborting tick failure.
pub(crate) fn run(shared: &Shared, shutdown: &CancelToken, cancel: Option<&CancelToken>) -> Exit {
    let mut wait_set = WaitSet::build(&shared.registry.read());
    debug!(groups = wait_set.len(), "scheduler loop started");

    let exit = loop {
        match wait_set.wait(shared, shutdown, cancel) {
            Event::Exit(exit) => break exit,
            Event::Topology => {
                wait_set = WaitSet::build(&shared.registry.read());
                trace!(groups = wait_set.len(), "rebuilt wait-set");
            }
            Event::Fire(group) => {
                if dispatch(shared, &group).is_break() {
                    break Exit::Aborted;
                }
            }
        }
    };

    debug!(?exit, "scheduler loop exited");
    exit
}

/// Fire one group: tick every member that wants it.
pub(crate) fn dispatch(shared: &Shared, group: &Arc<TickGroup>) -> ControlFlow<()> {
    let (members, delta) = {
        let registry = shared.registry.read();
        let members = registry.members_of(group);
        let delta = group.advance(Instant::now());
        (members, delta)
    };

    trace!(
        interval = ?group.interval(),
        members = members.len(),
        ?delta,
        "tick group fired"
    );

    let policy = shared.config.tick_failure_policy;
    for member in &members {
        // An earlier member's tick may have removed this one. A pending
        // re-add does not count until its begin_play has returned.
        if shared.registry.read().interval_of(ActorId::of(member)).is_none() {
            continue;
        }

        match actor::want_tick(member.as_ref()) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                if policy
                    .on_failure(ActorId::of(member), Stage::WantTick, &err)
                    .is_break()
                {
                    return ControlFlow::Break(());
                }
                continue;
            }
        }

        if let Err(err) = actor::tick(member.as_ref(), delta) {
            if policy
                .on_failure(ActorId::of(member), Stage::Tick, &err)
                .is_break()
            {
                return ControlFlow::Break(());
            }
        }
    }

    ControlFlow::Continue(())
}
