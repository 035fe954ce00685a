//! Per-actor options for [`Manager::add_actor`](crate::Manager::add_actor).

use crate::error::{Error, Result};
use std::time::Duration;

/// How often an actor wants to tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TickRate {
    /// Use the manager's configured default interval.
    #[default]
    Default,
    /// Tick on a fixed wall-clock interval. Zero is rejected.
    Interval(Duration),
    /// Tick once per [`Manager::tick_frame`](crate::Manager::tick_frame) call.
    EveryFrame,
}

/// Options applied when an actor is added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorOptions {
    /// Requested tick rate.
    pub tick_rate: TickRate,
}

impl ActorOptions {
    /// Options with the default tick rate.
    pub const fn new() -> Self {
        Self {
            tick_rate: TickRate::Default,
        }
    }

    /// Tick every `interval`.
    ///
    /// A zero interval makes `add_actor` fail with
    /// [`Error::ZeroTickInterval`]; use [`ActorOptions::with_every_frame_tick`]
    /// for manually driven actors.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_rate = TickRate::Interval(interval);
        self
    }

    /// Tick only when the manager's frame is triggered.
    #[must_use]
    pub const fn with_every_frame_tick(mut self) -> Self {
        self.tick_rate = TickRate::EveryFrame;
        self
    }

    /// Resolve the tick-group key. `Duration::ZERO` is the every-frame group.
    pub(crate) fn resolve(self, default: Duration) -> Result<Duration> {
        match self.tick_rate {
            TickRate::Default => Ok(default),
            TickRate::Interval(interval) if interval.is_zero() => Err(Error::ZeroTickInterval),
            TickRate::Interval(interval) => Ok(interval),
            TickRate::EveryFrame => Ok(Duration::ZERO),
        }
    }
}

impl From<TickRate> for ActorOptions {
    fn from(tick_rate: TickRate) -> Self {
        Self { tick_rate }
    }
}
