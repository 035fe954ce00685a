//! Manager configuration and the tick-failure policy.

use crate::actor::{ActorId, Stage};
use crate::error::{BoxError, Error, Result};
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{error, warn};

/// Tick interval used when an actor does not ask for one.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// What the scheduler does when `want_tick` or `tick` fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickFailurePolicy {
    /// Stop the scheduler and shut the manager down.
    ///
    /// One misbehaving actor takes every other actor with it; every
    /// remaining actor receives `end_play` with
    /// [`EndPlayReason::ManagerStopped`](crate::EndPlayReason::ManagerStopped).
    #[default]
    Abort,
    /// Log the failure and carry on with the next actor.
    LogAndContinue,
}

impl TickFailurePolicy {
    /// Decide whether the scheduler keeps running after a failed capability.
    pub(crate) fn on_failure(self, actor: ActorId, stage: Stage, err: &BoxError) -> ControlFlow<()> {
        match self {
            Self::Abort => {
                error!(%actor, %stage, error = %err, "actor failed during tick dispatch, stopping scheduler");
                ControlFlow::Break(())
            }
            Self::LogAndContinue => {
                warn!(%actor, %stage, error = %err, "actor failed during tick dispatch");
                ControlFlow::Continue(())
            }
        }
    }
}

/// Configuration for the [`Manager`](crate::Manager).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Interval for actors added without an explicit tick rate.
    pub default_tick_interval: Duration,
    /// Reaction to `want_tick`/`tick` failures inside the scheduler.
    pub tick_failure_policy: TickFailurePolicy,
    /// Name of the scheduler thread.
    pub thread_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_tick_interval: DEFAULT_TICK_INTERVAL,
            tick_failure_policy: TickFailurePolicy::Abort,
            thread_name: "tickwheel-scheduler".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Set the default tick interval.
    #[must_use]
    pub fn with_default_tick_interval(mut self, interval: Duration) -> Self {
        self.default_tick_interval = interval;
        self
    }

    /// Set the tick-failure policy.
    #[must_use]
    pub fn with_tick_failure_policy(mut self, policy: TickFailurePolicy) -> Self {
        self.tick_failure_policy = policy;
        self
    }

    /// Set the scheduler thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroTickInterval`] if the default interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.default_tick_interval.is_zero() {
            return Err(Error::ZeroTickInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;
    use std::sync::Arc;

    struct Noop;

    impl Actor for Noop {}

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.default_tick_interval, Duration::from_millis(200));
        assert_eq!(config.tick_failure_policy, TickFailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_default_interval_rejected() {
        let config = ManagerConfig::default().with_default_tick_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::ZeroTickInterval)));
    }

    #[test]
    fn test_policy_decision() {
        let actor = ActorId::of(&Arc::new(Noop));
        let err: BoxError = "boom".into();
        assert!(TickFailurePolicy::Abort
            .on_failure(actor, Stage::Tick, &err)
            .is_break());
        assert!(TickFailurePolicy::LogAndContinue
            .on_failure(actor, Stage::WantTick, &err)
            .is_continue());
    }
}
