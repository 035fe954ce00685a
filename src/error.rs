//! Error types for the manager and the actor lifecycle.

use crate::actor::Stage;
use thiserror::Error;

/// Error type returned by actor capabilities.
///
/// Capabilities may fail with any error; the manager hands it back to the
/// caller untouched inside [`Error::Capability`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by actor capabilities.
pub type CapabilityResult<T = ()> = std::result::Result<T, BoxError>;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the manager and the spawn sequence.
#[derive(Error, Debug)]
pub enum Error {
    /// The manager has been asked to stop, or is not running yet for an
    /// operation that needs the scheduler.
    #[error("manager stopped")]
    ManagerStopped,

    /// The actor is not in the manager's registry.
    #[error("actor not found")]
    ActorNotFound,

    /// The actor is already in the manager's registry.
    #[error("actor already added")]
    ActorAlreadyAdded,

    /// A zero tick interval was requested explicitly.
    ///
    /// Zero is reserved for the every-frame group, see
    /// [`ActorOptions::with_every_frame_tick`](crate::ActorOptions::with_every_frame_tick).
    #[error("tick interval cannot be zero")]
    ZeroTickInterval,

    /// An actor capability failed.
    #[error("{stage} failed: {source}")]
    Capability {
        /// The lifecycle stage that failed.
        stage: Stage,
        /// The error returned by the actor.
        #[source]
        source: BoxError,
    },

    /// The scheduler thread could not be spawned.
    #[error("could not spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    /// Wrap a capability failure with the stage it came from.
    pub fn capability(stage: Stage, source: BoxError) -> Self {
        Self::Capability { stage, source }
    }

    /// Whether this error means the manager is no longer accepting work.
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::ManagerStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_keeps_source() {
        let err = Error::capability(Stage::BeginPlay, "no spawn point".into());
        assert_eq!(err.to_string(), "begin-play failed: no spawn point");

        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "no spawn point");
    }

    #[test]
    fn test_is_stopped() {
        assert!(Error::ManagerStopped.is_stopped());
        assert!(!Error::ActorNotFound.is_stopped());
    }
}
