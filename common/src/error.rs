//! Errors a caller of the pool can observe.
//!
//! Per-target failures never show up here: an unreachable host or a missing
//! PTR record is an [`Outcome`](crate::outcome::Outcome), not an error.

use thiserror::Error;

use crate::outcome::ProbeRecord;

/// Rejected configuration, reported before any worker starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("no ping invocation is known for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("invalid nameserver '{0}'")]
    InvalidNameserver(String),
}

/// Failure of a whole `run` call.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    Config(#[from] ConfigError),

    /// The batch was aborted through its cancel token.
    ///
    /// Every worker was joined before this was returned, so `completed` holds
    /// everything that finished and nothing is still running.
    #[error("batch cancelled after {} targets, {skipped} never probed", .completed.len())]
    Cancelled {
        completed: Vec<ProbeRecord>,
        skipped: usize,
    },
}
