//! The central **abstraction** for per-target probing.
//!
//! A [`Probe`] performs one blocking operation against one target and turns
//! the backend's answer into an [`Outcome`]. The worker pool knows nothing
//! else about the backend: platform command lines, resolver lists and timeouts
//! all live inside the strategy.
//!
//! **Failure policy:**
//! Expected negative answers (no echo reply, NXDOMAIN, timeouts) are returned
//! as `Ok(outcome)`. `Err` is reserved for faults of the backend itself; the
//! pool logs those and substitutes [`Probe::fault_outcome`], then moves on to
//! the next target.

use std::io;
use std::time::Duration;

use thiserror::Error;

use sounder_common::network::target::Target;
use sounder_common::outcome::Outcome;
use sounder_protocols::dns::DnsError;

mod ping;
mod ptr;

pub use ping::{PingCommand, PingProbe};
pub use ptr::PtrProbe;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("lost track of probe process: {0}")]
    Wait(#[source] io::Error),

    #[error("refusing to probe '{0}'")]
    InvalidTarget(String),

    #[error("socket error: {0}")]
    Socket(#[from] io::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Dns(#[from] DnsError),

    /// Catch-all for strategies outside this crate.
    #[error("{0}")]
    Backend(String),
}

/// A pluggable per-target operation.
pub trait Probe: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &'static str;

    /// Probes one target. Must return within a bounded time.
    fn probe(&self, target: &Target) -> Result<Outcome, ProbeError>;

    /// Outcome recorded when [`Probe::probe`] fails or panics.
    fn fault_outcome(&self) -> Outcome;
}

impl<P: Probe + ?Sized> Probe for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn probe(&self, target: &Target) -> Result<Outcome, ProbeError> {
        (**self).probe(target)
    }

    fn fault_outcome(&self) -> Outcome {
        (**self).fault_outcome()
    }
}
