//! # Probe Outcomes
//!
//! Every target handed to the pool comes back with exactly one [`Outcome`].
//! Reachability probes report [`Outcome::Reachable`] or [`Outcome::Unreachable`];
//! name-resolution probes report [`Outcome::Resolved`] or [`Outcome::Unresolved`].

use std::fmt;

use crate::network::target::Target;

/// Why a reverse lookup produced no name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnresolvedReason {
    /// The resolver answered NXDOMAIN.
    NotFound,
    /// The name exists but carries no PTR record.
    NoAnswer,
    /// No resolver answered within the lookup lifetime.
    Timeout,
    /// There was no resolver to ask, or none of them gave a usable answer.
    NoNameserver,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnresolvedReason::NotFound => "not found",
            UnresolvedReason::NoAnswer => "no answer",
            UnresolvedReason::Timeout => "timeout",
            UnresolvedReason::NoNameserver => "no nameserver",
        };
        f.write_str(label)
    }
}

/// Categorized result of probing one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    Reachable,
    Unreachable,
    Resolved(String),
    Unresolved(UnresolvedReason),
}

impl Outcome {
    /// `true` for [`Outcome::Reachable`] and [`Outcome::Resolved`].
    pub fn is_positive(&self) -> bool {
        matches!(self, Outcome::Reachable | Outcome::Resolved(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reachable => f.write_str("active"),
            Outcome::Unreachable => f.write_str("inactive"),
            Outcome::Resolved(name) => f.write_str(name),
            Outcome::Unresolved(reason) => write!(f, "unresolved ({reason})"),
        }
    }
}

/// One `(target, outcome)` pair as returned by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeRecord {
    pub target: Target,
    pub outcome: Outcome,
}

impl ProbeRecord {
    pub fn new(target: Target, outcome: Outcome) -> Self {
        Self { target, outcome }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
