//! # Sounder Core
//!
//! A bounded-concurrency probing pool: a fixed number of worker threads drain
//! a shared queue of targets through a pluggable [`Probe`](probe::Probe)
//! strategy and collect one outcome per target.
//!
//! * **[`coordinator`]**: the public entry point ([`run`](coordinator::run), [`Pool`](coordinator::Pool)).
//! * **[`probe`]**: the strategy trait plus the ping and PTR implementations.
//! * **[`queue`]** / **[`sink`]**: the two shared containers the workers coordinate through.
//! * **[`cancel`]**: cooperative abort of a running batch.

pub mod cancel;
pub mod coordinator;
pub mod pool;
pub mod probe;
pub mod queue;
pub mod sink;

pub use cancel::CancelToken;
pub use coordinator::{Pool, run};
pub use probe::{PingProbe, Probe, ProbeError, PtrProbe};
