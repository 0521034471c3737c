//! # Pool Coordinator
//!
//! Public entry point of the crate. A call to [`Pool::run`] (or the [`run`]
//! shortcut):
//! 1. validates the configuration, before any thread exists,
//! 2. seeds a fresh [`TaskQueue`] with every target,
//! 3. starts the workers and joins all of them,
//! 4. hands back one [`ProbeRecord`] per target, in no particular order.
//!
//! Queue, sink and workers live only for the duration of the call.

use std::time::Instant;

use tracing::{debug, info};

use sounder_common::config::PoolConfig;
use sounder_common::error::PoolError;
use sounder_common::network::target::Target;
use sounder_common::outcome::ProbeRecord;

use crate::cancel::CancelToken;
use crate::pool::{self, ProgressFn, Shared};
use crate::probe::Probe;
use crate::queue::TaskQueue;
use crate::sink::ResultSink;

/// A configured pool. Every [`Pool::run`] builds its own queue and workers.
///
/// The cancel token is shared by all runs and stays fired once cancelled:
/// later runs on the same pool skip every target and return
/// [`PoolError::Cancelled`]. Use a fresh pool or token for a new batch.
pub struct Pool {
    config: PoolConfig,
    cancel: CancelToken,
    progress: Option<Box<ProgressFn>>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Lets the caller abort a running batch from another thread.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Registers a callback fed with the running count of finished targets.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Probes every target with `probe` and blocks until all workers have
    /// terminated.
    ///
    /// Returns exactly one record per input element (duplicates included), or
    /// [`PoolError::Config`] without doing any work, or
    /// [`PoolError::Cancelled`] carrying whatever finished before the token
    /// fired.
    pub fn run<P, I, T>(&self, targets: I, probe: &P) -> Result<Vec<ProbeRecord>, PoolError>
    where
        P: Probe + ?Sized,
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        self.config.validate()?;

        let mut queue = TaskQueue::new();
        queue.seed(targets);
        let total: usize = queue.len();
        if total == 0 {
            debug!("Nothing to probe");
            return Ok(Vec::new());
        }

        let workers: usize = self.config.workers.min(total);
        let sink = ResultSink::with_capacity(total + workers);
        let shared = Shared::new(&queue, &sink, probe, &self.cancel, self.progress.as_deref());

        info!(
            "Probing {} targets with {} {} workers",
            total,
            workers,
            probe.name()
        );
        let start_time = Instant::now();
        let probed: usize = pool::drain(workers, &shared);
        drop(shared);

        let skipped: usize = queue.len();
        let (records, finished) = sink.into_parts();
        debug!(
            "{} of {} workers reported done, {} targets probed",
            finished.len(),
            workers,
            probed
        );
        debug_assert_eq!(records.len() + skipped, total);

        // Leftovers only survive `drain` when the token fired.
        if self.cancel.is_cancelled() && skipped > 0 {
            info!(
                "Batch cancelled: {} probed, {} skipped in {:.2}s",
                records.len(),
                skipped,
                start_time.elapsed().as_secs_f64()
            );
            return Err(PoolError::Cancelled {
                completed: records,
                skipped,
            });
        }

        let positive = records.iter().filter(|r| r.outcome.is_positive()).count();
        info!(
            "Probed {} targets in {:.2}s, {} positive",
            total,
            start_time.elapsed().as_secs_f64(),
            positive
        );
        Ok(records)
    }
}

/// Runs one batch with `worker_count` workers and no cancellation.
pub fn run<P, I, T>(targets: I, worker_count: usize, probe: &P) -> Result<Vec<ProbeRecord>, PoolError>
where
    P: Probe + ?Sized,
    I: IntoIterator<Item = T>,
    T: Into<Target>,
{
    Pool::new(PoolConfig::new(worker_count)).run(targets, probe)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
