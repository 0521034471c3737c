//! Worker threads for one batch.
//!
//! Each worker loops `take → probe → push` until the queue reports empty or
//! the batch is cancelled, then pushes its [`SinkEntry::WorkerDone`] marker and
//! returns. The shared queue is the only load balancing: fast workers simply
//! take more targets.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use tracing::{debug, trace, warn};

use sounder_common::network::target::Target;
use sounder_common::outcome::{Outcome, ProbeRecord};

use crate::cancel::CancelToken;
use crate::probe::Probe;
use crate::queue::TaskQueue;
use crate::sink::{ResultSink, SinkEntry};

/// Called with the number of targets finished so far, from worker threads.
pub type ProgressFn = dyn Fn(usize) + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Draining,
    Probing,
    Drained,
    Terminated,
}

/// Everything the workers of one batch share. Borrowed, never owned, so all of
/// it is dropped by the coordinator once the scope has joined.
pub(crate) struct Shared<'a, P: ?Sized> {
    pub queue: &'a TaskQueue,
    pub sink: &'a ResultSink,
    pub probe: &'a P,
    pub cancel: &'a CancelToken,
    pub progress: Option<&'a ProgressFn>,
    pub completed: AtomicUsize,
    progress_failed: AtomicBool,
}

impl<'a, P: ?Sized> Shared<'a, P> {
    pub fn new(
        queue: &'a TaskQueue,
        sink: &'a ResultSink,
        probe: &'a P,
        cancel: &'a CancelToken,
        progress: Option<&'a ProgressFn>,
    ) -> Self {
        Self {
            queue,
            sink,
            probe,
            cancel,
            progress,
            completed: AtomicUsize::new(0),
            progress_failed: AtomicBool::new(false),
        }
    }
}

struct Worker<'s, 'a, P: ?Sized> {
    id: usize,
    state: WorkerState,
    probed: usize,
    shared: &'s Shared<'a, P>,
}

impl<'s, 'a, P: Probe + ?Sized> Worker<'s, 'a, P> {
    fn new(id: usize, shared: &'s Shared<'a, P>) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            probed: 0,
            shared,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(worker = self.id, from = ?self.state, to = ?next);
        self.state = next;
    }

    /// Runs the worker to completion and returns how many targets it probed.
    fn run(mut self) -> usize {
        self.transition(WorkerState::Draining);

        loop {
            if self.shared.cancel.is_cancelled() {
                debug!(worker = self.id, "Cancelled, leaving remaining targets queued");
                break;
            }
            let Some(target) = self.shared.queue.try_take() else {
                break;
            };

            self.transition(WorkerState::Probing);
            let outcome = probe_guarded(self.shared.probe, &target);
            self.shared
                .sink
                .push(SinkEntry::Record(ProbeRecord::new(target, outcome)));
            self.probed += 1;
            self.report_progress();
            self.transition(WorkerState::Draining);
        }

        self.transition(WorkerState::Drained);
        self.shared.sink.push(SinkEntry::WorkerDone { worker: self.id });
        self.transition(WorkerState::Terminated);
        self.probed
    }

    /// A panicking callback is logged once per batch and never stops the worker.
    fn report_progress(&self) {
        let done = self.shared.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let Some(progress) = self.shared.progress else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| progress(done))).is_err()
            && !self.shared.progress_failed.swap(true, Ordering::Relaxed)
        {
            warn!("Progress callback panicked, further progress may be missing");
        }
    }
}

/// Probes one target, turning faults and panics into the strategy's fault outcome.
fn probe_guarded<P: Probe + ?Sized>(probe: &P, target: &Target) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| probe.probe(target))) {
        Ok(Ok(outcome)) => {
            debug!("{} {}: {}", probe.name(), target, outcome);
            outcome
        }
        Ok(Err(e)) => {
            warn!("{} probe of {} failed: {}", probe.name(), target, e);
            probe.fault_outcome()
        }
        Err(_) => {
            warn!("{} probe of {} panicked", probe.name(), target);
            probe.fault_outcome()
        }
    }
}

/// Starts `workers` threads over `shared` and blocks until every one of them
/// has returned.
///
/// Threads that cannot be spawned are skipped; if none can be spawned the
/// calling thread drains the queue itself, so the batch still completes.
/// Targets left behind by a worker that died are drained the same way unless
/// the batch was cancelled.
pub(crate) fn drain<P: Probe + ?Sized>(workers: usize, shared: &Shared<'_, P>) -> usize {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let spawned = thread::Builder::new()
                .name(format!("sounder-worker-{id}"))
                .spawn_scoped(scope, move || Worker::new(id, shared).run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("Failed to spawn worker {id}: {e}"),
            }
        }

        if handles.is_empty() {
            warn!("No worker threads available, probing on the calling thread");
            return Worker::new(0, shared).run();
        }

        let mut probed = 0;
        for handle in handles {
            match handle.join() {
                Ok(count) => probed += count,
                Err(_) => warn!("A worker thread panicked outside of a probe"),
            }
        }

        if !shared.cancel.is_cancelled() && !shared.queue.is_empty() {
            warn!("{} targets left behind, probing them on the calling thread", shared.queue.len());
            probed += Worker::new(workers, shared).run();
        }
        probed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;

    struct Flaky;

    impl Probe for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn probe(&self, target: &Target) -> Result<Outcome, ProbeError> {
            match target.as_str() {
                "boom" => panic!("backend exploded"),
                "err" => Err(ProbeError::Backend("backend down".into())),
                _ => Ok(Outcome::Reachable),
            }
        }

        fn fault_outcome(&self) -> Outcome {
            Outcome::Unreachable
        }
    }

    #[test]
    fn faults_and_panics_do_not_stop_the_worker() {
        let mut queue = TaskQueue::new();
        queue.seed(["a", "boom", "err", "b"]);
        let sink = ResultSink::default();
        let cancel = CancelToken::new();
        let shared = Shared::new(&queue, &sink, &Flaky, &cancel, None);

        let probed = drain(1, &shared);
        assert_eq!(probed, 4);

        let entries = sink.into_entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries.last(), Some(&SinkEntry::WorkerDone { worker: 0 }));
        assert!(entries.contains(&SinkEntry::Record(ProbeRecord::new(
            Target::from("boom"),
            Outcome::Unreachable
        ))));
        assert!(entries.contains(&SinkEntry::Record(ProbeRecord::new(
            Target::from("b"),
            Outcome::Reachable
        ))));
    }

    #[test]
    fn every_worker_leaves_a_done_marker() {
        let mut queue = TaskQueue::new();
        queue.seed((0..20).map(|i| format!("10.0.0.{i}")));
        let sink = ResultSink::default();
        let cancel = CancelToken::new();
        let shared = Shared::new(&queue, &sink, &Flaky, &cancel, None);

        assert_eq!(drain(4, &shared), 20);
        assert_eq!(shared.completed.load(Ordering::Relaxed), 20);

        let (records, mut finished) = sink.into_parts();
        finished.sort_unstable();
        assert_eq!(records.len(), 20);
        assert_eq!(finished, vec![0, 1, 2, 3]);
    }

    #[test]
    fn panicking_progress_callback_does_not_stop_the_worker() {
        let mut queue = TaskQueue::new();
        queue.seed(["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let sink = ResultSink::default();
        let cancel = CancelToken::new();
        let progress: &ProgressFn = &|done| {
            if done == 1 {
                panic!("observer gone");
            }
        };
        let shared = Shared::new(&queue, &sink, &Flaky, &cancel, Some(progress));

        assert_eq!(drain(1, &shared), 3);
        assert!(queue.is_empty());
        assert!(shared.progress_failed.load(Ordering::Relaxed));

        let (records, finished) = sink.into_parts();
        assert_eq!(records.len(), 3);
        assert_eq!(finished, vec![0]);
    }
}
