use crossbeam::queue::SegQueue;

use sounder_common::network::target::Target;

/// Pending targets for one batch.
///
/// Seeding needs `&mut self`; workers only ever see `&TaskQueue`, so nothing
/// can be enqueued once the pool is running. `try_take` is a lock-free pop:
/// every target goes to exactly one caller.
#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: SegQueue<Target>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed<I, T>(&mut self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        for target in targets {
            self.pending.push(target.into());
        }
    }

    /// Takes one target, or `None` once the queue is drained. Never blocks.
    pub fn try_take(&self) -> Option<Target> {
        self.pending.pop()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
