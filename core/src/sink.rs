use parking_lot::Mutex;

use sounder_common::outcome::ProbeRecord;

/// One item pushed by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEntry {
    Record(ProbeRecord),
    /// Informational only. Completion is decided by joining the workers,
    /// never by counting these.
    WorkerDone { worker: usize },
}

/// Collects entries from every worker of one batch.
#[derive(Debug, Default)]
pub struct ResultSink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl ResultSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn push(&self, entry: SinkEntry) {
        self.entries.lock().push(entry);
    }

    /// Consumes the sink. Only callable once every worker has been joined,
    /// since workers hold shared borrows until then.
    pub fn into_entries(self) -> Vec<SinkEntry> {
        self.entries.into_inner()
    }

    /// Splits the entries into records and the ids of workers that reported done.
    pub fn into_parts(self) -> (Vec<ProbeRecord>, Vec<usize>) {
        let mut records = Vec::new();
        let mut finished = Vec::new();
        for entry in self.into_entries() {
            match entry {
                SinkEntry::Record(record) => records.push(record),
                SinkEntry::WorkerDone { worker } => finished.push(worker),
            }
        }
        (records, finished)
    }
}
