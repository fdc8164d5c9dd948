//! Persisted FIFO of event records.

use crate::OutboxResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tally_storage::PersistedState;
use tally_wire::EventRecord;
use tracing::{debug, error, info, warn};

struct QueueState {
    records: VecDeque<EventRecord>,
    /// Set while a drain loop owns the head.
    processing: bool,
    /// Set once the persisted snapshot has been merged in.
    restored: bool,
}

/// In-memory event queue mirrored to the key-value store.
///
/// One lock guards the records, the processing flag and the snapshot write,
/// so a reader never sees the queue and its snapshot disagree. The lock is
/// never held across an await point.
pub struct EventQueue {
    state: Mutex<QueueState>,
    persisted: PersistedState,
}

impl EventQueue {
    /// Create an empty queue persisting through `persisted`.
    pub fn new(persisted: PersistedState) -> Self {
        Self {
            state: Mutex::new(QueueState {
                records: VecDeque::new(),
                processing: false,
                restored: false,
            }),
            persisted,
        }
    }

    /// Merge the last persisted snapshot in front of the in-memory queue.
    ///
    /// Runs at most once per queue; [`push`](Self::push) runs it first if it
    /// has not happened yet, so a new record never overwrites an unread
    /// snapshot. A missing, unreadable or corrupt snapshot restores nothing.
    /// Returns the number of restored records.
    pub fn restore(&self) -> usize {
        let mut state = self.state.lock();
        self.restore_locked(&mut state)
    }

    fn restore_locked(&self, state: &mut QueueState) -> usize {
        if state.restored {
            return 0;
        }
        state.restored = true;

        let mut records = match self.load_snapshot() {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Discarding unreadable event queue snapshot");
                VecDeque::new()
            }
        };

        let count = records.len();
        if count > 0 {
            records.extend(state.records.drain(..));
            state.records = records;
            info!(count, "Restored pending events");
        }
        count
    }

    fn load_snapshot(&self) -> OutboxResult<VecDeque<EventRecord>> {
        match self.persisted.queue_snapshot()? {
            Some(snapshot) => Ok(serde_json::from_str(&snapshot)?),
            None => Ok(VecDeque::new()),
        }
    }

    /// Append a record and persist the whole queue. Returns the new length.
    pub fn push(&self, record: EventRecord) -> usize {
        let mut state = self.state.lock();
        self.restore_locked(&mut state);
        state.records.push_back(record);
        self.persist(&state.records);

        debug!(pending = state.records.len(), "Enqueued event");
        state.records.len()
    }

    /// Claim the drain role if it is free and there is work.
    pub fn try_begin_drain(&self) -> bool {
        let mut state = self.state.lock();
        if state.processing || state.records.is_empty() {
            return false;
        }
        state.processing = true;
        true
    }

    /// Copy of the head, or release the drain role when the queue is empty.
    ///
    /// Checking for emptiness and clearing the flag happen under the same
    /// lock, so a concurrent push either sees the loop still running or is
    /// free to start a new one.
    pub fn peek_or_release(&self) -> Option<EventRecord> {
        let mut state = self.state.lock();
        match state.records.front() {
            Some(head) => Some(head.clone()),
            None => {
                state.processing = false;
                None
            }
        }
    }

    /// Give up the drain role without draining.
    pub fn release(&self) {
        self.state.lock().processing = false;
    }

    /// Drop the head after a terminal outcome and persist.
    pub fn complete_head(&self) -> Option<EventRecord> {
        let mut state = self.state.lock();
        let head = state.records.pop_front();
        self.persist(&state.records);
        head
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().processing
    }

    /// Copy of every queued record, head first.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.state.lock().records.iter().cloned().collect()
    }

    // Called with the state lock held.
    fn persist(&self, records: &VecDeque<EventRecord>) {
        if let Err(e) = self.write_snapshot(records) {
            warn!(error = %e, pending = records.len(), "Failed to persist event queue");
        }
    }

    fn write_snapshot(&self, records: &VecDeque<EventRecord>) -> OutboxResult<()> {
        let json = serde_json::to_string(records)?;
        self.persisted.set_queue_snapshot(&json)?;
        Ok(())
    }
}
