use crossbeam_channel::{unbounded, Receiver, Sender};
/// Cross-thread event queue
///
/// A thread-safe, ordered mailbox between the network side (any number of
/// producer threads/tasks) and the single presentation consumer. Producers
/// enqueue without blocking; the consumer drains everything pending once per
/// tick and processes the batch in arrival order.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::events::{QueueEntry, QueueEvent};
use crate::error::QueueError;

/// Pending-entry count above which the consumer is considered stalled
const STALL_THRESHOLD: usize = 512;

struct QueueInner {
    tx: Sender<QueueEntry>,
    rx: Receiver<QueueEntry>,
    /// Next arrival-order stamp. A mutex, not an atomic: the stamp and the
    /// send must happen as one step or a preempted producer could insert an
    /// older stamp after a newer one.
    next_order: Mutex<u64>,
    pending: AtomicUsize,
    closed: AtomicBool,
}

/// Multi-producer, single-consumer event queue with batched drains.
///
/// Cloning shares the same underlying queue. Exactly one consumer is expected
/// to call [`EventQueue::drain_all`]; which clone that is, is a convention of
/// the caller, not enforced here.
pub struct EventQueue {
    inner: Arc<QueueInner>,
}

impl EventQueue {
    /// Create a new, open queue
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            inner: Arc::new(QueueInner {
                tx,
                rx,
                next_order: Mutex::new(0),
                pending: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Append an event, preserving arrival order. Callable from any thread;
    /// never blocks. After [`EventQueue::close`] this is a logged no-op.
    pub fn enqueue(&self, event: QueueEvent) {
        if self.inner.closed.load(Ordering::Acquire) {
            tracing::warn!("Enqueue after consumer stop, dropping: {}", event.description());
            return;
        }

        let sent = {
            let mut next_order = self.inner.next_order.lock();
            let entry = QueueEntry {
                arrival_order: *next_order,
                event,
            };
            // Send on an unbounded channel only fails when all receivers are
            // gone, which cannot happen while `inner.rx` is alive.
            let sent = self.inner.tx.send(entry).is_ok();
            if sent {
                *next_order += 1;
            }
            sent
        };

        if sent {
            let pending = self.inner.pending.fetch_add(1, Ordering::Relaxed) + 1;
            if pending == STALL_THRESHOLD {
                tracing::warn!(
                    pending,
                    "Event queue is growing without drains; consumer may be stalled"
                );
            }
        }
    }

    /// Atomically take everything currently pending, in arrival order.
    ///
    /// Non-blocking; returns an empty Vec when nothing is queued. Only the
    /// designated consumer may call this.
    pub fn drain_all(&self) -> Vec<QueueEntry> {
        let batch: Vec<QueueEntry> = self.inner.rx.try_iter().collect();
        if !batch.is_empty() {
            self.inner.pending.fetch_sub(batch.len(), Ordering::Relaxed);
        }
        batch
    }

    /// Permanently stop accepting new entries. Entries already queued can
    /// still be drained.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Number of entries waiting for the next drain
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Relaxed)
    }

    /// Check for consumer stall (queue growth without drains). Detection
    /// only; recovery is the caller's decision.
    pub fn check_health(&self) -> Result<(), QueueError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        let pending = self.pending();
        if pending >= STALL_THRESHOLD {
            return Err(QueueError::ConsumerStalled { pending });
        }
        Ok(())
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventQueue {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
