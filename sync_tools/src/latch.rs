use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// A countdown shared by a fixed number of participants.
///
/// Every participant calls [`arrive`](CompletionLatch::arrive) exactly once when it is done.
/// The arrival that brings the count to zero is told so, which lets exactly one participant
/// run the closing action. Arrivals past zero are ignored.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: AtomicUsize,
    done: Notify,
}

impl CompletionLatch {
    /// Returns a latch waiting for `participants` arrivals. A latch created with zero
    /// participants is already open.
    pub fn new(participants: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(participants),
            done: Notify::new(),
        }
    }

    /// Records one arrival. Returns `true` only for the arrival that opened the latch.
    pub fn arrive(&self) -> bool {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                self.done.notify_waiters();
                true
            }
            _ => false,
        }
    }

    /// Number of participants that have not arrived yet.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Returns `true` once every participant has arrived.
    pub fn is_open(&self) -> bool {
        self.remaining() == 0
    }

    /// Waits until every participant has arrived.
    pub async fn wait(&self) {
        loop {
            let notified = self.done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_open() {
                return;
            }
            notified.await;
        }
    }
}
