use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use sync_tools::CompletionLatch;
use tracing::debug;

use crate::{channel::Sender, error::ClosedChannelError};

/// A fixed set of producers feeding one channel. The producer that finishes last closes it.
///
/// Each of the `producers` handles must either call [`Producer::finish`] or be dropped;
/// both count as finishing, so a producer whose task was cancelled never keeps the
/// channel open. A producer may still close the channel early through
/// [`Producer::sender`], in which case the others fail with [`ClosedChannelError`].
#[derive(Debug)]
pub struct ProducerGroup<T> {
    sender: Sender<T>,
    latch: Arc<CompletionLatch>,
    handed_out: AtomicUsize,
    producers: usize,
}

impl<T> ProducerGroup<T> {
    /// Builds a group of `producers` handles over `sender`. With zero producers the
    /// channel is closed straight away.
    pub fn new(sender: Sender<T>, producers: usize) -> Self {
        if producers == 0 {
            sender.close();
        }
        Self {
            sender,
            latch: Arc::new(CompletionLatch::new(producers)),
            handed_out: AtomicUsize::new(0),
            producers,
        }
    }

    /// Hands out the next producer handle, or `None` once all of them are taken.
    pub fn producer(&self) -> Option<Producer<T>> {
        let index = self
            .handed_out
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.producers).then_some(n + 1)
            })
            .ok()?;
        Some(Producer {
            index,
            sender: self.sender.clone(),
            latch: self.latch.clone(),
            finished: false,
        })
    }

    /// Number of producers that have not finished yet.
    pub fn running(&self) -> usize {
        self.latch.remaining()
    }

    /// Waits until every producer has finished.
    pub async fn wait(&self) {
        self.latch.wait().await
    }
}

/// One member of a [`ProducerGroup`].
#[derive(Debug)]
pub struct Producer<T> {
    index: usize,
    sender: Sender<T>,
    latch: Arc<CompletionLatch>,
    finished: bool,
}

impl<T> Producer<T> {
    /// Position of this producer in its group, from zero.
    pub fn index(&self) -> usize {
        self.index
    }

    pub async fn send(&self, value: T) -> Result<(), ClosedChannelError<T>> {
        self.sender.send(value).await
    }

    pub fn sender(&self) -> &Sender<T> {
        &self.sender
    }

    /// Marks this producer as done. Returns `true` if it was the last one, in which case
    /// the channel has been closed.
    pub fn finish(mut self) -> bool {
        self.complete()
    }

    fn complete(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        if self.latch.arrive() {
            debug!(
                parent: self.sender.span(),
                producer = self.index,
                "last producer finished, closing channel"
            );
            self.sender.close();
            true
        } else {
            false
        }
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.complete();
    }
}
