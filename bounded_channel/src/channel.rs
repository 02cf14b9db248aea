use std::{
    collections::VecDeque,
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, Span};

use crate::error::{
    CancellableSendError, CancellationSignal, ClosedChannelError, RecvTimeoutError,
    SendTimeoutError, TryRecvError, TrySendError,
};

/// The default capacity used by callers that have no better idea.
pub const DEFAULT_CAPACITY: usize = 10;

/// Label used in traces for channels created without a name.
const UNNAMED: &str = "unnamed";

/// Creates a bounded channel holding at most `capacity` values.
///
/// Both ends can be cloned: several senders give a fan-in, several receivers a fan-out.
/// Trace events of the channel are emitted under the span that is current when this
/// function is called. Use [`ChannelBuilder`] to name the channel or hand it another span.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    ChannelBuilder::new(capacity).build()
}

/// Configures a channel before creating it.
#[derive(Debug, Clone)]
pub struct ChannelBuilder {
    capacity: usize,
    name: Option<String>,
    span: Option<Span>,
}

impl ChannelBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            name: None,
            span: None,
        }
    }

    /// Gives the channel a name, reported in every trace event and by [`Sender::name`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The span the channel logs under. Defaults to the span current at `build` time.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn build<T>(self) -> (Sender<T>, Receiver<T>) {
        assert!(self.capacity > 0, "channel capacity must be positive");
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(self.capacity),
                closed: false,
                sent: 0,
                received: 0,
                high_water: 0,
            }),
            capacity: self.capacity,
            not_empty: Notify::new(),
            not_full: Notify::new(),
            senders: AtomicUsize::new(1),
            receivers: AtomicUsize::new(1),
            name: self.name,
            span: self.span.unwrap_or_else(Span::current),
        });
        (
            Sender {
                shared: shared.clone(),
            },
            Receiver { shared },
        )
    }
}

/// A snapshot of the channel counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub capacity: usize,
    pub len: usize,
    pub sent: u64,
    pub received: u64,
    /// The largest number of values the buffer ever held at once.
    pub high_water: usize,
    pub closed: bool,
}

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    sent: u64,
    received: u64,
    high_water: usize,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    /// Waiters: receivers blocked on an empty channel.
    not_empty: Notify,
    /// Waiters: senders blocked on a full channel.
    not_full: Notify,
    senders: AtomicUsize,
    receivers: AtomicUsize,
    name: Option<String>,
    span: Span,
}

impl<T> Shared<T> {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    fn try_push(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TrySendError::Closed(value));
        }
        if state.queue.len() >= self.capacity {
            return Err(TrySendError::Full(value));
        }
        state.queue.push_back(value);
        state.sent += 1;
        let len = state.queue.len();
        state.high_water = state.high_water.max(len);
        drop(state);

        trace!(parent: &self.span, channel = self.label(), len, "value sent");
        self.not_empty.notify_one();
        Ok(())
    }

    fn try_pop(&self) -> Result<T, TryRecvError> {
        let mut state = self.state.lock();
        match state.queue.pop_front() {
            Some(value) => {
                state.received += 1;
                let len = state.queue.len();
                drop(state);

                trace!(parent: &self.span, channel = self.label(), len, "value received");
                self.not_full.notify_one();
                Ok(value)
            }
            None if state.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Closes the channel and wakes every waiter. Returns `false` if it was already closed.
    fn close(&self, reason: &'static str) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        let pending = state.queue.len();
        drop(state);

        debug!(parent: &self.span, channel = self.label(), reason, pending, "channel closed");
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
        true
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn stats(&self) -> ChannelStats {
        let state = self.state.lock();
        ChannelStats {
            capacity: self.capacity,
            len: state.queue.len(),
            sent: state.sent,
            received: state.received,
            high_water: state.high_water,
            closed: state.closed,
        }
    }
}

/// Why a waiting operation gave up before completing.
enum Interrupted<T> {
    Closed(T),
    Stopped(T),
}

/// The sending half of a channel. Clone it to add producers.
///
/// The channel closes when the last sender is dropped.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Sender<T> {
    /// Sends a value, waiting while the channel is full.
    ///
    /// Fails with [`ClosedChannelError`] if the channel is closed, including when it gets
    /// closed while this call waits for space. A value already in the buffer when the
    /// channel closes stays there and can still be received.
    ///
    /// Dropping the returned future before it completes leaves the channel untouched.
    pub async fn send(&self, value: T) -> Result<(), ClosedChannelError<T>> {
        let mut value = value;
        loop {
            let notified = self.shared.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.shared.try_push(value) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Closed(v)) => return Err(ClosedChannelError(v)),
                Err(TrySendError::Full(v)) => value = v,
            }
            notified.await;
        }
    }

    /// Sends a value only if there is room right now.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.shared.try_push(value)
    }

    /// Like [`send`](Sender::send), but gives the value back if no space frees up in time.
    pub async fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SendTimeoutError<T>> {
        match self.send_or_stop(value, tokio::time::sleep(timeout)).await {
            Ok(()) => Ok(()),
            Err(Interrupted::Closed(v)) => Err(SendTimeoutError::Closed(v)),
            Err(Interrupted::Stopped(v)) => Err(SendTimeoutError::Timeout(v)),
        }
    }

    /// Like [`send`](Sender::send), but returns the value untouched as soon as `token`
    /// is cancelled. A token cancelled before the call means nothing is sent.
    pub async fn send_cancellable(
        &self,
        value: T,
        token: &CancellationToken,
    ) -> Result<(), CancellableSendError<T>> {
        if token.is_cancelled() {
            return Err(CancellableSendError::Cancelled(value));
        }
        match self.send_or_stop(value, token.cancelled()).await {
            Ok(()) => Ok(()),
            Err(Interrupted::Closed(v)) => Err(CancellableSendError::Closed(v)),
            Err(Interrupted::Stopped(v)) => Err(CancellableSendError::Cancelled(v)),
        }
    }

    async fn send_or_stop<S>(&self, value: T, stop: S) -> Result<(), Interrupted<T>>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut value = value;
        loop {
            let notified = self.shared.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.shared.try_push(value) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Closed(v)) => return Err(Interrupted::Closed(v)),
                Err(TrySendError::Full(v)) => value = v,
            }
            tokio::select! {
                biased;
                () = &mut notified => {}
                () = &mut stop => return Err(Interrupted::Stopped(value)),
            }
        }
    }

    /// Closes the channel. Returns `true` for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.shared.close("closed by sender")
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of values currently buffered.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    pub fn stats(&self) -> ChannelStats {
        self.shared.stats()
    }

    /// Returns `true` if both senders feed the same channel.
    pub fn same_channel(&self, other: &Sender<T>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Returns `true` if this sender feeds the channel `receiver` reads from.
    pub fn is_bound_to(&self, receiver: &Receiver<T>) -> bool {
        Arc::ptr_eq(&self.shared, &receiver.shared)
    }

    pub(crate) fn span(&self) -> &Span {
        &self.shared.span
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.close("last sender dropped");
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("channel", &self.shared.label())
            .field("stats", &self.shared.stats())
            .finish()
    }
}

/// The receiving half of a channel. Clone it to add consumers; every value goes to
/// exactly one of them.
///
/// The channel closes when the last receiver is dropped.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Receiver<T> {
    /// Receives the next value, waiting while the channel is empty and open.
    ///
    /// Returns `None` once the channel is closed and every buffered value has been taken.
    /// Dropping the returned future before it completes loses no value and no wake-up.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.shared.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.shared.try_pop() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => notified.await,
            }
        }
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.shared.try_pop()
    }

    /// Like [`recv`](Receiver::recv), but gives up after `timeout`.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        match self.recv_or_stop(tokio::time::sleep(timeout)).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(RecvTimeoutError::Closed),
            Err(CancellationSignal) => Err(RecvTimeoutError::Timeout),
        }
    }

    /// Like [`recv`](Receiver::recv), but returns [`CancellationSignal`] as soon as
    /// `token` is cancelled. A token cancelled before the call means nothing is taken.
    pub async fn recv_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<T>, CancellationSignal> {
        if token.is_cancelled() {
            return Err(CancellationSignal);
        }
        self.recv_or_stop(token.cancelled()).await
    }

    async fn recv_or_stop<S>(&self, stop: S) -> Result<Option<T>, CancellationSignal>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            let notified = self.shared.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.shared.try_pop() {
                Ok(value) => return Ok(Some(value)),
                Err(TryRecvError::Closed) => return Ok(None),
                Err(TryRecvError::Empty) => {}
            }
            tokio::select! {
                biased;
                () = &mut notified => {}
                () = &mut stop => return Err(CancellationSignal),
            }
        }
    }

    /// Runs `f` on every value until end-of-stream, then returns how many values it saw.
    pub async fn consume_each<F, Fut>(self, mut f: F) -> usize
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut consumed = 0;
        while let Some(value) = self.recv().await {
            f(value).await;
            consumed += 1;
        }
        consumed
    }

    /// Receives every remaining value until end-of-stream.
    pub async fn collect(self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.recv().await {
            values.push(value);
        }
        values
    }

    /// Closes the channel from the receiving side. Values already buffered can still be
    /// received. Returns `true` for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.shared.close("closed by receiver")
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    pub fn stats(&self) -> ChannelStats {
        self.shared.stats()
    }

    pub fn same_channel(&self, other: &Receiver<T>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn is_bound_to(&self, sender: &Sender<T>) -> bool {
        Arc::ptr_eq(&self.shared, &sender.shared)
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        self.shared.receivers.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        if self.shared.receivers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.close("last receiver dropped");
        }
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("channel", &self.shared.label())
            .field("stats", &self.shared.stats())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn single_producer_order_is_preserved(values in proptest::collection::vec(any::<u32>(), 0..200), capacity in 1usize..8) {
            let received = runtime().block_on(async {
                let (sender, receiver) = channel(capacity);
                let expected = values.clone();
                let producer = tokio::spawn(async move {
                    for value in expected {
                        sender.send(value).await.unwrap();
                    }
                });
                let received = receiver.collect().await;
                producer.await.unwrap();
                received
            });
            prop_assert_eq!(received, values);
        }

        #[test]
        fn buffer_never_exceeds_capacity(count in 0usize..300, capacity in 1usize..6) {
            let stats = runtime().block_on(async {
                let (sender, receiver) = channel(capacity);
                let producer = tokio::spawn(async move {
                    for i in 0..count {
                        sender.send(i).await.unwrap();
                    }
                });
                let stats_receiver = receiver.clone();
                while receiver.recv().await.is_some() {}
                producer.await.unwrap();
                stats_receiver.stats()
            });
            prop_assert!(stats.high_water <= capacity);
            prop_assert_eq!(stats.sent, count as u64);
            prop_assert_eq!(stats.received, count as u64);
        }
    }
}
