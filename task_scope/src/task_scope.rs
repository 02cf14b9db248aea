use std::future::Future;

use bounded_channel::{ChannelBuilder, Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn, Instrument, Span};

use crate::errors::{ScopeError, ScopeResult};

pub type TaskId = u64;

/// The result of a completed task: its output and the id `spawn` returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEnded<Output> {
    pub id: TaskId,
    pub output: Output,
}

/// A group of child tasks sharing one lifetime.
///
/// Every task spawned into the scope is owned by it. [`join`](TaskScope::join) waits for
/// all of them; [`cancel`](TaskScope::cancel) asks them to stop through the scope's
/// cancellation token; [`abort`](TaskScope::abort) stops them without asking. A scope
/// dropped with tasks still running cancels its token and aborts them, so no task outlives
/// the scope that spawned it.
///
/// The scope logs under the span it was given, and so do its tasks.
pub struct TaskScope<Output: Send + 'static> {
    tasks: JoinSet<(TaskId, Output)>,
    token: CancellationToken,
    span: Span,
    next_id: TaskId,
}

impl<Output: Send + 'static> Default for TaskScope<Output> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Output: Send + 'static> TaskScope<Output> {
    /// Returns an empty scope logging under the current span.
    pub fn new() -> Self {
        Self::with_span(Span::current())
    }

    pub fn with_span(span: Span) -> Self {
        Self::with_token(CancellationToken::new(), span)
    }

    fn with_token(token: CancellationToken, span: Span) -> Self {
        Self {
            tasks: JoinSet::new(),
            token,
            span,
            next_id: 0,
        }
    }

    /// Returns a new scope cancelled whenever this one is. Cancelling the child does not
    /// touch its parent.
    pub fn child<ChildOutput: Send + 'static>(&self) -> TaskScope<ChildOutput> {
        TaskScope::with_token(self.token.child_token(), self.span.clone())
    }

    /// A clone of the scope's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Number of tasks not joined yet.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawns `future` as a child of the scope and returns its id.
    pub fn spawn<F>(&mut self, future: F) -> TaskId
    where
        F: Future<Output = Output> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks
            .spawn(async move { (id, future.await) }.instrument(self.span.clone()));
        debug!(parent: &self.span, task = id, "task spawned");
        id
    }

    /// Spawns a child that receives the scope's cancellation token, so it can stop on
    /// [`cancel`](TaskScope::cancel).
    pub fn spawn_cancellable<F, Fut>(&mut self, f: F) -> TaskId
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Output> + Send + 'static,
    {
        let future = f(self.token.clone());
        self.spawn(future)
    }

    /// Spawns a producer task writing into a new channel of `capacity` and returns the
    /// receiving end. The channel is closed as soon as the producer's future ends, even if
    /// clones of its sender are still alive.
    pub fn produce<T, F, Fut>(&mut self, capacity: usize, f: F) -> Receiver<T>
    where
        T: Send + 'static,
        F: FnOnce(Sender<T>) -> Fut,
        Fut: Future<Output = Output> + Send + 'static,
    {
        let (sender, receiver) = ChannelBuilder::new(capacity)
            .span(self.span.clone())
            .build();
        let closer = sender.clone();
        let future = f(sender);
        self.spawn(async move {
            let output = future.await;
            closer.close();
            output
        });
        receiver
    }

    /// Cancels the scope's token. Tasks waiting in a cancellable channel operation get a
    /// `CancellationSignal` and are expected to return.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(parent: &self.span, running = self.tasks.len(), "cancelling task scope");
            self.token.cancel();
        }
    }

    /// Aborts every task still running. Aborted tasks are skipped by `join`.
    pub fn abort(&mut self) {
        debug!(parent: &self.span, running = self.tasks.len(), "aborting task scope");
        self.tasks.abort_all();
    }

    /// Waits for the next task to end. Aborted tasks are skipped. Returns `None` once the
    /// scope is empty.
    pub async fn join_next(&mut self) -> Option<ScopeResult<TaskEnded<Output>>> {
        loop {
            match self.tasks.join_next().await? {
                Ok((id, output)) => {
                    debug!(parent: &self.span, task = id, "task ended");
                    return Some(Ok(TaskEnded { id, output }));
                }
                Err(e) if e.is_cancelled() => {
                    debug!(parent: &self.span, "task aborted");
                }
                Err(e) => return Some(Err(ScopeError::Join(e))),
            }
        }
    }

    /// Waits for every task of the scope.
    ///
    /// Outputs are returned in completion order. If a task panics the scope is cancelled,
    /// the remaining tasks are still awaited, and the first failure is returned.
    pub async fn join(mut self) -> ScopeResult<Vec<TaskEnded<Output>>> {
        let mut ended = Vec::with_capacity(self.tasks.len());
        let mut failure = None;
        while let Some(result) = self.join_next().await {
            match result {
                Ok(task) => ended.push(task),
                Err(e) => {
                    error!(parent: &self.span, "task failed: {e}");
                    self.cancel();
                    failure.get_or_insert(e);
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(ended),
        }
    }

    /// Like [`join`](TaskScope::join), but cancels the scope when `token` fires first.
    /// Tasks are still awaited after the cancellation.
    pub async fn join_or_cancel(
        self,
        token: &CancellationToken,
    ) -> ScopeResult<Vec<TaskEnded<Output>>> {
        let scope_token = self.token.clone();
        let join = self.join();
        tokio::pin!(join);
        tokio::select! {
            result = &mut join => return result,
            () = token.cancelled() => scope_token.cancel(),
        }
        join.await
    }
}

impl<Output: Send + 'static> Drop for TaskScope<Output> {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            warn!(
                parent: &self.span,
                abandoned = self.tasks.len(),
                "task scope dropped before join, aborting its tasks"
            );
            self.token.cancel();
            self.tasks.abort_all();
        }
    }
}

/// Runs `f` with a fresh scope, then joins every task it spawned.
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// let ended = task_scope::scoped(|scope| {
///     scope.spawn(async { "world" });
///     scope.spawn(async { "moon" });
/// })
/// .await
/// .unwrap();
/// assert_eq!(ended.len(), 2);
/// # }
/// ```
pub async fn scoped<Output, F>(f: F) -> ScopeResult<Vec<TaskEnded<Output>>>
where
    Output: Send + 'static,
    F: FnOnce(&mut TaskScope<Output>),
{
    let mut scope = TaskScope::new();
    f(&mut scope);
    scope.join().await
}
