use std::future::Future;

use bounded_channel::{ChannelBuilder, Producer, ProducerGroup, Receiver};
use tracing::debug;

use crate::{errors::ScopeResult, task_scope::TaskScope};

/// What one fan-out worker did before the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub processed: usize,
}

/// Spawns `workers` consumers into `scope`, all reading from `receiver`.
///
/// Each value goes to whichever worker is ready first; nothing balances the load. A
/// worker stops at end-of-stream, or when the scope is cancelled, and reports how many
/// values it handled.
pub fn spawn_fan_out<T, F, Fut>(
    scope: &mut TaskScope<WorkerReport>,
    receiver: &Receiver<T>,
    workers: usize,
    handler: F,
) where
    T: Send + 'static,
    F: Fn(usize, T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    for worker in 0..workers {
        let receiver = receiver.clone();
        let handler = handler.clone();
        scope.spawn_cancellable(move |token| async move {
            let mut processed = 0;
            while let Ok(Some(value)) = receiver.recv_cancellable(&token).await {
                handler(worker, value).await;
                processed += 1;
            }
            debug!(worker, processed, "fan-out worker done");
            WorkerReport { worker, processed }
        });
    }
}

/// Consumes `receiver` with `workers` concurrent workers and waits for all of them.
/// Reports come back sorted by worker.
pub async fn fan_out<T, F, Fut>(
    receiver: Receiver<T>,
    workers: usize,
    handler: F,
) -> ScopeResult<Vec<WorkerReport>>
where
    T: Send + 'static,
    F: Fn(usize, T) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut scope = TaskScope::new();
    spawn_fan_out(&mut scope, &receiver, workers, handler);
    drop(receiver);

    let mut reports: Vec<_> = scope
        .join()
        .await?
        .into_iter()
        .map(|ended| ended.output)
        .collect();
    reports.sort_by_key(|report| report.worker);
    Ok(reports)
}

/// Spawns `producers` tasks into `scope`, all writing into one new channel of `capacity`,
/// and returns its receiving end.
///
/// `factory` builds each producer's future from its [`Producer`] handle; the handle's
/// `index` tells producers apart. The channel is closed when the last producer finishes,
/// whether by calling `finish`, by returning, or by being aborted.
pub fn fan_in<T, Output, F, Fut>(
    scope: &mut TaskScope<Output>,
    capacity: usize,
    producers: usize,
    factory: F,
) -> Receiver<T>
where
    T: Send + 'static,
    Output: Send + 'static,
    F: Fn(Producer<T>) -> Fut,
    Fut: Future<Output = Output> + Send + 'static,
{
    let (sender, receiver) = ChannelBuilder::new(capacity)
        .span(scope.span().clone())
        .build();
    let group = ProducerGroup::new(sender, producers);
    while let Some(producer) = group.producer() {
        scope.spawn(factory(producer));
    }
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounded_channel::channel;
    use std::{collections::HashSet, time::Duration};
    use sync_tools::{wrap, Wrapped};
    use tokio::time::sleep;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_hands_each_value_to_one_worker() {
        let (sender, receiver) = channel(3);
        let producer = tokio::spawn(async move {
            for i in 0..100u32 {
                sender.send(i).await.unwrap();
            }
        });

        let seen: Wrapped<Vec<u32>> = wrap!(Vec::new());
        let reports = {
            let seen = seen.clone();
            fan_out(receiver, 10, move |_, value| {
                let seen = seen.clone();
                async move { seen.lock().await.push(value) }
            })
            .await
            .unwrap()
        };
        producer.await.unwrap();

        assert_eq!(reports.len(), 10);
        assert_eq!(reports.iter().map(|r| r.processed).sum::<usize>(), 100);
        assert!(reports.iter().enumerate().all(|(i, r)| r.worker == i));

        let seen = seen.lock().await;
        assert_eq!(seen.len(), 100);
        let distinct: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(distinct, (0..100).collect());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_workers_stop_on_cancel() {
        let (_sender, receiver) = channel::<u32>(3);
        let mut scope = TaskScope::new();
        spawn_fan_out(&mut scope, &receiver, 4, |_, _| async {});

        sleep(Duration::from_millis(10)).await;
        scope.cancel();
        let ended = scope.join().await.unwrap();
        assert_eq!(ended.len(), 4);
        assert!(ended.iter().all(|t| t.output.processed == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_in_interleaves_producers_and_closes_once() {
        let mut scope = TaskScope::new();
        let receiver = fan_in(&mut scope, 2, 3, |producer| async move {
            for round in 0..4usize {
                sleep(Duration::from_millis(10 * (producer.index() as u64 + 1))).await;
                producer.send((producer.index(), round)).await.unwrap();
            }
        });

        let received = receiver.collect().await;
        scope.join().await.unwrap();

        assert_eq!(received.len(), 12);
        for index in 0..3 {
            let rounds: Vec<_> = received
                .iter()
                .filter(|(producer, _)| *producer == index)
                .map(|(_, round)| *round)
                .collect();
            assert_eq!(rounds, vec![0, 1, 2, 3]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_in_stays_open_while_a_producer_runs() {
        let mut scope = TaskScope::new();
        let receiver = fan_in(&mut scope, 4, 2, |producer| async move {
            if producer.index() == 1 {
                sleep(Duration::from_millis(100)).await;
            }
            producer.send(producer.index()).await.unwrap();
            producer.finish()
        });

        assert_eq!(receiver.recv().await, Some(0));
        assert!(!receiver.is_closed());
        assert_eq!(receiver.recv().await, Some(1));
        assert_eq!(receiver.recv().await, None);

        let mut closers: Vec<_> = scope.join().await.unwrap().into_iter().map(|t| t.output).collect();
        closers.sort_unstable();
        assert_eq!(closers, vec![false, true]);
    }
}
