use std::time::Duration;

use sync_tools::{wrap, Wrapped};
use task_scope::{spawn_fan_out, TaskScope, WorkerReport};
use tracing::info_span;

use crate::{
    config::FanOutConfig,
    error::{DemoError, DemoResult},
    transcript::Transcript,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    /// One report per processor, sorted by processor.
    pub workers: Vec<WorkerReport>,
    /// Every value the processors received, sorted.
    pub received: Vec<u32>,
}

/// One producer sends `0..count`, pausing after each value; `workers` processors share
/// the channel and each value is handled by exactly one of them.
pub async fn fan_out(config: FanOutConfig, transcript: &Transcript) -> DemoResult<FanOutReport> {
    config.validate()?;
    let span = info_span!(
        "fan_out",
        count = config.count,
        capacity = config.capacity,
        workers = config.workers
    );

    let mut producers = TaskScope::<DemoResult<()>>::with_span(span.clone());
    let receiver = {
        let count = config.count;
        let send_delay = config.send_delay;
        producers.produce(config.capacity, move |sender| async move {
            for value in 0..count {
                sender.send(value).await?;
                if send_delay > Duration::ZERO {
                    tokio::time::sleep(send_delay).await;
                }
            }
            Ok::<_, DemoError>(())
        })
    };

    let received: Wrapped<Vec<u32>> = wrap!(Vec::with_capacity(config.count as usize));
    let mut processors = TaskScope::with_span(span);
    {
        let transcript = transcript.clone();
        let received = received.clone();
        spawn_fan_out(&mut processors, &receiver, config.workers, move |worker, value| {
            let transcript = transcript.clone();
            let received = received.clone();
            async move {
                transcript
                    .line(format!("Processor #{worker} received {value}"))
                    .await;
                received.lock().await.push(value);
            }
        });
    }
    drop(receiver);

    let mut workers: Vec<_> = processors
        .join()
        .await?
        .into_iter()
        .map(|ended| ended.output)
        .collect();
    workers.sort_by_key(|report| report.worker);

    for ended in producers.join().await? {
        ended.output?;
    }

    let mut received = received.lock().await.clone();
    received.sort_unstable();
    Ok(FanOutReport { workers, received })
}
