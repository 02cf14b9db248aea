use bounded_channel::ClosedChannelError;
use task_scope::TaskScope;
use tracing::{debug, info_span};

use crate::{config::SquaresConfig, error::DemoResult, transcript::Transcript};

/// One producer sends the squares of `1..=count` and closes the channel; the consumer
/// writes every value to the transcript, pausing after each, until end-of-stream.
///
/// Returns the values in the order they were received.
pub async fn squares(config: SquaresConfig, transcript: &Transcript) -> DemoResult<Vec<u64>> {
    config.validate()?;
    let span = info_span!("squares", capacity = config.capacity, count = config.count);
    let mut scope = TaskScope::<Result<(), ClosedChannelError<u64>>>::with_span(span.clone());

    let receiver = {
        let transcript = transcript.clone();
        let count = config.count;
        scope.produce(config.capacity, move |sender| async move {
            for x in 1..=count {
                sender.send(x * x).await?;
            }
            sender.close();
            transcript.line("closed!").await;
            Ok::<_, ClosedChannelError<u64>>(())
        })
    };

    let mut received = Vec::new();
    while let Some(square) = receiver.recv().await {
        transcript.line(square.to_string()).await;
        received.push(square);
        tokio::time::sleep(config.delay).await;
    }
    debug!(parent: &span, received = received.len(), "stream ended");

    for ended in scope.join().await? {
        ended.output?;
    }
    transcript.line("Done!").await;
    Ok(received)
}
