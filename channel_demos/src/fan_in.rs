use std::sync::Arc;

use task_scope::TaskScope;
use tracing::{debug, info_span};

use crate::{config::FanInConfig, error::DemoResult, transcript::Transcript};

/// Every ticker sends its message once per period into one shared channel. The consumer
/// takes the first `take` values, then cancels the tickers and waits for them to stop.
///
/// Returns the values in the order they were received.
pub async fn fan_in(config: FanInConfig, transcript: &Transcript) -> DemoResult<Vec<String>> {
    config.validate()?;
    let span = info_span!("fan_in", capacity = config.capacity, take = config.take);
    let mut scope = TaskScope::<()>::with_span(span.clone());

    let tickers = Arc::new(config.tickers);
    let token = scope.token();
    let receiver = task_scope::fan_in(&mut scope, config.capacity, tickers.len(), {
        let tickers = tickers.clone();
        move |producer| {
            let ticker = tickers[producer.index()].clone();
            let token = token.clone();
            async move {
                loop {
                    tokio::select! {
                        () = token.cancelled() => break,
                        () = tokio::time::sleep(ticker.period) => {}
                    }
                    if producer
                        .sender()
                        .send_cancellable(ticker.message.clone(), &token)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                debug!(ticker = %ticker.message, "ticker stopped");
            }
        }
    });

    let mut received = Vec::with_capacity(config.take);
    while received.len() < config.take {
        match receiver.recv().await {
            Some(message) => {
                transcript.line(message.as_str()).await;
                received.push(message);
            }
            None => break,
        }
    }

    scope.cancel();
    scope.join().await?;
    Ok(received)
}
