use task_scope::TaskScope;
use tracing::info_span;

use crate::{config::HelloConfig, error::DemoResult, transcript::Transcript};

/// Launches "World!" and "Moon!" after their delays, writes "Hello," right away, and
/// returns only once both launched tasks are done.
pub async fn hello(config: HelloConfig, transcript: &Transcript) -> DemoResult<()> {
    let mut scope = TaskScope::<()>::with_span(info_span!("hello"));

    for (delay, word) in [(config.world_delay, "World!"), (config.moon_delay, "Moon!")] {
        let transcript = transcript.clone();
        scope.spawn(async move {
            tokio::time::sleep(delay).await;
            transcript.line(word).await;
        });
    }
    transcript.line("Hello,").await;

    scope.join().await?;
    Ok(())
}
