use channel_demos::{
    config::{Cli, Command},
    fan_in::fan_in,
    fan_out::fan_out,
    hello::hello,
    squares::squares,
    DemoResult, Transcript,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> DemoResult<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let transcript = Transcript::new(true);
    match cli.command {
        Command::Squares(args) => {
            let received = squares(args.into(), &transcript).await?;
            info!(received = received.len(), "squares demo finished");
        }
        Command::FanIn(args) => {
            let received = fan_in(args.into(), &transcript).await?;
            info!(received = received.len(), "fan-in demo finished");
        }
        Command::FanOut(args) => {
            let report = fan_out(args.into(), &transcript).await?;
            for worker in &report.workers {
                info!(worker = worker.worker, processed = worker.processed, "processor done");
            }
            info!(received = report.received.len(), "fan-out demo finished");
        }
        Command::Hello(args) => {
            hello(args.into(), &transcript).await?;
            info!("hello demo finished");
        }
    }
    Ok(())
}
