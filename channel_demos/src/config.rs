use std::time::Duration;

use bounded_channel::DEFAULT_CAPACITY;
use clap::{builder::RangedU64ValueParser, Args, Parser, Subcommand};

use crate::error::{DemoError, DemoResult};

pub const DEFAULT_LOG_FILTER: &str = "info";

pub const SQUARES_COUNT: u64 = 5;
pub const SQUARES_DELAY_MS: u64 = 1000;
/// Largest count whose square still fits in a `u64`.
pub const SQUARES_MAX_COUNT: u64 = u32::MAX as u64;

pub const FAN_IN_TAKE: usize = 6;
pub const FAN_IN_FAST: (&str, u64) = ("foo", 200);
pub const FAN_IN_SLOW: (&str, u64) = ("BAR!", 500);

pub const FAN_OUT_COUNT: u32 = 100;
pub const FAN_OUT_CAPACITY: usize = 3;
pub const FAN_OUT_WORKERS: usize = 10;
pub const FAN_OUT_SEND_DELAY_MS: u64 = 50;

pub const HELLO_WORLD_DELAY_MS: u64 = 500;
pub const HELLO_MOON_DELAY_MS: u64 = 550;

fn check_capacity(capacity: usize) -> DemoResult<()> {
    if capacity == 0 {
        return Err(DemoError::InvalidConfig("channel capacity must be positive"));
    }
    Ok(())
}

fn positive_capacity() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquaresConfig {
    pub capacity: usize,
    /// Squares of `1..=count` are sent.
    pub count: u64,
    /// Pause of the consumer after each value.
    pub delay: Duration,
}

impl Default for SquaresConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            count: SQUARES_COUNT,
            delay: Duration::from_millis(SQUARES_DELAY_MS),
        }
    }
}

/// A producer sending the same message forever, once per period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    pub message: String,
    pub period: Duration,
}

impl SquaresConfig {
    pub fn validate(&self) -> DemoResult<()> {
        check_capacity(self.capacity)?;
        if self.count > SQUARES_MAX_COUNT {
            return Err(DemoError::InvalidConfig("squares count is too large for u64 squares"));
        }
        Ok(())
    }
}

impl Ticker {
    pub fn new(message: impl Into<String>, period: Duration) -> Self {
        Self {
            message: message.into(),
            period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanInConfig {
    pub capacity: usize,
    /// Number of values received before the tickers are cancelled.
    pub take: usize,
    pub tickers: Vec<Ticker>,
}

impl Default for FanInConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            take: FAN_IN_TAKE,
            tickers: vec![
                Ticker::new(FAN_IN_FAST.0, Duration::from_millis(FAN_IN_FAST.1)),
                Ticker::new(FAN_IN_SLOW.0, Duration::from_millis(FAN_IN_SLOW.1)),
            ],
        }
    }
}

impl FanInConfig {
    pub fn validate(&self) -> DemoResult<()> {
        check_capacity(self.capacity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Values `0..count` are produced.
    pub count: u32,
    pub capacity: usize,
    pub workers: usize,
    /// Pause of the producer after each value.
    pub send_delay: Duration,
}

impl FanOutConfig {
    pub fn validate(&self) -> DemoResult<()> {
        check_capacity(self.capacity)
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            count: FAN_OUT_COUNT,
            capacity: FAN_OUT_CAPACITY,
            workers: FAN_OUT_WORKERS,
            send_delay: Duration::from_millis(FAN_OUT_SEND_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloConfig {
    pub world_delay: Duration,
    pub moon_delay: Duration,
}

impl Default for HelloConfig {
    fn default() -> Self {
        Self {
            world_delay: Duration::from_millis(HELLO_WORLD_DELAY_MS),
            moon_delay: Duration::from_millis(HELLO_MOON_DELAY_MS),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "channel-demos",
    version,
    about = "Producer/consumer, fan-in and fan-out over bounded channels"
)]
pub struct Cli {
    /// Log filter, used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILTER)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One producer sends squares, closes the channel, one consumer prints them.
    Squares(SquaresArgs),
    /// Two tickers share one channel; the consumer takes a few values and cancels them.
    FanIn(FanInArgs),
    /// One producer feeds a pool of processors.
    FanOut(FanOutArgs),
    /// A scope launches two delayed greetings and waits for both.
    Hello(HelloArgs),
}

#[derive(Debug, Args)]
pub struct SquaresArgs {
    #[arg(long, default_value_t = DEFAULT_CAPACITY, value_parser = positive_capacity())]
    pub capacity: usize,
    #[arg(
        long,
        default_value_t = SQUARES_COUNT,
        value_parser = clap::value_parser!(u64).range(..=SQUARES_MAX_COUNT)
    )]
    pub count: u64,
    #[arg(long, default_value_t = SQUARES_DELAY_MS)]
    pub delay_ms: u64,
}

impl From<SquaresArgs> for SquaresConfig {
    fn from(args: SquaresArgs) -> Self {
        Self {
            capacity: args.capacity,
            count: args.count,
            delay: Duration::from_millis(args.delay_ms),
        }
    }
}

#[derive(Debug, Args)]
pub struct FanInArgs {
    #[arg(long, default_value_t = DEFAULT_CAPACITY, value_parser = positive_capacity())]
    pub capacity: usize,
    #[arg(long, default_value_t = FAN_IN_TAKE)]
    pub take: usize,
    #[arg(long, default_value_t = FAN_IN_FAST.1)]
    pub fast_ms: u64,
    #[arg(long, default_value_t = FAN_IN_SLOW.1)]
    pub slow_ms: u64,
}

impl From<FanInArgs> for FanInConfig {
    fn from(args: FanInArgs) -> Self {
        Self {
            capacity: args.capacity,
            take: args.take,
            tickers: vec![
                Ticker::new(FAN_IN_FAST.0, Duration::from_millis(args.fast_ms)),
                Ticker::new(FAN_IN_SLOW.0, Duration::from_millis(args.slow_ms)),
            ],
        }
    }
}

#[derive(Debug, Args)]
pub struct FanOutArgs {
    #[arg(long, default_value_t = FAN_OUT_COUNT)]
    pub count: u32,
    #[arg(long, default_value_t = FAN_OUT_CAPACITY, value_parser = positive_capacity())]
    pub capacity: usize,
    #[arg(long, default_value_t = FAN_OUT_WORKERS)]
    pub workers: usize,
    #[arg(long, default_value_t = FAN_OUT_SEND_DELAY_MS)]
    pub send_delay_ms: u64,
}

impl From<FanOutArgs> for FanOutConfig {
    fn from(args: FanOutArgs) -> Self {
        Self {
            count: args.count,
            capacity: args.capacity,
            workers: args.workers,
            send_delay: Duration::from_millis(args.send_delay_ms),
        }
    }
}

#[derive(Debug, Args)]
pub struct HelloArgs {
    #[arg(long, default_value_t = HELLO_WORLD_DELAY_MS)]
    pub world_ms: u64,
    #[arg(long, default_value_t = HELLO_MOON_DELAY_MS)]
    pub moon_ms: u64,
}

impl From<HelloArgs> for HelloConfig {
    fn from(args: HelloArgs) -> Self {
        Self {
            world_delay: Duration::from_millis(args.world_ms),
            moon_delay: Duration::from_millis(args.moon_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["channel-demos", "squares"]).unwrap();
        assert_eq!(cli.log, DEFAULT_LOG_FILTER);
        match cli.command {
            Command::Squares(args) => assert_eq!(SquaresConfig::from(args), SquaresConfig::default()),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["channel-demos", "fan-in"]).unwrap();
        match cli.command {
            Command::FanIn(args) => assert_eq!(FanInConfig::from(args), FanInConfig::default()),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["channel-demos", "fan-out"]).unwrap();
        match cli.command {
            Command::FanOut(args) => assert_eq!(FanOutConfig::from(args), FanOutConfig::default()),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["channel-demos", "hello"]).unwrap();
        match cli.command {
            Command::Hello(args) => assert_eq!(HelloConfig::from(args), HelloConfig::default()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_arguments_override_defaults() {
        let cli = Cli::try_parse_from([
            "channel-demos",
            "fan-out",
            "--workers",
            "4",
            "--count",
            "20",
            "--send-delay-ms",
            "0",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log, "debug");
        match cli.command {
            Command::FanOut(args) => {
                let config = FanOutConfig::from(args);
                assert_eq!(config.workers, 4);
                assert_eq!(config.count, 20);
                assert_eq!(config.send_delay, Duration::ZERO);
                assert_eq!(config.capacity, FAN_OUT_CAPACITY);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        for command in ["squares", "fan-in", "fan-out"] {
            assert!(Cli::try_parse_from(["channel-demos", command, "--capacity", "0"]).is_err());
        }
        assert!(Cli::try_parse_from(["channel-demos", "fan-out", "--capacity", "1"]).is_ok());
    }

    #[test]
    fn test_squares_count_is_bounded() {
        let too_large = (SQUARES_MAX_COUNT + 1).to_string();
        assert!(Cli::try_parse_from(["channel-demos", "squares", "--count", &too_large]).is_err());

        let largest = SQUARES_MAX_COUNT.to_string();
        let cli = Cli::try_parse_from(["channel-demos", "squares", "--count", &largest]).unwrap();
        match cli.command {
            Command::Squares(args) => assert!(SquaresConfig::from(args).validate().is_ok()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_unusable_configs() {
        let squares = SquaresConfig {
            capacity: 0,
            ..SquaresConfig::default()
        };
        assert!(matches!(squares.validate(), Err(DemoError::InvalidConfig(_))));

        let squares = SquaresConfig {
            count: SQUARES_MAX_COUNT + 1,
            ..SquaresConfig::default()
        };
        assert!(matches!(squares.validate(), Err(DemoError::InvalidConfig(_))));

        let fan_in = FanInConfig {
            capacity: 0,
            ..FanInConfig::default()
        };
        assert!(fan_in.validate().is_err());

        let fan_out = FanOutConfig {
            capacity: 0,
            ..FanOutConfig::default()
        };
        assert!(fan_out.validate().is_err());
        assert!(FanOutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["channel-demos", "fan-sideways"]).is_err());
    }
}
