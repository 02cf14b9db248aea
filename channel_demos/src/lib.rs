//! # Channel Demos
//! Four small demonstrations of bounded channels and task scopes:
//!
//! - [`squares`]: one producer, one consumer, explicit close.
//! - [`fan_in`]: two tickers writing into one channel, cancelled after a few values.
//! - [`fan_out`]: one producer feeding a pool of processors.
//! - [`hello`]: a scope waiting for the two tasks it launched.
//!
//! Every demo writes its output lines to a [`Transcript`] and returns what it observed,
//! so the binary can print it and the tests can check it.

pub mod config;
pub mod error;
pub mod fan_in;
pub mod fan_out;
pub mod hello;
pub mod squares;
pub mod transcript;

pub use error::{DemoError, DemoResult};
pub use transcript::Transcript;
