//! # Sync Tools
//! Small helpers to share state between tokio tasks and to count tasks down to
//! completion.

mod latch;
mod macros;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use latch::CompletionLatch;

/// State shared between tasks behind an async mutex. Build one with [`wrap!`].
pub type Wrapped<T> = Arc<Mutex<T>>;
