//! # Task Scope
//! Structured concurrency for tokio tasks, and the fan-out / fan-in patterns built on
//! top of [`bounded_channel`].
//!
//! A [`TaskScope`] owns every task spawned into it. Its exit points never leave a task
//! behind: [`TaskScope::join`] waits for all of them, and dropping a scope that was not
//! joined cancels and aborts what is still running.
//!
//! ```rust
//! use std::time::Duration;
//! use task_scope::TaskScope;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut scope = TaskScope::new();
//!     for i in 0..3u64 {
//!         scope.spawn(async move {
//!             tokio::time::sleep(Duration::from_millis(10 * i)).await;
//!             i * 2
//!         });
//!     }
//!     let mut outputs: Vec<_> = scope.join().await.unwrap().into_iter().map(|t| t.output).collect();
//!     outputs.sort_unstable();
//!     assert_eq!(outputs, vec![0, 2, 4]);
//! }
//! ```

/// This module contains error handling types.
pub mod errors;
/// Fan-out and fan-in helpers.
pub mod fan;
/// The implementation of the task scope.
pub mod task_scope;

pub use errors::{ScopeError, ScopeResult};
pub use fan::{fan_in, fan_out, spawn_fan_out, WorkerReport};
pub use task_scope::{scoped, TaskEnded, TaskId, TaskScope};
