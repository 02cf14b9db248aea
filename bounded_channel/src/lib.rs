//! # Bounded Channel
//! A bounded, closable, multi-producer multi-consumer FIFO channel for tokio tasks.
//!
//! ## Overview
//! - **Backpressure**: `send` waits while the channel holds `capacity` values.
//! - **Explicit close**: `close` ends the stream; receivers drain what is buffered and then
//!   get `None`, senders get a [`ClosedChannelError`] carrying back their value.
//! - **Fan-out / fan-in**: both ends are cloneable, and [`ProducerGroup`] closes the channel
//!   once the last of several producers is done.
//! - **Cancellation**: every waiting operation is cancel-safe, and has a variant taking a
//!   `CancellationToken`.
//!
//! ## Usage Example
//! ```rust
//! #[tokio::main]
//! async fn main() {
//!     use bounded_channel::channel;
//!
//!     let (sender, receiver) = channel(3);
//!
//!     tokio::spawn(async move {
//!         for x in 1..=5 {
//!             sender.send(x * x).await.unwrap();
//!         }
//!         sender.close();
//!     });
//!
//!     let mut squares = Vec::new();
//!     while let Some(square) = receiver.recv().await {
//!         squares.push(square);
//!     }
//!     assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! }
//! ```

mod channel;
/// Error types of the channel operations.
pub mod error;
mod group;

pub use channel::{channel, ChannelBuilder, ChannelStats, Receiver, Sender, DEFAULT_CAPACITY};
pub use error::{
    CancellableSendError, CancellationSignal, ClosedChannelError, RecvTimeoutError,
    SendTimeoutError, TryRecvError, TrySendError,
};
pub use group::{Producer, ProducerGroup};
pub use tokio_util::sync::CancellationToken;
