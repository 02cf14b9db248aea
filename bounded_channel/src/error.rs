use thiserror::Error;

/// Returned by `send` when the channel has been closed. The rejected value is handed back.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("Sending on a closed channel")]
pub struct ClosedChannelError<T>(pub T);

impl<T> ClosedChannelError<T> {
    /// Takes back the value that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Marker returned by the cancellable operations when the token fired first.
/// Seeing it means the task was asked to stop, not that something went wrong.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("The operation was cancelled")]
pub struct CancellationSignal;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TrySendError<T> {
    #[error("The channel is full")]
    Full(T),
    #[error("Sending on a closed channel")]
    Closed(T),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SendTimeoutError<T> {
    #[error("Timed out waiting for space in the channel")]
    Timeout(T),
    #[error("Sending on a closed channel")]
    Closed(T),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CancellableSendError<T> {
    #[error("Sending on a closed channel")]
    Closed(T),
    #[error("The send was cancelled")]
    Cancelled(T),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
    #[error("The channel is empty")]
    Empty,
    #[error("The channel is closed and drained")]
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RecvTimeoutError {
    #[error("Timed out waiting for a value")]
    Timeout,
    #[error("The channel is closed and drained")]
    Closed,
}

macro_rules! impl_into_inner {
    ($name:ident, $($variant:ident),+) => {
        impl<T> $name<T> {
            /// Takes back the value that could not be sent.
            pub fn into_inner(self) -> T {
                match self {
                    $(Self::$variant(value) => value,)+
                }
            }
        }
    };
}

impl_into_inner!(TrySendError, Full, Closed);
impl_into_inner!(SendTimeoutError, Timeout, Closed);
impl_into_inner!(CancellableSendError, Closed, Cancelled);

impl<T> From<ClosedChannelError<T>> for TrySendError<T> {
    fn from(err: ClosedChannelError<T>) -> Self {
        Self::Closed(err.0)
    }
}

impl<T> From<ClosedChannelError<T>> for SendTimeoutError<T> {
    fn from(err: ClosedChannelError<T>) -> Self {
        Self::Closed(err.0)
    }
}

impl<T> From<ClosedChannelError<T>> for CancellableSendError<T> {
    fn from(err: ClosedChannelError<T>) -> Self {
        Self::Closed(err.0)
    }
}
