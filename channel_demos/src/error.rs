use bounded_channel::ClosedChannelError;
use task_scope::ScopeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("A producer sent on a closed channel")]
    ChannelClosed,
    #[error("Invalid demo configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl<T> From<ClosedChannelError<T>> for DemoError {
    fn from(_: ClosedChannelError<T>) -> Self {
        Self::ChannelClosed
    }
}

pub type DemoResult<T> = Result<T, DemoError>;
