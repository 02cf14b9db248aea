use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum ScopeError {
    /// A child task panicked. Reported once every other child has ended.
    #[error("A task of the scope failed: {0}")]
    Join(#[from] JoinError),
}

pub type ScopeResult<T> = Result<T, ScopeError>;
