/// Wraps a value into a [`Wrapped`](crate::Wrapped), ready to be cloned into several tasks.
///
/// ```rust
/// use sync_tools::{wrap, Wrapped};
///
/// let counter: Wrapped<usize> = wrap!(0);
/// assert_eq!(std::sync::Arc::strong_count(&counter), 1);
/// ```
#[macro_export]
macro_rules! wrap {
    ($name:expr) => {
        std::sync::Arc::new(tokio::sync::Mutex::new($name))
    };
}
