pub mod config;
pub mod retryable;
pub mod try_again;

pub use config::{ConfigError, RetryConfig};
pub use retryable::{NoopObserver, OnRetry, RetryError};
pub use try_again::{execute, retry, retry_notify};
