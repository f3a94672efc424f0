use std::convert::Infallible;
use thiserror::Error;

/// Why a retried operation did not produce a value.
///
/// `Operation` carries the failure of the last attempt exactly as the
/// operation returned it; nothing is wrapped or converted along the way.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E, O = Infallible> {
    #[error("{0}")]
    Operation(E),
    #[error("retry observer aborted: {0}")]
    Observer(O),
    #[error("no attempts permitted: max_retries is 0")]
    NoAttempts,
}

impl<E, O> RetryError<E, O> {
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_no_attempts(&self) -> bool {
        matches!(self, Self::NoAttempts)
    }
}

/// Notified after every failed attempt, including the last one.
///
/// Returning `Err` stops the retry loop on the spot: no further attempts and
/// no backoff, and the observer's error is what the caller gets back.
#[allow(clippy::module_name_repetitions)]
pub trait OnRetry<E> {
    type Error;
    fn on_retry(&mut self, attempt: u32, error: &E) -> Result<(), Self::Error>;
}

impl<E, O, F> OnRetry<E> for F
where
    F: FnMut(u32, &E) -> Result<(), O>,
{
    type Error = O;

    fn on_retry(&mut self, attempt: u32, error: &E) -> Result<(), O> {
        self(attempt, error)
    }
}

/// Observer for when nobody is listening.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl<E> OnRetry<E> for NoopObserver {
    type Error = Infallible;

    fn on_retry(&mut self, _attempt: u32, _error: &E) -> Result<(), Infallible> {
        Ok(())
    }
}
