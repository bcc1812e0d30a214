use thiserror::Error;

/// Failures crossing the distance-provider boundary.
///
/// `Timeout` and `Unavailable` are transient and worth a bounded retry;
/// `AddressNotFound` and `NoRoute` are definitive answers about the input
/// and must never be retried or papered over with a fallback fee.
#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("address could not be resolved: {0}")]
    AddressNotFound(String),

    #[error("no driving route between the given points")]
    NoRoute,

    #[error("distance provider timed out")]
    Timeout,

    #[error("distance provider unavailable: {0}")]
    Unavailable(String),
}

impl DistanceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable(_))
    }
}
