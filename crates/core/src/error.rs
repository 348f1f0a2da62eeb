//! Unified error types for marketdeck.
//!
//! The enum is `Clone` so that single-flight callers awaiting the same
//! network attempt can each receive the failure.

/// Unified error types for the marketdeck retrieval layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Network fetch failed and no usable stale record was available.
    /// This is the only variant that escapes `fetch_with_cache`.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// HTTP error response (transport error or non-2xx status).
    #[error("HTTP_ERROR: {0}")]
    Http(String),

    /// Response body could not be parsed as structured data.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Response body exceeded the configured size limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Database operation failed. Read/write faults on the durable
    /// store are absorbed where they occur; this surfaces only from
    /// opening the store.
    #[error("STORE_ERROR: {0}")]
    Store(String),
}

impl From<tokio_rusqlite::rusqlite::Error> for Error {
    fn from(err: tokio_rusqlite::rusqlite::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            other => Error::Store(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>) -> Self {
        Error::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FetchFailed("status 503".to_string());
        assert!(err.to_string().contains("FETCH_FAILED"));
        assert!(err.to_string().contains("status 503"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::Http("status 404".to_string());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
