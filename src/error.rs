//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// Failure of one remote read, as recorded on its cache entry.
///
/// Cloneable because every subscriber of the key observes the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Network or endpoint failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<HttpError> for QueryError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode(msg) => QueryError::Decode(msg),
            #[cfg(feature = "http")]
            HttpError::Reqwest(re) if re.is_decode() => QueryError::Decode(re.to_string()),
            other => QueryError::Transport(other.to_string()),
        }
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        QueryError::Decode(err.to_string())
    }
}

/// Field-level parse failures (chart samples, ticker records).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error("invalid number in `{field}`: {value}")]
    Number { field: &'static str, value: String },

    #[error("unknown interval: {0}")]
    Interval(String),
}

/// A save/remove write that did not go through.
#[derive(Error, Debug)]
#[error("{action} failed: {source}")]
pub struct MutationError {
    /// Human-readable action, e.g. `save BTC`.
    pub action: String,
    #[source]
    pub source: HttpError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_http_error_maps_to_decode_query_error() {
        let err: QueryError = HttpError::Decode("expected `tickers`".into()).into();
        assert_eq!(err, QueryError::Decode("expected `tickers`".into()));
    }

    #[test]
    fn test_status_errors_map_to_transport() {
        let err: QueryError = HttpError::ServerError {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, QueryError::Transport(msg) if msg.contains("502")));
    }

    #[test]
    fn test_mutation_error_message_names_action() {
        let err = MutationError {
            action: "save BTC".into(),
            source: HttpError::Timeout,
        };
        assert_eq!(err.to_string(), "save BTC failed: Timeout");
    }
}
