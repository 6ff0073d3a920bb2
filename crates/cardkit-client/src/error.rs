//! Directory client error types.

use serde::Deserialize;

/// Structured error body returned by the directory on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceError {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Errors from directory calls.
#[derive(Debug, thiserror::Error)]
pub enum CardClientError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Non-2xx status with a structured error body.
    #[error("directory {endpoint} returned {status}: {error}")]
    Service {
        endpoint: String,
        status: u16,
        error: ServiceError,
    },

    /// Non-2xx status with an unstructured text body.
    #[error("directory {endpoint} returned {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Non-2xx status with no usable body.
    #[error("directory {endpoint} returned {status}")]
    Status { endpoint: String, status: u16 },

    /// Success status but the body is empty.
    #[error("directory {endpoint} returned no body")]
    NoBody { endpoint: String },

    /// Success status but the body is not JSON.
    #[error("directory {endpoint} returned invalid JSON: {source}")]
    InvalidJson {
        endpoint: String,
        source: serde_json::Error,
    },

    /// JSON that does not have the expected card shape.
    #[error("directory {endpoint} returned an unexpected response model: {source}")]
    InvalidResponseModel {
        endpoint: String,
        source: serde_json::Error,
    },

    /// The access token cannot be carried in an HTTP header.
    #[error("access token is not a valid header value")]
    InvalidToken,

    /// HTTP client construction failed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl CardClientError {
    /// The structured service error, if the directory sent one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } | Self::Http { status, .. } | Self::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display_includes_code() {
        let err = CardClientError::Service {
            endpoint: "GET /cards/x".into(),
            status: 404,
            error: ServiceError {
                code: 30401,
                message: "not found".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "directory GET /cards/x returned 404: not found (code 30401)"
        );
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.service_error().map(|e| e.code), Some(30401));
    }

    #[test]
    fn no_body_has_no_status() {
        let err = CardClientError::NoBody {
            endpoint: "POST /cards".into(),
        };
        assert_eq!(err.status(), None);
        assert!(err.service_error().is_none());
    }
}
