use http::StatusCode;
use thiserror::Error;

/// Errors surfaced on the HTTP API. All are local and non-fatal; the
/// caller decides whether to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or missing request data
    #[error("{0}")]
    InvalidInput(String),

    /// Wrong verb on a known route
    #[error("Method Not Supported")]
    MethodNotSupported,

    /// Request arrived after draining began
    #[error("Service is shutting down")]
    Unavailable,
}

impl ApiError {
    /// HTTP status for this error. Wrong-method and draining both answer
    /// 404, never 405 or 503: the legacy surface worked that way and
    /// callers depend on it.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotSupported | ApiError::Unavailable => StatusCode::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = ApiError::InvalidInput("missing password field".to_string());
        assert_eq!(format!("{}", err), "missing password field");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_method_not_supported_maps_to_404() {
        let err = ApiError::MethodNotSupported;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(format!("{}", err).contains("Method Not Supported"));
    }

    #[test]
    fn test_unavailable_maps_to_404() {
        // Legacy compatibility: draining answers 404, not 503
        let err = ApiError::Unavailable;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(format!("{}", err).contains("shutting down"));
    }

    #[test]
    fn test_error_debug() {
        let err = ApiError::InvalidInput("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("InvalidInput"));
        assert!(debug_str.contains("test"));
    }
}
