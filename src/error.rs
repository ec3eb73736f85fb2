//! Error types for the Mini App client

use thiserror::Error;

/// Detail string the backend returns once every question is answered.
const TEST_COMPLETED_DETAIL: &str = "Test already completed";

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error! status: {status} ({endpoint})")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Host bridge error: {0}")]
    BridgeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Redirect loop detected after {0} hops")]
    RedirectLoop(usize),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the backend refused a question request because the test is over.
    pub fn is_test_completed(&self) -> bool {
        match self {
            Error::HttpStatus { body, .. } => body.contains(TEST_COMPLETED_DETAIL),
            Error::Unknown(msg) => msg.contains(TEST_COMPLETED_DETAIL),
            _ => false,
        }
    }

    /// HTTP status code if the error came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message shown to the user. Every failure collapses to the same sentence.
    pub fn user_message(&self) -> &'static str {
        "Something went wrong. Please try again later."
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::SerializationError(err.to_string())
        } else {
            Error::ConnectionError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16, body: &str) -> Error {
        Error::HttpStatus {
            endpoint: "/user/1/current-question".to_string(),
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_error_display_http_status() {
        let err = http_error(500, "boom");
        let msg = err.to_string();
        assert!(msg.contains("HTTP error! status: 500"));
        assert!(msg.contains("/user/1/current-question"));
    }

    #[test]
    fn test_error_display_connection_error() {
        let err = Error::ConnectionError("timeout".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Connection error"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_error_display_storage_error() {
        let err = Error::StorageError("locked".to_string());
        assert!(err.to_string().contains("Storage error"));
    }

    #[test]
    fn test_error_display_redirect_loop() {
        let err = Error::RedirectLoop(16);
        assert_eq!(err.to_string(), "Redirect loop detected after 16 hops");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();

        assert!(matches!(err, Error::SerializationError(_)));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_from_serde_yaml() {
        let yaml_err = serde_yaml::from_str::<Vec<i32>>("{ not: [a list").unwrap_err();
        let err: Error = yaml_err.into();

        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn detects_test_completed_detail() {
        let err = http_error(400, r#"{"detail":"Test already completed"}"#);
        assert!(err.is_test_completed());

        let other = http_error(500, r#"{"detail":"Failed to get question"}"#);
        assert!(!other.is_test_completed());

        assert!(!Error::ConnectionError("Test already completed".into()).is_test_completed());
    }

    #[test]
    fn status_is_exposed_only_for_http_errors() {
        assert_eq!(http_error(404, "").status(), Some(404));
        assert_eq!(Error::ConnectionError("x".into()).status(), None);
    }

    #[test]
    fn user_message_does_not_distinguish_failures() {
        let transient = Error::ConnectionError("reset by peer".into());
        let permanent = http_error(404, "not found");
        assert_eq!(transient.user_message(), permanent.user_message());
    }

    #[test]
    fn test_error_all_variants_debug() {
        let variants: Vec<Error> = vec![
            http_error(502, "bad gateway"),
            Error::ConnectionError("conn".to_string()),
            Error::SerializationError("serial".to_string()),
            Error::StorageError("storage".to_string()),
            Error::BridgeError("bridge".to_string()),
            Error::ConfigError("config".to_string()),
            Error::InvalidArgument("arg".to_string()),
            Error::RedirectLoop(3),
            Error::Unknown("unknown".to_string()),
        ];

        for err in variants {
            let debug_str = format!("{:?}", err);
            assert!(!debug_str.is_empty());
        }
    }
}
