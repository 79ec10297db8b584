//! Test helpers shared by the `processing` and `rto` test suites.
//!
//! Tests return `TestResult` and fail through `test_assert!` /
//! `test_assert_eq!` instead of panicking, so a failing HTTP round trip
//! reports what went wrong rather than where it unwound.
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;

static ARTIFACT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// `"{prefix}-{millis}-{counter}"`, unique across parallel tests.
pub fn generate_unique_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let counter = ARTIFACT_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, millis, counter)
}

/// Writes a model or scaling artifact to a temp file.
///
/// The file is removed when the handle drops; keep it alive while the path
/// is in use.
pub fn write_temp_artifact(contents: &str) -> TestResult<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Assertion failed: {message}")]
    AssertionFailure { message: String },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("HTTP error: {source}")]
    HttpError {
        #[from]
        source: http::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Service error: {message}")]
    Service { message: String },

    #[error("Generic test error: {message}")]
    Generic { message: String },
}

impl TestError {
    pub fn assertion_failure(message: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
        }
    }

    /// Wraps a router, transport or body error from an in-process request
    pub fn service(error: impl std::fmt::Display) -> Self {
        Self::Service {
            message: error.to_string(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

pub type TestResult<T = ()> = Result<T, TestError>;

/// Like `assert!`, but returns a `TestError`
#[macro_export]
macro_rules! test_assert {
    ($condition:expr) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!("assertion failed: {}", stringify!($condition))
            ));
        }
    };
    ($condition:expr, $message:expr $(, $arg:expr)*) => {
        if !($condition) {
            return Err($crate::test_helpers::TestError::assertion_failure(
                format!($message $(, $arg)*)
            ));
        }
    };
}

/// Like `assert_eq!`, but returns a `TestError`
#[macro_export]
macro_rules! test_assert_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!("assertion failed: `(left == right)`\n  left: `{:?}`,\n right: `{:?}`",
                                left_val, right_val)
                    ));
                }
            }
        }
    };
    ($left:expr, $right:expr, $message:expr $(, $arg:expr)*) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    return Err($crate::test_helpers::TestError::assertion_failure(
                        format!($message $(, $arg)*)
                    ));
                }
            }
        }
    };
}

pub mod test_utils {
    use super::*;

    /// JSON request for the in-process router; a body sets the content type
    pub fn build_request(
        method: &str,
        uri: &str,
        body: Option<String>,
    ) -> TestResult<http::Request<String>> {
        let mut builder = http::Request::builder().uri(uri).method(method);

        if body.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }

        Ok(builder.body(body.unwrap_or_default())?)
    }

    pub fn check_status_code(
        actual: http::StatusCode,
        expected: http::StatusCode,
    ) -> TestResult<()> {
        if actual != expected {
            return Err(TestError::assertion_failure(format!(
                "Status code mismatch: expected {}, got {}",
                expected, actual
            )));
        }
        Ok(())
    }

    /// Checks a `{"error": "..."}` response body for a substring
    pub fn check_error_body(body: &str, expected_substring: &str) -> TestResult<()> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        let message = value
            .get("error")
            .and_then(|e| e.as_str())
            .ok_or_else(|| TestError::assertion_failure(format!("No error field in {}", body)))?;
        if !message.contains(expected_substring) {
            return Err(TestError::assertion_failure(format!(
                "Error message '{}' does not contain '{}'",
                message, expected_substring
            )));
        }
        Ok(())
    }
}
