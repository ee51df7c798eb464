//! Error types for the Eventio network client.
//!
//! # Design
//! Each concern gets its own enum: configuration at startup, hook failures,
//! transport failures, and token store writes. `ApiError` is what callers of
//! `NetworkProvider::request` see. It keeps before-hook and after-hook
//! failures apart because only the latter happen after a network call has
//! already completed, and it keeps both apart from transport failures and
//! non-2xx statuses.

use crate::http::HttpResponse;

/// Fatal startup misconfiguration. No client is built when this occurs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {0} environment variable")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("base URL must not be empty")]
    EmptyBaseUrl,
}

/// Failure raised by a before- or after-request hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// No access token is stored and the client requires one.
    #[error("authentication required: no token stored")]
    AuthRequired,

    /// The hook panicked; the payload message is kept when it is a string.
    #[error("hook panicked: {0}")]
    Panicked(String),

    #[error("token store write failed: {0}")]
    Store(#[from] TokenStoreError),

    #[error("{0}")]
    Message(String),
}

impl HookError {
    pub fn msg(message: impl Into<String>) -> Self {
        HookError::Message(message.into())
    }
}

/// Network-level failure reported by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors returned by `NetworkProvider::request` and the typed API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A before-request hook failed. Nothing was sent.
    #[error("before-request hook #{index} failed: {source}")]
    BeforeHook {
        index: usize,
        #[source]
        source: HookError,
    },

    /// An after-request hook failed. The network call completed; `response`
    /// is the last value produced before the failing hook.
    #[error("after-request hook #{index} failed: {source}")]
    AfterHook {
        index: usize,
        #[source]
        source: HookError,
        response: Box<HttpResponse>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session refresh was asked for with no refresh token stored.
    /// Nothing was sent.
    #[error("no refresh token stored; log in first")]
    MissingRefreshToken,

    /// The server answered with a non-2xx status. After-request hooks have
    /// already run. Non-JSON bodies are kept as a JSON string.
    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// The call needs a token the store does not have. Never set once a
    /// response has arrived.
    pub fn is_auth_required(&self) -> bool {
        matches!(
            self,
            ApiError::MissingRefreshToken
                | ApiError::BeforeHook {
                    source: HookError::AuthRequired,
                    ..
                }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::AfterHook { response, .. } => Some(response.status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_status_and_body() {
        let err = ApiError::Http {
            status: 401,
            body: serde_json::json!({"error": "expired"}),
        };
        assert_eq!(err.to_string(), r#"HTTP 401: {"error":"expired"}"#);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn auth_required_is_detected_only_before_dispatch() {
        let err = ApiError::BeforeHook {
            index: 1,
            source: HookError::AuthRequired,
        };
        assert!(err.is_auth_required());
        assert!(ApiError::MissingRefreshToken.is_auth_required());

        let err = ApiError::AfterHook {
            index: 0,
            source: HookError::AuthRequired,
            response: Box::new(HttpResponse::new(200)),
        };
        assert!(!err.is_auth_required());
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn transport_errors_carry_no_status() {
        let err = ApiError::from(TransportError::Connect("refused".to_string()));
        assert!(!err.is_auth_required());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn config_error_names_the_variable() {
        assert_eq!(
            ConfigError::Missing("EVENTIO_API_KEY").to_string(),
            "missing EVENTIO_API_KEY environment variable"
        );
    }
}
