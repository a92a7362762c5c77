//! Provider-layer error taxonomy.
//!
//! Only genuine faults are errors here. Outcome-like conditions (timeout,
//! empty-but-complete results, "nothing new yet", lost subscription) are
//! modeled as enum outcomes in [`crate::poll`] and [`crate::tracking`],
//! not as error variants, so callers cannot confuse them with failures.

/// Provider error codes that indicate invalid credentials regardless of
/// the HTTP status line.
const CREDENTIAL_ERROR_MARKERS: &[&str] = &["invalid_api_key", "invalid credentials"];

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Bad or malformed credentials / client configuration. Fatal: never
    /// retried, surfaced directly to the operator.
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider returned HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider returned a body that could not be decoded.
    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether this error means the credentials are bad.
    ///
    /// An authorization failure aborts variant retries immediately: it is
    /// a configuration problem, not a transient fault.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Configuration(_) => true,
            Self::Upstream { status: 401, .. } => true,
            Self::Upstream { body, .. } => {
                let body = body.to_lowercase();
                CREDENTIAL_ERROR_MARKERS.iter().any(|m| body.contains(m))
            }
            _ => false,
        }
    }

    /// Upstream HTTP status, if this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_401_is_an_auth_failure() {
        let err = ProviderError::Upstream {
            status: 401,
            body: "unauthorized".into(),
        };
        assert!(err.is_auth_failure());
    }

    #[test]
    fn credential_error_code_is_an_auth_failure_despite_status() {
        let err = ProviderError::Upstream {
            status: 400,
            body: r#"{"error":"invalid_api_key"}"#.into(),
        };
        assert!(err.is_auth_failure());
    }

    #[test]
    fn plain_500_is_not_an_auth_failure() {
        let err = ProviderError::Upstream {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_auth_failure());
        assert_eq!(err.upstream_status(), Some(500));
    }
}
