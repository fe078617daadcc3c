use thiserror::Error;

/// Failure taxonomy for authenticated calls made through the gateway.
///
/// These are the only errors the gateway surfaces to callers. Logout
/// teardown failures are logged and swallowed internally and never
/// appear here.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No token exists in the session store. The gateway has already
    /// emitted a redirect-to-root event by the time the caller sees
    /// this, so callers must not assume continued page life.
    #[error("No authentication token found")]
    MissingToken,

    /// The stored token is expired, either detected locally from its
    /// payload or signaled by a 401 response. Fatal for this request;
    /// callers must not retry. Logout teardown runs in the background.
    #[error("Token expired")]
    TokenExpired,

    /// Transport-level failure (DNS, connection refused, TLS). The
    /// original error is preserved as the source; the display string
    /// carries enough context to diagnose without the source chain.
    #[error(
        "{method} {url} failed: {source}. Check network connectivity and the API server's CORS configuration"
    )]
    Transport {
        method: reqwest::Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GatewayError::MissingToken | GatewayError::TokenExpired)
    }
}
