use crate::config::ApiSettings;
use crate::services::events::{SessionEvent, SessionEvents};
use crate::services::logout::LogoutCoordinator;
use crate::services::session_store::SessionStore;
use crate::utils::jwt;
use chrono::Utc;
use portal_core::error::GatewayError;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;

/// Request payload accepted by the gateway.
///
/// The backend takes either JSON or multipart uploads; multipart must
/// reach the transport without a caller-supplied `Content-Type` so the
/// boundary parameter is generated correctly.
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Form),
}

/// Caller-controlled portions of a request. Headers arrive as one
/// canonical `HeaderMap`; the gateway normalizes nothing else.
#[derive(Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Some(RequestBody::Json(body)),
        }
    }

    pub fn multipart(form: Form) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Some(RequestBody::Multipart(form)),
        }
    }
}

/// Authenticated HTTP gateway to the portal backend.
///
/// Every outgoing call goes through [`ApiGateway::request`], which
/// attaches the stored bearer token, refuses calls that are doomed to
/// fail (missing or locally-expired token), and converts a 401 from the
/// server into the same background logout an expired token triggers.
pub struct ApiGateway {
    client: Client,
    settings: ApiSettings,
    store: Arc<SessionStore>,
    logout: Arc<LogoutCoordinator>,
    events: SessionEvents,
}

impl ApiGateway {
    pub fn new(
        client: Client,
        settings: ApiSettings,
        store: Arc<SessionStore>,
        logout: Arc<LogoutCoordinator>,
        events: SessionEvents,
    ) -> Self {
        Self {
            client,
            settings,
            store,
            logout,
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Issue an authenticated request against the backend.
    ///
    /// Returns the raw response unparsed; interpretation of bodies is
    /// the caller's concern. The only status this function interprets
    /// is 401, which it treats exactly like a locally-expired token.
    ///
    /// Errors are [`GatewayError::MissingToken`] (redirect event already
    /// emitted), [`GatewayError::TokenExpired`] (background logout
    /// already triggered, do not retry), or [`GatewayError::Transport`]
    /// wrapping the underlying connection failure with the target URL.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, GatewayError> {
        let Some(token) = self.store.token() else {
            tracing::warn!(path, "authenticated request without a token");
            self.events.emit(SessionEvent::RedirectToRoot);
            return Err(GatewayError::MissingToken);
        };

        if jwt::is_expired(&token, Utc::now()) {
            tracing::info!(path, "token expired locally, triggering logout");
            self.spawn_logout();
            return Err(GatewayError::TokenExpired);
        }

        let url = format!("{}{}", self.settings.base_url, path);

        let mut headers = options.headers;
        // The stored token always wins over a caller-supplied value, and
        // reqwest appends rather than replaces, so drop the caller's
        // header before bearer_auth adds ours.
        headers.remove(AUTHORIZATION);
        if matches!(options.body, Some(RequestBody::Multipart(_))) {
            // The transport must set the multipart boundary itself.
            headers.remove(CONTENT_TYPE);
        }

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(headers)
            .bearer_auth(&token);

        match options.body {
            // json() defaults Content-Type to application/json only when
            // the caller has not set one.
            Some(RequestBody::Json(value)) => builder = builder.json(&value),
            Some(RequestBody::Multipart(form)) => builder = builder.multipart(form),
            None => {}
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "request failed");
            GatewayError::Transport {
                method: method.clone(),
                url: url.clone(),
                source: e,
            }
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(method = %method, url = %url, "server signaled 401, triggering logout");
            self.spawn_logout();
            return Err(GatewayError::TokenExpired);
        }

        Ok(response)
    }

    pub async fn get(&self, path: &str) -> Result<Response, GatewayError> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Response, GatewayError> {
        self.request(Method::POST, path, RequestOptions::json(body))
            .await
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Response, GatewayError> {
        self.request(Method::PUT, path, RequestOptions::json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, GatewayError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Response, GatewayError> {
        self.request(Method::POST, path, RequestOptions::multipart(form))
            .await
    }

    /// Fire-and-forget: the caller gets its error immediately while the
    /// single-flight teardown proceeds in the background.
    fn spawn_logout(&self) {
        let coordinator = Arc::clone(&self.logout);
        tokio::spawn(async move {
            coordinator.logout().await;
        });
    }
}
