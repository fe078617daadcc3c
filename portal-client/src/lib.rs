//! portal-client: session lifecycle and permission resolution for the
//! staff portal.
//!
//! The portal UI shells call into two components here: the
//! [`services::gateway::ApiGateway`] for every authenticated backend
//! call, and the [`services::permissions::PermissionResolver`] to decide
//! whether a tab may render. Both are wired once through [`Portal::new`].
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use config::Settings;
use reqwest::Client;
use services::events::SessionEvents;
use services::gateway::ApiGateway;
use services::logout::LogoutCoordinator;
use services::permissions::PermissionResolver;
use services::session_store::SessionStore;
use std::sync::Arc;

/// Shared application state bundling the session components.
///
/// Construction order doubles as dependency injection: the store and
/// event channel exist first, the logout coordinator owns them, the
/// gateway owns the coordinator, and the resolver owns the gateway.
/// This breaks the gateway/permissions cycle at construction time.
#[derive(Clone)]
pub struct Portal {
    pub session: Arc<SessionStore>,
    pub events: SessionEvents,
    pub logout: Arc<LogoutCoordinator>,
    pub gateway: Arc<ApiGateway>,
    pub permissions: Arc<PermissionResolver>,
}

impl Portal {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        // Cookie store on: the browser original sent requests with
        // credentials included.
        let client = Client::builder().cookie_store(true).build()?;

        let session = Arc::new(SessionStore::new());
        let events = SessionEvents::new();

        let logout = Arc::new(LogoutCoordinator::new(
            client.clone(),
            settings.api.clone(),
            Arc::clone(&session),
            events.clone(),
        ));

        let gateway = Arc::new(ApiGateway::new(
            client.clone(),
            settings.api.clone(),
            Arc::clone(&session),
            Arc::clone(&logout),
            events.clone(),
        ));

        let permissions = Arc::new(PermissionResolver::new(
            client,
            settings.api,
            Arc::clone(&gateway),
            Arc::clone(&session),
        ));

        Ok(Self {
            session,
            events,
            logout,
            gateway,
            permissions,
        })
    }
}
