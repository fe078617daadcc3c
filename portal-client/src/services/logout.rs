use crate::config::ApiSettings;
use crate::services::events::{SessionEvent, SessionEvents};
use crate::services::session_store::SessionStore;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Single-flight session teardown.
///
/// Every logout trigger in the process funnels through one coordinator
/// instance. Concurrent triggers (several in-flight requests all
/// discovering an expired token at once) share one teardown future, so
/// the backend is notified once, storage is cleared once, and exactly
/// one redirect event is emitted per session.
pub struct LogoutCoordinator {
    client: Client,
    settings: ApiSettings,
    store: Arc<SessionStore>,
    events: SessionEvents,
    in_flight: Mutex<Option<Shared<BoxFuture<'static, ()>>>>,
}

impl LogoutCoordinator {
    pub fn new(
        client: Client,
        settings: ApiSettings,
        store: Arc<SessionStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            client,
            settings,
            store,
            events,
            in_flight: Mutex::new(None),
        }
    }

    /// Run the teardown, or await the one already running.
    ///
    /// Never fails: server notification is best-effort and every
    /// internal error is logged and swallowed, because teardown must
    /// complete regardless.
    pub async fn logout(self: &Arc<Self>) {
        let teardown = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let this = Arc::clone(self);
                    let teardown = async move { this.teardown().await }.boxed().shared();
                    *slot = Some(teardown.clone());
                    teardown
                }
            }
        };

        teardown.await;
    }

    async fn teardown(self: Arc<Self>) {
        tracing::info!("session teardown started");

        self.notify_backend().await;
        self.store.clear();

        // Give the caller that triggered the teardown a chance to run
        // its own error handling before the shell navigates away.
        tokio::time::sleep(Duration::from_millis(self.settings.redirect_delay_ms)).await;
        self.events.emit(SessionEvent::RedirectToRoot);

        // Release the slot so a future session can log out fresh.
        let mut slot = self.in_flight.lock().await;
        *slot = None;
    }

    /// Best-effort logout notification: primary endpoint first, fallback
    /// on any failure, and proceed even when both fail.
    async fn notify_backend(&self) {
        let primary = format!("{}{}", self.settings.base_url, self.settings.logout_path);
        match self.client.post(&primary).send().await {
            Ok(response) if response.status().is_success() => return,
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    url = %primary,
                    "primary logout endpoint rejected notification, trying fallback"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %primary,
                    "primary logout notification failed, trying fallback"
                );
            }
        }

        let fallback = format!(
            "{}{}",
            self.settings.base_url, self.settings.fallback_logout_path
        );
        match self.client.post(&fallback).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    url = %fallback,
                    "fallback logout endpoint rejected notification, proceeding with teardown"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %fallback,
                    "fallback logout notification failed, proceeding with teardown"
                );
            }
        }
    }
}
