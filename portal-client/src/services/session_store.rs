use crate::models::SessionRecord;
use secrecy::{ExposeSecret, Secret};
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    token: Option<Secret<String>>,
    session: Option<SessionRecord>,
}

/// Client-side credential storage: one token slot and one session-record
/// slot, the analogue of the portal's two fixed storage keys.
///
/// Shared via `Arc`; interior mutability so any component can read or
/// clear it. `clear` removes both slots under a single write lock so no
/// reader ever observes a session record without its token or vice versa.
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut inner = self.inner.write().expect("session store lock poisoned");
        inner.token = Some(Secret::new(token.into()));
    }

    pub fn token(&self) -> Option<String> {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.token.as_ref().map(|t| t.expose_secret().clone())
    }

    pub fn set_session(&self, record: SessionRecord) {
        let mut inner = self.inner.write().expect("session store lock poisoned");
        inner.session = Some(record);
    }

    pub fn session(&self) -> Option<SessionRecord> {
        let inner = self.inner.read().expect("session store lock poisoned");
        inner.session.clone()
    }

    pub fn session_email(&self) -> Option<String> {
        self.session().map(|record| record.email)
    }

    /// Remove token and session record atomically.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("session store lock poisoned");
        inner.token = None;
        inner.session = None;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
