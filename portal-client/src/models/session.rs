use serde::{Deserialize, Serialize};

/// User session record persisted alongside the token.
///
/// The portal stores a larger blob client-side; only the email is read
/// here, so unknown fields are tolerated and round-tripped by the
/// storage layer, not by this type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionRecord {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SessionRecord {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}
