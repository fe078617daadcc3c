use crate::config::ApiSettings;
use crate::models::permission::{AccessCheckResponse, AccessDecision, PermissionGrant, RbacUsersResponse};
use crate::services::gateway::ApiGateway;
use crate::services::session_store::SessionStore;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Accounts that bypass every RBAC and static-table check.
const SUPER_ADMIN_EMAILS: &[&str] = &[
    "arjun@solsticehq.com",
    "meera@solsticehq.com",
    "ops@solsticehq.com",
];

/// Static allow rule for one portal tab.
#[derive(Debug, Clone, Copy)]
enum AllowRule {
    Everyone,
    Emails(&'static [&'static str]),
}

static STATIC_ACCESS_RULES: Lazy<HashMap<&'static str, AllowRule>> = Lazy::new(|| {
    HashMap::from([
        ("tasks", AllowRule::Everyone),
        ("notifications", AllowRule::Everyone),
        ("paperwork", AllowRule::Everyone),
        ("referrals", AllowRule::Everyone),
        (
            "qr-codes",
            AllowRule::Emails(&["frontdesk@solsticehq.com", "meera@solsticehq.com"]),
        ),
        (
            "whatsapp",
            AllowRule::Emails(&["outreach@solsticehq.com", "meera@solsticehq.com"]),
        ),
        (
            "requirements",
            AllowRule::Emails(&["ops@solsticehq.com", "arjun@solsticehq.com"]),
        ),
    ])
});

/// (tab, email) pairs excluded even when the tab's allow rule is a
/// wildcard. Checked before the allow rule.
const STATIC_DENY_RULES: &[(&str, &str)] = &[
    ("referrals", "frontdesk@solsticehq.com"),
    ("notifications", "kiosk@solsticehq.com"),
];

/// Whether the email belongs to the fixed super-admin allow-list.
/// Purely local; never makes a network call.
pub fn is_super_admin(email: Option<&str>) -> bool {
    match email {
        Some(email) => {
            let normalized = email.trim().to_lowercase();
            SUPER_ADMIN_EMAILS.contains(&normalized.as_str())
        }
        None => false,
    }
}

/// Static fallback access table, used when no live permission data is
/// available. Deny rules take precedence over the allow rule, wildcard
/// included; unknown tabs are denied.
pub fn can_access(tab: &str, email: Option<&str>) -> bool {
    if is_super_admin(email) {
        return true;
    }

    let normalized = email.map(|e| e.trim().to_lowercase());

    if let Some(email) = normalized.as_deref() {
        if STATIC_DENY_RULES
            .iter()
            .any(|(denied_tab, denied_email)| *denied_tab == tab && *denied_email == email)
        {
            return false;
        }
    }

    match STATIC_ACCESS_RULES.get(tab) {
        Some(AllowRule::Everyone) => true,
        Some(AllowRule::Emails(allowed)) => normalized
            .as_deref()
            .map(|email| allowed.contains(&email))
            .unwrap_or(false),
        None => false,
    }
}

struct CachedGrants {
    grants: Vec<PermissionGrant>,
    fetched_at: DateTime<Utc>,
}

/// Cache-aware permission decisions for the current user.
///
/// Combines three authority sources: the hardcoded super-admin list,
/// server-fetched permission grants (cached for five minutes), and the
/// static fallback table above. Every operation degrades instead of
/// failing; this resolver never returns an error.
pub struct PermissionResolver {
    client: Client,
    settings: ApiSettings,
    gateway: Arc<ApiGateway>,
    store: Arc<SessionStore>,
    cache: Mutex<Option<CachedGrants>>,
}

impl PermissionResolver {
    pub fn new(
        client: Client,
        settings: ApiSettings,
        gateway: Arc<ApiGateway>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            settings,
            gateway,
            store,
            cache: Mutex::new(None),
        }
    }

    /// The current user's grant set, served from cache while fresh.
    ///
    /// On cache miss the grants are fetched through the gateway and the
    /// cache repopulated. Every failure path (no session email, network
    /// failure, malformed payload) is logged and yields an empty list;
    /// failures are not cached, so the next check retries immediately.
    pub async fn fetch_user_permissions(&self) -> Vec<PermissionGrant> {
        if let Some(grants) = self.cached_grants() {
            return grants;
        }

        let Some(email) = self.store.session_email() else {
            tracing::debug!("no session email, skipping permission fetch");
            return Vec::new();
        };

        match self.fetch_remote(&email).await {
            Ok(grants) => {
                let mut cache = self.cache.lock().expect("permission cache lock poisoned");
                *cache = Some(CachedGrants {
                    grants: grants.clone(),
                    fetched_at: Utc::now(),
                });
                grants
            }
            Err(e) => {
                tracing::warn!(error = %e, "permission fetch failed, treating as no permissions");
                Vec::new()
            }
        }
    }

    /// Drop the cached grant set so the next check refetches. Callers
    /// that mutate permissions server-side should invoke this, or
    /// tolerate up to the TTL of staleness.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().expect("permission cache lock poisoned");
        *cache = None;
    }

    /// Resource-level access check with an explicitly supplied token.
    ///
    /// Super admins short-circuit to allow before any network call;
    /// `require_super_admin` resources deny non-admins without an RBAC
    /// lookup. Everything else defers to the backend's verdict, with any
    /// transport failure or non-2xx response read as no permission.
    pub async fn check_has_access(
        &self,
        email: &str,
        resource: &str,
        token: &str,
        require_super_admin: bool,
    ) -> AccessDecision {
        if is_super_admin(Some(email)) {
            return AccessDecision::super_admin();
        }

        if require_super_admin {
            return AccessDecision::no_permission();
        }

        let url = format!("{}{}", self.settings.base_url, self.settings.access_check_path);
        let result = self
            .client
            .get(&url)
            .query(&[("email", email), ("resource", resource)])
            .bearer_auth(token)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    resource,
                    "access check rejected, denying"
                );
                return AccessDecision::no_permission();
            }
            Err(e) => {
                tracing::warn!(error = %e, resource, "access check failed, denying");
                return AccessDecision::no_permission();
            }
        };

        match response.json::<AccessCheckResponse>().await {
            Ok(body) if body.success => body.data,
            Ok(_) => AccessDecision::no_permission(),
            Err(e) => {
                tracing::warn!(error = %e, resource, "access check payload malformed, denying");
                AccessDecision::no_permission()
            }
        }
    }

    /// Same check resolved against the stored session; missing
    /// credentials deny without a network call.
    pub async fn check_has_access_current(
        &self,
        resource: &str,
        require_super_admin: bool,
    ) -> AccessDecision {
        let (Some(email), Some(token)) = (self.store.session_email(), self.store.token()) else {
            tracing::debug!(resource, "no session for access check, denying");
            return AccessDecision::no_permission();
        };

        self.check_has_access(&email, resource, &token, require_super_admin)
            .await
    }

    /// Tab-level access decision preferring live grants.
    ///
    /// With a non-empty grant list, access requires an active
    /// `(resource: tab, action: "access")` grant. An empty list — a
    /// failed fetch is indistinguishable from a user with zero grants —
    /// falls back to the static table keyed by the session email. The
    /// fall-back-on-empty is a deliberate availability trade-off: a
    /// backend outage must not lock every user out, at the cost of
    /// over-granting whatever the static table allows during the
    /// outage. Do not tighten this to fail-closed without product
    /// sign-off; callers depend on the current semantics.
    pub async fn can_access_rbac(&self, tab: &str) -> bool {
        let grants = self.fetch_user_permissions().await;

        if !grants.is_empty() {
            return grants
                .iter()
                .any(|g| g.resource == tab && g.action == "access" && g.is_active);
        }

        let email = self.store.session_email();
        can_access(tab, email.as_deref())
    }

    fn cached_grants(&self) -> Option<Vec<PermissionGrant>> {
        let cache = self.cache.lock().expect("permission cache lock poisoned");
        let ttl = Duration::seconds(self.settings.permission_ttl_secs as i64);
        cache.as_ref().and_then(|cached| {
            let age = Utc::now().signed_duration_since(cached.fetched_at);
            if age < ttl {
                Some(cached.grants.clone())
            } else {
                None
            }
        })
    }

    async fn fetch_remote(&self, email: &str) -> anyhow::Result<Vec<PermissionGrant>> {
        let response = self.gateway.get(&self.settings.rbac_users_path).await?;

        if !response.status().is_success() {
            bail!("rbac listing returned {}", response.status());
        }

        let body: RbacUsersResponse = response
            .json()
            .await
            .context("failed to parse rbac listing payload")?;

        if !body.success {
            bail!("rbac listing reported failure");
        }

        let grants = body
            .data
            .users
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .map(|user| user.permissions)
            .unwrap_or_default();

        Ok(grants)
    }
}
