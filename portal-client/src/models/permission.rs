use serde::{Deserialize, Serialize};

/// One capability a user holds, as returned by the RBAC listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub id: String,
    pub action: String,
    pub resource: String,
    /// Absent in older backend payloads; treated as active.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// `GET <rbac_users_path>` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RbacUsersResponse {
    pub success: bool,
    pub data: RbacUsersData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RbacUsersData {
    pub users: Vec<RbacUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RbacUser {
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

/// Verdict of an access check, whether decided locally or by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_access: bool,
    pub reason: String,
}

impl AccessDecision {
    pub fn super_admin() -> Self {
        Self {
            has_access: true,
            reason: "super_admin".to_string(),
        }
    }

    pub fn no_permission() -> Self {
        Self {
            has_access: false,
            reason: "no_permission".to_string(),
        }
    }
}

/// `GET <access_check_path>` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessCheckResponse {
    pub success: bool,
    pub data: AccessDecision,
}
