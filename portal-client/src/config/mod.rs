use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the portal backend (browser-equivalent origin).
    pub base_url: String,
    /// Primary logout notification endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Fallback logout endpoint attempted when the primary fails.
    #[serde(default = "default_fallback_logout_path")]
    pub fallback_logout_path: String,
    /// RBAC listing endpoint returning every user's grant set.
    #[serde(default = "default_rbac_users_path")]
    pub rbac_users_path: String,
    /// Per-resource access-check endpoint.
    #[serde(default = "default_access_check_path")]
    pub access_check_path: String,
    /// Delay before the post-logout redirect event is emitted, so any
    /// caller error handling for the triggering request can run first.
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
    /// TTL of the cached permission grant set.
    #[serde(default = "default_permission_ttl_secs")]
    pub permission_ttl_secs: u64,
}

fn default_logout_path() -> String {
    "/api/auth/logout".to_string()
}

fn default_fallback_logout_path() -> String {
    "/api/logout".to_string()
}

fn default_rbac_users_path() -> String {
    "/api/rbac/users".to_string()
}

fn default_access_check_path() -> String {
    "/api/rbac/check-access".to_string()
}

fn default_redirect_delay_ms() -> u64 {
    100
}

fn default_permission_ttl_secs() -> u64 {
    300
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    // Check if we're already in portal-client directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("portal-client") {
        base_path.join("config")
    } else {
        base_path.join("portal-client").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
