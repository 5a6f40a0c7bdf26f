use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    #[default]
    Mock,
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    #[serde(default)]
    pub mode: DataMode,
    /// Simulated round-trip latency of the mock backend
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            mode: DataMode::default(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl DataSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Byte cap for the memory backend
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            quota_bytes: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Store key holding the bearer token
    #[serde(default = "default_token_key")]
    pub token_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub endpoints: EndpointSettings,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_key: default_token_key(),
            timeout_ms: default_timeout_ms(),
            endpoints: EndpointSettings::default(),
        }
    }
}

/// Path templates relative to `base_url`; `${name}` placeholders are filled per request
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointSettings {
    pub kpis: String,
    pub activity: String,
    pub notifications: String,
    pub notifications_read: String,
    pub devices: String,
    pub orders: String,
    pub transactions: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            kpis: "/kpis?from=${from}&to=${to}".to_string(),
            activity: "/activity?limit=${limit}&type=${kind}".to_string(),
            notifications: "/notifications".to_string(),
            notifications_read: "/notifications/read".to_string(),
            devices: "/devices?status=${status}".to_string(),
            orders: "/orders".to_string(),
            transactions: "/transactions?from=${from}&to=${to}".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    /// Live dashboards re-fetch every panel on this interval; 0 disables polling
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            toast_ms: default_toast_ms(),
        }
    }
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_delay_ms() -> u64 {
    420
}

fn default_storage_path() -> String {
    "data/store".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_token_key() -> String {
    "auth.token".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_toast_ms() -> u64 {
    2_500
}

/// Load `config/dashboard.*` (optional) layered with `DASHBOARD_*` environment
/// variables, e.g. `DASHBOARD_DATA__MODE=remote`.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_query() {
        let mut vars = HashMap::new();
        vars.insert("from".to_string(), "100".to_string());
        vars.insert("to".to_string(), "200".to_string());

        let query = "/kpis?from=${from}&to=${to}";
        let result = prepare_query(query, &vars);

        assert_eq!(result, "/kpis?from=100&to=200");
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = config::Config::builder().build().unwrap();
        let config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.data.mode, DataMode::Mock);
        assert_eq!(config.data.delay_ms, 420);
        assert_eq!(config.dashboard.poll_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_overrides_from_toml() {
        let toml = r#"
            [data]
            mode = "remote"

            [dashboard]
            poll_interval_secs = 0

            [remote.endpoints]
            kpis = "/v2/kpis"
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.data.mode, DataMode::Remote);
        assert_eq!(config.dashboard.poll_interval(), None);
        assert_eq!(config.remote.endpoints.kpis, "/v2/kpis");
        assert_eq!(config.remote.endpoints.orders, "/orders");
    }
}
