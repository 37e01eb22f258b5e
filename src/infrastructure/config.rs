use crate::application::command_relay::RelaySettings;
use crate::domain::axis::AxisSettings;
use crate::domain::dashboard::SensorSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub device_server: DeviceServerSettings,
    pub push: PushSettings,
    pub events: EventSettings,
    pub sensors: SensorSettings,
    pub axis: AxisSettings,
    pub relay: RelaySettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceServerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for DeviceServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl DeviceServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PushSettings {
    /// Station push endpoint. Without it, events only arrive via `POST /push`.
    pub url: Option<String>,
    pub reconnect_delay_secs: u64,
    /// Whether the station Brotli-compresses each frame.
    pub compressed: bool,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_delay_secs: 5,
            compressed: false,
        }
    }
}

impl PushSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EventSettings {
    /// View events kept for slow subscribers before they start skipping.
    pub buffer: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { buffer: 256 }
    }
}

/// Load `config/dashboard.{toml,...}` (optional), then `DASHBOARD__*` overrides.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    load_with_env(config::Environment::with_prefix("DASHBOARD").separator("__"))
}

fn load_with_env(env: config::Environment) -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(env)
        .build()?;

    Ok(settings.try_deserialize()?)
}
