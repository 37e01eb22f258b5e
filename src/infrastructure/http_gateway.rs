// HTTP implementation of the device gateway
use crate::application::device_gateway::{DeviceGateway, RelayError};
use crate::domain::device::{CommandReply, DeviceAction, DeviceCommand};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDeviceGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeviceGateway {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint path and JSON body for a command.
    fn request_for(command: &DeviceCommand) -> (&'static str, serde_json::Value) {
        match &command.action {
            DeviceAction::Toggle(state) => (
                "/toggle-device",
                json!({ "device": command.device_id, "state": state.as_str() }),
            ),
            DeviceAction::SetSpeed(speed) => (
                "/set-device-speed",
                json!({ "device": command.device_id, "speed": speed }),
            ),
        }
    }
}

#[async_trait]
impl DeviceGateway for HttpDeviceGateway {
    async fn send(&self, command: &DeviceCommand) -> Result<CommandReply, RelayError> {
        let (path, body) = Self::request_for(command);
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Http { status, body });
        }

        response
            .json::<CommandReply>()
            .await
            .map_err(|e| RelayError::Transport(format!("unreadable reply: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::SwitchState;

    #[test]
    fn test_toggle_request_matches_server_contract() {
        let (path, body) = HttpDeviceGateway::request_for(&DeviceCommand::toggle("pump", SwitchState::On));
        assert_eq!(path, "/toggle-device");
        assert_eq!(body, json!({"device": "pump", "state": "on"}));
    }

    #[test]
    fn test_speed_request_matches_server_contract() {
        let (path, body) = HttpDeviceGateway::request_for(&DeviceCommand::set_speed("pump", 62.5));
        assert_eq!(path, "/set-device-speed");
        assert_eq!(body, json!({"device": "pump", "speed": 62.5}));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = HttpDeviceGateway::new("http://incubator.local:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url, "http://incubator.local:5000");
    }
}
