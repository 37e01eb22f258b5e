// Device command relay - Use case for toggling relays and setting speeds
use crate::application::dashboard_view::DashboardView;
use crate::application::device_gateway::{DeviceGateway, RelayError};
use crate::domain::device::{CommandReply, DeviceCommand, StepDirection, Stepper, SwitchState};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Revert the optimistic local state when a command fails.
    pub rollback_on_failure: bool,
    /// Devices that may be controlled. Empty allows any id.
    pub devices: Vec<String>,
    pub steppers: HashMap<String, Stepper>,
    pub default_stepper: Stepper,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            devices: ["co2-solenoid", "argon-solenoid", "ito-heating", "pump"]
                .into_iter()
                .map(String::from)
                .collect(),
            steppers: HashMap::new(),
            default_stepper: Stepper::default(),
        }
    }
}

impl RelaySettings {
    fn stepper(&self, device_id: &str) -> Stepper {
        self.steppers.get(device_id).copied().unwrap_or(self.default_stepper)
    }

    fn knows(&self, device_id: &str) -> bool {
        self.devices.is_empty() || self.devices.iter().any(|d| d == device_id)
    }
}

/// Local control state as shown on the page.
#[derive(Debug, Default)]
struct ControlPanel {
    toggles: HashMap<String, SwitchState>,
    speeds: HashMap<String, f64>,
}

/// Translates user actions into device-server requests.
///
/// Local state is updated optimistically before the request resolves. There is
/// no ordering between concurrent calls for the same device: the last response
/// to arrive wins.
#[derive(Clone)]
pub struct DeviceCommandRelay {
    gateway: Arc<dyn DeviceGateway>,
    view: Arc<dyn DashboardView>,
    settings: Arc<RelaySettings>,
    panel: Arc<Mutex<ControlPanel>>,
}

impl DeviceCommandRelay {
    pub fn new(gateway: Arc<dyn DeviceGateway>, view: Arc<dyn DashboardView>, settings: RelaySettings) -> Self {
        Self {
            gateway,
            view,
            settings: Arc::new(settings),
            panel: Arc::new(Mutex::new(ControlPanel::default())),
        }
    }

    pub async fn toggle_state(&self, device_id: &str) -> SwitchState {
        self.panel.lock().await.toggles.get(device_id).copied().unwrap_or_default()
    }

    pub async fn speed(&self, device_id: &str) -> f64 {
        self.panel.lock().await.speeds.get(device_id).copied().unwrap_or(0.0)
    }

    /// Flip a relay and tell the device server about it.
    pub async fn send_toggle(&self, device_id: &str) -> Result<CommandReply, RelayError> {
        self.ensure_known(device_id)?;

        let (previous, next) = {
            let mut panel = self.panel.lock().await;
            let previous = panel.toggles.get(device_id).copied().unwrap_or_default();
            let next = previous.flipped();
            panel.toggles.insert(device_id.to_string(), next);
            (previous, next)
        };
        self.view.set_toggle(device_id, next);

        let result = self.dispatch(DeviceCommand::toggle(device_id, next)).await;

        match &result {
            Ok(reply) => {
                if let Some(acked) = reply.switch_state() {
                    self.panel.lock().await.toggles.insert(device_id.to_string(), acked);
                    self.view.set_toggle(device_id, acked);
                }
            }
            Err(e) => {
                self.report_failure(device_id, e);
                if self.settings.rollback_on_failure {
                    self.panel.lock().await.toggles.insert(device_id.to_string(), previous);
                    self.view.set_toggle(device_id, previous);
                }
            }
        }

        result
    }

    /// Send a raw speed value. Every call issues one request; nothing is merged.
    pub async fn send_speed(&self, device_id: &str, speed: f64) -> Result<CommandReply, RelayError> {
        self.ensure_known(device_id)?;
        if !speed.is_finite() {
            return Err(RelayError::Rejected(format!("speed {} is not a number", speed)));
        }

        let previous = {
            let mut panel = self.panel.lock().await;
            panel.speeds.insert(device_id.to_string(), speed).unwrap_or(0.0)
        };
        self.view.set_speed(device_id, speed);

        let result = self.dispatch(DeviceCommand::set_speed(device_id, speed)).await;

        match &result {
            Ok(reply) => {
                if let Some(acked) = reply.speed() {
                    self.panel.lock().await.speeds.insert(device_id.to_string(), acked);
                    self.view.set_speed(device_id, acked);
                }
            }
            Err(e) => {
                self.report_failure(device_id, e);
                if self.settings.rollback_on_failure {
                    self.panel.lock().await.speeds.insert(device_id.to_string(), previous);
                    self.view.set_speed(device_id, previous);
                }
            }
        }

        result
    }

    /// Increment or decrement the current speed with the device's stepper.
    pub async fn step_speed(&self, device_id: &str, direction: StepDirection) -> Result<CommandReply, RelayError> {
        self.ensure_known(device_id)?;
        let current = self.speed(device_id).await;
        let next = self.settings.stepper(device_id).adjust(current, direction);
        self.send_speed(device_id, next).await
    }

    async fn dispatch(&self, command: DeviceCommand) -> Result<CommandReply, RelayError> {
        tracing::debug!("Relaying {:?}", command);
        let reply = self.gateway.send(&command).await?;
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(RelayError::Rejected(reply.error.unwrap_or(reply.status)))
        }
    }

    fn ensure_known(&self, device_id: &str) -> Result<(), RelayError> {
        if self.settings.knows(device_id) {
            Ok(())
        } else {
            Err(RelayError::UnknownDevice(device_id.to_string()))
        }
    }

    fn report_failure(&self, device_id: &str, error: &RelayError) {
        tracing::warn!("Command for {} failed: {}", device_id, error);
        self.view.alert(&format!("Error updating {}: {}", device_id, error));
    }
}
