// Device control domain model
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

impl SwitchState {
    pub fn flipped(self) -> Self {
        match self {
            SwitchState::On => SwitchState::Off,
            SwitchState::Off => SwitchState::On,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwitchState::On => "on",
            SwitchState::Off => "off",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Some(SwitchState::On),
            "off" => Some(SwitchState::Off),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceAction {
    Toggle(SwitchState),
    SetSpeed(f64),
}

/// One outbound control request; lives for the duration of a relay call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub device_id: String,
    pub action: DeviceAction,
}

impl DeviceCommand {
    pub fn toggle(device_id: impl Into<String>, state: SwitchState) -> Self {
        Self {
            device_id: device_id.into(),
            action: DeviceAction::Toggle(state),
        }
    }

    pub fn set_speed(device_id: impl Into<String>, speed: f64) -> Self {
        Self {
            device_id: device_id.into(),
            action: DeviceAction::SetSpeed(speed),
        }
    }
}

/// Reply body of the device server's control endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Acknowledged switch state, when the server echoes one.
    pub fn switch_state(&self) -> Option<SwitchState> {
        self.state.as_ref()?.as_str().and_then(SwitchState::parse)
    }

    /// Acknowledged speed, when the server echoes a number.
    pub fn speed(&self) -> Option<f64> {
        match self.state.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Up,
    Down,
}

/// Increment/decrement control bound to a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stepper {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for Stepper {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }
    }
}

const ROUNDING_SLACK: f64 = 1e-9;

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Stepper {
    /// Move one step and round to one decimal place, staying within `[min, max]`.
    pub fn adjust(&self, current: f64, direction: StepDirection) -> f64 {
        let delta = match direction {
            StepDirection::Up => self.step,
            StepDirection::Down => -self.step,
        };
        let rounded = round_tenth(current + delta);

        // Tightest one-decimal values inside the bounds.
        let lo = (self.min * 10.0 - ROUNDING_SLACK).ceil() / 10.0;
        let hi = (self.max * 10.0 + ROUNDING_SLACK).floor() / 10.0;
        if lo <= hi {
            rounded.clamp(lo, hi)
        } else {
            rounded.clamp(self.min, self.max.max(self.min))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stepper_clamps_at_max() {
        let stepper = Stepper {
            min: 0.0,
            max: 100.0,
            step: 0.5,
        };
        assert_eq!(stepper.adjust(99.8, StepDirection::Up), 100.0);
        assert_eq!(stepper.adjust(0.2, StepDirection::Down), 0.0);
    }

    #[test]
    fn test_stepper_rounds_to_one_decimal() {
        let stepper = Stepper {
            min: 0.0,
            max: 10.0,
            step: 0.1,
        };
        assert_eq!(stepper.adjust(0.2, StepDirection::Up), 0.3);
        assert_eq!(stepper.adjust(1.26, StepDirection::Down), 1.2);
    }

    #[test]
    fn test_stepper_stays_inside_fractional_bounds() {
        let stepper = Stepper {
            min: 0.04,
            max: 99.95,
            step: 1.0,
        };
        assert_eq!(stepper.adjust(1.0, StepDirection::Down), 0.1);
        assert_eq!(stepper.adjust(99.0, StepDirection::Up), 99.9);
        assert_eq!(stepper.adjust(50.0, StepDirection::Up), 51.0);
    }

    #[test]
    fn test_stepper_accepts_partial_config() {
        let stepper: Stepper = serde_json::from_value(json!({"step": 0.5})).unwrap();
        assert_eq!(stepper, Stepper { min: 0.0, max: 100.0, step: 0.5 });
    }

    #[test]
    fn test_reply_exposes_acknowledged_state() {
        let reply: CommandReply = serde_json::from_value(json!({"status": "success", "state": "on"})).unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.switch_state(), Some(SwitchState::On));

        let reply: CommandReply = serde_json::from_value(json!({"status": "success", "state": 42})).unwrap();
        assert_eq!(reply.speed(), Some(42.0));

        let reply: CommandReply = serde_json::from_value(json!({"status": "error", "error": "pump off"})).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.error.as_deref(), Some("pump off"));
    }
}
