// View port - everything the session and relay draw goes through here
use crate::domain::dashboard::ChartView;
use crate::domain::device::SwitchState;
use serde::Serialize;

/// Rendering surface of the dashboard page (charts, text labels, controls).
///
/// Calls are fire-and-forget; implementations must not block.
pub trait DashboardView: Send + Sync {
    /// Redraw one chart with its current window and axis range.
    fn redraw(&self, chart: &ChartView);

    /// Replace the text of a reading label (`co2`, `temp3`, ...).
    fn set_label(&self, element_id: &str, text: &str);

    /// Show a toggle button and its paired hidden field in `state`.
    fn set_toggle(&self, device_id: &str, state: SwitchState);

    /// Move a speed slider to `speed`.
    fn set_speed(&self, device_id: &str, speed: f64);

    /// Surface an error to the user.
    fn alert(&self, message: &str);
}

/// A single view update, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    Redraw(ChartView),
    Label {
        element_id: String,
        text: String,
    },
    Toggle {
        button_id: String,
        field_id: String,
        state: SwitchState,
    },
    Speed {
        device: String,
        speed: f64,
    },
    Alert {
        message: String,
    },
}

impl ViewEvent {
    pub fn toggle(device_id: &str, state: SwitchState) -> Self {
        ViewEvent::Toggle {
            button_id: format!("{}-toggle", device_id),
            field_id: format!("{}_state", device_id),
            state,
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Collects every view call for assertions.
    #[derive(Default)]
    pub struct RecordingView {
        events: Mutex<Vec<ViewEvent>>,
    }

    impl RecordingView {
        pub fn events(&self) -> Vec<ViewEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn redraws(&self) -> Vec<ChartView> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    ViewEvent::Redraw(chart) => Some(chart),
                    _ => None,
                })
                .collect()
        }

        pub fn alerts(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    ViewEvent::Alert { message } => Some(message),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, event: ViewEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl DashboardView for RecordingView {
        fn redraw(&self, chart: &ChartView) {
            self.push(ViewEvent::Redraw(chart.clone()));
        }

        fn set_label(&self, element_id: &str, text: &str) {
            self.push(ViewEvent::Label {
                element_id: element_id.to_string(),
                text: text.to_string(),
            });
        }

        fn set_toggle(&self, device_id: &str, state: SwitchState) {
            self.push(ViewEvent::toggle(device_id, state));
        }

        fn set_speed(&self, device_id: &str, speed: f64) {
            self.push(ViewEvent::Speed {
                device: device_id.to_string(),
                speed,
            });
        }

        fn alert(&self, message: &str) {
            self.push(ViewEvent::Alert {
                message: message.to_string(),
            });
        }
    }
}
