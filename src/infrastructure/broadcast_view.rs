// View adapter that fans view events out to HTTP subscribers
use crate::application::dashboard_view::{DashboardView, ViewEvent};
use crate::domain::dashboard::ChartView;
use crate::domain::device::SwitchState;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct BroadcastView {
    tx: broadcast::Sender<ViewEvent>,
}

impl BroadcastView {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: ViewEvent) {
        // No subscribers is the normal idle state.
        let _ = self.tx.send(event);
    }
}

impl DashboardView for BroadcastView {
    fn redraw(&self, chart: &ChartView) {
        self.publish(ViewEvent::Redraw(chart.clone()));
    }

    fn set_label(&self, element_id: &str, text: &str) {
        self.publish(ViewEvent::Label {
            element_id: element_id.to_string(),
            text: text.to_string(),
        });
    }

    fn set_toggle(&self, device_id: &str, state: SwitchState) {
        self.publish(ViewEvent::toggle(device_id, state));
    }

    fn set_speed(&self, device_id: &str, speed: f64) {
        self.publish(ViewEvent::Speed {
            device: device_id.to_string(),
            speed,
        });
    }

    fn alert(&self, message: &str) {
        tracing::info!("Alert: {}", message);
        self.publish(ViewEvent::Alert {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribers_receive_published_events() {
        let view = BroadcastView::new(8);
        let mut rx = view.subscribe();

        view.set_label("o2", "20.9 %");
        view.set_toggle("pump", SwitchState::On);

        assert_eq!(
            rx.try_recv().unwrap(),
            ViewEvent::Label {
                element_id: "o2".to_string(),
                text: "20.9 %".to_string(),
            }
        );
        let toggle = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            toggle,
            json!({"type": "toggle", "button_id": "pump-toggle", "field_id": "pump_state", "state": "on"})
        );
    }

    #[test]
    fn test_publishing_without_subscribers_is_silent() {
        let view = BroadcastView::new(1);
        view.alert("device server unreachable");
    }
}
