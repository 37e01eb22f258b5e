// Application state for HTTP handlers
use crate::application::command_relay::DeviceCommandRelay;
use crate::application::session::SessionHandle;
use crate::infrastructure::broadcast_view::BroadcastView;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub relay: DeviceCommandRelay,
    pub view: BroadcastView,
}
