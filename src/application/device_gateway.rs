// Gateway trait for the device-control server
use crate::domain::device::{CommandReply, DeviceCommand};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("device server unreachable: {0}")]
    Transport(String),
    #[error("device server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("device server rejected command: {0}")]
    Rejected(String),
    #[error("unknown device {0}")]
    UnknownDevice(String),
}

#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Deliver one command and return the server's reply.
    async fn send(&self, command: &DeviceCommand) -> Result<CommandReply, RelayError>;
}
