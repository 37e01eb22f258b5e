// Application layer - Use cases and the ports they depend on
pub mod command_relay;
pub mod dashboard_view;
pub mod device_gateway;
pub mod ingestion_service;
pub mod session;
