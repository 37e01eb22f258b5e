// Infrastructure layer - External dependencies and adapters
pub mod broadcast_view;
pub mod chunked_json;
pub mod config;
pub mod http_gateway;
pub mod http_response;
pub mod push_client;
