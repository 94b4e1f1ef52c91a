pub mod api_client;
pub mod auth;
pub mod client_factory;
pub mod credentials;
pub mod logger;
pub mod tool_executor;
pub mod transport;
pub mod validation;
pub mod wire;
