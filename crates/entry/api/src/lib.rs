//! API entry layer: routing, state, and the server lifecycle.

pub mod models;
pub mod routes;
pub mod services;

pub use models::{ApiError, ApiState};
pub use routes::configure_routes;
pub use services::server::ApiServer;
