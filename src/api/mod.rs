//! HTTP request layer.

pub mod routes;
pub mod types;

pub use routes::{ApiState, api_routes};
