//! HTTP surface: `/metrics` and `/health`.

pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
