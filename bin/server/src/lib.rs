//! Roleypoly edge API.
//!
//! This crate wires the session store, Discord client and guild cache into
//! an axum router serving the login flow and the session-gated endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod responses;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
