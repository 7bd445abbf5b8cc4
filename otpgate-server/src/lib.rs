//! otpgate Server Library - HTTP gateway for the Yubikey second factor
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod bindings;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bindings::BindingStore;
pub use config::Config;
pub use error::ApiError;
pub use handlers::{HealthResponse, ValidateResponse, AUTHENTICATED_USER_HEADER};
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
