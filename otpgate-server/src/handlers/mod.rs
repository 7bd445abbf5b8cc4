//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod validate;

pub use crate::state::AppState;
pub use health::{health, HealthResponse};
pub use validate::{validate_handler, ValidateResponse, AUTHENTICATED_USER_HEADER};
