//! Prelude Server Library
//!
//! Self-hosted media-library server. Requests pass through a single
//! pipeline ([`api::Api`]) that resolves credentials, decodes the body,
//! routes to a resource controller and renders a typed response.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod response;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use api::{router, Api, ApiError, ApiRequest};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use response::ApiResponse;
pub use services::{AuthContext, AuthService};
pub use state::AppState;
