//! Storefront API Library
//!
//! HTTP handlers, the media lifecycle services and application setup.

pub mod constants;
pub mod context;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;
mod utils;

pub use error::ErrorResponse;
pub use state::AppState;
