//! Clipvault API Library
//!
//! HTTP handlers, the submission pipeline and archive services, and application setup.

mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
