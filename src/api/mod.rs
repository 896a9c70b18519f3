//! HTTP API for the booking service.
//!
//! Serves the payment-gated appointment protocol over axum. All routes
//! except `/health` require a bearer session token; the auth middleware
//! resolves it to a `CallerContext` that scopes every data access.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod types;

pub use error::{ApiError, ApiJson};
pub use router::api_router;
pub use types::{ApiContext, AppState, CallerContext};
