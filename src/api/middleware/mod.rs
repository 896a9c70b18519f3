//! API middleware stack.
//!
//! One concern: resolving the bearer token to a caller before any
//! handler runs. Caller identity always comes from here, never from a
//! request body.

pub mod auth;
