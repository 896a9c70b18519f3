//! API endpoint handlers.
//!
//! Handlers stay thin: request validation and response shaping here,
//! protocol semantics in `crate::booking`.

pub mod appointments;
pub mod health;
pub mod payment;
