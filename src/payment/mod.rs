//! Payment integration: order creation against the external processor
//! and signature verification of its confirmation callback.

pub mod gateway;
pub mod signature;

pub use gateway::{GatewayError, HttpGateway, PaymentGateway, PaymentOrder};
pub use signature::{compute_signature, verify_signature};
