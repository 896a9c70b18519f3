//! Medibook: payment-gated appointment booking service.
//!
//! An appointment exists in `pending` state from the moment an order is
//! initiated and becomes `scheduled` only after the payment processor's
//! HMAC signature verifies. Fees are resolved server-side from a price
//! table; nothing a client sends can set an amount.

pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod models;
pub mod payment;
pub mod pricing;
pub mod sweep;
