//! Repository layer — entity-scoped database operations.
//!
//! Every read and write on appointments is scoped to the owning caller.
//! State transitions are expressed as conditional UPDATEs so the status
//! check and the transition are one atomic statement.

mod appointment;

pub use appointment::*;
