//! Error types for the hive protocol layer.
//!
//! Only recoverable failures are modelled here. Invariant violations are
//! panics and never travel through these types.

mod agent;
mod kernel;

pub use agent::*;
pub use kernel::*;
