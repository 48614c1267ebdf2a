//! Infrastructure Layer
//!
//! Process-level plumbing shared by the adapters.

pub mod shutdown;

pub use shutdown::shutdown_signal;
