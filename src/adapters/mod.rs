//! Adapters Layer
//!
//! Inbound: the HTTP API. Outbound: geolocation database backends.

pub mod inbound;
pub mod outbound;
