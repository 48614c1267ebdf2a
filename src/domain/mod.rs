//! Domain Layer
//!
//! Address semantics and resolution rules. Nothing in here performs I/O.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{BackendKind, GeoRecord, ResolutionResult, Source};
pub use value_objects::{Address, IpVersion};
