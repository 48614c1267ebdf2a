//! ip-lookup Library
//!
//! This module exposes the ip-lookup components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{BackendDescriptor, BackendRegistry, Resolver};
pub use config::{load_config, Config};
pub use domain::entities::{BackendKind, GeoRecord, ResolutionResult, Source};
pub use domain::ports::{BackendError, GeoBackend};
pub use domain::services::{AddressNormalizer, InvalidAddress};
pub use domain::value_objects::{Address, IpVersion};
