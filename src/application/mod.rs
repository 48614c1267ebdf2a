//! Application Layer
//!
//! Use cases built on the domain: startup backend selection and per-request
//! resolution.

mod backend_registry;
mod resolver;

pub use backend_registry::{BackendDescriptor, BackendRegistry};
pub use resolver::{Resolver, CLASSIFIER_LABEL, MOCK_DATA_LABEL};
