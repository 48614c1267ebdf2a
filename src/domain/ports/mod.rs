mod geo_backend;

pub use geo_backend::{BackendError, BackendLoader, BackendSource, GeoBackend};
