//! Geolocation Backend Port
//!
//! Defines the interface every geolocation database adapter implements.

use crate::domain::entities::{BackendKind, GeoRecord};
use crate::domain::value_objects::Address;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Failures raised while loading or querying a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file {} is missing or unreadable", .0.display())]
    MissingKey(PathBuf),
    #[error("key file {} does not contain a usable key", .0.display())]
    InvalidKey(PathBuf),
    #[error("corrupt database: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("{0} addresses are not covered by this database")]
    Unsupported(&'static str),
    #[error("address not found")]
    NotFound,
}

/// Lookup capability of a loaded geolocation database.
///
/// This is an outbound port; the resolver never sees the file format.
/// Implementations are shared between request handlers and must be safe
/// for concurrent `lookup` calls.
pub trait GeoBackend: Send + Sync {
    /// Which database format this backend reads.
    fn kind(&self) -> BackendKind;

    /// Short name for logs (usually the data file).
    fn name(&self) -> &str;

    /// Resolve an address to a location/operator pair.
    ///
    /// A record with an empty location is allowed; the resolver treats it
    /// as unusable and falls back.
    fn lookup(&self, addr: &Address) -> Result<GeoRecord, BackendError>;
}

/// Everything a backend needs to open its data source.
#[derive(Debug, Clone, Copy)]
pub struct BackendSource<'a> {
    /// Main database file
    pub data_path: &'a Path,
    /// Optional companion database (e.g. an ASN database next to a City one)
    pub aux_path: Option<&'a Path>,
    /// Decryption key read from the descriptor's key file
    pub key: Option<&'a str>,
    /// Preferred language for localized names
    pub language: &'a str,
}

/// Constructor for one backend variant.
pub type BackendLoader = fn(&BackendSource<'_>) -> Result<Arc<dyn GeoBackend>, BackendError>;
