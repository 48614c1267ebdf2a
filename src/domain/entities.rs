//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the IP lookup domain.
//! They have no external dependencies and contain only business logic.

use serde::{Deserialize, Serialize};

/// Placeholder location for addresses nobody could place.
pub const UNKNOWN_LOCATION: &str = "unknown region";
/// Placeholder operator for addresses nobody could attribute.
pub const UNKNOWN_OPERATOR: &str = "unknown operator";

/// A (location, operator) pair produced by any resolution stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// Human-readable place (country, region, city)
    pub location: String,
    /// Network operator or ISP
    pub operator: String,
}

impl GeoRecord {
    pub fn new(location: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            operator: operator.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LOCATION, UNKNOWN_OPERATOR)
    }
}

/// Geolocation database formats the service can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// MaxMind GeoIP2 / GeoLite2 database (`.mmdb`)
    MaxMind,
    /// Legacy QQWry database (`qqwry.dat`)
    Qqwry,
}

impl BackendKind {
    /// Selection priority, lower is tried first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::MaxMind => 0,
            Self::Qqwry => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxMind => "maxmind",
            Self::Qqwry => "qqwry",
        }
    }

    /// Label rendered in API responses.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MaxMind => "MaxMind GeoIP2 database",
            Self::Qqwry => "QQWry database",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage produced a [`ResolutionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Backend(BackendKind),
    Classifier,
    MockCatalog,
}

/// Answer for a single lookup. Built fresh per query and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Canonical text form of the queried address
    pub ip: String,
    pub location: String,
    pub operator: String,
    pub source: Source,
}

impl ResolutionResult {
    pub fn new(ip: String, record: GeoRecord, source: Source) -> Self {
        Self {
            ip,
            location: record.location,
            operator: record.operator,
            source,
        }
    }
}
