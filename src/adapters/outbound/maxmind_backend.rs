//! MaxMind GeoIP Backend
//!
//! Implements GeoBackend using a MaxMind GeoIP2 / GeoLite2 database, with an
//! optional ASN database for operator names.

use crate::domain::entities::{BackendKind, GeoRecord};
use crate::domain::ports::{BackendError, BackendSource, GeoBackend};
use crate::domain::value_objects::Address;
use maxminddb::{MaxMindDBError, Reader};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

/// Language used when the preferred one has no translation.
const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Deserialize)]
struct Named {
    names: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct LocationResp {
    country: Option<Named>,
    subdivisions: Option<Vec<Named>>,
    city: Option<Named>,
    // GeoIP2-ISP and combined databases
    isp: Option<String>,
    organization: Option<String>,
    autonomous_system_organization: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsnResp {
    autonomous_system_organization: Option<String>,
}

/// MaxMind geolocation backend.
///
/// Both readers hold the whole file in memory; lookups are read-only and
/// safe to run concurrently.
pub struct MaxMindBackend {
    name: String,
    reader: Arc<Reader<Vec<u8>>>,
    asn_reader: Option<Arc<Reader<Vec<u8>>>>,
    language: String,
}

impl MaxMindBackend {
    /// Open a database file.
    pub fn from_file(path: &Path, language: &str) -> Result<Self, BackendError> {
        let reader = open_reader(path)?;
        Ok(Self {
            name: path.display().to_string(),
            reader: Arc::new(reader),
            asn_reader: None,
            language: language.to_string(),
        })
    }

    /// Loader used by the backend registry.
    ///
    /// A broken ASN database only costs operator names, so it is logged and
    /// skipped rather than failing the whole candidate.
    pub fn load(source: &BackendSource<'_>) -> Result<Arc<dyn GeoBackend>, BackendError> {
        let mut backend = Self::from_file(source.data_path, source.language)?;

        if let Some(asn_path) = source.aux_path {
            match open_reader(asn_path) {
                Ok(reader) => backend.asn_reader = Some(Arc::new(reader)),
                Err(e) => tracing::warn!("ignoring ASN database {}: {}", asn_path.display(), e),
            }
        }

        Ok(Arc::new(backend))
    }

    fn operator_from_asn(&self, ip: IpAddr) -> Option<String> {
        let reader = self.asn_reader.as_ref()?;
        let resp: AsnResp = reader.lookup(ip).ok()?;
        resp.autonomous_system_organization
    }
}

impl GeoBackend for MaxMindBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MaxMind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, addr: &Address) -> Result<GeoRecord, BackendError> {
        let ip = lookup_key(addr);
        let resp: LocationResp = self.reader.lookup(ip).map_err(lookup_error)?;
        Ok(record_from(resp, self.operator_from_asn(ip), &self.language))
    }
}

/// ::ffff:a.b.c.d is stored under its IPv4 form.
fn lookup_key(addr: &Address) -> IpAddr {
    addr.as_ipv4().map(IpAddr::V4).unwrap_or(addr.ip())
}

/// Build a record from a location response.
///
/// Operator order: ASN database, `isp`, `organization`, then the
/// response's own `autonomous_system_organization`.
fn record_from(resp: LocationResp, asn_operator: Option<String>, language: &str) -> GeoRecord {
    let mut parts = Vec::new();
    parts.extend(resp.country.as_ref().and_then(|c| pick_name(c, language)));
    parts.extend(
        resp.subdivisions
            .as_ref()
            .and_then(|subs| subs.first())
            .and_then(|s| pick_name(s, language)),
    );
    parts.extend(resp.city.as_ref().and_then(|c| pick_name(c, language)));
    let location = compose_location(&parts);

    let operator = asn_operator
        .or(resp.isp)
        .or(resp.organization)
        .or(resp.autonomous_system_organization)
        .unwrap_or_default();

    GeoRecord::new(location, operator)
}

/// Localized name in `language`, falling back to English.
fn pick_name<'a>(named: &'a Named, language: &str) -> Option<&'a str> {
    let names = named.names.as_ref()?;
    names
        .get(language)
        .or_else(|| names.get(FALLBACK_LANGUAGE))
        .map(String::as_str)
}

fn open_reader(path: &Path) -> Result<Reader<Vec<u8>>, BackendError> {
    Reader::open_readfile(path).map_err(|e| BackendError::Database(e.to_string()))
}

fn lookup_error(e: MaxMindDBError) -> BackendError {
    match e {
        MaxMindDBError::AddressNotFoundError(_) => BackendError::NotFound,
        other => BackendError::Database(other.to_string()),
    }
}

/// Join country, region and city, dropping blanks and repeats
/// ("Singapore Singapore" becomes "Singapore").
fn compose_location(parts: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(parts.len());
    for part in parts.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if out.last() != Some(&part) {
            out.push(part);
        }
    }
    out.join(" ")
}
