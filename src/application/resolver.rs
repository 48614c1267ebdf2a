//! Resolver - main application use case
//!
//! Answers "where is this address and who operates it" by walking a fixed
//! chain of sources: active backend, structural classifier, mock catalog.

use crate::domain::entities::{BackendKind, GeoRecord, ResolutionResult, Source, UNKNOWN_OPERATOR};
use crate::domain::ports::GeoBackend;
use crate::domain::services::{AddressClassifier, AddressNormalizer, InvalidAddress, MockCatalog};
use crate::domain::value_objects::Address;
use std::sync::Arc;

/// Label for answers that did not come from a real database.
pub const MOCK_DATA_LABEL: &str = "mock data";
/// Label for classifier answers while a real database is active.
pub const CLASSIFIER_LABEL: &str = "built-in classifier";

/// Resolution service.
///
/// Holds the backend chosen at startup; the handle never changes afterwards,
/// so `resolve` needs no locking and can run from any number of requests.
pub struct Resolver {
    backend: Option<Arc<dyn GeoBackend>>,
}

impl Resolver {
    pub fn new(backend: Option<Arc<dyn GeoBackend>>) -> Self {
        Self { backend }
    }

    /// Kind of the active backend, if any.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|b| b.kind())
    }

    /// Normalize raw text and resolve it.
    ///
    /// Only malformed input is an error; every valid address resolves.
    pub fn resolve_text(&self, raw: &str) -> Result<ResolutionResult, InvalidAddress> {
        let addr = AddressNormalizer::normalize(raw)?;
        Ok(self.resolve(&addr))
    }

    /// Resolve a validated address. Never fails.
    ///
    /// 1. Active backend, if it returns a non-empty location
    /// 2. Structural classifier
    /// 3. Mock catalog
    /// 4. "unknown region" / "unknown operator"
    pub fn resolve(&self, addr: &Address) -> ResolutionResult {
        let ip = addr.to_string();

        if let Some((record, kind)) = self.query_backend(addr) {
            return ResolutionResult::new(ip, record, Source::Backend(kind));
        }

        if let Some(classification) = AddressClassifier::classify(addr) {
            let source = if classification.rule.is_curated() {
                Source::MockCatalog
            } else {
                Source::Classifier
            };
            return ResolutionResult::new(ip, classification.record, source);
        }

        let record = MockCatalog::lookup(addr).unwrap_or_else(GeoRecord::unknown);
        ResolutionResult::new(ip, record, Source::MockCatalog)
    }

    /// Human label for the `database` field of API responses.
    pub fn database_label(&self, result: &ResolutionResult) -> &'static str {
        match result.source {
            Source::Backend(kind) => kind.label(),
            Source::Classifier if self.backend.is_some() => CLASSIFIER_LABEL,
            Source::Classifier | Source::MockCatalog => MOCK_DATA_LABEL,
        }
    }

    /// Label describing the service as a whole (active backend or mock data).
    pub fn backend_label(&self) -> &'static str {
        self.backend_kind()
            .map(|kind| kind.label())
            .unwrap_or(MOCK_DATA_LABEL)
    }

    fn query_backend(&self, addr: &Address) -> Option<(GeoRecord, BackendKind)> {
        let backend = self.backend.as_ref()?;

        match backend.lookup(addr) {
            Ok(record) => {
                let location = record.location.trim();
                if location.is_empty() {
                    tracing::debug!("{} returned no location for {}", backend.name(), addr);
                    return None;
                }

                let operator = match record.operator.trim() {
                    "" => UNKNOWN_OPERATOR,
                    operator => operator,
                };

                Some((GeoRecord::new(location, operator), backend.kind()))
            }
            Err(e) => {
                tracing::debug!("{} lookup failed for {}: {}", backend.name(), addr, e);
                None
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::entities::{UNKNOWN_LOCATION, UNKNOWN_OPERATOR};
    use crate::domain::ports::BackendError;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ===== Mock Implementations =====

    struct MockBackend {
        kind: BackendKind,
        records: HashMap<IpAddr, GeoRecord>,
        calls: AtomicUsize,
    }

    impl MockBackend {
        fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                records: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_record(mut self, ip: &str, location: &str, operator: &str) -> Self {
            self.records
                .insert(ip.parse().unwrap(), GeoRecord::new(location, operator));
            self
        }
    }

    impl GeoBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn lookup(&self, addr: &Address) -> Result<GeoRecord, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records
                .get(&addr.ip())
                .cloned()
                .ok_or(BackendError::NotFound)
        }
    }

    struct FailingBackend;

    impl GeoBackend for FailingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Qqwry
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn lookup(&self, _addr: &Address) -> Result<GeoRecord, BackendError> {
            Err(BackendError::Corrupt("offset out of range".to_string()))
        }
    }

    // ===== Test Helpers =====

    fn addr(raw: &str) -> Address {
        AddressNormalizer::normalize(raw).unwrap()
    }

    fn without_backend() -> Resolver {
        Resolver::new(None)
    }

    fn with_backend(backend: impl GeoBackend + 'static) -> Resolver {
        Resolver::new(Some(Arc::new(backend)))
    }

    // ===== Backend stage =====

    #[test]
    fn test_backend_answer_wins() {
        let resolver = with_backend(
            MockBackend::new(BackendKind::MaxMind).with_record("203.0.113.7", "Japan Tokyo", "IIJ"),
        );

        let result = resolver.resolve(&addr("203.0.113.7"));
        assert_eq!(result.location, "Japan Tokyo");
        assert_eq!(result.operator, "IIJ");
        assert_eq!(result.source, Source::Backend(BackendKind::MaxMind));
    }

    #[test]
    fn test_backend_is_consulted_before_classifier() {
        // a backend that knows a private range still wins
        let resolver = with_backend(
            MockBackend::new(BackendKind::Qqwry).with_record("10.0.0.1", "LAN", "corp"),
        );

        let result = resolver.resolve(&addr("10.0.0.1"));
        assert_eq!(result.source, Source::Backend(BackendKind::Qqwry));
    }

    #[test]
    fn test_backend_empty_location_falls_back() {
        let resolver = with_backend(
            MockBackend::new(BackendKind::Qqwry).with_record("192.168.1.1", "  ", "somebody"),
        );

        let result = resolver.resolve(&addr("192.168.1.1"));
        assert_eq!(result.location, "private network, LAN");
        assert_eq!(result.source, Source::Classifier);
    }

    #[test]
    fn test_backend_empty_operator_becomes_unknown() {
        let resolver = with_backend(
            MockBackend::new(BackendKind::Qqwry).with_record("203.0.113.9", " Somewhere ", ""),
        );

        let result = resolver.resolve(&addr("203.0.113.9"));
        assert_eq!(result.location, "Somewhere");
        assert_eq!(result.operator, UNKNOWN_OPERATOR);
    }

    #[test]
    fn test_failing_backend_falls_back_to_classifier() {
        let resolver = with_backend(FailingBackend);

        let result = resolver.resolve(&addr("192.168.1.1"));
        assert_eq!(result.location, "private network, LAN");
        assert_eq!(result.source, Source::Classifier);
    }

    #[test]
    fn test_failing_backend_falls_back_to_catalog() {
        let resolver = with_backend(FailingBackend);

        let result = resolver.resolve(&addr("198.41.0.4"));
        assert_eq!(result.operator, "Verisign (a.root-servers.net)");
        assert_eq!(result.source, Source::MockCatalog);
    }

    // ===== No backend =====

    #[test]
    fn test_catalog_address_without_backend() {
        let result = without_backend().resolve(&addr("8.8.8.8"));
        assert_eq!(result.location, "United States");
        assert_eq!(result.operator, "Google DNS");
        assert_eq!(result.source, Source::MockCatalog);
    }

    #[test]
    fn test_classified_address_without_backend() {
        let result = without_backend().resolve(&addr("::1"));
        assert_eq!(result.location, "local loopback");
        assert_eq!(result.source, Source::Classifier);
    }

    #[test]
    fn test_unknown_terminal() {
        let result = without_backend().resolve(&addr("203.0.113.50"));
        assert_eq!(result.location, UNKNOWN_LOCATION);
        assert_eq!(result.operator, UNKNOWN_OPERATOR);
        assert_eq!(result.source, Source::MockCatalog);
    }

    #[test]
    fn test_always_non_empty_fields() {
        let resolvers = [without_backend(), with_backend(FailingBackend)];
        let inputs = [
            "0.0.0.0",
            "255.255.255.255",
            "172.32.0.1",
            "8.8.8.8",
            "::",
            "2001:db8::1",
            "2400:cb00::1",
            "::ffff:127.0.0.1",
        ];

        for resolver in &resolvers {
            for raw in inputs {
                let result = resolver.resolve(&addr(raw));
                assert!(!result.location.is_empty(), "input {}", raw);
                assert!(!result.operator.is_empty(), "input {}", raw);
            }
        }
    }

    #[test]
    fn test_result_ip_is_canonical() {
        let result = without_backend().resolve(&addr("2001:0DB8::0001"));
        assert_eq!(result.ip, "2001:db8::1");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = with_backend(
            MockBackend::new(BackendKind::MaxMind).with_record("203.0.113.7", "Japan", "IIJ"),
        );

        for raw in ["203.0.113.7", "10.1.2.3", "8.8.8.8", "203.0.113.8"] {
            let a = addr(raw);
            assert_eq!(resolver.resolve(&a), resolver.resolve(&a));
        }
    }

    #[test]
    fn test_backend_queried_on_every_call() {
        let backend = Arc::new(MockBackend::new(BackendKind::MaxMind));
        let resolver = Resolver::new(Some(backend.clone() as Arc<dyn GeoBackend>));

        resolver.resolve(&addr("203.0.113.7"));
        resolver.resolve(&addr("203.0.113.7"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    // ===== resolve_text =====

    #[test]
    fn test_resolve_text_rejects_malformed_input() {
        let resolver = without_backend();
        assert!(resolver.resolve_text("999.1.1.1").is_err());
        assert!(resolver.resolve_text("not.an.ip").is_err());
    }

    #[test]
    fn test_resolve_text_accepts_both_families() {
        let resolver = without_backend();
        assert_eq!(resolver.resolve_text("127.0.0.1").unwrap().location, "local loopback");
        assert_eq!(resolver.resolve_text("fe80::1").unwrap().location, "link-local");
    }

    // ===== Labels =====

    #[test]
    fn test_database_label_without_backend() {
        let resolver = without_backend();
        let classified = resolver.resolve(&addr("10.0.0.1"));
        let mocked = resolver.resolve(&addr("8.8.8.8"));

        assert_eq!(resolver.database_label(&classified), MOCK_DATA_LABEL);
        assert_eq!(resolver.database_label(&mocked), MOCK_DATA_LABEL);
        assert_eq!(resolver.backend_label(), MOCK_DATA_LABEL);
        assert_eq!(resolver.backend_kind(), None);
    }

    #[test]
    fn test_database_label_with_backend() {
        let resolver = with_backend(
            MockBackend::new(BackendKind::Qqwry).with_record("203.0.113.7", "Somewhere", "ISP"),
        );

        let from_backend = resolver.resolve(&addr("203.0.113.7"));
        let classified = resolver.resolve(&addr("10.0.0.1"));
        let unknown = resolver.resolve(&addr("203.0.113.8"));

        assert_eq!(resolver.database_label(&from_backend), "QQWry database");
        assert_eq!(resolver.database_label(&classified), CLASSIFIER_LABEL);
        assert_eq!(resolver.database_label(&unknown), MOCK_DATA_LABEL);
        assert_eq!(resolver.backend_label(), "QQWry database");
        assert_eq!(resolver.backend_kind(), Some(BackendKind::Qqwry));
    }

    #[test]
    fn test_resolver_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Resolver>();
    }
}
