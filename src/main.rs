//! ip-lookup - IP geolocation HTTP service
//!
//! This is the composition root that wires together all the components.

use ip_lookup::adapters::inbound::{ApiServer, ApiState};
use ip_lookup::adapters::outbound::loader_for;
use ip_lookup::infrastructure::shutdown_signal;
use ip_lookup::{load_config, BackendDescriptor, BackendKind, BackendRegistry, Config, Resolver};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

/// Explicitly configured databases first, then whatever the data
/// directory holds.
fn backend_candidates(cfg: &Config) -> Vec<BackendDescriptor> {
    let mut candidates = Vec::new();

    if let Some(path) = &cfg.mmdb_path {
        let mut descriptor =
            BackendDescriptor::new(BackendKind::MaxMind, path, loader_for(BackendKind::MaxMind));
        if let Some(asn) = &cfg.asn_mmdb_path {
            descriptor = descriptor.with_aux_path(asn);
        }
        candidates.push(descriptor);
    }

    if let Some(path) = &cfg.qqwry_path {
        candidates.push(BackendDescriptor::new(
            BackendKind::Qqwry,
            path,
            loader_for(BackendKind::Qqwry),
        ));
    }

    candidates.extend(BackendRegistry::discover(Path::new(&cfg.data_dir), loader_for));
    candidates
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting ip-lookup listen={} data_dir={}",
        cfg.listen_addr,
        cfg.data_dir
    );

    // ===== COMPOSITION ROOT =====

    // 1. Pick the geolocation backend (once, before binding)
    let candidates = backend_candidates(&cfg);
    tracing::debug!("backend candidates: {:?}", candidates);
    let backend = BackendRegistry::new(cfg.language.clone()).select_backend(&candidates);

    // 2. Create application service
    let resolver = Arc::new(Resolver::new(backend));

    // 3. Create inbound adapter and run until a signal arrives
    let state = ApiState::new(resolver).with_trust_cf_connecting_ip(cfg.trust_cf_connecting_ip);
    let server = ApiServer::new(cfg.listen_addr.clone(), state);

    server.run(shutdown_signal()).await
}
