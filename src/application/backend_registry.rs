//! Backend Registry - startup backend selection
//!
//! Finds geolocation databases on disk, tries to open them in priority
//! order and commits to the first one that loads. Runs once, before the
//! HTTP listener accepts traffic.

use crate::domain::entities::BackendKind;
use crate::domain::ports::{BackendError, BackendLoader, BackendSource, GeoBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File names the legacy QQWry database ships under, in preference order.
const QQWRY_FILE_NAMES: [&str; 2] = ["qqwry.dat", "ip.dat"];

/// A candidate backend: which format, where its data lives, how to open it.
#[derive(Clone)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    pub data_path: PathBuf,
    pub aux_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    loader: BackendLoader,
}

impl BackendDescriptor {
    pub fn new(kind: BackendKind, data_path: impl Into<PathBuf>, loader: BackendLoader) -> Self {
        Self {
            kind,
            data_path: data_path.into(),
            aux_path: None,
            key_path: None,
            loader,
        }
    }

    /// Attach a companion database (e.g. an ASN database).
    pub fn with_aux_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.aux_path = Some(path.into());
        self
    }

    /// Require a key side file; the candidate fails to load without it.
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }
}

impl std::fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("kind", &self.kind)
            .field("data_path", &self.data_path)
            .field("aux_path", &self.aux_path)
            .field("key_path", &self.key_path)
            .finish()
    }
}

/// Chooses the single active backend for the process.
pub struct BackendRegistry {
    language: String,
}

impl BackendRegistry {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Scan `dir` for database files.
    ///
    /// Recognizes `qqwry.dat` / `ip.dat` and any `*.mmdb`. An mmdb whose
    /// name mentions "asn" is not a candidate by itself; it is attached to
    /// every MaxMind candidate as the operator database. A missing or
    /// unreadable directory yields no candidates.
    pub fn discover<F>(dir: &Path, loader_for: F) -> Vec<BackendDescriptor>
    where
        F: Fn(BackendKind) -> BackendLoader,
    {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("cannot scan {} for databases: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut asn_path = None;
        let mut found: Vec<(BackendKind, u8, PathBuf)> = Vec::new();

        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = name.to_ascii_lowercase();

            if let Some(rank) = QQWRY_FILE_NAMES.iter().position(|n| *n == lower) {
                found.push((BackendKind::Qqwry, rank as u8, path));
            } else if lower.ends_with(".mmdb") {
                if lower.contains("asn") {
                    asn_path.get_or_insert(path);
                } else {
                    // City beats Country when both are present
                    let rank = if lower.contains("city") { 0 } else { 1 };
                    found.push((BackendKind::MaxMind, rank, path));
                }
            }
        }

        found.sort_by(|a, b| (a.0.priority(), a.1, &a.2).cmp(&(b.0.priority(), b.1, &b.2)));

        found
            .into_iter()
            .map(|(kind, _, path)| {
                let descriptor = BackendDescriptor::new(kind, path, loader_for(kind));
                match (&asn_path, kind) {
                    (Some(asn), BackendKind::MaxMind) => descriptor.with_aux_path(asn.clone()),
                    _ => descriptor,
                }
            })
            .collect()
    }

    /// Try candidates in priority order and return the first that loads.
    ///
    /// Candidates are ordered by [`BackendKind::priority`]; candidates of
    /// the same kind keep their relative order. Load failures are logged
    /// and skipped. `None` means the service runs on the classifier and
    /// mock catalog alone.
    pub fn select_backend(&self, candidates: &[BackendDescriptor]) -> Option<Arc<dyn GeoBackend>> {
        let mut ordered: Vec<&BackendDescriptor> = candidates.iter().collect();
        ordered.sort_by_key(|d| d.kind.priority());

        for descriptor in ordered {
            match self.load(descriptor) {
                Ok(backend) => {
                    tracing::info!(
                        "geolocation backend selected: {} ({})",
                        descriptor.kind,
                        descriptor.data_path.display()
                    );
                    return Some(backend);
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to load {} backend from {}: {}",
                        descriptor.kind,
                        descriptor.data_path.display(),
                        e
                    );
                }
            }
        }

        tracing::warn!("no geolocation database loaded, serving built-in data only");
        None
    }

    fn load(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn GeoBackend>, BackendError> {
        let key = match &descriptor.key_path {
            Some(path) => Some(read_key(path)?),
            None => None,
        };

        let source = BackendSource {
            data_path: &descriptor.data_path,
            aux_path: descriptor.aux_path.as_deref(),
            key: key.as_deref(),
            language: &self.language,
        };

        (descriptor.loader)(&source)
    }
}

fn read_key(path: &Path) -> Result<String, BackendError> {
    let raw =
        std::fs::read_to_string(path).map_err(|_| BackendError::MissingKey(path.to_path_buf()))?;
    let key = raw.trim();
    if key.is_empty() {
        return Err(BackendError::InvalidKey(path.to_path_buf()));
    }
    Ok(key.to_string())
}
