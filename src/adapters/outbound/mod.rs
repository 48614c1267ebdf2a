mod maxmind_backend;
mod qqwry_backend;

pub use maxmind_backend::MaxMindBackend;
pub use qqwry_backend::QqwryBackend;

use crate::domain::entities::BackendKind;
use crate::domain::ports::BackendLoader;

/// Constructor for each backend variant.
pub fn loader_for(kind: BackendKind) -> BackendLoader {
    match kind {
        BackendKind::MaxMind => MaxMindBackend::load,
        BackendKind::Qqwry => QqwryBackend::load,
    }
}
