mod classifier;
mod mock_catalog;
mod normalizer;

pub use classifier::{AddressClassifier, Classification, ClassificationRule};
pub use mock_catalog::{CatalogEntry, MockCatalog};
pub use normalizer::{AddressNormalizer, InvalidAddress};
