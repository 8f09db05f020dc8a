pub mod catalog;
pub mod recommendation;
pub mod rest_catalog;

// Re-export public types
pub use catalog::{CatalogSource, InMemoryCatalog};
pub use recommendation::RecommendationService;
pub use rest_catalog::RestCatalogClient;
