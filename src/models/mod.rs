use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Re-export types from product.rs
pub use product::{Product, ProductId, ScoredProduct};

mod product;

/// Query parameters for related-product recommendations
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationQuery {
    /// Identifier of the product to find related products for
    #[param(example = "64b7f0c2a1e4d3b2c1a09f8e")]
    pub product_id: Option<String>,
    /// Optional number of related products to return
    #[param(example = 4, minimum = 1)]
    pub k: Option<usize>,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Status of the service
    #[schema(example = "ok")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Product not found: 64b7f0c2a1e4d3b2c1a09f8e")]
    pub error: String,
    /// Machine-readable error kind
    #[schema(example = "target_not_found")]
    pub kind: String,
}
