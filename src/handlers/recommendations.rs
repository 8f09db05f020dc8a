use crate::{
    error::ApiError,
    models::{ErrorResponse, Product, RecommendationQuery},
    services::RecommendationService,
};
use actix_web::{web, HttpResponse};

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(get_recommendations).service(get_product);
}

/// Get products related to a given product
#[utoipa::path(
    get,
    path = "/api/recommend",
    tag = "Recommendations",
    params(RecommendationQuery),
    responses(
        (status = 200, description = "Related products, most similar first", body = [Product]),
        (status = 400, description = "Missing or malformed product id, or k out of range", body = ErrorResponse),
        (status = 404, description = "No product with this id in the catalog", body = ErrorResponse),
        (status = 422, description = "Catalog exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Recommendation computation failed", body = ErrorResponse),
    ),
    summary = "Get related products",
    description = "Ranks every other catalog product by TF-IDF cosine similarity of name, category and description to the given product and returns the top matches. A catalog with a single product yields an empty list."
)]
#[actix_web::get("/recommend")]
pub async fn get_recommendations(
    query: web::Query<RecommendationQuery>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    let recommendations = recommendation_service
        .recommend(query.product_id.as_deref(), query.k)
        .await?;

    Ok(HttpResponse::Ok().json(recommendations.into_products()))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    tag = "Products",
    params(
        ("product_id" = String, Path, description = "Product identifier (24 hex characters)")
    ),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 400, description = "Malformed product id", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
    ),
    summary = "Get product by id"
)]
#[actix_web::get("/products/{product_id}")]
pub async fn get_product(
    product_id: web::Path<String>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let product = recommendation_service.get_product(&product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}
