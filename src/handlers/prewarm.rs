//! Prewarm endpoint so the first related-products request does not pay for the fit

use crate::{
    error::{ApiError, Result},
    models::ErrorResponse,
    services::RecommendationService,
};
use actix_web::{web, HttpResponse};
use log::{debug, error, info, warn};
use serde_json::json;

/// Fits the current catalog snapshot and caches it
///
/// # Returns
///
/// A JSON response describing whether this was the first prewarm. Expected
/// catalog failures are reported as `partial`; computation faults surface as
/// error responses.
#[utoipa::path(
    get,
    path = "/api/prewarm",
    tag = "System",
    responses(
        (status = 200, description = "Catalog snapshot fitted and cached", body = serde_json::Value),
        (status = 500, description = "Fit failed unexpectedly", body = ErrorResponse)
    ),
    summary = "Prewarm the recommender",
    description = "Fetches the current catalog and fits the TF-IDF model ahead of the first recommendation request. Useful after deployment or a bulk catalog import."
)]
#[actix_web::get("/prewarm")]
pub async fn prewarm(
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse> {
    info!("Prewarming recommender...");

    match recommendation_service.prewarm().await {
        Ok(was_first) => {
            debug!(
                "Prewarm finished, {} cached snapshot(s)",
                recommendation_service.cached_snapshots()
            );

            let message = if was_first {
                "Recommender prewarmed for the first time"
            } else {
                "Recommender snapshot refreshed"
            };

            Ok(HttpResponse::Ok().json(json!({
                "status": "ok",
                "message": message,
                "first_prewarm": was_first,
                "cached_snapshots": recommendation_service.cached_snapshots(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
        Err(e) => prewarm_failure(e),
    }
}

fn prewarm_failure(e: ApiError) -> Result<HttpResponse> {
    if e.is_unexpected() {
        error!("Prewarm failed: {}", e);
        return Err(e);
    }

    warn!("Prewarm partially completed with warning: {}", e);
    Ok(HttpResponse::Ok().json(json!({
        "status": "partial",
        "message": "Recommender could not be prewarmed",
        "warning": e.to_string(),
        "kind": e.kind(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
