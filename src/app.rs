use crate::{
    config::Config,
    error::Result,
    handlers,
    models::{ErrorResponse, HealthResponse, Product},
    routes::{api_routes, openapi_route},
    services::{CatalogSource, RecommendationService},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::net::TcpListener;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::prewarm::prewarm,
        handlers::recommendations::get_recommendations,
        handlers::recommendations::get_product,
    ),
    components(schemas(Product, ErrorResponse, HealthResponse)),
    tags(
        (name = "Recommendations", description = "Related-product recommendations"),
        (name = "Products", description = "Catalog lookups"),
        (name = "System", description = "Health and warm-up")
    )
)]
pub struct ApiDoc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let catalog =
            CatalogSource::from_config(&self.config).context("Failed to initialize catalog")?;
        let recommendation_service =
            web::Data::new(RecommendationService::new(catalog, &self.config));

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(recommendation_service.clone())
                .service(api_routes())
                .service(openapi_route())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
