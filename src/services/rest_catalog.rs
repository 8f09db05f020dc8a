use crate::{error::ApiError, models::Product};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const PRODUCTS_TABLE: &str = "products";

/// Catalog backed by a PostgREST-style HTTP API.
#[derive(Debug, Clone)]
pub struct RestCatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestCatalogClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Every product, in the provider's stable `_id` order.
    pub async fn fetch_all(&self) -> Result<Vec<Product>, ApiError> {
        let url = format!(
            "{}/rest/v1/{}?select=*&order=_id.asc",
            self.base_url, PRODUCTS_TABLE
        );
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ApiError::CatalogError(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| ApiError::SerializationError(e.to_string())),
            status => Err(ApiError::CatalogError(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }

    /// Product by id; `ilike` keeps the match case-insensitive on the provider side.
    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        let url = format!(
            "{}/rest/v1/{}?_id=ilike.{}",
            self.base_url, PRODUCTS_TABLE, id
        );
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ApiError::CatalogError(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let mut items: Vec<Product> = response
                    .json()
                    .await
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                items
                    .pop()
                    .ok_or_else(|| ApiError::TargetNotFound(id.to_string()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::TargetNotFound(id.to_string())),
            status => Err(ApiError::CatalogError(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }
}
