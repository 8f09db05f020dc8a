use crate::{
    config::Config,
    error::{ApiError, Result},
    models::Product,
    services::rest_catalog::RestCatalogClient,
};
use std::{
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::info;

/// Catalog held in process memory, typically loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Load a JSON array of products.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::CatalogError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let products: Vec<Product> = serde_json::from_str(&raw)?;
        info!("Loaded {} products from {}", products.len(), path.display());
        Ok(Self::new(products))
    }

    /// Point-in-time copy; later writes never reach a snapshot already taken.
    pub fn snapshot(&self) -> Result<Vec<Product>> {
        self.products
            .read()
            .map(|products| products.clone())
            .map_err(|_| ApiError::InternalError("Catalog lock poisoned".into()))
    }

    pub fn replace(&self, products: Vec<Product>) -> Result<()> {
        let mut guard = self
            .products
            .write()
            .map_err(|_| ApiError::InternalError("Catalog lock poisoned".into()))?;
        *guard = products;
        Ok(())
    }

    /// Insert a product or overwrite the one with the same id, keeping its position.
    pub fn upsert(&self, product: Product) -> Result<()> {
        let mut guard = self
            .products
            .write()
            .map_err(|_| ApiError::InternalError("Catalog lock poisoned".into()))?;
        match guard.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => guard.push(product),
        }
        Ok(())
    }
}

/// Where catalog snapshots come from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Memory(InMemoryCatalog),
    Rest(RestCatalogClient),
}

impl CatalogSource {
    /// REST catalog when configured, otherwise the JSON catalog file.
    pub fn from_config(config: &Config) -> Result<Self> {
        match (&config.catalog_url, &config.catalog_api_key) {
            (Some(url), Some(api_key)) => {
                info!("Using REST catalog at {}", url);
                Ok(CatalogSource::Rest(RestCatalogClient::new(url, api_key)?))
            }
            _ => Ok(CatalogSource::Memory(InMemoryCatalog::from_file(
                &config.catalog_path,
            )?)),
        }
    }

    /// The full ordered catalog as of now.
    pub async fn snapshot(&self) -> Result<Vec<Product>> {
        match self {
            CatalogSource::Memory(catalog) => catalog.snapshot(),
            CatalogSource::Rest(client) => client.fetch_all().await,
        }
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        match self {
            CatalogSource::Memory(catalog) => catalog
                .snapshot()?
                .into_iter()
                .find(|product| product.id.eq_ignore_ascii_case(id))
                .ok_or_else(|| ApiError::TargetNotFound(id.to_string())),
            CatalogSource::Rest(client) => client.get_product(id).await,
        }
    }
}

impl From<InMemoryCatalog> for CatalogSource {
    fn from(catalog: InMemoryCatalog) -> Self {
        CatalogSource::Memory(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let catalog = InMemoryCatalog::new(vec![Product::new("1", "Lamp", "Lighting")]);

        let snapshot = catalog.snapshot().unwrap();
        catalog
            .upsert(Product::new("2", "Desk", "Furniture"))
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(catalog.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let catalog = InMemoryCatalog::new(vec![
            Product::new("1", "Lamp", "Lighting"),
            Product::new("2", "Desk", "Furniture"),
        ]);

        catalog
            .upsert(Product::new("1", "Floor Lamp", "Lighting"))
            .unwrap();

        let snapshot = catalog.snapshot().unwrap();
        assert_eq!(snapshot[0].name, "Floor Lamp");
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"_id": "1", "name": "Lamp", "category": "Lighting", "price": 12}}]"#
        )
        .unwrap();

        let catalog = InMemoryCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.snapshot().unwrap()[0].name, "Lamp");
    }

    #[test]
    fn test_from_missing_file_is_catalog_error() {
        let err = InMemoryCatalog::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ApiError::CatalogError(_)));
    }

    #[tokio::test]
    async fn test_source_get_product() {
        let source = CatalogSource::from(InMemoryCatalog::new(vec![Product::new(
            "1", "Lamp", "Lighting",
        )]));

        assert_eq!(source.get_product("1").await.unwrap().name, "Lamp");
        assert!(matches!(
            source.get_product("2").await,
            Err(ApiError::TargetNotFound(_))
        ));
    }
}
